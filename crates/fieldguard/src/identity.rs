//! Caller identity and request context.
//!
//! Both are supplied by the surrounding framework. The engine only reads the
//! current user out of the context; everything else is passed untouched to
//! predicates and resolvers.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The caller behind a request.
///
/// `kind` is the caller's runtime type (`"Admin"`, `"User"`, ...) and is what
/// [`Pattern::TypeMatch`](crate::Pattern::TypeMatch) compares against.
/// `attributes` carries whatever the framework knows about the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    kind: String,
    #[serde(default)]
    attributes: Map<String, Value>,
}

impl Identity {
    /// Creates an identity of the given kind with no attributes.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            attributes: Map::new(),
        }
    }

    /// Adds an attribute (builder pattern).
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Returns the caller's kind.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Returns a single attribute, if present.
    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }
}

/// Request-scoped data handed to predicates and resolvers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestContext {
    /// `None` for unauthenticated callers.
    current_user: Option<Identity>,
    #[serde(default)]
    extensions: Map<String, Value>,
}

impl RequestContext {
    /// Creates a context for an unauthenticated caller.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Creates a context for the given caller.
    pub fn for_user(identity: Identity) -> Self {
        Self {
            current_user: Some(identity),
            extensions: Map::new(),
        }
    }

    /// Attaches request-scoped data (builder pattern).
    pub fn with_extension(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extensions.insert(key.into(), value.into());
        self
    }

    /// Returns the caller, or `None` when the request is unauthenticated.
    pub fn current_user(&self) -> Option<&Identity> {
        self.current_user.as_ref()
    }

    /// Returns a request-scoped value, if present.
    pub fn extension(&self, key: &str) -> Option<&Value> {
        self.extensions.get(key)
    }
}
