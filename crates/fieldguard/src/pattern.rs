//! Rule patterns.
//!
//! A pattern decides whether a rule applies to a request. There are exactly
//! three shapes and they are matched exhaustively in the matcher.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::identity::RequestContext;

type PredicateFn = dyn Fn(&Value, &RequestContext) -> bool + Send + Sync;

/// A named `(resource, context) -> bool` callable.
///
/// The resource is the resolver's output, so evaluating a predicate requires
/// running the resolver first.
#[derive(Clone)]
pub struct Predicate {
    name: String,
    func: Arc<PredicateFn>,
}

impl Predicate {
    /// Wraps a closure under a name used in logs and rule listings.
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&Value, &RequestContext) -> bool + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    /// Returns the predicate's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Evaluates the predicate against a resolved resource.
    pub fn evaluate(&self, resource: &Value, ctx: &RequestContext) -> bool {
        (self.func)(resource, ctx)
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Predicate")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// What a rule tests before it applies.
#[derive(Debug, Clone)]
pub enum Pattern {
    /// Matches every request.
    Always,

    /// Matches when the caller's kind equals the given kind.
    ///
    /// Never matches an unauthenticated caller.
    TypeMatch(String),

    /// Matches when the predicate accepts the resolved resource.
    PredicateMatch(Predicate),
}

impl Pattern {
    /// Shorthand for [`Pattern::TypeMatch`].
    pub fn kind(kind: impl Into<String>) -> Self {
        Pattern::TypeMatch(kind.into())
    }

    /// Shorthand for [`Pattern::PredicateMatch`].
    pub fn predicate<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&Value, &RequestContext) -> bool + Send + Sync + 'static,
    {
        Pattern::PredicateMatch(Predicate::new(name, func))
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Always => write!(f, "always"),
            Pattern::TypeMatch(kind) => write!(f, "identity:{kind}"),
            Pattern::PredicateMatch(predicate) => write!(f, "predicate:{}", predicate.name()),
        }
    }
}
