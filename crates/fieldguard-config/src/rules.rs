//! Declarative rule files.
//!
//! A rule file lists `[[rule]]` tables in declaration order. Later rules
//! take precedence over earlier ones for the same operation.
//!
//! ```toml
//! [[rule]]
//! operation = "user"
//! pattern = { type = "always" }
//! whitelist = ["name", { posts = ["title", "body"] }]
//!
//! [[rule]]
//! operation = "user"
//! pattern = { type = "identity", kind = "Admin" }
//!
//! [[rule]]
//! operation = "user"
//! pattern = { type = "predicate", name = "owner" }
//! ```
//!
//! Predicates are code, not data: a rule names one and the name is looked
//! up in a [`PredicateTable`] when the registry is built.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;

use fieldguard::{
    OperationName, Pattern, Predicate, RequestContext, Rule, RuleRegistry, WhitelistSpec,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::ConfigError;

/// How a rule's pattern is written in a rule file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PatternDeclaration {
    /// Matches every caller.
    Always,
    /// Matches callers of the given kind.
    Identity { kind: String },
    /// Matches when the named predicate accepts the resolved resource.
    Predicate { name: String },
}

impl fmt::Display for PatternDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternDeclaration::Always => write!(f, "always"),
            PatternDeclaration::Identity { kind } => write!(f, "identity:{kind}"),
            PatternDeclaration::Predicate { name } => write!(f, "predicate:{name}"),
        }
    }
}

/// A single `[[rule]]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleDeclaration {
    pub operation: OperationName,
    pub pattern: PatternDeclaration,
    /// Omitted or empty means results pass through unfiltered.
    #[serde(default)]
    pub whitelist: WhitelistSpec,
}

/// Contents of a rule file, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSet {
    #[serde(default, rename = "rule")]
    pub rules: Vec<RuleDeclaration>,
}

impl RuleSet {
    /// Parses a rule file's contents.
    pub fn from_toml_str(source: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(source)
    }

    /// Reads and parses a rule file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        let rules = Self::from_toml_str(&source).map_err(|source| ConfigError::ParseError {
            path: path.to_path_buf(),
            source,
        })?;

        debug!(path = %path.display(), rules = rules.rules.len(), "Rule file loaded");
        Ok(rules)
    }

    /// Builds a registry, resolving predicate names through `predicates`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownPredicate`] for unregistered predicate
    /// names and [`ConfigError::ValidationError`] for empty operation names.
    pub fn into_registry(self, predicates: &PredicateTable) -> Result<RuleRegistry, ConfigError> {
        let mut builder = RuleRegistry::builder();
        for (index, decl) in self.rules.into_iter().enumerate() {
            builder = builder.declare(decl.into_rule(index, predicates)?);
        }
        Ok(builder.build())
    }
}

impl RuleDeclaration {
    fn into_rule(self, index: usize, predicates: &PredicateTable) -> Result<Rule, ConfigError> {
        if self.operation.as_str().is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "Rule {index} has an empty operation name"
            )));
        }
        let pattern = match self.pattern {
            PatternDeclaration::Always => Pattern::Always,
            PatternDeclaration::Identity { kind } => Pattern::TypeMatch(kind),
            PatternDeclaration::Predicate { name } => match predicates.get(&name) {
                Some(predicate) => Pattern::PredicateMatch(predicate.clone()),
                None => {
                    return Err(ConfigError::UnknownPredicate {
                        index,
                        operation: self.operation.to_string(),
                        name,
                    });
                }
            },
        };
        let rule = Rule::new(self.operation, pattern);
        Ok(rule.with_whitelist(self.whitelist))
    }
}

/// Named predicates that rule files may refer to.
#[derive(Debug, Clone, Default)]
pub struct PredicateTable {
    predicates: HashMap<String, Predicate>,
}

impl PredicateTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a table holding the built-in predicates.
    ///
    /// - `owner`: the resource's `id` equals the caller's `id` attribute.
    pub fn with_builtins() -> Self {
        Self::new().register("owner", owns_resource)
    }

    /// Registers a predicate under `name` (builder pattern).
    ///
    /// A later registration under the same name replaces the earlier one.
    pub fn register<F>(mut self, name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&Value, &RequestContext) -> bool + Send + Sync + 'static,
    {
        let name = name.into();
        self.predicates.insert(name.clone(), Predicate::new(name, func));
        self
    }

    pub fn get(&self, name: &str) -> Option<&Predicate> {
        self.predicates.get(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.predicates.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

fn owns_resource(resource: &Value, ctx: &RequestContext) -> bool {
    let Some(caller_id) = ctx.current_user().and_then(|user| user.attribute("id")) else {
        return false;
    };
    !caller_id.is_null() && resource.get("id") == Some(caller_id)
}
