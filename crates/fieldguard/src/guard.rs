//! Authorization entry point.
//!
//! [`Guard::with_auth`] ties the pieces together: look up the operation's
//! rules, match one against the caller, run the resolver and filter its
//! output through the matched rule's whitelist.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::error::{AuthError, Result};
use crate::filter::ResponseFilter;
use crate::identity::{Identity, RequestContext};
use crate::matcher::{LazyResource, match_rule};
use crate::registry::RuleRegistry;

/// Guards resolver calls with a frozen rule registry.
///
/// Cheap to clone; clones share the registry.
#[derive(Debug, Clone)]
pub struct Guard {
    registry: Arc<RuleRegistry>,
    filter: ResponseFilter,
    /// Whether to log access decisions.
    audit_enabled: bool,
}

impl Guard {
    /// Creates a guard over the given registry.
    pub fn new(registry: impl Into<Arc<RuleRegistry>>) -> Self {
        Self {
            registry: registry.into(),
            filter: ResponseFilter::default(),
            audit_enabled: true,
        }
    }

    /// Replaces the response filter (e.g. to change implicit keys).
    pub fn with_filter(mut self, filter: ResponseFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Disables audit logging (for testing).
    pub fn without_audit(mut self) -> Self {
        self.audit_enabled = false;
        self
    }

    /// Runs `resolver` for `operation` if a rule allows the caller, and
    /// returns its output filtered through that rule's whitelist.
    ///
    /// The resolver runs at most once. When no rule matches it does not run
    /// at all, unless a predicate rule needed its output while matching.
    ///
    /// # Errors
    ///
    /// - [`AuthError::Unauthorized`] if no rule matches.
    /// - [`AuthError::Resolver`] if the resolver fails, whether during
    ///   predicate matching or afterwards.
    /// - [`AuthError::MalformedWhitelistEntry`] if the whitelist does not
    ///   fit the shape of the result.
    ///
    /// # Examples
    ///
    /// ```
    /// use fieldguard::{Guard, Identity, Pattern, RequestContext, RuleRegistry, WhitelistSpec};
    /// use serde_json::json;
    ///
    /// let registry = RuleRegistry::builder()
    ///     .rule_with_whitelist("user", Pattern::Always, WhitelistSpec::fields(["name"]))
    ///     .rule("user", Pattern::kind("Admin"))
    ///     .build();
    /// let guard = Guard::new(registry).without_audit();
    ///
    /// let resolver = |_: &serde_json::Value, _: &RequestContext| {
    ///     Ok(json!({ "id": 1, "name": "Ann" }))
    /// };
    ///
    /// let ctx = RequestContext::anonymous();
    /// let public = guard.with_auth("user", &json!({}), &ctx, resolver).unwrap();
    /// assert_eq!(public, json!({ "id": null, "name": "Ann" }));
    ///
    /// let ctx = RequestContext::for_user(Identity::new("Admin"));
    /// let full = guard.with_auth("user", &json!({}), &ctx, resolver).unwrap();
    /// assert_eq!(full, json!({ "id": 1, "name": "Ann" }));
    /// ```
    pub fn with_auth<F>(
        &self,
        operation: &str,
        attrs: &Value,
        ctx: &RequestContext,
        resolver: F,
    ) -> Result<Value>
    where
        F: FnOnce(&Value, &RequestContext) -> std::result::Result<Value, String>,
    {
        let rules = self.registry.rules_for(operation);
        let caller = ctx.current_user().map_or("anonymous", Identity::kind);
        let mut resource = LazyResource::new(attrs, ctx, resolver);

        let matched = match match_rule(rules, ctx, &mut resource) {
            Ok(matched) => matched,
            Err(err) => {
                if self.audit_enabled {
                    warn!(
                        operation = %operation,
                        caller = %caller,
                        error = %err,
                        "Resolver failed during rule matching"
                    );
                }
                return Err(err);
            }
        };

        let Some(rule) = matched else {
            if self.audit_enabled {
                warn!(
                    operation = %operation,
                    caller = %caller,
                    candidates = rules.len(),
                    resolved = resource.is_resolved(),
                    "Access denied"
                );
            }
            return Err(AuthError::Unauthorized);
        };

        if self.audit_enabled {
            info!(
                operation = %operation,
                caller = %caller,
                rule = rule.index(),
                pattern = %rule.pattern(),
                filtered = !rule.is_pass_through(),
                "Access granted"
            );
        }

        let outcome = resource.into_outcome();
        if rule.is_pass_through() {
            return outcome.map_err(AuthError::Resolver);
        }
        self.filter.filter(rule.whitelist(), outcome)
    }
}

/// Wire shape of a guarded call: `{"ok": value}` or `{"error": message}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Response {
    Ok(Value),
    Error(String),
}

impl From<Result<Value>> for Response {
    fn from(result: Result<Value>) -> Self {
        match result {
            Ok(value) => Response::Ok(value),
            Err(err) => Response::Error(err.to_string()),
        }
    }
}
