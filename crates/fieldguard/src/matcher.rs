//! Rule matching.
//!
//! Scans one operation's rules in the order the registry yields them (most
//! recently declared first) and returns the first rule whose pattern
//! matches. Predicate patterns inspect the resolver's output, so the
//! resolver runs lazily the first time such a pattern is reached and its
//! outcome is kept for the rest of the request.

use serde_json::Value;
use tracing::trace;

use crate::error::{AuthError, Result};
use crate::identity::RequestContext;
use crate::pattern::Pattern;
use crate::rule::Rule;

/// A resolver call that runs at most once.
pub struct LazyResource<'a, F> {
    attrs: &'a Value,
    ctx: &'a RequestContext,
    resolver: Option<F>,
    outcome: Option<std::result::Result<Value, String>>,
}

impl<'a, F> LazyResource<'a, F>
where
    F: FnOnce(&Value, &RequestContext) -> std::result::Result<Value, String>,
{
    pub fn new(attrs: &'a Value, ctx: &'a RequestContext, resolver: F) -> Self {
        Self {
            attrs,
            ctx,
            resolver: Some(resolver),
            outcome: None,
        }
    }

    /// Returns `true` once the resolver has been invoked.
    pub fn is_resolved(&self) -> bool {
        self.outcome.is_some()
    }

    /// Returns the resolved value, invoking the resolver on first use.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Resolver`] if the resolver failed.
    pub fn get(&mut self) -> Result<&Value> {
        if let Some(resolver) = self.resolver.take() {
            self.outcome = Some(resolver(self.attrs, self.ctx));
        }
        match &self.outcome {
            Some(Ok(value)) => Ok(value),
            Some(Err(message)) => Err(AuthError::Resolver(message.clone())),
            None => unreachable!("resolver is only taken when its outcome is stored"),
        }
    }

    /// Consumes the cell, invoking the resolver if nothing has yet.
    pub fn into_outcome(self) -> std::result::Result<Value, String> {
        match (self.outcome, self.resolver) {
            (Some(outcome), _) => outcome,
            (None, Some(resolver)) => resolver(self.attrs, self.ctx),
            (None, None) => unreachable!("resolver is only taken when its outcome is stored"),
        }
    }
}

/// Finds the rule to apply.
///
/// `rules` must already be restricted to one operation and ordered newest
/// first. An empty slice never matches.
///
/// # Errors
///
/// Returns [`AuthError::Resolver`] when a predicate pattern needs the
/// resource and the resolver fails. Scanning stops at that point.
pub fn match_rule<'r, F>(
    rules: &'r [Rule],
    ctx: &RequestContext,
    resource: &mut LazyResource<'_, F>,
) -> Result<Option<&'r Rule>>
where
    F: FnOnce(&Value, &RequestContext) -> std::result::Result<Value, String>,
{
    let identity = ctx.current_user();

    for rule in rules {
        let matched = match rule.pattern() {
            Pattern::Always => true,
            Pattern::TypeMatch(kind) => identity.is_some_and(|id| id.kind() == kind),
            Pattern::PredicateMatch(predicate) => {
                let value = resource.get()?;
                predicate.evaluate(value, ctx)
            }
        };

        trace!(
            operation = %rule.operation(),
            rule = rule.index(),
            pattern = %rule.pattern(),
            matched,
            "Rule tested"
        );

        if matched {
            return Ok(Some(rule));
        }
    }

    Ok(None)
}
