//! Rule registry.
//!
//! Rules are declared once at startup through [`RegistryBuilder`] and frozen
//! into an immutable [`RuleRegistry`]. Each operation's rules are kept
//! newest-first, so a forward scan tests the most recently declared rule
//! first.

use std::collections::HashMap;

use tracing::debug;

use crate::pattern::Pattern;
use crate::rule::{OperationName, Rule};
use crate::whitelist::WhitelistSpec;

/// Collects rule declarations in declaration order.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    rules: Vec<Rule>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a rule.
    pub fn declare(mut self, rule: Rule) -> Self {
        let index = self.rules.len();
        self.rules.push(rule.with_index(index));
        self
    }

    /// Declares a pass-through rule for `operation`.
    pub fn rule(self, operation: impl Into<OperationName>, pattern: Pattern) -> Self {
        self.declare(Rule::new(operation, pattern))
    }

    /// Declares a rule whose results are filtered through `whitelist`.
    pub fn rule_with_whitelist(
        self,
        operation: impl Into<OperationName>,
        pattern: Pattern,
        whitelist: WhitelistSpec,
    ) -> Self {
        self.declare(Rule::new(operation, pattern).with_whitelist(whitelist))
    }

    /// Freezes the declarations.
    pub fn build(self) -> RuleRegistry {
        let mut by_operation: HashMap<OperationName, Vec<Rule>> = HashMap::new();
        let mut operations = Vec::new();
        let declared = self.rules.len();

        for rule in self.rules {
            let slot = by_operation
                .entry(rule.operation().clone())
                .or_insert_with(|| {
                    operations.push(rule.operation().clone());
                    Vec::new()
                });
            slot.insert(0, rule);
        }

        debug!(
            rules = declared,
            operations = operations.len(),
            "Rule registry built"
        );

        RuleRegistry {
            by_operation,
            operations,
            declared,
        }
    }
}

/// Immutable, operation-indexed rule set.
///
/// Never mutated after [`RegistryBuilder::build`], so it can be shared across
/// threads (typically behind an `Arc`) without locking.
#[derive(Debug, Default)]
pub struct RuleRegistry {
    by_operation: HashMap<OperationName, Vec<Rule>>,
    /// Operations in order of first declaration.
    operations: Vec<OperationName>,
    declared: usize,
}

impl RuleRegistry {
    /// Starts a new builder.
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Returns the rules for `operation`, most recently declared first.
    ///
    /// Unknown operations yield an empty slice.
    pub fn rules_for(&self, operation: &str) -> &[Rule] {
        self.by_operation
            .get(operation)
            .map_or(&[], Vec::as_slice)
    }

    /// Returns every operation that has at least one rule.
    pub fn operations(&self) -> &[OperationName] {
        &self.operations
    }

    /// Total number of declared rules.
    pub fn len(&self) -> usize {
        self.declared
    }

    pub fn is_empty(&self) -> bool {
        self.declared == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> RuleRegistry {
        RuleRegistry::builder()
            .rule("user", Pattern::Always)
            .rule("post", Pattern::kind("Admin"))
            .rule("user", Pattern::kind("Admin"))
            .rule("user", Pattern::kind("Moderator"))
            .build()
    }

    #[test]
    fn test_rules_for_is_newest_first() {
        let registry = registry();
        let indexes: Vec<usize> = registry.rules_for("user").iter().map(Rule::index).collect();

        assert_eq!(indexes, vec![3, 2, 0]);
    }

    #[test]
    fn test_unknown_operation_has_no_rules() {
        assert!(registry().rules_for("comment").is_empty());
    }

    #[test]
    fn test_operations_in_first_declaration_order() {
        let registry = registry();
        let names: Vec<&str> = registry
            .operations()
            .iter()
            .map(OperationName::as_str)
            .collect();

        assert_eq!(names, vec!["user", "post"]);
        assert_eq!(registry.len(), 4);
    }

    #[test]
    fn test_registry_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RuleRegistry>();
    }
}
