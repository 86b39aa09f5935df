//! Rules command: show what `with_auth` will try, and in which order.

use std::path::Path;

use anyhow::Result;
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, ContentArrangement, Table};
use fieldguard::{Rule, RuleRegistry};

pub fn run(project_dir: Option<&Path>, rules: Option<&Path>) -> Result<()> {
    let config = super::load_config(project_dir)?;
    let registry = super::load_registry(&config, rules)?;

    if registry.is_empty() {
        println!("No rules declared; every operation is refused.");
        return Ok(());
    }

    println!("{}", rule_table(&registry));

    println!("({})", summary(registry.len(), registry.operations().len()));

    Ok(())
}

/// One row per rule, grouped by operation, most recent declaration first.
fn rule_table(registry: &RuleRegistry) -> Table {
    let mut table = Table::new();

    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(
        ["Operation", "Try", "Declared", "Pattern", "Whitelist"]
            .into_iter()
            .map(|h| Cell::new(h).add_attribute(Attribute::Bold))
            .collect::<Vec<_>>(),
    );

    for operation in registry.operations() {
        for (position, rule) in registry.rules_for(operation.as_str()).iter().enumerate() {
            table.add_row(vec![
                operation.to_string(),
                (position + 1).to_string(),
                format!("#{}", rule.index()),
                rule.pattern().to_string(),
                whitelist_summary(rule),
            ]);
        }
    }

    table
}

fn summary(rules: usize, operations: usize) -> String {
    let rule_word = if rules == 1 { "rule" } else { "rules" };
    let operation_word = if operations == 1 {
        "operation"
    } else {
        "operations"
    };
    format!("{rules} {rule_word} across {operations} {operation_word}")
}

fn whitelist_summary(rule: &Rule) -> String {
    if rule.is_pass_through() {
        return "(all fields)".to_string();
    }
    serde_json::to_string(rule.whitelist()).unwrap_or_else(|_| "?".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldguard::{Pattern, WhitelistSpec};

    #[test]
    fn test_summary_pluralizes() {
        assert_eq!(summary(1, 1), "1 rule across 1 operation");
        assert_eq!(summary(3, 2), "3 rules across 2 operations");
    }

    #[test]
    fn test_summary_pass_through() {
        let rule = Rule::new("user", Pattern::Always);
        assert_eq!(whitelist_summary(&rule), "(all fields)");
    }

    #[test]
    fn test_summary_lists_fields() {
        let whitelist =
            WhitelistSpec::fields(["name"]).nested("posts", WhitelistSpec::fields(["title"]));
        let rule = Rule::new("user", Pattern::Always).with_whitelist(whitelist);
        assert_eq!(whitelist_summary(&rule), r#"["name",{"posts":["title"]}]"#);
    }

    #[test]
    fn test_table_orders_newest_first() {
        let registry = RuleRegistry::builder()
            .rule("user", Pattern::Always)
            .rule("user", Pattern::kind("Admin"))
            .build();

        let rendered = rule_table(&registry).to_string();
        let admin = rendered.find("identity:Admin").unwrap();
        let always = rendered.find("always").unwrap();
        assert!(admin < always);
    }
}
