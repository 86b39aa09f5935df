//! CLI command implementations.

pub mod check;
pub mod filter;
pub mod rules;
pub mod version;

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use fieldguard::RuleRegistry;
use fieldguard_config::{FieldguardConfig, PredicateTable, RuleSet};
use serde_json::Value;

/// Reads a JSON document from `path`, or from stdin when no path is given.
pub(crate) fn read_json(path: Option<&Path>) -> Result<Value> {
    let source = match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read stdin")?;
            buf
        }
    };

    serde_json::from_str(&source).context("Input is not valid JSON")
}

/// Loads configuration from `project_dir`, or from the current directory.
pub(crate) fn load_config(project_dir: Option<&Path>) -> Result<FieldguardConfig> {
    let config = match project_dir {
        Some(dir) => FieldguardConfig::load_from_dir(dir),
        None => FieldguardConfig::load(),
    };
    config.context("Failed to load configuration")
}

/// Loads the rule file given on the command line, or the configured one.
pub(crate) fn load_registry(
    config: &FieldguardConfig,
    rules: Option<&Path>,
) -> Result<RuleRegistry> {
    let path = rules.unwrap_or(config.rules.path.as_path());
    let registry = RuleSet::from_file(path)?.into_registry(&PredicateTable::with_builtins())?;
    Ok(registry)
}
