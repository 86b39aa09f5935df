//! Filter command: apply a whitelist without any rules.

use std::path::Path;

use anyhow::{Context, Result};
use fieldguard::WhitelistSpec;

/// Filters the input through `whitelist` and prints the result.
///
/// An empty whitelist redacts every field here; pass-through only exists at
/// the rule level.
pub fn run(project_dir: Option<&Path>, whitelist: &str, input: Option<&Path>) -> Result<()> {
    let config = super::load_config(project_dir)?;
    let whitelist: WhitelistSpec = serde_json::from_str(whitelist).context("Invalid whitelist")?;
    let value = super::read_json(input)?;

    let filtered = config.response_filter().filter_value(&whitelist, value)?;
    println!("{}", serde_json::to_string_pretty(&filtered)?);

    Ok(())
}
