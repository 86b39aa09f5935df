//! Configuration loader with multi-source merging

use crate::{FieldguardConfig, Paths};
use anyhow::{Context, Result};
use std::env;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Prefix of environment overrides, e.g. `FIELDGUARD_RULES__PATH`.
const ENV_PREFIX: &str = "FIELDGUARD";

/// Configuration loader with builder pattern
pub struct ConfigLoader {
    project_dir: PathBuf,
    include_user_config: bool,
}

impl ConfigLoader {
    /// Create a new config loader with default project directory (current dir)
    pub fn new() -> Self {
        Self {
            project_dir: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            include_user_config: true,
        }
    }

    /// Set the project directory
    pub fn with_project_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.project_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Skip ~/.config/fieldguard/config.toml (for testing)
    pub fn without_user_config(mut self) -> Self {
        self.include_user_config = false;
        self
    }

    /// Load configuration from all sources with proper precedence
    pub fn load(self) -> Result<FieldguardConfig> {
        let mut builder = config::Config::builder();

        // 1. Start with built-in defaults
        let defaults = FieldguardConfig::default();
        builder = builder.add_source(config::Config::try_from(&defaults)?);

        // 2. User config (~/.config/fieldguard/config.toml)
        if self.include_user_config
            && let Ok(user_config_file) = Paths::new().user_config_file()
            && user_config_file.exists()
        {
            debug!(path = %user_config_file.display(), "Using user config");
            builder = builder.add_source(
                config::File::from(user_config_file)
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // 3. Project config (fieldguard.toml)
        let project_config_file = Paths::project_config_file(&self.project_dir);
        if project_config_file.exists() {
            builder = builder.add_source(
                config::File::from(project_config_file)
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // 4. Local config (fieldguard.local.toml, gitignored)
        let local_config_file = Paths::local_config_file(&self.project_dir);
        if local_config_file.exists() {
            builder = builder.add_source(
                config::File::from(local_config_file)
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // 5. Environment variables (FIELDGUARD_ENGINE__AUDIT=false)
        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("engine.implicit_keys")
                .try_parsing(true),
        );

        // Build and deserialize
        let config = builder.build().context("Failed to build configuration")?;

        let mut fieldguard_config: FieldguardConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        // Resolve relative paths
        fieldguard_config.resolve_paths(&self.project_dir);

        Ok(fieldguard_config)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PredicateTable;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_load_defaults() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let config = ConfigLoader::new()
            .with_project_dir(temp_dir.path())
            .without_user_config()
            .load()
            .expect("Failed to load config");

        assert!(config.engine.audit);
        assert_eq!(config.engine.implicit_keys, vec!["__struct__", "__meta__"]);
        assert_eq!(config.rules.path, temp_dir.path().join("rules.toml"));
    }

    #[test]
    fn test_load_project_config() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let project_dir = temp_dir.path();

        let config_content = r#"
[engine]
audit = false
implicit_keys = ["__typename"]

[rules]
path = "config/authz.toml"
"#;
        fs::write(project_dir.join("fieldguard.toml"), config_content)
            .expect("Failed to write config");

        let config = ConfigLoader::new()
            .with_project_dir(project_dir)
            .without_user_config()
            .load()
            .expect("Failed to load config");

        assert!(!config.engine.audit);
        assert_eq!(config.engine.implicit_keys, vec!["__typename"]);
        assert_eq!(config.rules.path, project_dir.join("config/authz.toml"));
    }

    #[test]
    fn test_local_overrides() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let project_dir = temp_dir.path();

        fs::write(
            project_dir.join("fieldguard.toml"),
            r#"
[rules]
path = "rules.toml"
"#,
        )
        .expect("Failed to write project config");

        fs::write(
            project_dir.join("fieldguard.local.toml"),
            r#"
[rules]
path = "rules.dev.toml"
"#,
        )
        .expect("Failed to write local config");

        let config = ConfigLoader::new()
            .with_project_dir(project_dir)
            .without_user_config()
            .load()
            .expect("Failed to load config");

        // Local config should override project config
        assert_eq!(config.rules.path, project_dir.join("rules.dev.toml"));
    }

    // Environment overrides are not exercised here: the process environment is
    // shared between concurrently running tests. In actual usage:
    //
    // FIELDGUARD_ENGINE__AUDIT=false
    // FIELDGUARD_ENGINE__IMPLICIT_KEYS=__typename,__meta__
    // FIELDGUARD_RULES__PATH=/etc/fieldguard/rules.toml

    #[test]
    fn test_load_registry_from_configured_path() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let project_dir = temp_dir.path();

        fs::write(
            project_dir.join("rules.toml"),
            r#"
[[rule]]
operation = "user"
pattern = { type = "always" }
whitelist = ["name"]
"#,
        )
        .expect("Failed to write rules");

        let config = ConfigLoader::new()
            .with_project_dir(project_dir)
            .without_user_config()
            .load()
            .expect("Failed to load config");
        let registry = config
            .load_registry(&PredicateTable::with_builtins())
            .expect("Failed to load rules");

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.rules_for("user").len(), 1);
    }
}
