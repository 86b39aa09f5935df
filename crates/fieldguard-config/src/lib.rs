//! Configuration management for fieldguard
//!
//! Provides hierarchical configuration loading from multiple sources:
//! 1. Environment variables (FIELDGUARD_* prefix, `__` between sections)
//! 2. fieldguard.local.toml (gitignored, local overrides)
//! 3. fieldguard.toml (git-tracked, project config)
//! 4. ~/.config/fieldguard/config.toml (user defaults)
//! 5. Built-in defaults (lowest precedence)
//!
//! Rules themselves live in a separate rule file (see [`rules`]), whose
//! location is part of the configuration.

use anyhow::Result;
use fieldguard::{Guard, IMPLICIT_KEYS, ResponseFilter, RuleRegistry};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

mod error;
mod loader;
mod paths;
pub mod rules;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use paths::Paths;
pub use rules::{PatternDeclaration, PredicateTable, RuleDeclaration, RuleSet};

/// Main fieldguard configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldguardConfig {
    pub engine: EngineConfig,
    pub rules: RulesConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Log every access decision.
    pub audit: bool,
    /// Keys copied verbatim by the response filter.
    pub implicit_keys: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            audit: true,
            implicit_keys: IMPLICIT_KEYS.iter().map(ToString::to_string).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Rule file, relative paths resolve against the project directory.
    pub path: PathBuf,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("rules.toml"),
        }
    }
}

impl FieldguardConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        ConfigLoader::new().load()
    }

    /// Load configuration from specific project directory
    pub fn load_from_dir(project_dir: impl AsRef<Path>) -> Result<Self> {
        ConfigLoader::new().with_project_dir(project_dir).load()
    }

    /// Resolve relative paths to absolute
    pub fn resolve_paths(&mut self, base_dir: impl AsRef<Path>) {
        let base = base_dir.as_ref();

        if self.rules.path.is_relative() {
            self.rules.path = base.join(&self.rules.path);
        }
    }

    /// Reads the configured rule file and builds a registry from it.
    pub fn load_registry(&self, predicates: &PredicateTable) -> Result<RuleRegistry, ConfigError> {
        RuleSet::from_file(&self.rules.path)?.into_registry(predicates)
    }

    /// Response filter honouring the configured implicit keys.
    pub fn response_filter(&self) -> ResponseFilter {
        ResponseFilter::with_implicit_keys(self.engine.implicit_keys.iter().cloned())
    }

    /// Builds a guard over `registry` with the engine settings applied.
    pub fn guard(&self, registry: RuleRegistry) -> Guard {
        let guard = Guard::new(registry).with_filter(self.response_filter());
        if self.engine.audit {
            guard
        } else {
            guard.without_audit()
        }
    }
}
