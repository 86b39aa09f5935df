//! fieldguard CLI.
//!
//! Evaluates authorization rule files against JSON fixtures, without a
//! running API around them.
//!
//! # Quick Start
//!
//! ```bash
//! # Which rule applies to an admin asking for a user?
//! fieldguard check --rules rules.toml --operation user --kind Admin --result user.json
//!
//! # Apply a whitelist to a payload read from stdin
//! echo '{"name": "Greg", "email": "g@x.com"}' | fieldguard filter --whitelist '["name"]'
//!
//! # Show rules in evaluation order
//! fieldguard rules --rules rules.toml
//! ```

mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

/// fieldguard - rule-based authorization and response filtering.
#[derive(Parser)]
#[command(name = "fieldguard")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Directory holding fieldguard.toml (defaults to the current directory).
    #[arg(short = 'C', long, global = true)]
    project_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version information.
    Version,

    /// Authorize one operation and print the filtered response.
    Check {
        /// Rule file (defaults to `rules.path` from the configuration).
        #[arg(short, long)]
        rules: Option<PathBuf>,

        /// Operation name to authorize.
        #[arg(short, long)]
        operation: String,

        /// Caller kind, e.g. Admin. Omit for an anonymous caller.
        #[arg(short, long)]
        kind: Option<String>,

        /// Caller attributes as a JSON object, e.g. `{"id": 3}`.
        #[arg(short, long, requires = "kind")]
        identity: Option<String>,

        /// JSON file standing in for the resolver result (stdin when omitted).
        #[arg(long)]
        result: Option<PathBuf>,
    },

    /// Apply a whitelist to a JSON payload.
    Filter {
        /// Whitelist as JSON, e.g. `["name", {"posts": ["title"]}]`.
        #[arg(short, long)]
        whitelist: String,

        /// JSON file to filter (stdin when omitted).
        #[arg(long)]
        input: Option<PathBuf>,
    },

    /// List rules per operation in evaluation order.
    Rules {
        /// Rule file (defaults to `rules.path` from the configuration).
        #[arg(short, long)]
        rules: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    // Initialize logging; stdout is reserved for JSON output
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let project_dir = cli.project_dir.as_deref();

    match cli.command {
        Commands::Version => {
            commands::version::run();
            Ok(())
        }
        Commands::Check {
            rules,
            operation,
            kind,
            identity,
            result,
        } => commands::check::run(
            project_dir,
            rules.as_deref(),
            &operation,
            kind.as_deref(),
            identity.as_deref(),
            result.as_deref(),
        ),
        Commands::Filter { whitelist, input } => {
            commands::filter::run(project_dir, &whitelist, input.as_deref())
        }
        Commands::Rules { rules } => commands::rules::run(project_dir, rules.as_deref()),
    }
}
