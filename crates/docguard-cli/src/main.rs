//! docguard CLI.
//!
//! Evaluates `@auth-*` declarations against caller attributes without
//! writing any host code.
//!
//! # Quick Start
//!
//! ```bash
//! # Would an admin be allowed into Billing::refund?
//! docguard check Billing --member refund --attr groups=admin
//!
//! # Show the rules that apply to a member
//! docguard rules Billing --member refund
//!
//! # Show the resolved configuration
//! docguard config
//!
//! # Drop persisted rules
//! docguard cache clear
//! ```
//!
//! Exit codes: 0 allow, 1 deny, 2 error.

mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

/// docguard - annotation-driven access control.
#[derive(Parser)]
#[command(name = "docguard")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Project directory holding docguard.toml.
    #[arg(short, long, global = true)]
    project: Option<PathBuf>,

    /// Declaration file (overrides `[declarations] path`).
    #[arg(short, long, global = true)]
    decl: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decide whether a caller may use a unit or member.
    Check {
        /// Unit name.
        unit: String,

        /// Member name. Omit to check the unit itself.
        #[arg(short, long)]
        member: Option<String>,

        /// Caller attribute as group=v1,v2. Repeatable.
        #[arg(short, long = "attr", value_name = "GROUP=VALUES")]
        attrs: Vec<String>,

        /// Default mode for rule sets that declare none (and, or, none).
        #[arg(long)]
        mode: Option<String>,

        /// Print the decision as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print the effective rules for a unit or member as JSON.
    Rules {
        /// Unit name.
        unit: String,

        /// Member name.
        #[arg(short, long)]
        member: Option<String>,
    },

    /// Print the resolved configuration as TOML.
    Config,

    /// Manage the persisted rule cache.
    Cache {
        #[command(subcommand)]
        command: CacheCommands,
    },
}

#[derive(Subcommand)]
enum CacheCommands {
    /// Empty the file cache so rules are extracted again.
    Clear,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(commands::EXIT_FATAL)
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let config = commands::load_config(cli.project.as_deref())?;
    init_logging(&config.logging.level);

    match cli.command {
        Commands::Check {
            unit,
            member,
            attrs,
            mode,
            json,
        } => commands::check::run(
            &config,
            cli.decl.as_deref(),
            &unit,
            member.as_deref(),
            &attrs,
            mode.as_deref(),
            json,
        ),
        Commands::Rules { unit, member } => {
            commands::rules::run(&config, cli.decl.as_deref(), &unit, member.as_deref())?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Config => {
            commands::config::run(&config)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Cache {
            command: CacheCommands::Clear,
        } => {
            commands::cache::clear(&config)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// RUST_LOG wins over `[logging] level`. Logs go to stderr so stdout stays
/// machine-readable.
fn init_logging(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
