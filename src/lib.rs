//! tbc: root directory manager for a Third Brain Companion.
//!
//! A root holds three collections of records on disk:
//!
//! - `tbc/`: system records (`root.md`, id markers) and template assets
//!   (`specs/`, `tools/`, `extensions/`)
//! - `vault/`: user records
//! - `dex/`: generated indexes
//!
//! # Crate Structure
//!
//! - [`core`]: record store, index generation, root lifecycle
//! - [`plugins`]: agent interface generators (Kilo Code, Copilot, Goose)
//!
//! # Examples
//!
//! ```bash
//! # Create a companion in the current directory
//! tbc init --companion "Nova" --prime "Kim"
//!
//! # Refresh indexes
//! tbc dex core
//! tbc dex records
//!
//! # Upgrade template assets, keeping root.md and extensions
//! tbc init --upgrade
//! ```

pub mod core;
pub mod plugins;

use crate::core::{
    config, error,
    lifecycle::{Identity, Lifecycle},
    probe, refresh, report, time, validate,
};
use crate::plugins::AgentInterface;

use clap::{Parser, Subcommand, ValueEnum};
use env_logger::Env;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(
    name = "tbc",
    version = env!("CARGO_PKG_VERSION"),
    about = "Third Brain Companion root manager"
)]
struct Cli {
    /// Root directory (defaults to the current working directory).
    #[clap(long, global = true)]
    root: Option<PathBuf>,
    /// Debug logging for this crate. `RUST_LOG` takes precedence.
    #[clap(short, long, global = true)]
    verbose: bool,
    /// Configuration file (defaults to `<root>/tbc.toml` when present).
    #[clap(long, global = true)]
    config: Option<PathBuf>,
    #[clap(subcommand)]
    command: Command,
}

#[derive(clap::Args, Debug)]
struct InitCli {
    /// Upgrade an existing companion: refresh assets, keep root.md and extensions.
    #[clap(long)]
    upgrade: bool,
    /// Name of the companion agent.
    #[clap(long, requires = "prime")]
    companion: Option<String>,
    /// Name of the prime user.
    #[clap(long, requires = "companion")]
    prime: Option<String>,
}

#[derive(Subcommand, Debug)]
enum DexCommand {
    /// Root, specs and extensions into dex/core.md
    Core,
    /// Vault records grouped by record_type into dex/<type>.md
    Records,
    /// Extension records into dex/extensions.md
    Extensions,
}

#[derive(Subcommand, Debug)]
enum GenCommand {
    /// Time-ordered UUIDs (v7)
    Uuid {
        #[clap(short, long, default_value_t = 1)]
        count: usize,
    },
    /// UTC YYYYMMDDHHmmss ids, one second apart
    Tsid {
        #[clap(short, long, default_value_t = 1)]
        count: usize,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum InterfaceTarget {
    Core,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check the root directory structure
    Validate,
    /// Print environment and root information
    Probe,
    /// Create a companion or upgrade an existing one
    Init(InitCli),
    /// Regenerate index records
    #[clap(subcommand)]
    Dex(DexCommand),
    /// Generate identifiers
    #[clap(subcommand)]
    Gen(GenCommand),
    /// Generate agent interface files
    Int {
        #[clap(value_enum)]
        interface: AgentInterface,
        #[clap(value_enum)]
        target: InterfaceTarget,
    },
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "warn,tbc=debug" } else { "warn" };
    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or(default_filter));
    builder.format_timestamp(None);
    let _ = builder.try_init();
}

fn print_refresh(title: &str, outcome: &refresh::RefreshReport) {
    log::debug!("{}: {} records fetched", title, outcome.fetched);
    report::print_failures(&outcome.fetch_failures);
    report::print_store_outcome(title, validate::DEX_DIR, &outcome.stored);
}

pub fn run() -> Result<(), error::TbcError> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let root = match cli.root {
        Some(root) => root,
        None => std::env::current_dir()?,
    };
    log::debug!("root directory: {}", root.display());

    match cli.command {
        Command::Validate => {
            let validation = validate::validate_root(&root);
            report::print_validation(&validation);
        }
        Command::Probe => {
            report::print_info_box("TBC PROBE", "");
            report::print_plain(&probe::probe(&root));
        }
        Command::Gen(GenCommand::Uuid { count }) => {
            report::print_plain(&time::generate_uuids(count));
        }
        Command::Gen(GenCommand::Tsid { count }) => {
            report::print_plain(&time::generate_tsids(count));
        }
        Command::Init(init) => {
            let config = config::load_config(&root, cli.config.as_deref())?;
            let identity = match (init.companion, init.prime) {
                (Some(companion), Some(prime)) => Some(Identity::new(companion, prime)),
                _ => None,
            };
            let outcome = Lifecycle::new(&root, &config).run(init.upgrade, identity.as_ref())?;
            report::print_init_report(&outcome);
        }
        Command::Dex(dex) => {
            let config = config::load_config(&root, cli.config.as_deref())?;
            match dex {
                DexCommand::Core => print_refresh("Core index", &refresh::refresh_core(&root, &config)?),
                DexCommand::Records => {
                    print_refresh("Record indexes", &refresh::refresh_records(&root, &config)?)
                }
                DexCommand::Extensions => print_refresh(
                    "Extensions index",
                    &refresh::refresh_extensions(&root, &config)?,
                ),
            }
        }
        Command::Int { interface, target } => {
            let config = config::load_config(&root, cli.config.as_deref())?;
            match target {
                InterfaceTarget::Core => {
                    let outcome = plugins::generate(&root, &config, interface)?;
                    report::print_store_outcome("Interface", plugins::ROOT_LEVEL, &outcome);
                }
            }
        }
    }

    Ok(())
}
