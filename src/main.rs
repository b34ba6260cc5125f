//! doxidx - query tool for generated documentation search indexes
//!
//! Loads the search-index tables a documentation generator emits
//! (Doxygen-style `search/*.js` shards or a JSON export) and serves
//! lookups, validation, statistics, and format conversion over them.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

mod cli;
mod config;
mod index;

use cli::convert::Format;
use index::query::MatchMode;

/// doxidx - search a generated documentation index
#[derive(Parser)]
#[command(name = "doxidx")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Query tool for generated documentation search indexes", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search the index for a symbol
    Search {
        /// Search query (an empty string lists every entry)
        query: String,

        /// Index file or generated search/ directory
        index: Option<String>,

        /// Maximum results
        #[arg(short, long)]
        limit: Option<usize>,

        /// Match mode
        #[arg(short, long, value_enum)]
        mode: Option<MatchMode>,

        /// Match case-sensitively
        #[arg(long)]
        case_sensitive: bool,
    },

    /// Show index statistics
    Info {
        /// Index file or generated search/ directory
        index: Option<String>,
    },

    /// Check generation-time invariants of an index
    Validate {
        /// Index file or generated search/ directory
        index: Option<String>,
    },

    /// Re-serialize an index to another format
    Convert {
        /// Index file or generated search/ directory
        index: String,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "json")]
        format: Format,
    },

    /// Show configuration
    Config {
        /// Show current configuration (the default action)
        #[arg(long)]
        show: bool,

        /// Initialize configuration file
        #[arg(long)]
        init: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Load configuration
    let config = config::load_config(cli.config.as_deref())?;

    info!("doxidx v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Search {
            query,
            index,
            limit,
            mode,
            case_sensitive,
        } => {
            let mut policy = config.search.policy();
            if let Some(mode) = mode {
                policy.mode = mode;
            }
            if case_sensitive {
                policy.case_sensitive = true;
            }
            let limit = limit.unwrap_or(config.search.limit);
            let path = resolve_index(&config, index.as_deref());
            cli::search::run(&path, &query, &policy, limit)?;
        }
        Commands::Info { index } => {
            let path = resolve_index(&config, index.as_deref());
            cli::info::run(&path)?;
        }
        Commands::Validate { index } => {
            let path = resolve_index(&config, index.as_deref());
            let clean = cli::validate::run(&path)?;
            if !clean {
                std::process::exit(1);
            }
        }
        Commands::Convert {
            index,
            output,
            format,
        } => {
            cli::convert::run(
                &PathBuf::from(index),
                output.as_deref().map(std::path::Path::new),
                format,
            )?;
        }
        Commands::Config { show: _, init } => {
            if init {
                config::init_config()?;
            } else {
                config::show_config(&config)?;
            }
        }
    }

    Ok(())
}

/// Index path from the command line, falling back to the configured default.
fn resolve_index(config: &config::Config, arg: Option<&str>) -> PathBuf {
    PathBuf::from(arg.unwrap_or(&config.index.default_path))
}
