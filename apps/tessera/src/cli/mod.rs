//! # Tessera CLI Module
//!
//! Command-line access to one dashboard's filter state.
//!
//! ## Available Commands
//!
//! - `server` - Start the HTTP server
//! - `filter` - List the components visible under the current filters
//! - `classify` - Show the detected role of every component
//! - `state` - Show the active filters
//! - `set` - Set a filter value
//! - `reset` - Return one filter to its default
//! - `clear` - Clear one filter bar, or every filter
//! - `encode` - Print the query string for the current state

mod commands;

use crate::config::{AppConfig, StorageBackend};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tessera_core::TesseraError;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Tessera - dashboard filter engine
///
/// Applies a dashboard's filter bars to its components and keeps the
/// filter state persisted between runs.
#[derive(Parser, Debug)]
#[command(name = "tessera")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the configuration file (default: ./tessera.toml if present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the dashboard JSON file
    #[arg(short, long, global = true)]
    pub dashboard: Option<PathBuf>,

    /// Path to the filter state database
    #[arg(short = 'S', long, global = true)]
    pub storage: Option<PathBuf>,

    /// Storage backend: "redb" (persistent) or "memory"
    #[arg(short = 'B', long, global = true)]
    pub backend: Option<String>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP server
    Server {
        /// Host to bind to (overrides config)
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// List visible components
    Filter {
        /// Query string applied on top of the stored state, e.g. "region=north"
        #[arg(short = 'u', long)]
        query: Option<String>,

        /// Also show which filter excluded each hidden component
        #[arg(short, long)]
        trace: bool,
    },

    /// Show component roles
    Classify,

    /// Show active filters
    State,

    /// Set a filter value
    Set {
        /// Filter id
        id: String,

        /// Value in query-string form ("north,south", "100,150", "true")
        /// or as JSON ('["north"]', '[100,150]')
        value: String,
    },

    /// Return a filter to its default
    Reset {
        /// Filter id
        id: String,
    },

    /// Clear a filter bar, or every filter when no bar is given
    Clear {
        /// Filter bar id
        #[arg(short, long)]
        bar: Option<String>,
    },

    /// Print the query string for the current state
    Encode,
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

impl Cli {
    /// Resolve configuration: file, then environment, then flags.
    pub fn resolve_config(&self) -> Result<AppConfig, TesseraError> {
        let mut config = AppConfig::load(self.config.as_deref())?;
        if let Some(dashboard) = &self.dashboard {
            config.dashboard = Some(dashboard.clone());
        }
        if let Some(storage) = &self.storage {
            config.storage.path = storage.clone();
        }
        if let Some(backend) = &self.backend {
            config.storage.backend = StorageBackend::parse(backend)?;
        }
        Ok(config)
    }
}

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), TesseraError> {
    let config = cli.resolve_config()?;
    let json_mode = cli.json_mode;
    let verbose = cli.verbose;

    match cli.command {
        Some(Commands::Server { host, port }) => cmd_server(config, host, port).await,
        Some(Commands::Filter { query, trace }) => {
            cmd_filter(&config, json_mode, verbose, query.as_deref(), trace)
        }
        Some(Commands::Classify) => cmd_classify(&config, json_mode),
        Some(Commands::Set { id, value }) => cmd_set(&config, json_mode, &id, &value),
        Some(Commands::Reset { id }) => cmd_reset(&config, json_mode, &id),
        Some(Commands::Clear { bar }) => cmd_clear(&config, json_mode, bar.as_deref()),
        Some(Commands::Encode) => cmd_encode(&config, json_mode),
        Some(Commands::State) | None => cmd_state(&config, json_mode, verbose),
    }
}
