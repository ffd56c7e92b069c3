//! # Tessera - Dashboard Filter Server
//!
//! The main binary for the Tessera filter engine.
//!
//! This application provides:
//! - HTTP REST API server (axum-based) over one dashboard session
//! - CLI interface for filtering and filter state
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │               apps/tessera (THE BINARY)              │
//! │                                                      │
//! │   ┌─────────────┐   ┌─────────────┐   ┌──────────┐   │
//! │   │    CLI      │   │  HTTP API   │   │  config  │   │
//! │   │   (clap)    │   │   (axum)    │   │  (toml)  │   │
//! │   └──────┬──────┘   └──────┬──────┘   └────┬─────┘   │
//! │          └─────────────────┼───────────────┘         │
//! │                            ▼                         │
//! │                   ┌────────────────┐                 │
//! │                   │  tessera-core  │                 │
//! │                   │  (THE ENGINE)  │                 │
//! │                   └────────────────┘                 │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Start the HTTP server
//! tessera --dashboard dashboard.json server --port 8080
//!
//! # CLI operations
//! tessera -d dashboard.json set region north,south
//! tessera -d dashboard.json filter --trace
//! tessera -d dashboard.json encode
//! ```

use clap::Parser;
use tessera::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // TESSERA_LOG_FORMAT=json switches to machine-parseable output.
    let log_format = std::env::var("TESSERA_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "tessera=info,tessera_core=info,tower_http=debug".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    let cli = cli::Cli::parse();

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the Tessera startup banner.
fn print_banner() {
    println!(
        r#"
  ╔╦╗╔═╗╔═╗╔═╗╔═╗╦═╗╔═╗
   ║ ║╣ ╚═╗╚═╗║╣ ╠╦╝╠═╣
   ╩ ╚═╝╚═╝╚═╝╚═╝╩╚═╩ ╩

  Dashboard Filter Engine v{}
"#,
        env!("CARGO_PKG_VERSION")
    );
}
