//! `tasklist` development backend.
//!
//! An axum server that stands in for the hosted row store during local
//! development and tests. Rows live in memory and vanish on exit.
//!
//! # Usage
//!
//! ```bash
//! # Run on default address 127.0.0.1:54321 with key `local-dev-key`
//! cargo run --bin tasklist-backend
//!
//! # Custom address and key
//! cargo run --bin tasklist-backend -- --bind 0.0.0.0:8080 --api-key s3cret
//!
//! # Or via environment variables
//! TASKLIST_BACKEND_ADDR=0.0.0.0:8080 TASKLIST_BACKEND_KEY=s3cret cargo run --bin tasklist-backend
//! ```

use std::sync::Arc;

use clap::Parser;
use tasklist_backend::config::{BackendCliArgs, BackendConfig};
use tasklist_backend::server::{self, BackendState};

#[tokio::main]
async fn main() {
    let cli = BackendCliArgs::parse();

    let config = match BackendConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            std::process::exit(1);
        }
    };

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    tracing::info!(addr = %config.bind_addr, table = %config.table, "starting tasklist backend");

    let state = Arc::new(BackendState::with_table(&config.table, &config.api_key));

    match server::start_server(&config.bind_addr, state).await {
        Ok((bound_addr, handle)) => {
            tracing::info!(addr = %bound_addr, "backend listening");
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "backend server task failed");
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to start backend");
            std::process::exit(1);
        }
    }
}
