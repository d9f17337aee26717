//! Command line and environment configuration for the server binary.

use std::path::PathBuf;

use clap::Parser;

use crate::state::DEFAULT_ADVISOR_ENDPOINT;

/// The command line arguments for the server.
#[derive(Parser, Debug)]
#[command(version, about = "The Santim Sentry personal-finance API server.")]
pub struct ServerConfig {
    /// The port to listen on.
    #[arg(long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// The path to the SQLite database file. The file is created and
    /// migrated on first start.
    #[arg(long, env = "DATABASE_PATH", default_value = "santim_sentry.db")]
    pub database_path: PathBuf,

    /// The secret used to sign and verify bearer tokens.
    #[arg(long, env = "JWT_SECRET")]
    pub jwt_secret: String,

    /// The API key for the generative-text advisor. Tips are unavailable
    /// when unset.
    #[arg(long, env = "ADVISOR_API_KEY")]
    pub advisor_api_key: Option<String>,

    /// The generateContent endpoint the advisor relay talks to.
    #[arg(long, env = "ADVISOR_ENDPOINT", default_value = DEFAULT_ADVISOR_ENDPOINT)]
    pub advisor_endpoint: String,

    /// How many milliseconds the mocked mobile-money provider waits before
    /// confirming a payment.
    #[arg(long, env = "PAYMENT_DELAY_MS", default_value_t = 1500)]
    pub payment_delay_ms: u64,
}
