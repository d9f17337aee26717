//! Implements a struct that holds the state of the REST server.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use jsonwebtoken::{DecodingKey, EncodingKey};
use rusqlite::Connection;

use crate::{db::initialize, Error};

/// The default Google Gemini endpoint the advisor relay talks to.
pub const DEFAULT_ADVISOR_ENDPOINT: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent";

/// How long the mocked mobile-money network "takes" to confirm a payment.
pub const DEFAULT_PAYMENT_DELAY: Duration = Duration::from_millis(1500);

#[derive(Clone)]
struct JwtKeys {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

/// Settings for the external generative-text advisor.
#[derive(Clone)]
pub struct AdvisorSettings {
    /// The `generateContent` endpoint to POST prompts to.
    pub endpoint: String,
    /// The API key, or `None` when the advisor is not configured.
    pub api_key: Option<String>,
}

/// The state of the REST server.
///
/// Explicitly constructed once at start-up and handed to every handler via
/// axum's `State` extractor; there is no process-wide singleton.
#[derive(Clone)]
pub struct AppState {
    db_connection: Arc<Mutex<Connection>>,
    jwt_keys: JwtKeys,
    payment_delay: Duration,
    advisor: AdvisorSettings,
    http_client: reqwest::Client,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function runs the schema migrations, so the connection is ready
    /// for use when it returns.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be migrated to the current
    /// schema version.
    pub fn new(
        db_connection: Connection,
        jwt_secret: &str,
        payment_delay: Duration,
        advisor: AdvisorSettings,
    ) -> Result<Self, Error> {
        initialize(&db_connection)?;

        Ok(Self {
            db_connection: Arc::new(Mutex::new(db_connection)),
            jwt_keys: JwtKeys {
                encoding_key: EncodingKey::from_secret(jwt_secret.as_ref()),
                decoding_key: DecodingKey::from_secret(jwt_secret.as_ref()),
            },
            payment_delay,
            advisor,
            http_client: reqwest::Client::new(),
        })
    }

    /// The mutex guarding the SQLite connection.
    pub fn db_connection(&self) -> &Mutex<Connection> {
        &self.db_connection
    }

    /// The encoding key for bearer tokens.
    pub fn encoding_key(&self) -> &EncodingKey {
        &self.jwt_keys.encoding_key
    }

    /// The decoding key for bearer tokens.
    pub fn decoding_key(&self) -> &DecodingKey {
        &self.jwt_keys.decoding_key
    }

    /// The simulated network latency for the mocked payment provider.
    pub fn payment_delay(&self) -> Duration {
        self.payment_delay
    }

    /// The external advisor settings.
    pub fn advisor(&self) -> &AdvisorSettings {
        &self.advisor
    }

    /// The shared HTTP client for outbound calls.
    pub fn http_client(&self) -> &reqwest::Client {
        &self.http_client
    }
}
