//! Santim Sentry is a personal-finance tracking service.
//!
//! This library provides a JSON REST API for user registration and login,
//! per-user transaction CRUD with category-based summaries, an append-only
//! notification log, a mocked mobile-money wallet, and financial tips
//! relayed from an external generative-text API.

#![warn(missing_docs)]

use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use axum_server::Handle;
use serde_json::json;
use tokio::signal;

pub mod auth;
pub mod config;
pub mod db;
pub mod models;
pub mod routes;
mod state;

#[cfg(test)]
mod test_utils;

pub use routes::build_router;
pub use state::{AdvisorSettings, AppState};

/// An async task that waits for either the ctrl+c or terminate signal,
/// whichever comes first, and then signals the server to shut down
/// gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The email or password used to log in did not match a registered
    /// user. The two cases are deliberately indistinguishable.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// The request carried no usable credential, an invalid or expired
    /// token, or a token for a user that no longer exists.
    #[error("missing or invalid credentials")]
    Unauthorized,

    /// The email address is already registered to another account.
    #[error("the email address is already in use")]
    DuplicateEmail,

    /// A request carried a malformed or missing field. The message names
    /// the offending field.
    #[error("{0}")]
    InvalidInput(String),

    /// A transaction amount was zero, negative or not a number.
    #[error("the amount must be a positive number")]
    InvalidAmount,

    /// The category ID used to create or update a transaction did not
    /// match a category in the catalog.
    #[error("the category ID does not refer to a valid category")]
    InvalidCategory,

    /// The requested resource was not found.
    ///
    /// Also returned when the resource exists but belongs to another user,
    /// so that callers cannot probe for other users' data.
    #[error("the requested resource could not be found")]
    NotFound,

    /// The wallet balance does not cover the attempted charge. Nothing was
    /// debited.
    #[error("insufficient wallet balance")]
    InsufficientFunds,

    /// The generative-text advisor has no API key configured.
    #[error("the advisor service is not configured")]
    AdvisorNotConfigured,

    /// The generative-text advisor could not be reached or returned an
    /// unusable reply. The call is never retried.
    #[error("the advisor service is currently unavailable")]
    AdvisorUnavailable,

    /// An unexpected error occurred with the password hashing library.
    ///
    /// The error string should only be logged on the server, never sent to
    /// the client.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// A bearer token could not be created.
    #[error("token creation failed")]
    TokenCreation,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 787 occurs when a FOREIGN KEY constraint failed. The
            // only client-controlled foreign key is the category id.
            rusqlite::Error::SqliteFailure(sql_error, Some(_))
                if sql_error.extended_code == 787 =>
            {
                Error::InvalidCategory
            }
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.contains("email") =>
            {
                Error::DuplicateEmail
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => Error::SqlError(error),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            Error::InvalidCredentials => (StatusCode::BAD_REQUEST, self.to_string()),
            Error::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            Error::DuplicateEmail => (StatusCode::CONFLICT, self.to_string()),
            Error::InvalidInput(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            Error::InvalidAmount | Error::InvalidCategory => {
                (StatusCode::UNPROCESSABLE_ENTITY, self.to_string())
            }
            Error::NotFound => (StatusCode::NOT_FOUND, self.to_string()),
            Error::InsufficientFunds => (StatusCode::PAYMENT_REQUIRED, self.to_string()),
            Error::AdvisorNotConfigured => (StatusCode::SERVICE_UNAVAILABLE, self.to_string()),
            Error::AdvisorUnavailable => (StatusCode::BAD_GATEWAY, self.to_string()),
            // Internal failures are logged server-side and surfaced as a
            // generic message without leaking details.
            Error::HashingError(_) | Error::TokenCreation | Error::SqlError(_) => {
                tracing::error!("An unexpected error occurred: {self}");

                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}
