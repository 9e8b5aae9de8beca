//! Outlay is a web service for tracking personal expenses.
//!
//! This library provides a JSON REST API: an OAuth/OpenID session layer for
//! establishing who the caller is, and an owner-scoped expense ledger with
//! search, reports and CSV export. Rendering is left entirely to the client.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use tokio::signal;

mod app_state;
mod auth;
mod db;
mod endpoints;
mod expense;
mod logging;
mod report;
mod routing;

pub use app_state::{AppState, create_cookie_key};
pub use auth::{Identity, OAuthProvider, TokenVerifier};
pub use db::initialize as initialize_db;
pub use logging::logging_middleware;
pub use routing::build_router;

/// An async task that waits for either the ctrl+c or terminate signal,
/// whichever comes first, and then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
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
    /// An expense amount of zero or less was supplied on create or update.
    ///
    /// Amounts are rejected before anything is written, so the ledger is
    /// unchanged when this error is returned.
    #[error("the expense amount must be greater than zero")]
    NonPositiveAmount,

    /// The requested resource could not be found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// Tried to update an expense that does not exist or belongs to someone
    /// else. The two cases are deliberately indistinguishable to the caller.
    #[error("tried to update an expense that is not in the ledger")]
    UpdateMissingExpense,

    /// The identity token failed verification (bad signature, wrong audience,
    /// expired, unknown signing key).
    ///
    /// The reason string is for the server logs; clients only see a generic
    /// authentication failure.
    #[error("identity token rejected: {0}")]
    TokenRejected(String),

    /// The authorization-code exchange with the identity provider failed
    /// (invalid or replayed code, network error, provider error response).
    #[error("authorization code exchange failed: {0}")]
    ExchangeFailed(String),

    /// The OAuth callback was requested without an authorization code.
    #[error("the callback request did not carry an authorization code")]
    MissingAuthCode,

    /// The session cookie is missing from the request.
    #[error("no session cookie in the request")]
    CookieMissing,

    /// Could not acquire the database lock.
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// An error occurred while serializing expenses as CSV.
    #[error("could not serialize expenses as CSV: {0}")]
    CsvError(String),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Error::NonPositiveAmount => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "Amount must be greater than zero".to_owned(),
            ),
            Error::NotFound | Error::UpdateMissingExpense => (
                StatusCode::NOT_FOUND,
                "The expense could not be found".to_owned(),
            ),
            Error::MissingAuthCode => (
                StatusCode::BAD_REQUEST,
                "The callback request did not carry an authorization code".to_owned(),
            ),
            Error::TokenRejected(_) | Error::CookieMissing => {
                (StatusCode::UNAUTHORIZED, "Not signed in".to_owned())
            }
            Error::ExchangeFailed(_) => (
                StatusCode::BAD_GATEWAY,
                "Could not reach the identity provider".to_owned(),
            ),
            // Any errors that are not handled above are not intended to be
            // shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An unexpected error occurred, check the server logs for more details"
                        .to_owned(),
                )
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
