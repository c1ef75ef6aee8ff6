//! A personal finance tracker backend.
//!
//! This library provides a JSON API over a user's income and expense records
//! and exports them as a PDF report. The report is rendered in parallel: the
//! records are split into fixed-size batches, each batch is rendered to its own
//! PDF fragment on the blocking thread pool, and the fragments are merged back
//! together in a deterministic order.

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
mod config;
mod db;
mod endpoints;
mod logging;
mod record;
mod report;
mod routing;
mod summary;
mod timezone;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use auth::{
    AuthError, COOKIE_TOKEN, DEFAULT_COOKIE_DURATION, UserID, auth_guard, set_auth_cookie,
};
pub use config::{DEFAULT_PAGE_SIZE, ReportConfig};
pub use db::initialize as initialize_db;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use record::{
    NewRecord, Record, RecordDetail, RecordKind, RecordStore, SqliteRecordStore, insert_record,
};
pub use report::{Batch, FragmentId, REPORT_FILE_NAME, generate_report, plan_batches};
pub use routing::build_router;
pub use summary::Summary;
pub use timezone::require_timezone;

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
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
    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// A record is missing the field used to label it in the report, i.e. the
    /// source of an income or the category of an expense.
    ///
    /// Rendering a blank label would silently hide bad data, so the batch
    /// containing the record fails instead.
    #[error("{kind} record {record_id} has no {}", .kind.label_field())]
    MissingLabel {
        /// The kind of the malformed record.
        kind: RecordKind,
        /// The database ID of the malformed record.
        record_id: i64,
    },

    /// A PDF fragment could not be encoded.
    #[error("could not render PDF: {0}")]
    RenderError(String),

    /// The PDF fragments could not be merged into the final document.
    #[error("could not assemble the report: {0}")]
    AssemblyError(String),

    /// Reading or writing the temporary files of an export failed.
    #[error("work area I/O failed: {0}")]
    WorkAreaError(String),

    /// A rendering task panicked or was cancelled before it reported back.
    #[error("a report task did not complete: {0}")]
    TaskError(String),

    /// The export did not finish within the configured time limit.
    #[error("the export did not finish within {0:?}")]
    ExportTimeout(Duration),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        tracing::error!("an unhandled SQL error occurred: {}", value);
        Error::SqlError(value)
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Error::WorkAreaError(value.to_string())
    }
}

impl Error {
    /// A short, client-safe name for the kind of failure.
    ///
    /// Internal details such as SQL messages or file paths stay in the server
    /// logs; clients only see which stage of the request failed.
    pub fn category(&self) -> &'static str {
        match self {
            Error::SqlError(_) | Error::DatabaseLockError => "record read failure",
            Error::MissingLabel { .. } | Error::RenderError(_) => "render failure",
            Error::AssemblyError(_) => "assembly failure",
            Error::WorkAreaError(_) | Error::TaskError(_) => "internal failure",
            Error::ExportTimeout(_) => "timeout",
            Error::InvalidTimezoneError(_) => "invalid timezone settings",
        }
    }

    /// Convert the error into a JSON response of the form `{message, error}`.
    ///
    /// `message` should describe what the client was trying to do, e.g.
    /// "Something went wrong while generating PDF". Every error is a failure
    /// of the server, so the status is always 500.
    pub(crate) fn into_json_response(self, message: &str) -> Response {
        tracing::error!("{message}: {self}");

        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "message": message,
                "error": self.category(),
            })),
        )
            .into_response()
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        self.into_json_response("Something went wrong")
    }
}

#[cfg(test)]
mod error_tests {
    use axum::{http::StatusCode, response::IntoResponse};

    use crate::{Error, RecordKind};

    #[test]
    fn missing_label_names_the_field() {
        let error = Error::MissingLabel {
            kind: RecordKind::Expense,
            record_id: 7,
        };

        assert_eq!(error.to_string(), "expense record 7 has no category");
        assert_eq!(error.category(), "render failure");
    }

    #[test]
    fn internal_errors_map_to_500() {
        let response = Error::AssemblyError("bad xref".to_owned()).into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn no_rows_is_a_read_failure() {
        let error: Error = rusqlite::Error::QueryReturnedNoRows.into();

        assert_eq!(error, Error::SqlError(rusqlite::Error::QueryReturnedNoRows));
        assert_eq!(error.category(), "record read failure");
        assert_eq!(
            error.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
