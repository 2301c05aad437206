//! # Error Handling for DataTables endpoints
//!
//! Only two conditions abort a DataTables request:
//! - one of the two count queries fails, so `recordsTotal`/`recordsFiltered` are unknown
//! - the client asks to sort on a column index the endpoint does not have
//!
//! Everything else (a failing page query, an undecodable row, a malformed number in the
//! request) is recovered where it happens so the widget still receives a reply.
//!
//! Internal details are logged with `tracing` when the error is turned into a response and
//! never sent to the client:
//!
//! ```rust,ignore
//! tracing_subscriber::fmt()
//!     .with_target(false)
//!     .compact()
//!     .init();
//! ```

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::DbErr;
use serde::Serialize;
use std::fmt;

/// The statement a database error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStage {
    TotalCount,
    FilteredCount,
    Page,
}

impl fmt::Display for QueryStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TotalCount => f.write_str("total count"),
            Self::FilteredCount => f.write_str("filtered count"),
            Self::Page => f.write_str("page"),
        }
    }
}

/// API error type with automatic logging and sanitized responses
#[derive(Debug)]
pub enum ApiError {
    /// 400 Bad Request - The request could not be read at all
    BadRequest {
        /// User-facing error message
        message: String,
    },

    /// 400 Bad Request - `order[0][column]` points past the last column
    OrderColumnOutOfRange {
        /// Index requested by the client
        index: usize,
        /// Number of columns the endpoint serves
        columns: usize,
    },

    /// 500 Internal Server Error - The endpoint itself is misconfigured
    InvalidConfiguration {
        /// Description of the problem (logged, not sent to user)
        internal: String,
    },

    /// 500 Internal Server Error - Database error (details logged, not exposed)
    Database {
        /// Statement that failed, when known
        stage: Option<QueryStage>,
        /// Internal error (logged, not sent to user)
        internal: DbErr,
    },
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    #[must_use]
    pub const fn order_column_out_of_range(index: usize, columns: usize) -> Self {
        Self::OrderColumnOutOfRange { index, columns }
    }

    pub fn invalid_configuration(internal: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            internal: internal.into(),
        }
    }

    /// Wrap a database error raised while running `stage`.
    #[must_use]
    pub fn query_failed(stage: QueryStage, err: DbErr) -> Self {
        Self::Database {
            stage: Some(stage),
            internal: err,
        }
    }

    /// Get the HTTP status code for this error
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest { .. } | Self::OrderColumnOutOfRange { .. } => {
                StatusCode::BAD_REQUEST
            }
            Self::InvalidConfiguration { .. } | Self::Database { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Get the user-facing error message (sanitized)
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::BadRequest { message } => message.clone(),
            Self::OrderColumnOutOfRange { index, columns } => {
                format!("Order column {index} is out of range for {columns} columns")
            }
            Self::InvalidConfiguration { .. } => "The table endpoint is misconfigured".to_string(),
            Self::Database { .. } => "A database error occurred".to_string(),
        }
    }

    fn log_internal(&self) {
        match self {
            Self::Database {
                stage: Some(stage),
                internal,
            } => {
                tracing::error!(stage = %stage, error = ?internal, "Database error occurred");
            }
            Self::Database {
                stage: None,
                internal,
            } => {
                tracing::error!(error = ?internal, "Database error occurred");
            }
            Self::InvalidConfiguration { internal } => {
                tracing::error!(details = %internal, "DataTables endpoint misconfigured");
            }
            _ => {
                tracing::debug!(
                    error = %self.user_message(),
                    status = %self.status_code(),
                    "API error"
                );
            }
        }
    }
}

/// Error response sent to users (sanitized)
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.log_internal();

        let status = self.status_code();
        let response = ErrorResponse {
            error: self.user_message(),
        };

        (status, Json(response)).into_response()
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.user_message())
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Database { internal, .. } => Some(internal),
            _ => None,
        }
    }
}

impl From<DbErr> for ApiError {
    fn from(err: DbErr) -> Self {
        Self::Database {
            stage: None,
            internal: err,
        }
    }
}
