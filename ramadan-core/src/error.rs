//! Classified failures of the calendar relay.
//!
//! Every variant maps to a fixed HTTP status, machine-readable code and
//! caller-facing message. Underlying reqwest/serde details are logged but
//! never sent back to the caller.

use axum::{
    Json,
    extract::rejection::QueryRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error body returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub detail: String,
}

#[derive(Debug, Error)]
pub enum RelayError {
    /// `lat`/`lon` missing or not decodable from the query string.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// No provider API key was configured at startup.
    #[error("API key not setup")]
    MissingApiKey,

    /// Provider answered, but its `status` field was not "success".
    #[error("Failed to get Ramadan data (provider status: {status:?})")]
    UpstreamStatus { status: Option<String> },

    #[error("Ramadan data provider timed out")]
    Timeout,

    #[error("Could not reach Ramadan data provider: {0}")]
    Network(#[source] reqwest::Error),

    /// Non-2xx answer whose body was not JSON.
    #[error("Ramadan data provider returned HTTP {status}")]
    UpstreamHttp { status: u16 },

    #[error("Ramadan data provider returned malformed JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// Status was "success" but the payload did not have the expected shape.
    #[error("Ramadan data provider returned unexpected data: {0}")]
    Schema(String),
}

impl RelayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidQuery(_) => StatusCode::BAD_REQUEST,
            Self::MissingApiKey => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Timeout => StatusCode::GATEWAY_TIMEOUT,
            Self::UpstreamStatus { .. }
            | Self::Network(_)
            | Self::UpstreamHttp { .. }
            | Self::Parse(_)
            | Self::Schema(_) => StatusCode::BAD_GATEWAY,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidQuery(_) => "invalid_query",
            Self::MissingApiKey => "configuration_error",
            Self::UpstreamStatus { .. } => "upstream_failure",
            Self::Timeout => "upstream_timeout",
            Self::Network(_) => "upstream_unreachable",
            Self::UpstreamHttp { .. } => "upstream_http_error",
            Self::Parse(_) => "upstream_malformed",
            Self::Schema(_) => "upstream_schema",
        }
    }

    /// Fixed message shown to callers.
    pub fn public_message(&self) -> &'static str {
        match self {
            Self::InvalidQuery(_) => "Query parameters `lat` and `lon` are required",
            Self::MissingApiKey => "API key not setup",
            Self::UpstreamStatus { .. } => "Failed to get Ramadan data",
            Self::Timeout => "Ramadan data provider timed out",
            Self::Network(_) => "Could not reach Ramadan data provider",
            Self::UpstreamHttp { .. } => "Ramadan data provider returned an error",
            Self::Parse(_) => "Ramadan data provider returned malformed data",
            Self::Schema(_) => "Ramadan data provider returned unexpected data",
        }
    }

    pub fn to_response_body(&self) -> ErrorResponse {
        ErrorResponse { error: self.code().to_string(), detail: self.public_message().to_string() }
    }
}

impl From<reqwest::Error> for RelayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() { Self::Timeout } else { Self::Network(err) }
    }
}

impl From<QueryRejection> for RelayError {
    fn from(rejection: QueryRejection) -> Self {
        Self::InvalidQuery(rejection.body_text())
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        match &self {
            RelayError::InvalidQuery(reason) => {
                tracing::debug!(%reason, "Rejected calendar query");
            }
            RelayError::MissingApiKey => {
                tracing::error!("Configuration error: ISLAMIC_API_KEY is not configured");
            }
            RelayError::UpstreamStatus { status } => {
                tracing::warn!(?status, "Provider reported a non-success status");
            }
            other => tracing::error!("Upstream error: {other}"),
        }

        (self.status_code(), Json(self.to_response_body())).into_response()
    }
}

pub type RelayResult<T> = Result<T, RelayError>;
