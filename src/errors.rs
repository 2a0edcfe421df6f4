use axum::{ http::StatusCode, response::{ IntoResponse, Response }, Json };
use std::fmt;
use serde::{ Serialize, Deserialize };
use thiserror::Error;
use chrono::{ DateTime, Utc };

use crate::config::ConfigError;

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: String,
    pub message: String,
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.status, self.message)
    }
}

/// A raw record that could not be turned into a `Post`.
///
/// Recoverable: the batch skips the record and keeps going.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Malformed {platform} record: {reason}")]
pub struct MalformedRecord {
    pub platform: String,
    pub reason: String,
}

impl MalformedRecord {
    pub fn new(platform: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown platform: {0}")]
pub struct ParsePlatformError(pub String);

/// Caller-contract violations raised by the filter engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    #[error("At least one platform must be selected")]
    EmptySelection,

    #[error("Invalid date range: start {start} is after end {end}")] InvalidRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

/// Failures talking to an upstream data source.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Request to {0} timed out")] Timeout(String),

    #[error("Transport error: {0}")] Transport(String),

    #[error("{platform} API returned status {status}")] Status {
        platform: String,
        status: u16,
    },

    #[error("Unexpected {platform} payload: {reason}")] UnexpectedPayload {
        platform: String,
        reason: String,
    },

    #[error("No API credentials configured for live sources")]
    MissingCredentials,
}

impl SourceError {
    /// Whether the same request may succeed if tried again.
    pub fn is_transient(&self) -> bool {
        match self {
            SourceError::Timeout(_) | SourceError::Transport(_) => true,
            SourceError::Status { status, .. } => *status == 429 || *status >= 500,
            SourceError::UnexpectedPayload { .. } | SourceError::MissingCredentials => false,
        }
    }
}

impl From<reqwest::Error> for SourceError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            let target = e
                .url()
                .and_then(|u| u.host_str())
                .unwrap_or("upstream")
                .to_string();
            SourceError::Timeout(target)
        } else if e.is_decode() {
            SourceError::UnexpectedPayload {
                platform: "upstream".to_string(),
                reason: e.to_string(),
            }
        } else {
            SourceError::Transport(e.to_string())
        }
    }
}

/// Anything that stops a dashboard cycle from producing a result.
#[derive(Debug, Error)]
pub enum DashboardError {
    #[error(transparent)] Filter(#[from] FilterError),

    #[error(transparent)] Source(#[from] SourceError),
}

#[derive(Debug, PartialEq)]
pub enum ErrorMessage {
    InternalServerError,
    NotFound,
    InvalidPlatform(String),
    InvalidDate(String),
    InvalidSourceMode(String),
    InvalidSortOrder(String),
    UpstreamUnavailable,
    RenderError,
}

impl fmt::Display for ErrorMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorMessage::InternalServerError =>
                write!(f, "Server Error. Please try again later."),
            ErrorMessage::NotFound => write!(f, "The requested resource could not be found"),
            ErrorMessage::InvalidPlatform(value) =>
                write!(f, "Unknown platform '{}', expected LinkedIn, Reddit or Twitter", value),
            ErrorMessage::InvalidDate(value) =>
                write!(f, "Invalid date '{}', expected YYYY-MM-DD or RFC 3339", value),
            ErrorMessage::InvalidSourceMode(value) =>
                write!(f, "Unknown source '{}', expected 'mock' or 'live'", value),
            ErrorMessage::InvalidSortOrder(value) =>
                write!(f, "Unknown sort '{}', expected 'input' or 'engagement'", value),
            ErrorMessage::UpstreamUnavailable =>
                write!(f, "Upstream data source is unavailable, try again later"),
            ErrorMessage::RenderError => write!(f, "Unable to render the dashboard"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpError {
    pub message: String,
    pub status: StatusCode,
}

impl HttpError {
    pub fn server_error(message: impl Into<String>) -> Self {
        HttpError {
            message: message.into(),
            status: StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        HttpError {
            message: message.into(),
            status: StatusCode::BAD_REQUEST,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        HttpError {
            message: message.into(),
            status: StatusCode::NOT_FOUND,
        }
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        HttpError {
            message: message.into(),
            status: StatusCode::BAD_GATEWAY,
        }
    }

    pub fn into_http_response(self) -> Response {
        let response = Json(ErrorResponse {
            status: "fail".to_string(),
            message: self.message.clone(),
        });

        (self.status, response).into_response()
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HttpError: message: {}, status: {}", self.message, self.status)
    }
}

impl std::error::Error for HttpError {}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        self.into_http_response()
    }
}

impl From<FilterError> for HttpError {
    fn from(e: FilterError) -> Self {
        HttpError::bad_request(e.to_string())
    }
}

impl From<SourceError> for HttpError {
    fn from(e: SourceError) -> Self {
        tracing::error!("Upstream source failure: {}", e);
        HttpError::bad_gateway(ErrorMessage::UpstreamUnavailable.to_string())
    }
}

impl From<DashboardError> for HttpError {
    fn from(e: DashboardError) -> Self {
        match e {
            DashboardError::Filter(e) => e.into(),
            DashboardError::Source(e) => e.into(),
        }
    }
}

impl From<ConfigError> for HttpError {
    fn from(e: ConfigError) -> Self {
        tracing::error!("Configuration failure: {}", e);
        HttpError::server_error(ErrorMessage::InternalServerError.to_string())
    }
}

impl From<validator::ValidationErrors> for HttpError {
    fn from(e: validator::ValidationErrors) -> Self {
        HttpError::bad_request(e.to_string())
    }
}
