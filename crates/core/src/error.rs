//! Unified error types for seoscope.
//!
//! Fetch-stage variants make up the typed "analysis failed" outcome handed
//! back to callers; stats variants only surface from startup and forced saves.

use rmcp::model::{ErrorCode, ErrorData as McpError};

/// Unified error types for the seoscope service.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., empty URL).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Invalid URL.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// Fetch timeout (page fetch or the outer analysis deadline).
    #[error("FETCH_TIMEOUT: {0}")]
    FetchTimeout(String),

    /// Fetch response too large.
    #[error("FETCH_TOO_LARGE: {0}")]
    FetchTooLarge(String),

    /// HTTP error response or transport failure.
    #[error("HTTP_ERROR: {0}")]
    HttpError(String),

    /// Page body could not be parsed.
    #[error("PARSE_FAILED: {0}")]
    ParseFailed(String),

    /// Reading or writing the statistics file failed.
    #[error("STATS_IO: {context}: {source}")]
    StatsIo {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// The statistics file exists but is not valid.
    #[error("STATS_CORRUPT: {0}")]
    StatsCorrupt(String),

    /// The component has already been shut down.
    #[error("SHUT_DOWN")]
    ShutDown,
}

impl Error {
    pub(crate) fn stats_io(context: impl Into<String>, source: std::io::Error) -> Self {
        Error::StatsIo { context: context.into(), source }
    }

    /// Whether this error aborted an analysis before a result was produced.
    pub fn is_analysis_failure(&self) -> bool {
        matches!(
            self,
            Error::InvalidUrl(_)
                | Error::FetchTimeout(_)
                | Error::FetchTooLarge(_)
                | Error::HttpError(_)
                | Error::ParseFailed(_)
        )
    }
}

impl From<Error> for McpError {
    fn from(err: Error) -> Self {
        let (code, message) = match &err {
            Error::InvalidInput(msg) => (-32602, msg.clone()),
            Error::InvalidUrl(msg) => (-32003, msg.clone()),
            Error::FetchTimeout(msg) => (-32006, msg.clone()),
            Error::FetchTooLarge(msg) => (-32007, msg.clone()),
            Error::HttpError(msg) => (-32008, msg.clone()),
            Error::ParseFailed(msg) => (-32000, msg.clone()),
            Error::StatsIo { .. } => (-32002, err.to_string()),
            Error::StatsCorrupt(msg) => (-32002, msg.clone()),
            Error::ShutDown => (-32013, "Service is shutting down".to_string()),
        };

        McpError { code: ErrorCode(code), message: message.into(), data: None }
    }
}
