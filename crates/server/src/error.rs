//! Tool-level errors for the seoscope server.
//!
//! Domain failures arrive as `seoscope_core::Error` and convert on their own;
//! these cover problems with the tool call itself.

use rmcp::model::{ErrorCode, ErrorData as McpError};

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// Invalid input parameters (e.g., empty URL, malformed month).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// The tool output could not be encoded.
    #[error("SERIALIZE_FAILED: {0}")]
    SerializeFailed(String),
}

impl From<ToolError> for McpError {
    fn from(err: ToolError) -> Self {
        let (code, message) = match &err {
            ToolError::InvalidInput(msg) => (-32602, msg.clone()),
            ToolError::SerializeFailed(msg) => (-32603, msg.clone()),
        };

        McpError { code: ErrorCode(code), message: message.into(), data: None }
    }
}

impl From<serde_json::Error> for ToolError {
    fn from(err: serde_json::Error) -> Self {
        ToolError::SerializeFailed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_input_code() {
        let err: McpError = ToolError::InvalidInput("url must not be empty".into()).into();
        assert_eq!(err.code.0, -32602);
        assert_eq!(err.message, "url must not be empty");
    }

    #[test]
    fn test_display_prefix() {
        assert!(ToolError::SerializeFailed("boom".into()).to_string().starts_with("SERIALIZE_FAILED"));
    }
}
