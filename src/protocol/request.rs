//! Request and Response message types.
//!
//! Defines the envelope for command requests and responses between the local
//! end and the remote end.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::identifiers::{RequestId, SessionId};

use super::Command;

// ============================================================================
// Request
// ============================================================================

/// A command request from local end to remote end.
///
/// # Format
///
/// ```json
/// {
///   "id": "uuid",
///   "sessionId": "optional",
///   "method": "Domain.methodName",
///   "params": { ... }
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct Request {
    /// Unique identifier for request/response correlation.
    pub id: RequestId,

    /// Target session (omitted for the top-level session).
    #[serde(rename = "sessionId", skip_serializing_if = "SessionId::is_root")]
    pub session_id: SessionId,

    /// Command with method and params.
    #[serde(flatten)]
    pub command: Command,
}

impl Request {
    /// Creates a new request with auto-generated ID.
    #[inline]
    #[must_use]
    pub fn new(session_id: SessionId, command: Command) -> Self {
        Self {
            id: RequestId::generate(),
            session_id,
            command,
        }
    }
}

// ============================================================================
// Response
// ============================================================================

/// A response from remote end to local end.
///
/// # Format
///
/// Success:
/// ```json
/// { "id": "uuid", "type": "success", "result": { ... } }
/// ```
///
/// Error:
/// ```json
/// { "id": "uuid", "type": "error", "error": "code", "message": "text" }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Response {
    /// Matches the request `id`.
    pub id: RequestId,

    /// Response type.
    #[serde(rename = "type")]
    pub response_type: ResponseType,

    /// Result data (if success).
    #[serde(default)]
    pub result: Option<Value>,

    /// Error code (if error).
    #[serde(default)]
    pub error: Option<String>,

    /// Error message (if error).
    #[serde(default)]
    pub message: Option<String>,
}

impl Response {
    /// Returns `true` if this is a success response.
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.response_type == ResponseType::Success
    }

    /// Returns `true` if this is an error response.
    #[inline]
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.response_type == ResponseType::Error
    }

    /// Extracts the result value, returning error if response was error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] if the response was an error.
    pub fn into_result(self) -> Result<Value> {
        match self.response_type {
            ResponseType::Success => Ok(self.result.unwrap_or(Value::Null)),
            ResponseType::Error => {
                let error_code = self.error.unwrap_or_else(|| "unknown error".to_string());
                let message = self.message.unwrap_or_else(|| error_code.clone());
                Err(Error::protocol(message))
            }
        }
    }
}

// ============================================================================
// ResponseType
// ============================================================================

/// Response type discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    /// Successful response.
    Success,
    /// Error response.
    Error,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifiers::FrameId;
    use crate::protocol::PageCommand;

    #[test]
    fn test_request_serialization() {
        let command = Command::Page(PageCommand::Navigate {
            url: "https://example.com".to_string(),
            referrer: None,
            referrer_policy: None,
            frame_id: FrameId::new("F1"),
        });

        let request = Request::new(SessionId::root(), command);
        let json = serde_json::to_string(&request).expect("serialize");

        assert!(json.contains("Page.navigate"));
        assert!(json.contains("frameId"));
        assert!(!json.contains("sessionId"));
    }

    #[test]
    fn test_request_carries_child_session() {
        let command = Command::Page(PageCommand::Enable {});
        let request = Request::new(SessionId::new("S7"), command);
        let json = serde_json::to_value(&request).expect("serialize");

        assert_eq!(json["sessionId"], "S7");
        assert_eq!(json["method"], "Page.enable");
    }

    #[test]
    fn test_success_response() {
        let json_str = r#"{
            "id": "550e8400-e29b-41d4-a716-446655440000",
            "type": "success",
            "result": {"loaderId": "L1"}
        }"#;

        let response: Response = serde_json::from_str(json_str).expect("parse");
        assert!(response.is_success());
        let result = response.into_result().expect("should succeed");
        assert_eq!(result["loaderId"], "L1");
    }

    #[test]
    fn test_into_result_error() {
        let json_str = r#"{
            "id": "550e8400-e29b-41d4-a716-446655440000",
            "type": "error",
            "error": "invalid params",
            "message": "No frame with given id found"
        }"#;

        let response: Response = serde_json::from_str(json_str).expect("parse");
        assert!(response.is_error());
        let err = response.into_result().unwrap_err();
        assert!(matches!(err, Error::Protocol { .. }));
        assert!(err.to_string().contains("No frame with given id"));
    }
}
