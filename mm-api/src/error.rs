//! Error types for mm-api
//!
//! Every error renders as `{"error": {"code", "message", "details"?}}`.

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use mm_common::Error as CommonError;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Malformed or oversized multipart body
    #[error("Invalid upload: {0}")]
    Multipart(#[from] MultipartError),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// mm-common error
    #[error(transparent)]
    Common(#[from] CommonError),
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        ApiError::Internal(format!("Worker task failed: {}", err))
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        ApiError::Common(CommonError::Io(err))
    }
}

fn common_code(err: &CommonError) -> &'static str {
    match err {
        CommonError::Validation(_) => "VALIDATION_ERROR",
        CommonError::ToolMissing { .. } => "TOOL_MISSING",
        CommonError::ToolFailed { .. } => "TOOL_FAILED",
        CommonError::ToolTimedOut { .. } => "TOOL_TIMEOUT",
        CommonError::Parse(_) => "PARSE_ERROR",
        CommonError::InvalidFile(_) => "INVALID_FILE",
        CommonError::EmptyBatch => "EMPTY_BATCH",
        CommonError::Config(_) => "CONFIG_ERROR",
        CommonError::Io(_) => "IO_ERROR",
        CommonError::Json(_) => "JSON_ERROR",
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Multipart(err) => err.status(),
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Common(err) if err.is_client_error() => StatusCode::BAD_REQUEST,
            ApiError::Common(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Multipart(_) => "INVALID_UPLOAD",
            ApiError::Internal(_) => "INTERNAL_ERROR",
            ApiError::Common(err) => common_code(err),
        }
    }

    /// Extra diagnostic text: remediation hint or captured stderr
    pub fn details(&self) -> Option<&str> {
        match self {
            ApiError::Common(CommonError::ToolMissing { hint, .. }) => Some(hint.as_str()),
            ApiError::Common(CommonError::ToolFailed { stderr, .. }) if !stderr.trim().is_empty() => {
                Some(stderr.as_str())
            }
            _ => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();
        let message = match &self {
            ApiError::Multipart(err) => err.body_text(),
            other => other.to_string(),
        };

        if status.is_server_error() {
            error!(code, %message, "Request failed");
        } else {
            warn!(code, %message, "Request rejected");
        }

        let mut error = json!({
            "code": code,
            "message": message,
        });
        if let Some(details) = self.details() {
            error["details"] = json!(details);
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors_are_400() {
        let err = ApiError::from(CommonError::EmptyBatch);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.code(), "EMPTY_BATCH");

        let err = ApiError::from(CommonError::InvalidFile("x.ale".into()));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_tool_errors_are_500_with_details() {
        let err = ApiError::from(CommonError::ToolMissing {
            tool: "ffprobe".into(),
            hint: "install FFmpeg".into(),
        });
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.details(), Some("install FFmpeg"));

        let err = ApiError::from(CommonError::ToolFailed {
            tool: "ffprobe".into(),
            code: Some(1),
            stderr: "moov atom not found".into(),
        });
        assert_eq!(err.code(), "TOOL_FAILED");
        assert_eq!(err.details(), Some("moov atom not found"));
    }

    #[test]
    fn test_parse_error_is_500() {
        let err = ApiError::from(CommonError::Parse("line 3: invalid timecode".into()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.details(), None);
    }
}
