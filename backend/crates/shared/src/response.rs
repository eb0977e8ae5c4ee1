//! Response Envelope
//!
//! Every HTTP response body is wrapped in a uniform envelope whose `code`
//! mirrors the status line:
//!
//! - success: `{ "code": 200, "status": "OK", "data": ... }`
//! - failure: `{ "code": 401, "status": "Unauthorized", "error": { "message": ..., "action": ... } }`

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Success envelope
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    pub code: u16,
    pub status: &'static str,
    pub data: T,
    #[serde(skip)]
    status_code: StatusCode,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn with_status(status_code: StatusCode, data: T) -> Self {
        Self {
            code: status_code.as_u16(),
            status: status_code.canonical_reason().unwrap_or("OK"),
            data,
            status_code,
        }
    }

    /// 200 OK
    pub fn ok(data: T) -> Self {
        Self::with_status(StatusCode::OK, data)
    }

    /// 201 Created
    pub fn created(data: T) -> Self {
        Self::with_status(StatusCode::CREATED, data)
    }

    pub fn status_code(&self) -> StatusCode {
        self.status_code
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (self.status_code, Json(self)).into_response()
    }
}

/// Failure envelope
#[derive(Debug, Clone, Serialize)]
pub struct ErrorEnvelope {
    pub code: u16,
    pub status: &'static str,
    pub error: ErrorBody,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_created_envelope() {
        let resp = ApiResponse::created(serde_json::json!({ "id": 1 }));
        assert_eq!(resp.code, 201);
        assert_eq!(resp.status, "Created");

        let value = serde_json::to_value(&resp).unwrap();
        assert_eq!(value["code"], 201);
        assert_eq!(value["data"]["id"], 1);
        assert!(value.get("status_code").is_none());
    }

    #[test]
    fn test_error_envelope_omits_empty_action() {
        let body = ErrorEnvelope {
            code: 401,
            status: "Unauthorized",
            error: ErrorBody {
                message: "authorization token required".to_string(),
                action: None,
            },
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["error"]["message"], "authorization token required");
        assert!(value["error"].get("action").is_none());
    }
}
