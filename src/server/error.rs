use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};
use tracing::{error, warn};

use crate::Error;

/// JSON error response returned by every route.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: Value,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            body: json!({ "error": message.into() }),
        }
    }

    /// 500 carrying the underlying failure as `detail`.
    pub fn internal(message: impl Into<String>, detail: impl std::fmt::Display) -> Self {
        let message = message.into();
        error!(detail = %detail, "{message}");
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: json!({ "error": message, "detail": detail.to_string() }),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::InvalidRequest(message) | Error::Import(message) => Self::bad_request(message),
            Error::Store(message) => {
                warn!(error = %message, "store request failed");
                Self {
                    status: StatusCode::BAD_GATEWAY,
                    body: json!({ "error": message }),
                }
            }
            Error::Http(e) => {
                warn!(error = %e, "store unreachable");
                Self {
                    status: StatusCode::BAD_GATEWAY,
                    body: json!({ "error": e.to_string() }),
                }
            }
            other => Self::internal("internal error", other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::from(Error::invalid_request("missing title")).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(Error::import("row 2: title is empty")).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(Error::store("list todos failed (500): boom")).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ApiError::from(Error::config("bad")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_error_carries_detail() {
        let err = ApiError::internal("failed to build streaming response", "bad header");
        assert_eq!(err.body["error"], "failed to build streaming response");
        assert_eq!(err.body["detail"], "bad header");
    }
}
