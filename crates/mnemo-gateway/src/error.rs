// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mapping of engine errors onto HTTP responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use mnemo_core::MnemoError;

/// Error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error description.
    pub detail: String,
}

/// Handler error carrying the engine error it was built from.
#[derive(Debug)]
pub struct ApiError(pub MnemoError);

impl ApiError {
    /// A 400 response with `detail`.
    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self(MnemoError::InvalidRequest(detail.into()))
    }

    /// HTTP status for the wrapped error.
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            MnemoError::Config(_) | MnemoError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            MnemoError::NotFound { .. } => StatusCode::NOT_FOUND,
            MnemoError::Upstream { .. } => StatusCode::BAD_GATEWAY,
            MnemoError::Storage { .. } | MnemoError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<MnemoError> for ApiError {
    fn from(err: MnemoError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.0, status = status.as_u16(), "request failed");
        } else {
            tracing::debug!(error = %self.0, status = status.as_u16(), "request rejected");
        }
        let detail = match &self.0 {
            MnemoError::InvalidRequest(msg) => msg.clone(),
            other => other.to_string(),
        };
        (status, Json(ErrorResponse { detail })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_table() {
        let cases = [
            (MnemoError::Config("x".into()), StatusCode::BAD_REQUEST),
            (MnemoError::InvalidRequest("x".into()), StatusCode::BAD_REQUEST),
            (
                MnemoError::NotFound {
                    kind: "memory".into(),
                    id: "m1".into(),
                },
                StatusCode::NOT_FOUND,
            ),
            (
                MnemoError::upstream("graph down", std::io::Error::other("refused")),
                StatusCode::BAD_GATEWAY,
            ),
            (
                MnemoError::Storage {
                    source: Box::new(std::io::Error::other("disk")),
                },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (MnemoError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, expected) in cases {
            assert_eq!(ApiError(err).status(), expected);
        }
    }

    #[test]
    fn invalid_request_detail_is_bare_message() {
        let resp = ApiError::bad_request("memory text is required").into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn error_response_serializes() {
        let json = serde_json::to_string(&ErrorResponse {
            detail: "something went wrong".to_string(),
        })
        .unwrap();
        assert_eq!(json, r#"{"detail":"something went wrong"}"#);
    }
}
