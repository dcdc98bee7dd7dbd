// crates/backend-lib/src/error.rs

//! Central error type + Axum integration.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::auth::CryptoError;
use crate::storage::StoreError;

/// Failures a handler cannot turn into a normal reply
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),
}

impl AppError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Storage(_) | AppError::Crypto(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Storage(_) => "DB_001",
            AppError::Crypto(_) => "CRYPTO_001",
        }
    }

    /// Get a sanitized message suitable for production use
    pub fn sanitized_message(&self) -> String {
        match self {
            AppError::Storage(_) => "Unable to process request, please try again later".to_string(),
            AppError::Crypto(_) => "An internal server error occurred".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();

        if status.is_server_error() {
            tracing::error!(code = error_code, error = %self, "request failed");
        }

        // Use detailed messages in development, sanitized in production
        let message = if cfg!(debug_assertions) {
            self.to_string()
        } else {
            self.sanitized_message()
        };

        let body = serde_json::json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        });

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    #[test]
    fn test_app_error_display() {
        let store_error = AppError::Storage(StoreError::UnsupportedUrl("ftp://x".into()));
        assert!(store_error.to_string().contains("Storage error"));

        let crypto_error = AppError::Crypto(CryptoError::MalformedToken);
        assert!(crypto_error.to_string().starts_with("Crypto error"));
    }

    #[test]
    fn test_app_error_codes() {
        let store_error: AppError = StoreError::UnsupportedUrl("x".into()).into();
        assert_eq!(store_error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(store_error.error_code(), "DB_001");

        let crypto_error: AppError = CryptoError::Open.into();
        assert_eq!(crypto_error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(crypto_error.error_code(), "CRYPTO_001");
    }

    #[test]
    fn test_sanitized_messages_hide_details() {
        let err = AppError::Storage(StoreError::UnsupportedUrl("secret://host".into()));
        assert!(!err.sanitized_message().contains("secret"));
    }

    #[tokio::test]
    async fn test_error_serialization() {
        let response = AppError::Crypto(CryptoError::Seal).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response
            .headers()
            .get("content-type")
            .unwrap()
            .to_str()
            .unwrap()
            .contains("application/json"));
    }
}
