//! Mapping of engine errors onto HTTP responses.

use crate::error::PaymentError;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Error returned by every route handler.
#[derive(Debug)]
pub struct ApiError(pub PaymentError);

impl From<PaymentError> for ApiError {
    fn from(err: PaymentError) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(PaymentError::InvalidInput(rejection.body_text()))
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            PaymentError::InvalidInput(_) | PaymentError::InvalidAmount(_) => {
                StatusCode::BAD_REQUEST
            }
            PaymentError::DuplicateKey { .. } => StatusCode::CONFLICT,
            PaymentError::Unauthorized => StatusCode::UNAUTHORIZED,
            PaymentError::UserNotFound(_) | PaymentError::WalletNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            PaymentError::InsufficientFunds { .. } => StatusCode::PAYMENT_REQUIRED,
            PaymentError::NotImplemented(_) => StatusCode::NOT_IMPLEMENTED,
            PaymentError::StorageError(_)
            | PaymentError::LedgerWriteError(_)
            | PaymentError::PartialRegistration { .. }
            | PaymentError::ChainBroken { .. }
            | PaymentError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if self.0.is_user_correctable() {
            tracing::debug!(error = %self.0, code = self.0.code(), "Request rejected");
        } else if status != StatusCode::NOT_IMPLEMENTED {
            tracing::error!(error = %self.0, code = self.0.code(), "Request failed");
        }
        let body = serde_json::json!({
            "error": self.0.to_string(),
            "code": self.0.code(),
        });
        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (PaymentError::InvalidAmount(dec!(0)), StatusCode::BAD_REQUEST),
            (PaymentError::Unauthorized, StatusCode::UNAUTHORIZED),
            (PaymentError::WalletNotFound(1), StatusCode::NOT_FOUND),
            (
                PaymentError::InsufficientFunds {
                    wallet: 1,
                    available: dec!(1),
                    requested: dec!(2),
                },
                StatusCode::PAYMENT_REQUIRED,
            ),
            (PaymentError::NotImplemented("x"), StatusCode::NOT_IMPLEMENTED),
            (
                PaymentError::StorageError("down".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError(err).status(), status);
        }
    }

    #[test]
    fn test_user_correctable_errors_are_client_errors() {
        let errors = [
            PaymentError::InvalidInput("bad".to_string()),
            PaymentError::InvalidAmount(dec!(0.001)),
            PaymentError::DuplicateKey {
                field: "email",
                value: "a@x.io".to_string(),
            },
            PaymentError::Unauthorized,
            PaymentError::UserNotFound(1),
            PaymentError::LedgerWriteError("io".to_string()),
            PaymentError::NotImplemented("x"),
        ];
        for err in errors {
            let correctable = err.is_user_correctable();
            assert_eq!(ApiError(err).status().is_client_error(), correctable);
        }
    }
}
