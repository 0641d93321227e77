use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::services::balance::BalanceError;
use crate::services::payouts::PayoutError;
use crate::services::reveal::RevealError;
use crate::services::wagers::WagerError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    /// Transient infrastructure failure — always retryable by the user.
    #[error("Temporarily unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".into()),
            AppError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg.clone()),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".into())
            }
        };

        (
            status,
            Json(ErrorBody {
                success: false,
                error: message,
            }),
        )
            .into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::Internal(e.into())
    }
}

// Validation, user-cancelled and contract-rejected wagers surface verbatim
// as blocking messages; infrastructure trouble is a retryable 503.
impl From<WagerError> for AppError {
    fn from(e: WagerError) -> Self {
        match e {
            WagerError::MarketNotFound => AppError::NotFound("market not found".into()),
            WagerError::Gateway(_) | WagerError::Decryption(_) => {
                AppError::Unavailable(e.to_string())
            }
            WagerError::Internal(err) => AppError::Internal(err),
            other => AppError::BadRequest(other.to_string()),
        }
    }
}

impl From<PayoutError> for AppError {
    fn from(e: PayoutError) -> Self {
        match e {
            PayoutError::Gateway(_) => AppError::Unavailable(e.to_string()),
            PayoutError::Internal(err) => AppError::Internal(err),
            other => AppError::BadRequest(other.to_string()),
        }
    }
}

impl From<RevealError> for AppError {
    fn from(e: RevealError) -> Self {
        match e {
            RevealError::Gateway(_) | RevealError::Decryption(_) => {
                AppError::Unavailable(e.to_string())
            }
            RevealError::Internal(err) => AppError::Internal(err),
        }
    }
}

impl From<BalanceError> for AppError {
    fn from(e: BalanceError) -> Self {
        match e {
            BalanceError::Gateway(_) | BalanceError::Decryption(_) => {
                AppError::Unavailable(e.to_string())
            }
            BalanceError::Internal(err) => AppError::Internal(err),
        }
    }
}
