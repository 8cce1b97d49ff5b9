use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use shared::errors::{ErrorCategory, ServiceError};
use shared::store::StoreError;
use shared::DomainError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    fn to_service_error(&self) -> ServiceError {
        match self {
            AppError::Domain(e) => ServiceError::from(e.clone()),
            AppError::Store(StoreError::Unavailable(reason)) => ServiceError::redis_error(reason),
            AppError::Store(StoreError::VersionConflict {
                jackpot_id,
                expected_version,
            }) => ServiceError::version_conflict(jackpot_id, *expected_version),
            AppError::Store(StoreError::JackpotNotFound(jackpot_id)) => {
                ServiceError::jackpot_not_found(jackpot_id)
            }
            AppError::Store(StoreError::Corrupt(reason)) => {
                ServiceError::serialization_error(reason)
            }
            AppError::Store(e) => ServiceError::internal(e.to_string()),
            AppError::InvalidInput(message) => ServiceError::invalid_input(message.clone()),
            AppError::Internal(_) => ServiceError::internal("Internal server error"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let error = self.to_service_error();

        match error.category {
            ErrorCategory::Validation | ErrorCategory::Conflict => {
                tracing::warn!(error_code = %error.code, error = %self, "Request failed")
            }
            ErrorCategory::NotFound => {
                tracing::info!(error_code = %error.code, error = %self, "Request failed")
            }
            ErrorCategory::Network | ErrorCategory::Internal => {
                tracing::error!(error_code = %error.code, error = ?self, "Request failed")
            }
        }

        metrics::counter!(
            "errors_total",
            "category" => format!("{:?}", error.category),
            "code" => error.code.clone()
        )
        .increment(1);

        let status = StatusCode::from_u16(error.category.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = Json(json!({
            "error": {
                "code": error.code,
                "message": error.message,
                "category": error.category,
            }
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_errors_are_bad_requests() {
        let response = AppError::from(DomainError::InvalidCurrency("eur".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_store_outage_is_unavailable() {
        let response =
            AppError::from(StoreError::Unavailable("refused".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_internal_errors_hide_details() {
        let error = AppError::Internal(anyhow::anyhow!("secret"));
        assert_eq!(error.to_service_error().message, "Internal server error");
        assert_eq!(error.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
