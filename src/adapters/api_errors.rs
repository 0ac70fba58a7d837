use crate::domain::error::OrchestrationError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

// Newtype over the domain error so the axum trait can live in the
// adapter layer, keeping HTTP out of the domain.
pub struct ApiError(pub OrchestrationError);

impl From<OrchestrationError> for ApiError {
    fn from(err: OrchestrationError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match &self.0 {
            OrchestrationError::Validation(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "validation_error",
                msg.clone(),
            ),
            OrchestrationError::IllegalTransition { .. } => (
                StatusCode::BAD_REQUEST,
                "illegal_transition",
                self.0.to_string(),
            ),
            OrchestrationError::NotFound(_) => {
                (StatusCode::NOT_FOUND, "not_found", self.0.to_string())
            }
            OrchestrationError::UpstreamUnavailable(detail) => {
                tracing::error!("provider unavailable: {detail}");
                (
                    StatusCode::BAD_GATEWAY,
                    "provider_unavailable",
                    "payment provider unavailable".to_string(),
                )
            }
            OrchestrationError::CacheConflict(key) => {
                tracing::error!("idempotency record missing after lost race: {key}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "internal error".to_string(),
                )
            }
            OrchestrationError::Database(err) => {
                tracing::error!("database error: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "internal error".to_string(),
                )
            }
            OrchestrationError::Serialization(err) => {
                tracing::error!("serialization error: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "internal error".to_string(),
                )
            }
        };

        let body = serde_json::json!({
            "error_code": error_code,
            "message": message,
        });

        (status, Json(body)).into_response()
    }
}
