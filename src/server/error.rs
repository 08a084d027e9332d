use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::predict::PredictError;
use crate::schema::ValidationErrors;

/// Errors returned by request handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request body failed schema validation.
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    /// The model and metadata disagree, or the model misbehaved.
    #[error(transparent)]
    Predict(#[from] PredictError),
    /// The blocking inference task panicked or was cancelled.
    #[error("Inference task failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Predict(_) | ApiError::Worker(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            ApiError::Validation(errors) => {
                tracing::debug!("Rejected request: {errors}");
                (status, Json(json!({ "detail": errors.0 }))).into_response()
            }
            other => {
                tracing::error!("Prediction failed: {other}");
                (status, Json(json!({ "detail": other.to_string() }))).into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_error_kinds_to_status_codes() {
        let validation = ApiError::from(ValidationErrors(Vec::new()));
        assert_eq!(validation.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let predict = ApiError::from(PredictError::UnknownLabel { index: 4 });
        assert_eq!(predict.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(predict.to_string().contains("class index 4"));
    }
}
