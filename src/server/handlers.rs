use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    extract::State,
    response::{Html, IntoResponse, Response},
};

use crate::context::AppContext;
use crate::predict::PredictionResult;

use super::error::ApiError;

/// `GET /`: model summary.
pub async fn root(State(ctx): State<Arc<AppContext>>) -> Response {
    Json(ctx.info()).into_response()
}

/// `GET /form`: manual test page.
pub async fn form(State(ctx): State<Arc<AppContext>>) -> Html<String> {
    Html(ctx.form_html().to_string())
}

/// `GET /schema`: description of the `/predict` body.
pub async fn schema(State(ctx): State<Arc<AppContext>>) -> Json<serde_json::Value> {
    Json(ctx.schema().json_schema(ctx.title()))
}

/// `POST /predict`: validate the body and run the model.
pub async fn predict(
    State(ctx): State<Arc<AppContext>>,
    body: Bytes,
) -> Result<Json<PredictionResult>, ApiError> {
    let row = ctx.schema().validate_bytes(&body)?;
    let worker = Arc::clone(&ctx);
    let result = tokio::task::spawn_blocking(move || worker.predict(row)).await??;
    tracing::debug!(
        "Predicted {} ({})",
        result.prediction_label,
        result.prediction_index
    );
    Ok(Json(result))
}
