use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

use crate::error::ErrorKind;
use crate::format::PredictionResult;
use crate::gateway::Gateway;
use crate::types::RawFields;

#[derive(Serialize)]
struct Out {
    price: f64,
    message: String,
}

type ErrorReply = (StatusCode, Json<serde_json::Value>);

async fn predict(
    State(gateway): State<Arc<Gateway>>,
    payload: Result<Json<RawFields>, JsonRejection>,
) -> Result<Json<Out>, ErrorReply> {
    // Field-level problems reach the validator; only a body that is not a
    // JSON object at all stops here.
    let Json(fields) = payload.map_err(|rejection| {
        (
            rejection.status(),
            Json(json!({
                "kind": ErrorKind::Validation,
                "error": format!("Invalid request body: {}", rejection.body_text()),
            })),
        )
    })?;

    // Validation and a possible lazy load are blocking work.
    let result = tokio::task::spawn_blocking(move || gateway.submit(&fields))
        .await
        .map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "kind": ErrorKind::Prediction, "error": format!("Prediction error: {e}") })),
            )
        })?;

    match result {
        PredictionResult::Price { value, text } => Ok(Json(Out {
            price: value,
            message: text,
        })),
        PredictionResult::Error { kind, message } => {
            Err((status_for(kind), Json(json!({ "kind": kind, "error": message }))))
        }
    }
}

fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation | ErrorKind::Encoding => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::Prediction => StatusCode::INTERNAL_SERVER_ERROR,
        ErrorKind::ModelLoad => StatusCode::SERVICE_UNAVAILABLE,
    }
}

async fn health(State(gateway): State<Arc<Gateway>>) -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "model": gateway.state() }))
}

pub fn router(gateway: Arc<Gateway>) -> Router {
    Router::new()
        .route("/predict", post(predict))
        .route("/health", get(health))
        .with_state(gateway)
}
