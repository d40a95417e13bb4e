//! Health endpoints.

use axum::{Json, Router, extract::State, routing::get};
use lostsons_common::{AppError, AppResult};
use serde_json::{Value, json};

use crate::state::AppState;

async fn http() -> Json<Value> {
    Json(json!({ "http": "alive" }))
}

/// Ping the database pool.
async fn db(State(state): State<AppState>) -> AppResult<Json<Value>> {
    state
        .db
        .ping()
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;
    Ok(Json(json!({ "db": "alive" })))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/http", get(http))
        .route("/db", get(db))
}
