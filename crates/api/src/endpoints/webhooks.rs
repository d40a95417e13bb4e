//! Video platform webhook endpoint.

use axum::{
    Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
};
use bytes::Bytes;
use lostsons_common::{AppResult, SIGNATURE_HEADER};

use crate::state::AppState;

/// Receive a signed webhook. The body is verified byte for byte before it is
/// decoded, so it must be taken raw.
async fn mux_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<StatusCode> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());

    let outcome = state.webhook_reconciler.handle(signature, &body).await?;
    tracing::debug!(outcome = ?outcome, "Webhook processed");

    Ok(StatusCode::OK)
}

pub fn router() -> Router<AppState> {
    Router::new().route("/mux-webhook", post(mux_webhook))
}
