//! API endpoints.

mod clips;
mod games;
mod health;
mod users;
mod webhooks;

use axum::Router;

use crate::state::AppState;

/// Create the API router. `max_upload_bytes` bounds clip upload bodies.
pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .nest("/clips", clips::router(max_upload_bytes))
        .nest("/users", users::router())
        .nest("/games", games::router())
        .nest("/health", health::router())
        .merge(webhooks::router())
}
