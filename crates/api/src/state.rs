//! Application state shared by all handlers.

use std::sync::Arc;

use lostsons_core::{ClipService, GameService, UserService, WebhookReconciler};
use sea_orm::DatabaseConnection;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub clip_service: ClipService,
    pub user_service: UserService,
    pub game_service: GameService,
    pub webhook_reconciler: WebhookReconciler,
}
