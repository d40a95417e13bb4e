//! Game repository.

use std::sync::Arc;

use crate::entities::{Game, game};
use lostsons_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

/// Game repository for database operations.
#[derive(Clone)]
pub struct GameRepository {
    db: Arc<DatabaseConnection>,
}

impl GameRepository {
    /// Create a new game repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a game by name.
    pub async fn find_by_name(&self, name: &str) -> AppResult<Option<game::Model>> {
        Game::find()
            .filter(game::Column::Name.eq(name))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new game.
    pub async fn create(&self, id: String, name: String) -> AppResult<game::Model> {
        let model = game::ActiveModel {
            id: Set(id),
            name: Set(name),
        };

        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List all games ordered by name.
    pub async fn list(&self) -> AppResult<Vec<game::Model>> {
        Game::find()
            .order_by_asc(game::Column::Name)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
