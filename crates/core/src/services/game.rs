//! Game service.

use lostsons_common::{AppError, AppResult, IdGenerator};
use lostsons_db::{entities::game, repositories::GameRepository};
use serde::Deserialize;
use validator::Validate;

/// Input for adding a game.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateGameInput {
    #[validate(length(min = 1, max = 60))]
    pub name: String,
}

#[derive(Clone)]
pub struct GameService {
    game_repo: GameRepository,
    id_gen: IdGenerator,
}

impl GameService {
    #[must_use]
    pub const fn new(game_repo: GameRepository) -> Self {
        Self {
            game_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Add a game. Names are unique.
    pub async fn create(&self, input: CreateGameInput) -> AppResult<game::Model> {
        let name = input.name.trim().to_string();
        CreateGameInput { name: name.clone() }.validate()?;

        if self.game_repo.find_by_name(&name).await?.is_some() {
            return Err(AppError::Conflict(format!("Game already exists: {name}")));
        }

        let game = self.game_repo.create(self.id_gen.generate(), name).await?;
        tracing::info!(game_id = %game.id, name = %game.name, "Added game");
        Ok(game)
    }

    pub async fn list(&self) -> AppResult<Vec<game::Model>> {
        self.game_repo.list().await
    }
}
