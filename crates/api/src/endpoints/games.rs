//! Game endpoints.

use axum::{
    Form, Router,
    extract::State,
    routing::{get, post},
};
use lostsons_common::AppResult;
use lostsons_core::CreateGameInput;
use lostsons_db::entities::game;

use crate::{response::ApiResponse, state::AppState};

async fn create(
    State(state): State<AppState>,
    Form(input): Form<CreateGameInput>,
) -> AppResult<ApiResponse<game::Model>> {
    let game = state.game_service.create(input).await?;
    Ok(ApiResponse::ok(game))
}

async fn list(State(state): State<AppState>) -> AppResult<ApiResponse<Vec<game::Model>>> {
    let games = state.game_service.list().await?;
    Ok(ApiResponse::ok(games))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/new", post(create))
}
