//! User endpoints.

use axum::{
    Form, Router,
    extract::{Query, State},
    routing::{get, post},
};
use lostsons_common::AppResult;
use lostsons_core::CreateUserInput;
use lostsons_db::entities::user;

use crate::{
    response::{ApiResponse, Paging},
    state::AppState,
};

/// Register a user.
async fn create(
    State(state): State<AppState>,
    Form(input): Form<CreateUserInput>,
) -> AppResult<ApiResponse<user::Model>> {
    let user = state.user_service.create(input).await?;
    Ok(ApiResponse::ok(user))
}

async fn list(
    State(state): State<AppState>,
    Query(paging): Query<Paging>,
) -> AppResult<ApiResponse<Vec<user::Model>>> {
    let users = state
        .user_service
        .list(paging.limit(), paging.offset())
        .await?;
    Ok(ApiResponse::ok(users))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/new", post(create))
}
