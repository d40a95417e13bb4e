//! Clip endpoints.

use axum::{
    Form, Router,
    extract::{DefaultBodyLimit, Multipart, Path, Query, State, multipart::Field},
    routing::{get, post},
};
use lostsons_common::{AppError, AppResult};
use lostsons_core::{ClipFile, CreateClipInput};
use lostsons_db::repositories::ClipView;
use serde::{Deserialize, Serialize};

use crate::{
    response::{ApiResponse, Paging},
    state::AppState,
};

/// Name of the multipart field carrying the media file.
const FILE_FIELD: &str = "clip";

#[derive(Debug, Deserialize)]
pub struct DeleteClipRequest {
    #[serde(default)]
    pub id: String,
}

#[derive(Serialize)]
pub struct DeletedClip {
    pub id: String,
}

fn form_err(e: impl std::fmt::Display) -> AppError {
    AppError::InvalidForm(e.to_string())
}

async fn text(field: Field<'_>) -> AppResult<String> {
    field.text().await.map_err(form_err)
}

/// Upload a new clip.
async fn create(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<ApiResponse<ClipView>> {
    let mut input = CreateClipInput::default();
    let mut file: Option<ClipFile> = None;

    while let Some(field) = multipart.next_field().await.map_err(form_err)? {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            FILE_FIELD => {
                let filename = field.file_name().unwrap_or("clip.mp4").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field.bytes().await.map_err(form_err)?;
                file = Some(ClipFile {
                    filename,
                    content_type,
                    data,
                });
            }
            "description" => input.description = text(field).await?,
            "game" => input.game = text(field).await?,
            "username" => input.username = text(field).await?,
            "tags" => input.tags = text(field).await?,
            "featured_users" => input.featured_users = text(field).await?,
            _ => tracing::debug!(field = %name, "Ignoring unknown form field"),
        }
    }

    let file = file.ok_or_else(|| AppError::InvalidForm(format!("missing file field `{FILE_FIELD}`")))?;

    let clip = state.clip_service.create_clip(input, file).await?;
    Ok(ApiResponse::ok(clip))
}

/// Delete a clip and its video asset.
async fn delete(
    State(state): State<AppState>,
    Form(req): Form<DeleteClipRequest>,
) -> AppResult<ApiResponse<DeletedClip>> {
    let id = req.id.trim();
    if id.is_empty() {
        return Err(AppError::InvalidForm("missing clip id".to_string()));
    }

    state.clip_service.delete_clip(id).await?;
    Ok(ApiResponse::ok(DeletedClip { id: id.to_string() }))
}

async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<ClipView>> {
    let clip = state.clip_service.get(&id).await?;
    Ok(ApiResponse::ok(clip))
}

async fn list(
    State(state): State<AppState>,
    Query(paging): Query<Paging>,
) -> AppResult<ApiResponse<Vec<ClipView>>> {
    let clips = state
        .clip_service
        .list(paging.limit(), paging.offset())
        .await?;
    Ok(ApiResponse::ok(clips))
}

pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route(
            "/new",
            post(create).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/delete", post(delete))
        .route("/{id}", get(show))
}
