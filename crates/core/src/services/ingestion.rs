//! Clip ingestion.
//!
//! A clip moves through `Received → Uploading → AssetRequested → Persisting →
//! Committed`. The uploaded object is public so the video platform can fetch
//! it; the catalog row is written only after the platform accepted the asset.
//! When the catalog write fails the asset is deleted again, exactly once.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use bytes::Bytes;
use lostsons_common::config::IngestConfig;
use lostsons_common::{AppError, AppResult, Compensation, IdGenerator, StorageService, generate_clip_key};
use lostsons_db::repositories::{ClipDraft, ClipRepository, ClipView};
use serde::Deserialize;
use validator::Validate;

use super::video_asset::VideoAssetService;

/// Longest tag name the catalog stores.
pub const MAX_TAG_LEN: usize = 20;

/// Text fields of the upload form.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CreateClipInput {
    #[validate(length(max = 120))]
    pub description: String,
    #[validate(length(min = 1, max = 60))]
    pub game: String,
    #[validate(length(min = 1, max = 35))]
    pub username: String,
    /// Comma- or whitespace-separated tag names.
    #[serde(default)]
    pub tags: String,
    /// Comma-separated usernames.
    #[serde(default)]
    pub featured_users: String,
}

/// The uploaded media file.
#[derive(Debug, Clone)]
pub struct ClipFile {
    pub filename: String,
    pub content_type: String,
    pub data: Bytes,
}

/// Ingestion progress, logged on every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestState {
    Received,
    Uploading,
    AssetRequested,
    Persisting,
    Committed,
}

impl fmt::Display for IngestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Received => "received",
            Self::Uploading => "uploading",
            Self::AssetRequested => "asset_requested",
            Self::Persisting => "persisting",
            Self::Committed => "committed",
        };
        f.write_str(name)
    }
}

/// Split a tag field on commas and whitespace, dropping empty and repeated names.
pub fn split_tags(raw: &str) -> AppResult<Vec<String>> {
    let mut tags: Vec<String> = Vec::new();
    for tag in raw.split(|c: char| c == ',' || c.is_whitespace()) {
        let tag = tag.trim();
        if tag.is_empty() || tags.iter().any(|t| t == tag) {
            continue;
        }
        if tag.chars().count() > MAX_TAG_LEN {
            return Err(AppError::InvalidForm(format!(
                "tag {tag:?} is longer than {MAX_TAG_LEN} characters"
            )));
        }
        tags.push(tag.to_string());
    }
    Ok(tags)
}

/// Split a comma-separated username field, dropping empty, repeated and excluded names.
#[must_use]
pub fn split_usernames(raw: &str, exclude: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for name in raw.split(',').map(str::trim) {
        if name.is_empty() || name == exclude || names.iter().any(|n| n == name) {
            continue;
        }
        names.push(name.to_string());
    }
    names
}

/// Validated form, ready to ingest.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Submission {
    description: String,
    game: String,
    username: String,
    tags: Vec<String>,
    featured_users: Vec<String>,
}

impl CreateClipInput {
    fn into_submission(self) -> AppResult<Submission> {
        let input = Self {
            description: self.description.trim().to_string(),
            game: self.game.trim().to_string(),
            username: self.username.trim().to_string(),
            ..self
        };
        input
            .validate()
            .map_err(|e| AppError::InvalidForm(e.to_string()))?;

        let tags = split_tags(&input.tags)?;
        let featured_users = split_usernames(&input.featured_users, &input.username);

        Ok(Submission {
            description: input.description,
            game: input.game,
            username: input.username,
            tags,
            featured_users,
        })
    }
}

/// Orchestrates clip creation and deletion across object storage, the video
/// platform and the catalog.
#[derive(Clone)]
pub struct ClipService {
    storage: StorageService,
    assets: VideoAssetService,
    clip_repo: ClipRepository,
    id_gen: IdGenerator,
    upstream_timeout: Duration,
    compensate_uploads: bool,
}

impl ClipService {
    /// Create a new clip service.
    #[must_use]
    pub const fn new(
        storage: StorageService,
        assets: VideoAssetService,
        clip_repo: ClipRepository,
        ingest: &IngestConfig,
    ) -> Self {
        Self {
            storage,
            assets,
            clip_repo,
            id_gen: IdGenerator::new(),
            upstream_timeout: ingest.upstream_timeout(),
            compensate_uploads: ingest.compensate_uploads,
        }
    }

    /// Upload, register and catalog a new clip.
    pub async fn create_clip(&self, input: CreateClipInput, file: ClipFile) -> AppResult<ClipView> {
        let submission = input.into_submission()?;
        if file.data.is_empty() {
            return Err(AppError::InvalidForm("clip file is empty".to_string()));
        }

        let token = self.id_gen.generate_token();
        let key = generate_clip_key(&token, &file.filename);
        trace_state(&token, IngestState::Received);

        trace_state(&token, IngestState::Uploading);
        let uploaded = self
            .bounded(
                self.storage.upload(&key, file.data, &file.content_type),
                AppError::UploadFailed,
            )
            .await
            .inspect_err(|e| tracing::warn!(upload_id = %token, error = %e, "Clip upload failed"))?;
        tracing::debug!(upload_id = %token, key = %uploaded.key, size = uploaded.size, "Clip stored");

        trace_state(&token, IngestState::AssetRequested);
        let asset = match self
            .bounded(
                self.assets.create_asset(&uploaded.url, &token),
                AppError::AssetCreationFailed,
            )
            .await
        {
            Ok(asset) => asset,
            Err(e) => {
                tracing::warn!(upload_id = %token, error = %e, "Video asset creation failed");
                self.discard_upload(&token, &key).await;
                return Err(e);
            }
        };

        trace_state(&token, IngestState::Persisting);
        let draft = ClipDraft {
            playback_id: asset.playback_id,
            asset_id: asset.asset_id.clone(),
            upload_id: token.clone(),
            username: submission.username,
            game: submission.game,
            description: submission.description,
            tags: submission.tags,
            featured_users: submission.featured_users,
        };

        let clip = match self.clip_repo.create_clip(draft).await {
            Ok(clip) => clip,
            Err(e) => {
                tracing::warn!(upload_id = %token, asset_id = %asset.asset_id, error = %e, "Catalog write failed, deleting video asset");
                let compensation = self.compensate_asset(&token, &asset.asset_id).await;
                self.discard_upload(&token, &key).await;
                return Err(AppError::PersistFailed {
                    source: Box::new(e),
                    compensation,
                });
            }
        };

        trace_state(&token, IngestState::Committed);
        tracing::info!(clip_id = %clip.id, upload_id = %token, asset_id = %clip.asset_id, "Clip ingested");

        Ok(clip)
    }

    /// Delete a clip: the remote asset first, then the catalog rows.
    pub async fn delete_clip(&self, id: &str) -> AppResult<()> {
        let clip = self
            .clip_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("clip {id}")))?;

        self.bounded(
            self.assets.delete_asset(&clip.asset_id),
            AppError::AssetDeletionFailed,
        )
        .await?;

        if !self.clip_repo.delete_clip(id).await? {
            return Err(AppError::NotFound(format!("clip {id}")));
        }

        tracing::info!(clip_id = %id, asset_id = %clip.asset_id, "Clip deleted");
        Ok(())
    }

    /// Get a clip by ID.
    pub async fn get(&self, id: &str) -> AppResult<ClipView> {
        self.clip_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("clip {id}")))
    }

    /// List clips, newest first.
    pub async fn list(&self, limit: u64, offset: u64) -> AppResult<Vec<ClipView>> {
        self.clip_repo.list(limit, offset).await
    }

    async fn compensate_asset(&self, token: &str, asset_id: &str) -> Compensation {
        match self
            .bounded(
                self.assets.delete_asset(asset_id),
                AppError::AssetDeletionFailed,
            )
            .await
        {
            Ok(()) => {
                tracing::warn!(upload_id = %token, asset_id = %asset_id, "Video asset removed after failed catalog write");
                Compensation::Compensated
            }
            Err(e) => {
                tracing::error!(upload_id = %token, asset_id = %asset_id, error = %e, "Video asset left behind after failed catalog write");
                Compensation::CompensationFailed(e.to_string())
            }
        }
    }

    /// Best-effort removal of the uploaded object, when enabled.
    async fn discard_upload(&self, token: &str, key: &str) {
        if !self.compensate_uploads {
            return;
        }
        if let Err(e) = self
            .bounded(self.storage.delete(key), AppError::Internal)
            .await
        {
            tracing::error!(upload_id = %token, key = %key, error = %e, "Failed to remove uploaded object");
        }
    }

    async fn bounded<T>(
        &self,
        call: impl Future<Output = AppResult<T>>,
        on_timeout: fn(String) -> AppError,
    ) -> AppResult<T> {
        tokio::time::timeout(self.upstream_timeout, call)
            .await
            .unwrap_or_else(|_| {
                Err(on_timeout(format!(
                    "timed out after {}s",
                    self.upstream_timeout.as_secs()
                )))
            })
    }
}

fn trace_state(token: &str, state: IngestState) {
    tracing::debug!(upload_id = %token, state = %state, "Ingest state");
}
