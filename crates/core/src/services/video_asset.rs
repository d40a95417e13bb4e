//! Video platform client.
//!
//! Assets are created from the public URL of an uploaded object; the platform
//! fetches and transcodes asynchronously and answers immediately with the
//! asset and playback identifiers.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use lostsons_common::config::MuxConfig;
use lostsons_common::{AppError, AppResult};
use serde::Deserialize;
use serde_json::json;

/// Identifiers of a freshly created asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetHandle {
    /// Asset ID.
    pub asset_id: String,
    /// Playback ID, usable before transcoding completes.
    pub playback_id: String,
}

/// Client for creating and deleting remote video assets.
#[async_trait]
pub trait VideoAssetClient: Send + Sync {
    /// Ask the platform to ingest `source_url`, tagging the asset with `passthrough`.
    async fn create_asset(&self, source_url: &str, passthrough: &str) -> AppResult<AssetHandle>;

    /// Delete an asset. An asset the platform no longer knows counts as deleted.
    async fn delete_asset(&self, asset_id: &str) -> AppResult<()>;
}

/// Shared handle to the configured video platform client.
pub type VideoAssetService = Arc<dyn VideoAssetClient>;

#[derive(Debug, Deserialize)]
struct AssetEnvelope {
    data: AssetData,
}

#[derive(Debug, Deserialize)]
struct AssetData {
    id: String,
    #[serde(default)]
    playback_ids: Vec<PlaybackId>,
}

#[derive(Debug, Deserialize)]
struct PlaybackId {
    id: String,
}

fn parse_asset_response(body: &str) -> AppResult<AssetHandle> {
    let envelope: AssetEnvelope = serde_json::from_str(body)
        .map_err(|e| AppError::AssetCreationFailed(format!("unexpected response body: {e}")))?;

    let playback_id = envelope
        .data
        .playback_ids
        .into_iter()
        .next()
        .map(|p| p.id)
        .ok_or_else(|| AppError::AssetCreationFailed("response carried no playback id".into()))?;

    Ok(AssetHandle {
        asset_id: envelope.data.id,
        playback_id,
    })
}

/// Mux Video API client.
#[derive(Clone)]
pub struct MuxClient {
    http: reqwest::Client,
    base_url: String,
    token_id: String,
    token_secret: String,
}

impl MuxClient {
    /// Create a client; `timeout` bounds every request.
    pub fn new(config: &MuxConfig, timeout: Duration) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent("lostsons.tv")
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token_id: config.token_id.clone(),
            token_secret: config.token_secret.clone(),
        })
    }
}

#[async_trait]
impl VideoAssetClient for MuxClient {
    async fn create_asset(&self, source_url: &str, passthrough: &str) -> AppResult<AssetHandle> {
        let response = self
            .http
            .post(format!("{}/video/v1/assets", self.base_url))
            .basic_auth(&self.token_id, Some(&self.token_secret))
            .json(&json!({
                "input": [{ "url": source_url }],
                "playback_policy": ["public"],
                "passthrough": passthrough,
            }))
            .send()
            .await
            .map_err(|e| AppError::AssetCreationFailed(format!("request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::AssetCreationFailed(format!("reading response failed: {e}")))?;

        if !status.is_success() {
            return Err(AppError::AssetCreationFailed(format!(
                "platform answered {status}"
            )));
        }

        let handle = parse_asset_response(&body)?;
        tracing::debug!(asset_id = %handle.asset_id, playback_id = %handle.playback_id, "Created video asset");
        Ok(handle)
    }

    async fn delete_asset(&self, asset_id: &str) -> AppResult<()> {
        let response = self
            .http
            .delete(format!("{}/video/v1/assets/{asset_id}", self.base_url))
            .basic_auth(&self.token_id, Some(&self.token_secret))
            .send()
            .await
            .map_err(|e| AppError::AssetDeletionFailed(format!("request failed: {e}")))?;

        let status = response.status();
        if status.is_success() || status == reqwest::StatusCode::NOT_FOUND {
            tracing::debug!(asset_id = %asset_id, status = %status, "Deleted video asset");
            Ok(())
        } else {
            Err(AppError::AssetDeletionFailed(format!(
                "platform answered {status}"
            )))
        }
    }
}
