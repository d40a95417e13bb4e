//! Chat notifications for clips that finished processing.

use std::time::Duration;

use lostsons_common::{AppError, AppResult};
use serde_json::json;

/// Posts short messages to a Discord-compatible webhook.
#[derive(Clone)]
pub struct DiscordNotifier {
    http: reqwest::Client,
    url: String,
}

impl DiscordNotifier {
    /// Create a notifier posting to `url`.
    pub fn new(url: impl Into<String>) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            http,
            url: url.into(),
        })
    }

    /// Announce that a clip is ready to play.
    pub async fn clip_ready(&self, playback_id: &str) -> AppResult<()> {
        let response = self
            .http
            .post(&self.url)
            .json(&json!({
                "username": "lostsons.tv",
                "content": format!("New clip ready\nPlaybackID: {playback_id}"),
            }))
            .send()
            .await
            .map_err(|e| AppError::Internal(format!("Notification request failed: {e}")))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(AppError::Internal(format!(
                "Notification rejected with {}",
                response.status()
            )))
        }
    }
}
