//! Reconciliation of video platform webhooks.

use lostsons_common::{AppError, AppResult, SignatureVerifier};
use lostsons_db::repositories::ClipRepository;
use serde::Deserialize;

use super::notifier::DiscordNotifier;

/// Event type announcing that an asset finished processing.
pub const ASSET_READY: &str = "video.asset.ready";

/// Webhook envelope; only the fields needed for reconciliation.
#[derive(Debug, Deserialize)]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub data: AssetEventData,
}

#[derive(Debug, Default, Deserialize)]
pub struct AssetEventData {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub passthrough: Option<String>,
    #[serde(default)]
    pub upload_id: Option<String>,
    #[serde(default)]
    pub playback_ids: Vec<PlaybackIdRef>,
}

#[derive(Debug, Deserialize)]
pub struct PlaybackIdRef {
    pub id: String,
}

impl AssetEventData {
    /// Correlation token: `passthrough` as set at asset creation, else the
    /// direct-upload ID.
    fn correlation(&self) -> Option<&str> {
        [self.passthrough.as_deref(), self.upload_id.as_deref()]
            .into_iter()
            .flatten()
            .find(|value| !value.is_empty())
    }
}

/// What a verified webhook led to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// A pending clip received its playback ID.
    Patched { upload_id: String, playback_id: String },
    /// No clip was waiting for this token (unknown, or already reconciled).
    NoPendingClip { upload_id: String },
    /// Not an "asset ready" event.
    Ignored { event_type: String },
    /// A ready event without a correlation token or playback ID.
    Incomplete,
    /// The catalog update failed and was logged.
    UpdateFailed,
}

/// Verifies webhooks and applies "asset ready" events to the catalog.
#[derive(Clone)]
pub struct WebhookReconciler {
    verifier: SignatureVerifier,
    clip_repo: ClipRepository,
    notifier: Option<DiscordNotifier>,
}

impl WebhookReconciler {
    /// Create a new reconciler.
    #[must_use]
    pub const fn new(
        verifier: SignatureVerifier,
        clip_repo: ClipRepository,
        notifier: Option<DiscordNotifier>,
    ) -> Self {
        Self {
            verifier,
            clip_repo,
            notifier,
        }
    }

    /// Handle one webhook delivery.
    ///
    /// Only signature and decoding failures are errors. Catalog failures are
    /// logged and reported as [`ReconcileOutcome::UpdateFailed`] so the sender
    /// does not retry because of them.
    pub async fn handle(&self, signature: Option<&str>, body: &[u8]) -> AppResult<ReconcileOutcome> {
        self.verifier.verify(signature, body).inspect_err(|e| {
            tracing::warn!(error = %e, "Rejected webhook with invalid signature");
        })?;

        let event: WebhookEvent = serde_json::from_slice(body)
            .map_err(|e| AppError::Validation(format!("invalid webhook body: {e}")))?;

        if event.event_type != ASSET_READY {
            tracing::debug!(event_type = %event.event_type, "Ignoring webhook event");
            return Ok(ReconcileOutcome::Ignored {
                event_type: event.event_type,
            });
        }

        let (Some(upload_id), Some(playback)) =
            (event.data.correlation(), event.data.playback_ids.first())
        else {
            tracing::warn!(asset_id = ?event.data.id, "Ready event without correlation token or playback id");
            return Ok(ReconcileOutcome::Incomplete);
        };
        let upload_id = upload_id.to_string();
        let playback_id = playback.id.clone();

        match self.clip_repo.mark_ready(&upload_id, &playback_id).await {
            Ok(0) => {
                tracing::info!(upload_id = %upload_id, "No pending clip for ready event");
                Ok(ReconcileOutcome::NoPendingClip { upload_id })
            }
            Ok(_) => {
                tracing::info!(upload_id = %upload_id, playback_id = %playback_id, "Clip ready");
                self.notify(&playback_id).await;
                Ok(ReconcileOutcome::Patched {
                    upload_id,
                    playback_id,
                })
            }
            Err(e) => {
                tracing::error!(upload_id = %upload_id, error = %e, "Failed to record ready clip");
                Ok(ReconcileOutcome::UpdateFailed)
            }
        }
    }

    async fn notify(&self, playback_id: &str) {
        if let Some(notifier) = &self.notifier {
            if let Err(e) = notifier.clip_ready(playback_id).await {
                tracing::warn!(playback_id = %playback_id, error = %e, "Ready notification failed");
            }
        }
    }
}
