//! Business logic services.

#![allow(missing_docs)]

pub mod game;
pub mod ingestion;
pub mod notifier;
pub mod user;
pub mod video_asset;
pub mod webhook;

pub use game::{CreateGameInput, GameService};
pub use ingestion::{ClipFile, ClipService, CreateClipInput, IngestState, MAX_TAG_LEN};
pub use notifier::DiscordNotifier;
pub use user::{CreateUserInput, UserService};
pub use video_asset::{AssetHandle, MuxClient, VideoAssetClient, VideoAssetService};
pub use webhook::{ReconcileOutcome, WebhookReconciler};
