//! Application configuration.

use serde::Deserialize;
use std::time::Duration;

use crate::{AppError, AppResult};

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Object storage configuration.
    pub storage: StorageConfig,
    /// Video platform (Mux) configuration.
    pub mux: MuxConfig,
    /// Inbound webhook configuration.
    pub webhook: WebhookConfig,
    /// Clip ingestion limits and policies.
    #[serde(default)]
    pub ingest: IngestConfig,
    /// Outbound notifications.
    #[serde(default)]
    pub notifications: NotificationConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// S3-compatible object storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Regional endpoint (virtual-hosted addressing is used against it).
    #[serde(default = "default_storage_endpoint")]
    pub endpoint: String,
    /// Signing region.
    #[serde(default = "default_storage_region")]
    pub region: String,
    /// Public bucket that receives uploaded clips.
    #[serde(default = "default_storage_bucket")]
    pub bucket: String,
    /// Access key ID.
    pub access_key_id: String,
    /// Secret access key.
    pub secret_access_key: String,
    /// Public URL prefix override for uploaded objects.
    #[serde(default)]
    pub public_url: Option<String>,
    /// Key prefix within the bucket.
    #[serde(default)]
    pub prefix: Option<String>,
}

/// Mux API configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MuxConfig {
    /// Access token ID.
    pub token_id: String,
    /// Access token secret.
    pub token_secret: String,
    /// API base URL.
    #[serde(default = "default_mux_base_url")]
    pub base_url: String,
}

/// Inbound webhook configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookConfig {
    /// Shared secret used by Mux to sign webhook deliveries.
    pub mux_signing_secret: String,
}

/// Clip ingestion configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct IngestConfig {
    /// Maximum accepted multipart body size in bytes.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
    /// Upper bound for each call to object storage or the video platform.
    #[serde(default = "default_upstream_timeout_secs")]
    pub upstream_timeout_secs: u64,
    /// Delete the uploaded object when a later ingestion step fails.
    #[serde(default)]
    pub compensate_uploads: bool,
}

impl IngestConfig {
    /// Timeout applied to each outbound call.
    #[must_use]
    pub const fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: default_max_upload_bytes(),
            upstream_timeout_secs: default_upstream_timeout_secs(),
            compensate_uploads: false,
        }
    }
}

/// Outbound notification configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationConfig {
    /// Discord-compatible webhook URL announcing clips that finished processing.
    #[serde(default)]
    pub discord_webhook_url: Option<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

const fn default_max_connections() -> u32 {
    20
}

const fn default_min_connections() -> u32 {
    2
}

fn default_storage_endpoint() -> String {
    "https://sfo3.digitaloceanspaces.com".to_string()
}

fn default_storage_region() -> String {
    "us-east-1".to_string()
}

fn default_storage_bucket() -> String {
    "lostsonstv".to_string()
}

fn default_mux_base_url() -> String {
    "https://api.mux.com".to_string()
}

/// 45 MiB, the multipart cap of the upload form.
const fn default_max_upload_bytes() -> usize {
    45 << 20
}

const fn default_upstream_timeout_secs() -> u64 {
    60
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `.env` (if present) into the process environment
    /// 2. `config/default.toml`
    /// 3. `config/{environment}.toml` (based on `LOSTSONS_ENV`)
    /// 4. Environment variables with `LOSTSONS__` prefix
    pub fn load() -> AppResult<Self> {
        let _ = dotenvy::dotenv();

        let env = std::env::var("LOSTSONS_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("LOSTSONS")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the server must not start with. The webhook signing
    /// secret must not be blank.
    pub fn validate(&self) -> AppResult<()> {
        if self.webhook.mux_signing_secret.trim().is_empty() {
            return Err(AppError::Config(
                "webhook.mux_signing_secret must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
