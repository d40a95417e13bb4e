//! Common utilities and shared types for lostsons.tv.
//!
//! This crate provides foundational components used across all lostsons crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **ID Generation**: ULID-based identifiers and correlation tokens via [`IdGenerator`]
//! - **Storage**: Object storage for uploaded clips (S3-compatible)
//! - **Webhook signatures**: Verification of signed video-platform callbacks
//!
//! # Example
//!
//! ```no_run
//! use lostsons_common::{Config, IdGenerator, AppResult};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     let id_gen = IdGenerator::new();
//!     let id = id_gen.generate();
//!     println!("Listening on {}:{} (next id {id})", config.server.host, config.server.port);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod id;
pub mod storage;
pub mod webhook_signature;

pub use config::Config;
pub use error::{AppError, AppResult, Compensation};
pub use id::IdGenerator;
#[cfg(feature = "s3")]
pub use storage::S3Storage;
pub use storage::{StorageBackend, StorageService, UploadedObject, generate_clip_key};
pub use webhook_signature::{SIGNATURE_HEADER, SignatureHeader, SignatureVerifier};
