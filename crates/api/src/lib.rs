//! HTTP API layer for lostsons.tv.
//!
//! - **Clips**: multipart upload, deletion and catalog reads
//! - **Users / games**: reference entities clips point at
//! - **Webhooks**: signed video platform callbacks
//! - **Health**: liveness of the process and the database
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod response;
pub mod state;

pub use endpoints::router;
pub use state::AppState;
