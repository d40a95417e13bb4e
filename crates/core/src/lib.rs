//! Core business logic for lostsons.tv: clip ingestion, deletion and
//! webhook reconciliation.

pub mod services;

pub use services::*;
