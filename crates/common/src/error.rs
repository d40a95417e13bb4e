//! Error types for lostsons.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;
use thiserror::Error;

/// Application result type.
pub type AppResult<T> = Result<T, AppError>;

/// Outcome of the compensating asset deletion after a failed catalog write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Compensation {
    /// The remote asset was deleted.
    Compensated,
    /// The remote asset could not be deleted; carries the deletion error.
    CompensationFailed(String),
}

impl fmt::Display for Compensation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compensated => f.write_str("video asset removed"),
            Self::CompensationFailed(reason) => {
                write!(f, "video asset could not be removed: {reason}")
            }
        }
    }
}

/// Application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // === Client Errors ===
    #[error("Invalid form: {0}")]
    InvalidForm(String),

    #[error("Unknown {field}: {value}")]
    ReferenceNotFound { field: &'static str, value: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Malformed signature header")]
    MalformedSignatureHeader,

    #[error("Signature mismatch")]
    SignatureMismatch,

    // === Upstream Errors ===
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Asset creation failed: {0}")]
    AssetCreationFailed(String),

    #[error("Asset deletion failed: {0}")]
    AssetDeletionFailed(String),

    #[error("Persist failed ({compensation}): {source}")]
    PersistFailed {
        source: Box<AppError>,
        compensation: Compensation,
    },

    // === Server Errors ===
    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 4xx Client Errors
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidForm(_)
            | Self::ReferenceNotFound { .. }
            | Self::Validation(_)
            | Self::MalformedSignatureHeader
            | Self::SignatureMismatch => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,

            Self::PersistFailed { source, .. } => {
                if source.status_code().is_client_error() {
                    StatusCode::BAD_REQUEST
                } else {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            }

            // 5xx Server Errors
            Self::UploadFailed(_)
            | Self::AssetCreationFailed(_)
            | Self::AssetDeletionFailed(_)
            | Self::Database(_)
            | Self::Config(_)
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the error code used in logs.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidForm(_) => "INVALID_FORM",
            Self::ReferenceNotFound { .. } => "REFERENCE_NOT_FOUND",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Conflict(_) => "CONFLICT",
            Self::MalformedSignatureHeader => "MALFORMED_SIGNATURE_HEADER",
            Self::SignatureMismatch => "SIGNATURE_MISMATCH",
            Self::UploadFailed(_) => "UPLOAD_FAILED",
            Self::AssetCreationFailed(_) => "ASSET_CREATION_FAILED",
            Self::AssetDeletionFailed(_) => "ASSET_DELETION_FAILED",
            Self::PersistFailed { .. } => "PERSIST_FAILED",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns whether this error should be logged at error level.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// Message safe to show to API clients.
    ///
    /// Upstream and server-side causes may embed SDK output or connection
    /// details, so only their kind is exposed.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::UploadFailed(_) => "failed to upload clip to object storage".to_string(),
            Self::AssetCreationFailed(_) => "failed to create video asset".to_string(),
            Self::AssetDeletionFailed(_) => "failed to delete video asset".to_string(),
            Self::PersistFailed {
                source,
                compensation,
            } => {
                let outcome = match compensation {
                    Compensation::Compensated => "video asset removed",
                    Compensation::CompensationFailed(_) => "video asset could not be removed",
                };
                format!("failed to save clip ({outcome}): {}", source.public_message())
            }
            Self::Database(_) | Self::Config(_) | Self::Internal(_) => {
                "internal server error".to_string()
            }
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();

        if self.is_server_error() {
            tracing::error!(error = %self, code = code, "Server error occurred");
        } else {
            tracing::debug!(error = %self, code = code, "Client error occurred");
        }

        let body = Json(json!({ "error": self.public_message() }));

        (status, body).into_response()
    }
}

// === From implementations ===

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors_map_to_4xx() {
        assert_eq!(
            AppError::InvalidForm("missing clip".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::ReferenceNotFound {
                field: "game",
                value: "Quake".into()
            }
            .status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::MalformedSignatureHeader.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::SignatureMismatch.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::NotFound("clip".into()).status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_persist_failed_status_follows_cause() {
        let server = AppError::PersistFailed {
            source: Box::new(AppError::Database("connection reset".into())),
            compensation: Compensation::Compensated,
        };
        assert_eq!(server.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let client = AppError::PersistFailed {
            source: Box::new(AppError::ReferenceNotFound {
                field: "username",
                value: "ghost".into(),
            }),
            compensation: Compensation::CompensationFailed("timeout".into()),
        };
        assert_eq!(client.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_public_message_hides_internals() {
        let err = AppError::Database("postgres://user:hunter2@db/lostsons refused".into());
        assert_eq!(err.public_message(), "internal server error");

        let err = AppError::UploadFailed("dispatch failure: secret key XYZ".into());
        assert!(!err.public_message().contains("XYZ"));

        let err = AppError::PersistFailed {
            source: Box::new(AppError::Database("password=hunter2".into())),
            compensation: Compensation::CompensationFailed("mux said 500".into()),
        };
        let message = err.public_message();
        assert!(message.contains("could not be removed"));
        assert!(!message.contains("hunter2"));
    }

    #[test]
    fn test_reference_not_found_message_names_field() {
        let err = AppError::ReferenceNotFound {
            field: "game",
            value: "Quake".into(),
        };
        assert_eq!(err.public_message(), "Unknown game: Quake");
    }
}
