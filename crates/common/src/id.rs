//! ID generation utilities.

use ulid::Ulid;
use uuid::Uuid;

/// ID generator for catalog rows and upload correlation tokens.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    _private: (),
}

impl IdGenerator {
    /// Create a new ID generator.
    #[must_use]
    pub const fn new() -> Self {
        Self { _private: () }
    }

    /// Generate a new ULID-based ID.
    ///
    /// ULIDs are lexicographically sortable and fit the 128-character
    /// `varchar` primary keys of the catalog.
    #[must_use]
    pub fn generate(&self) -> String {
        Ulid::new().to_string().to_lowercase()
    }

    /// Generate an upload correlation token.
    ///
    /// The token is handed to the video platform and comes back on the
    /// asynchronous "ready" notification, so it carries no time component.
    #[must_use]
    pub fn generate_token(&self) -> String {
        Uuid::new_v4().simple().to_string()
    }
}
