//! Repository layer for database operations.

mod clip;
mod game;
mod user;

pub use clip::{ClipDraft, ClipRepository, ClipView};
pub use game::GameRepository;
pub use user::UserRepository;
