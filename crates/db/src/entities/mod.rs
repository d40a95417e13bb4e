//! Database entities.

pub mod clip;
pub mod clip_tag;
pub mod clip_user;
pub mod game;
pub mod tag;
pub mod user;

pub use clip::Entity as Clip;
pub use clip_tag::Entity as ClipTag;
pub use clip_user::Entity as ClipUser;
pub use game::Entity as Game;
pub use tag::Entity as Tag;
pub use user::Entity as User;
