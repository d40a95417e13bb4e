//! Clip entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One uploaded video hosted by the video platform.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "clips")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Playback ID issued by the video platform.
    #[sea_orm(unique)]
    pub playback_id: String,

    /// Asset ID issued by the video platform.
    #[sea_orm(unique)]
    pub asset_id: String,

    /// Correlation token handed to the video platform at asset creation.
    #[sea_orm(unique)]
    pub upload_id: String,

    pub date_uploaded: DateTimeWithTimeZone,

    /// Uploader.
    pub user_id: String,

    pub game_id: String,

    pub description: String,

    /// Set once the "asset ready" notification has been reconciled.
    #[sea_orm(nullable)]
    pub ready_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
    #[sea_orm(
        belongs_to = "super::game::Entity",
        from = "Column::GameId",
        to = "super::game::Column::Id"
    )]
    Game,
    #[sea_orm(has_many = "super::clip_tag::Entity")]
    ClipTags,
    #[sea_orm(has_many = "super::clip_user::Entity")]
    ClipUsers,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::game::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Game.def()
    }
}

impl Related<super::tag::Entity> for Entity {
    fn to() -> RelationDef {
        super::clip_tag::Relation::Tag.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::clip_tag::Relation::Clip.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
