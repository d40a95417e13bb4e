//! Tag entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tags")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Label, at most 20 characters.
    #[sea_orm(unique)]
    pub tag_name: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::clip_tag::Entity")]
    ClipTags,
}

impl Related<super::clip_tag::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ClipTags.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
