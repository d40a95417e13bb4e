//! Create the clip catalog tables.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Users::Id).string_len(128).not_null().primary_key())
                    .col(ColumnDef::new(Users::Username).string_len(35).not_null().unique_key())
                    .col(ColumnDef::new(Users::Email).string_len(60).not_null().unique_key())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Games::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Games::Id).string_len(128).not_null().primary_key())
                    .col(ColumnDef::new(Games::Name).string_len(60).not_null().unique_key())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Clips::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Clips::Id).string_len(128).not_null().primary_key())
                    .col(ColumnDef::new(Clips::PlaybackId).string_len(128).not_null().unique_key())
                    .col(ColumnDef::new(Clips::AssetId).string_len(128).not_null().unique_key())
                    .col(ColumnDef::new(Clips::UploadId).string_len(128).not_null().unique_key())
                    .col(
                        ColumnDef::new(Clips::DateUploaded)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Clips::UserId).string_len(128).not_null())
                    .col(ColumnDef::new(Clips::GameId).string_len(128).not_null())
                    .col(ColumnDef::new(Clips::Description).string_len(120).not_null().default(""))
                    .col(ColumnDef::new(Clips::ReadyAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_clips_user")
                            .from(Clips::Table, Clips::UserId)
                            .to(Users::Table, Users::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_clips_game")
                            .from(Clips::Table, Clips::GameId)
                            .to(Games::Table, Games::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: date_uploaded (for newest-first listing)
        manager
            .create_index(
                Index::create()
                    .name("idx_clips_date_uploaded")
                    .table(Clips::Table)
                    .col(Clips::DateUploaded)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Tags::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Tags::Id).string_len(128).not_null().primary_key())
                    .col(ColumnDef::new(Tags::TagName).string_len(20).not_null().unique_key())
                    .to_owned(),
            )
            .await?;

        // Link rows reference their clip without cascading; deletes clear them first.
        manager
            .create_table(
                Table::create()
                    .table(ClipsTags::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(ClipsTags::ClipId).string_len(128).not_null())
                    .col(ColumnDef::new(ClipsTags::TagId).string_len(128).not_null())
                    .primary_key(Index::create().col(ClipsTags::ClipId).col(ClipsTags::TagId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_clips_tags_clip")
                            .from(ClipsTags::Table, ClipsTags::ClipId)
                            .to(Clips::Table, Clips::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_clips_tags_tag")
                            .from(ClipsTags::Table, ClipsTags::TagId)
                            .to(Tags::Table, Tags::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ClipsUsers::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(ClipsUsers::ClipId).string_len(128).not_null())
                    .col(ColumnDef::new(ClipsUsers::UserId).string_len(128).not_null())
                    .primary_key(Index::create().col(ClipsUsers::ClipId).col(ClipsUsers::UserId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_clips_users_clip")
                            .from(ClipsUsers::Table, ClipsUsers::ClipId)
                            .to(Clips::Table, Clips::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_clips_users_user")
                            .from(ClipsUsers::Table, ClipsUsers::UserId)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: user_id (for finding clips a user appears in)
        manager
            .create_index(
                Index::create()
                    .name("idx_clips_users_user_id")
                    .table(ClipsUsers::Table)
                    .col(ClipsUsers::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ClipsUsers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ClipsTags::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Tags::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Clips::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Games::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Users {
    Table,
    Id,
    Username,
    Email,
}

#[derive(Iden)]
enum Games {
    Table,
    Id,
    Name,
}

#[derive(Iden)]
enum Clips {
    Table,
    Id,
    PlaybackId,
    AssetId,
    UploadId,
    DateUploaded,
    UserId,
    GameId,
    Description,
    ReadyAt,
}

#[derive(Iden)]
enum Tags {
    Table,
    Id,
    TagName,
}

#[derive(Iden)]
enum ClipsTags {
    Table,
    ClipId,
    TagId,
}

#[derive(Iden)]
enum ClipsUsers {
    Table,
    ClipId,
    UserId,
}
