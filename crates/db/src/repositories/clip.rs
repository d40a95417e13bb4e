//! Clip catalog repository.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use lostsons_common::{AppError, AppResult, IdGenerator};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbBackend, DbErr, EntityTrait,
    FromQueryResult, QueryFilter, Set, Statement, TransactionTrait,
    prelude::DateTimeWithTimeZone,
    sea_query::{Expr, OnConflict},
};
use serde::Serialize;

use crate::entities::{
    Clip, ClipTag, ClipUser, Game, Tag, User, clip, clip_tag, clip_user, game, tag, user,
};

/// Everything needed to catalog a clip once the video platform accepted it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipDraft {
    /// Playback ID returned by asset creation.
    pub playback_id: String,
    /// Asset ID returned by asset creation.
    pub asset_id: String,
    /// Correlation token sent along with asset creation.
    pub upload_id: String,
    /// Uploader's username.
    pub username: String,
    /// Game name.
    pub game: String,
    /// Free-text description.
    pub description: String,
    /// Trimmed, deduplicated, non-empty tag names.
    pub tags: Vec<String>,
    /// Trimmed, deduplicated usernames featured in the clip.
    pub featured_users: Vec<String>,
}

/// A clip joined with its tags, users and game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClipView {
    /// Clip ID.
    pub id: String,
    /// Playback ID.
    pub playback_id: String,
    /// Asset ID.
    pub asset_id: String,
    /// Correlation token.
    pub upload_id: String,
    /// Creation time.
    pub date_uploaded: DateTimeWithTimeZone,
    /// Description.
    pub description: String,
    /// Tag names.
    pub tags: Vec<String>,
    /// Featured usernames, excluding the uploader.
    pub featured_users: Vec<String>,
    /// Game name.
    pub game: String,
    /// Uploader's username.
    pub uploader: String,
    /// Whether the video platform reported the asset as ready.
    pub ready: bool,
}

#[derive(Debug, FromQueryResult)]
struct ClipRow {
    id: String,
    playback_id: String,
    asset_id: String,
    upload_id: String,
    date_uploaded: DateTimeWithTimeZone,
    description: String,
    ready_at: Option<DateTimeWithTimeZone>,
    game: String,
    uploader: String,
    tags: String,
    featured_users: String,
}

impl From<ClipRow> for ClipView {
    fn from(row: ClipRow) -> Self {
        Self {
            id: row.id,
            playback_id: row.playback_id,
            asset_id: row.asset_id,
            upload_id: row.upload_id,
            date_uploaded: row.date_uploaded,
            description: row.description,
            tags: split_aggregate(&row.tags),
            featured_users: split_aggregate(&row.featured_users),
            game: row.game,
            uploader: row.uploader,
            ready: row.ready_at.is_some(),
        }
    }
}

/// Split a `string_agg(.., ',')` column. Aggregation order is unspecified,
/// so the result is sorted.
fn split_aggregate(value: &str) -> Vec<String> {
    let mut items: Vec<String> = value
        .split(',')
        .filter(|item| !item.is_empty())
        .map(ToString::to_string)
        .collect();
    items.sort();
    items
}

const CLIP_VIEW_SELECT: &str = r"
SELECT c.id, c.playback_id, c.asset_id, c.upload_id, c.date_uploaded, c.description, c.ready_at,
       g.name AS game,
       u.username AS uploader,
       COALESCE((SELECT string_agg(t.tag_name, ',')
                 FROM clips_tags ct JOIN tags t ON t.id = ct.tag_id
                 WHERE ct.clip_id = c.id), '') AS tags,
       COALESCE((SELECT string_agg(fu.username, ',')
                 FROM clips_users cu JOIN users fu ON fu.id = cu.user_id
                 WHERE cu.clip_id = c.id AND cu.user_id <> c.user_id), '') AS featured_users
FROM clips c
JOIN games g ON g.id = c.game_id
JOIN users u ON u.id = c.user_id
";

fn db_err(e: DbErr) -> AppError {
    AppError::Database(e.to_string())
}

/// Repository for the clip catalog.
#[derive(Clone)]
pub struct ClipRepository {
    db: Arc<DatabaseConnection>,
    id_gen: IdGenerator,
}

impl ClipRepository {
    /// Create a new clip repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            db,
            id_gen: IdGenerator::new(),
        }
    }

    /// Catalog a clip with its tags and user links in one transaction.
    ///
    /// The uploader, the game and every featured user must already exist.
    /// Tags are upserted by name. Nothing is written unless every step
    /// succeeds.
    pub async fn create_clip(&self, draft: ClipDraft) -> AppResult<ClipView> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let mut usernames = Vec::with_capacity(draft.featured_users.len() + 1);
        usernames.push(draft.username.clone());
        usernames.extend(draft.featured_users.iter().cloned());

        let user_ids: HashMap<String, String> = User::find()
            .filter(user::Column::Username.is_in(usernames))
            .all(&txn)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(|u| (u.username, u.id))
            .collect();

        let uploader_id = user_ids
            .get(&draft.username)
            .cloned()
            .ok_or_else(|| AppError::ReferenceNotFound {
                field: "username",
                value: draft.username.clone(),
            })?;

        let mut featured_ids: Vec<String> = Vec::with_capacity(draft.featured_users.len());
        let mut featured_names: Vec<String> = Vec::with_capacity(draft.featured_users.len());
        for name in &draft.featured_users {
            let id = user_ids
                .get(name)
                .ok_or_else(|| AppError::ReferenceNotFound {
                    field: "featured_users",
                    value: name.clone(),
                })?;
            if *id != uploader_id && !featured_ids.contains(id) {
                featured_ids.push(id.clone());
                featured_names.push(name.clone());
            }
        }

        let game = Game::find()
            .filter(game::Column::Name.eq(&draft.game))
            .one(&txn)
            .await
            .map_err(db_err)?
            .ok_or_else(|| AppError::ReferenceNotFound {
                field: "game",
                value: draft.game.clone(),
            })?;

        let clip = clip::ActiveModel {
            id: Set(self.id_gen.generate()),
            playback_id: Set(draft.playback_id),
            asset_id: Set(draft.asset_id),
            upload_id: Set(draft.upload_id),
            date_uploaded: Set(Utc::now().into()),
            user_id: Set(uploader_id.clone()),
            game_id: Set(game.id),
            description: Set(draft.description),
            ready_at: Set(None),
        }
        .insert(&txn)
        .await
        .map_err(db_err)?;

        let mut tag_ids: Vec<String> = Vec::with_capacity(draft.tags.len());
        for name in &draft.tags {
            let tag = Tag::insert(tag::ActiveModel {
                id: Set(self.id_gen.generate()),
                tag_name: Set(name.clone()),
            })
            .on_conflict(
                OnConflict::column(tag::Column::TagName)
                    .update_column(tag::Column::TagName)
                    .to_owned(),
            )
            .exec_with_returning(&txn)
            .await
            .map_err(db_err)?;

            if !tag_ids.contains(&tag.id) {
                tag_ids.push(tag.id);
            }
        }

        if !tag_ids.is_empty() {
            ClipTag::insert_many(tag_ids.iter().map(|tag_id| clip_tag::ActiveModel {
                clip_id: Set(clip.id.clone()),
                tag_id: Set(tag_id.clone()),
            }))
            .exec_without_returning(&txn)
            .await
            .map_err(db_err)?;
        }

        let user_links = std::iter::once(&uploader_id)
            .chain(featured_ids.iter())
            .map(|user_id| clip_user::ActiveModel {
                clip_id: Set(clip.id.clone()),
                user_id: Set(user_id.clone()),
            });
        ClipUser::insert_many(user_links)
            .exec_without_returning(&txn)
            .await
            .map_err(db_err)?;

        txn.commit().await.map_err(db_err)?;

        tracing::debug!(clip_id = %clip.id, upload_id = %clip.upload_id, "Cataloged clip");

        Ok(ClipView {
            id: clip.id,
            playback_id: clip.playback_id,
            asset_id: clip.asset_id,
            upload_id: clip.upload_id,
            date_uploaded: clip.date_uploaded,
            description: clip.description,
            tags: draft.tags,
            featured_users: featured_names,
            game: game.name,
            uploader: draft.username,
            ready: clip.ready_at.is_some(),
        })
    }

    /// Delete a clip and its link rows in one transaction.
    ///
    /// Links go first so no foreign key is ever violated. Returns whether a
    /// clip row was removed.
    pub async fn delete_clip(&self, id: &str) -> AppResult<bool> {
        let txn = self.db.begin().await.map_err(db_err)?;

        ClipTag::delete_many()
            .filter(clip_tag::Column::ClipId.eq(id))
            .exec(&txn)
            .await
            .map_err(db_err)?;

        ClipUser::delete_many()
            .filter(clip_user::Column::ClipId.eq(id))
            .exec(&txn)
            .await
            .map_err(db_err)?;

        let result = Clip::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(db_err)?;

        txn.commit().await.map_err(db_err)?;

        Ok(result.rows_affected > 0)
    }

    /// Find a clip view by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<ClipView>> {
        let row = ClipRow::find_by_statement(Statement::from_sql_and_values(
            DbBackend::Postgres,
            format!("{CLIP_VIEW_SELECT} WHERE c.id = $1"),
            [id.into()],
        ))
        .one(self.db.as_ref())
        .await
        .map_err(db_err)?;

        Ok(row.map(ClipView::from))
    }

    /// List clip views, newest first.
    pub async fn list(&self, limit: u64, offset: u64) -> AppResult<Vec<ClipView>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let offset = i64::try_from(offset).unwrap_or(i64::MAX);

        let rows = ClipRow::find_by_statement(Statement::from_sql_and_values(
            DbBackend::Postgres,
            format!("{CLIP_VIEW_SELECT} ORDER BY c.date_uploaded DESC, c.id DESC LIMIT $1 OFFSET $2"),
            [limit.into(), offset.into()],
        ))
        .all(self.db.as_ref())
        .await
        .map_err(db_err)?;

        Ok(rows.into_iter().map(ClipView::from).collect())
    }

    /// Record the playback ID reported by the "asset ready" notification.
    ///
    /// Only a clip that has not been marked ready yet is patched, so a
    /// replayed notification changes nothing. Returns the number of rows
    /// updated.
    pub async fn mark_ready(&self, upload_id: &str, playback_id: &str) -> AppResult<u64> {
        let result = Clip::update_many()
            .col_expr(clip::Column::PlaybackId, Expr::value(playback_id))
            .col_expr(clip::Column::ReadyAt, Expr::current_timestamp().into())
            .filter(clip::Column::UploadId.eq(upload_id))
            .filter(clip::Column::ReadyAt.is_null())
            .exec(self.db.as_ref())
            .await
            .map_err(db_err)?;

        Ok(result.rows_affected)
    }
}
