//! Database operations for tags and tagged items.
//!
//! # Tables
//!
//! - `tags_tag` - tag labels
//! - `tags_taggeditem` - `(tag_id, content_type, object_id)` associations
//!
//! # Migrations
//!
//! Migrations are stored in `crates/tags/migrations/` and embedded at compile
//! time. They share the `_sqlx_migrations` table with the store crate, so the
//! migrator ignores versions it does not own.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::instrument;

use storehouse_core::{EntityKind, TagId, TaggedItemId};

use crate::content_type::ContentTypeRegistry;
use crate::error::TagError;
use crate::models::{ContentObject, ContentRef, Tag, TaggedItem};
use crate::taggable::Taggable;

/// Maximum length of a tag label.
pub const MAX_LABEL_LENGTH: usize = 255;

/// Apply the tags migrations.
///
/// # Errors
///
/// Returns `TagError::Migration` if a migration fails to apply.
pub async fn migrate(pool: &SqlitePool) -> Result<(), TagError> {
    let mut migrator = sqlx::migrate!("./migrations");
    migrator.set_ignore_missing(true);
    migrator.run(pool).await?;
    Ok(())
}

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct TagRow {
    id: i32,
    label: String,
}

impl From<TagRow> for Tag {
    fn from(row: TagRow) -> Self {
        Self {
            id: TagId::new(row.id),
            label: row.label,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct TaggedItemRow {
    id: i32,
    tag_id: i32,
    label: String,
    content_type: String,
    object_id: i32,
}

impl TryFrom<TaggedItemRow> for TaggedItem {
    type Error = TagError;

    fn try_from(row: TaggedItemRow) -> Result<Self, Self::Error> {
        let kind = EntityKind::from_discriminator(&row.content_type)
            .map_err(|e| TagError::DataCorruption(e.to_string()))?;

        Ok(Self {
            id: TaggedItemId::new(row.id),
            tag: Tag {
                id: TagId::new(row.tag_id),
                label: row.label,
            },
            content: ContentRef::new(kind, row.object_id),
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ContentRefRow {
    content_type: String,
    object_id: i32,
}

impl TryFrom<ContentRefRow> for ContentRef {
    type Error = TagError;

    fn try_from(row: ContentRefRow) -> Result<Self, Self::Error> {
        let kind = EntityKind::from_discriminator(&row.content_type)
            .map_err(|e| TagError::DataCorruption(e.to_string()))?;
        Ok(Self::new(kind, row.object_id))
    }
}

/// Association rows with the tag joined in, so one query answers a lookup.
const SELECT_TAGGED: &str = r"
    SELECT ti.id, ti.tag_id, t.label, ti.content_type, ti.object_id
    FROM tags_taggeditem ti
    INNER JOIN tags_tag t ON t.id = ti.tag_id
";

fn normalize_label(label: &str) -> Result<&str, TagError> {
    let label = label.trim();
    if label.is_empty() {
        return Err(TagError::Invalid("tag label cannot be empty".to_owned()));
    }
    if label.chars().count() > MAX_LABEL_LENGTH {
        return Err(TagError::Invalid(format!(
            "tag label must be at most {MAX_LABEL_LENGTH} characters"
        )));
    }
    Ok(label)
}

fn check_target(target: ContentRef) -> Result<(), TagError> {
    if target.object_id < 0 {
        return Err(TagError::Invalid(format!(
            "object id must be non-negative (got {})",
            target.object_id
        )));
    }
    Ok(())
}

fn map_fk_error(e: sqlx::Error) -> TagError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_foreign_key_violation()
    {
        return TagError::NotFound;
    }
    TagError::Database(e)
}

async fn get_or_create_in(conn: &mut SqliteConnection, label: &str) -> Result<Tag, TagError> {
    let label = normalize_label(label)?;

    let existing = sqlx::query_as::<_, TagRow>(
        "SELECT id, label FROM tags_tag WHERE label = ? ORDER BY id LIMIT 1",
    )
    .bind(label)
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(row) = existing {
        return Ok(row.into());
    }

    let row = sqlx::query_as::<_, TagRow>("INSERT INTO tags_tag (label) VALUES (?) RETURNING id, label")
        .bind(label)
        .fetch_one(&mut *conn)
        .await?;

    Ok(row.into())
}

async fn tag_in(
    conn: &mut SqliteConnection,
    target: ContentRef,
    tag_id: TagId,
) -> Result<TaggedItem, TagError> {
    check_target(target)?;

    sqlx::query(
        r"
        INSERT INTO tags_taggeditem (tag_id, content_type, object_id)
        VALUES (?, ?, ?)
        ON CONFLICT (tag_id, content_type, object_id) DO NOTHING
        ",
    )
    .bind(tag_id.as_i32())
    .bind(target.kind.discriminator())
    .bind(target.object_id)
    .execute(&mut *conn)
    .await
    .map_err(map_fk_error)?;

    let row = sqlx::query_as::<_, TaggedItemRow>(&format!(
        "{SELECT_TAGGED} WHERE ti.tag_id = ? AND ti.content_type = ? AND ti.object_id = ?"
    ))
    .bind(tag_id.as_i32())
    .bind(target.kind.discriminator())
    .bind(target.object_id)
    .fetch_one(&mut *conn)
    .await?;

    row.try_into()
}

async fn tags_for_in(
    conn: &mut SqliteConnection,
    target: ContentRef,
) -> Result<Vec<TaggedItem>, TagError> {
    let rows = sqlx::query_as::<_, TaggedItemRow>(&format!(
        "{SELECT_TAGGED} WHERE ti.content_type = ? AND ti.object_id = ? ORDER BY t.label, ti.id"
    ))
    .bind(target.kind.discriminator())
    .bind(target.object_id)
    .fetch_all(&mut *conn)
    .await?;

    rows.into_iter().map(TryInto::try_into).collect()
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for tag database operations.
pub struct TagRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> TagRepository<'a> {
    /// Create a new tag repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a tag.
    ///
    /// # Errors
    ///
    /// Returns `TagError::Invalid` for an empty or over-long label.
    #[instrument(skip(self))]
    pub async fn create_tag(&self, label: &str) -> Result<Tag, TagError> {
        let label = normalize_label(label)?;
        let row = sqlx::query_as::<_, TagRow>(
            "INSERT INTO tags_tag (label) VALUES (?) RETURNING id, label",
        )
        .bind(label)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Get the tag with this label, creating it if missing.
    ///
    /// # Errors
    ///
    /// Returns `TagError::Invalid` for an empty or over-long label.
    #[instrument(skip(self))]
    pub async fn get_or_create_tag(&self, label: &str) -> Result<Tag, TagError> {
        let mut conn = self.pool.acquire().await?;
        get_or_create_in(&mut *conn, label).await
    }

    /// List all tags with the number of objects carrying each.
    ///
    /// # Errors
    ///
    /// Returns `TagError::Database` if the query fails.
    pub async fn list_tags(&self) -> Result<Vec<(Tag, i64)>, TagError> {
        let rows: Vec<(i32, String, i64)> = sqlx::query_as(
            r"
            SELECT t.id, t.label, COUNT(ti.id) AS usage
            FROM tags_tag t
            LEFT JOIN tags_taggeditem ti ON ti.tag_id = t.id
            GROUP BY t.id, t.label
            ORDER BY t.label, t.id
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, label, usage)| {
                (
                    Tag {
                        id: TagId::new(id),
                        label,
                    },
                    usage,
                )
            })
            .collect())
    }

    /// Delete a tag and, through the cascade, every association using it.
    ///
    /// # Errors
    ///
    /// Returns `TagError::NotFound` if the tag doesn't exist.
    #[instrument(skip(self))]
    pub async fn delete_tag(&self, id: TagId) -> Result<(), TagError> {
        let result = sqlx::query("DELETE FROM tags_tag WHERE id = ?")
            .bind(id.as_i32())
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(TagError::NotFound);
        }
        Ok(())
    }

    /// Attach a tag to a target. Attaching the same tag twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `TagError::NotFound` if the tag doesn't exist.
    /// Returns `TagError::Invalid` for a negative object id.
    #[instrument(skip(self))]
    pub async fn tag(&self, target: ContentRef, tag_id: TagId) -> Result<TaggedItem, TagError> {
        let mut conn = self.pool.acquire().await?;
        tag_in(&mut *conn, target, tag_id).await
    }

    /// Detach a tag from a target. Returns whether an association existed.
    ///
    /// # Errors
    ///
    /// Returns `TagError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn untag(&self, target: ContentRef, tag_id: TagId) -> Result<bool, TagError> {
        let result = sqlx::query(
            "DELETE FROM tags_taggeditem WHERE tag_id = ? AND content_type = ? AND object_id = ?",
        )
        .bind(tag_id.as_i32())
        .bind(target.kind.discriminator())
        .bind(target.object_id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// All tags attached to a target, ordered by label.
    ///
    /// A target with no associations yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns `TagError::DataCorruption` if a stored discriminator is unknown.
    #[instrument(skip(self))]
    pub async fn tags_for(&self, target: ContentRef) -> Result<Vec<TaggedItem>, TagError> {
        let mut conn = self.pool.acquire().await?;
        tags_for_in(&mut *conn, target).await
    }

    /// All tags attached to an entity instance.
    ///
    /// # Errors
    ///
    /// Returns `TagError::DataCorruption` if a stored discriminator is unknown.
    pub async fn tags_for_object<T: Taggable + Sync>(
        &self,
        object: &T,
    ) -> Result<Vec<TaggedItem>, TagError> {
        self.tags_for(object.content_ref()).await
    }

    /// Replace the full tag set of a target with the given labels.
    ///
    /// Missing tags are created. Runs in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `TagError::Invalid` if any label is empty or too long; nothing
    /// is changed in that case.
    #[instrument(skip(self, labels), fields(count = labels.len()))]
    pub async fn replace_tags(
        &self,
        target: ContentRef,
        labels: &[String],
    ) -> Result<Vec<TaggedItem>, TagError> {
        check_target(target)?;
        for label in labels {
            normalize_label(label)?;
        }

        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM tags_taggeditem WHERE content_type = ? AND object_id = ?")
            .bind(target.kind.discriminator())
            .bind(target.object_id)
            .execute(&mut *tx)
            .await?;

        for label in labels {
            let tag = get_or_create_in(&mut *tx, label).await?;
            tag_in(&mut *tx, target, tag.id).await?;
        }

        let items = tags_for_in(&mut *tx, target).await?;
        tx.commit().await?;

        Ok(items)
    }

    /// Every target carrying a tag.
    ///
    /// # Errors
    ///
    /// Returns `TagError::DataCorruption` if a stored discriminator is unknown.
    pub async fn objects_tagged(&self, tag_id: TagId) -> Result<Vec<ContentRef>, TagError> {
        let rows = sqlx::query_as::<_, ContentRefRow>(
            r"
            SELECT content_type, object_id
            FROM tags_taggeditem
            WHERE tag_id = ?
            ORDER BY content_type, object_id
            ",
        )
        .bind(tag_id.as_i32())
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Resolve a reference to its target row through the registry.
    ///
    /// Returns `None` when the kind is not registered or the row no longer
    /// exists.
    ///
    /// # Errors
    ///
    /// Returns `TagError::Database` if the lookup query fails.
    pub async fn resolve(
        &self,
        registry: &ContentTypeRegistry,
        target: ContentRef,
    ) -> Result<Option<ContentObject>, TagError> {
        let Some(info) = registry.get(target.kind) else {
            tracing::debug!(kind = %target.kind, "content type not registered");
            return Ok(None);
        };

        let label: Option<Option<String>> = sqlx::query_scalar(&info.label_query())
            .bind(target.object_id)
            .fetch_optional(self.pool)
            .await?;

        Ok(label.map(|label| ContentObject {
            content: target,
            label: label.unwrap_or_default(),
        }))
    }
}
