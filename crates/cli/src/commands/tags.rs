//! Tag commands.
//!
//! # Usage
//!
//! ```bash
//! storehouse tags show product 5
//! storehouse tags add order 2 priority
//! storehouse tags remove order 2 priority
//! ```
//!
//! The kind is an entity model name (`product`, `orderitem`) or its stored
//! discriminator (`store.product`).

use serde::Serialize;
use thiserror::Error;

use storehouse_core::{EntityKind, UnknownEntityKind};
use storehouse_store::{AdminError, AdminSite};
use storehouse_tags::{ContentRef, TagError, TagRepository};

/// Errors from tag commands.
#[derive(Debug, Error)]
pub enum TagCommandError {
    /// Kind argument did not name an entity.
    #[error(transparent)]
    Kind(#[from] UnknownEntityKind),

    /// The tagged object does not exist.
    #[error("No such object: {0}")]
    MissingTarget(ContentRef),

    /// The object does not carry that tag.
    #[error("{target} is not tagged '{label}'")]
    NotTagged { target: ContentRef, label: String },

    /// Lookup through the admin site failed.
    #[error(transparent)]
    Admin(#[from] AdminError),

    /// Tag repository error.
    #[error(transparent)]
    Tags(#[from] TagError),
}

/// An object and the labels of its tags.
#[derive(Debug, Serialize)]
pub struct TagView {
    /// The tagged object.
    pub target: ContentRef,
    /// Its display label, if it still exists.
    pub label: Option<String>,
    /// Tag labels, alphabetical.
    pub tags: Vec<String>,
}

fn target(kind: &str, id: i32) -> Result<ContentRef, UnknownEntityKind> {
    Ok(ContentRef::new(kind.parse::<EntityKind>()?, id))
}

async fn view(site: &AdminSite, target: ContentRef) -> Result<TagView, TagCommandError> {
    let label = site.resolve(target).await?.map(|object| object.label);
    let tags = TagRepository::new(site.pool())
        .tags_for(target)
        .await?
        .into_iter()
        .map(|item| item.tag.label)
        .collect();

    Ok(TagView {
        target,
        label,
        tags,
    })
}

/// Tags on an object. An object that no longer exists still lists the tags
/// pointing at it.
///
/// # Errors
///
/// Returns `TagCommandError::Kind` for an unknown kind.
pub async fn show(site: &AdminSite, kind: &str, id: i32) -> Result<TagView, TagCommandError> {
    view(site, target(kind, id)?).await
}

/// Tag an object, creating the tag if needed.
///
/// # Errors
///
/// Returns `TagCommandError::MissingTarget` if the object does not exist and
/// `TagCommandError::Tags` for an invalid label.
pub async fn add(
    site: &AdminSite,
    kind: &str,
    id: i32,
    label: &str,
) -> Result<TagView, TagCommandError> {
    let target = target(kind, id)?;
    if site.resolve(target).await?.is_none() {
        return Err(TagCommandError::MissingTarget(target));
    }

    let tags = TagRepository::new(site.pool());
    let tag = tags.get_or_create_tag(label).await?;
    tags.tag(target, tag.id).await?;
    tracing::info!(%target, tag = %tag.label, "tagged");

    view(site, target).await
}

/// Remove a tag from an object.
///
/// # Errors
///
/// Returns `TagCommandError::NotTagged` if the object does not carry the tag.
pub async fn remove(
    site: &AdminSite,
    kind: &str,
    id: i32,
    label: &str,
) -> Result<TagView, TagCommandError> {
    let target = target(kind, id)?;
    let tags = TagRepository::new(site.pool());

    let existing = tags
        .tags_for(target)
        .await?
        .into_iter()
        .find(|item| item.tag.label.eq_ignore_ascii_case(label.trim()))
        .ok_or_else(|| TagCommandError::NotTagged {
            target,
            label: label.to_owned(),
        })?;
    tags.untag(target, existing.tag.id).await?;
    tracing::info!(%target, tag = %existing.tag.label, "untagged");

    view(site, target).await
}
