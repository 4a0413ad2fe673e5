//! Tagging domain models.

use serde::{Deserialize, Serialize};

use storehouse_core::{EntityKind, TagId, TaggedItemId};

/// A tag label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    /// Unique tag ID.
    pub id: TagId,
    /// Tag label.
    pub label: String,
}

/// Address of a tagged entity: its kind and its id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentRef {
    /// Entity kind (stored as its discriminator).
    pub kind: EntityKind,
    /// Primary key of the target row.
    pub object_id: i32,
}

impl ContentRef {
    /// Create a new content reference.
    #[must_use]
    pub const fn new(kind: EntityKind, object_id: i32) -> Self {
        Self { kind, object_id }
    }
}

impl std::fmt::Display for ContentRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.kind, self.object_id)
    }
}

/// One association row, with its tag already joined in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedItem {
    /// Association row ID.
    pub id: TaggedItemId,
    /// The applied tag.
    pub tag: Tag,
    /// The tagged entity.
    pub content: ContentRef,
}

/// A resolved association target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentObject {
    /// The reference that was resolved.
    pub content: ContentRef,
    /// Display label read from the target's table.
    pub label: String,
}
