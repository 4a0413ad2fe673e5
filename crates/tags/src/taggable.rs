//! Taggable trait definition.

use storehouse_core::EntityKind;

use crate::models::ContentRef;

/// Trait for entities that can be tagged.
///
/// Supplies the discriminator and object id needed to address the entity
/// from a `TaggedItem` row.
///
/// # Examples
///
/// ```rust
/// use storehouse_core::EntityKind;
/// use storehouse_tags::Taggable;
///
/// struct Shelf {
///     id: i32,
/// }
///
/// impl Taggable for Shelf {
///     const KIND: EntityKind = EntityKind::Collection;
///
///     fn object_id(&self) -> i32 {
///         self.id
///     }
/// }
///
/// let target = Shelf { id: 3 }.content_ref();
/// assert_eq!(target.object_id, 3);
/// ```
pub trait Taggable {
    /// Kind stored as the association discriminator.
    const KIND: EntityKind;

    /// Primary key of this instance.
    fn object_id(&self) -> i32;

    /// The `(kind, id)` pair addressing this instance.
    fn content_ref(&self) -> ContentRef {
        ContentRef::new(Self::KIND, self.object_id())
    }
}
