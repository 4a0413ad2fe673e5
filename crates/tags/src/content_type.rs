//! Lookup table from entity kind to the table that stores it.
//!
//! The tags crate cannot name the entity types it tags. Instead, the crate that
//! owns those entities registers, per [`EntityKind`], the table and the SQL
//! expression used as a display label. Resolution of a [`ContentRef`] then
//! becomes a plain table lookup, with no reflection involved.
//!
//! [`ContentRef`]: crate::ContentRef

use std::collections::HashMap;

use storehouse_core::EntityKind;

/// Where a kind lives and how to label its rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentTypeInfo {
    /// Table name.
    pub table: &'static str,
    /// SQL expression over the table's columns producing a display label.
    ///
    /// Only trusted, compile-time strings are accepted here; the expression is
    /// interpolated into the lookup query.
    pub label_expr: &'static str,
}

impl ContentTypeInfo {
    /// Create a new content type entry.
    #[must_use]
    pub const fn new(table: &'static str, label_expr: &'static str) -> Self {
        Self { table, label_expr }
    }

    /// Query selecting the label of one row by id.
    pub(crate) fn label_query(&self) -> String {
        format!(
            "SELECT CAST({} AS TEXT) AS label FROM {} WHERE id = ?",
            self.label_expr, self.table
        )
    }
}

/// Registry of entity kinds that can be resolved.
#[derive(Debug, Clone, Default)]
pub struct ContentTypeRegistry {
    entries: HashMap<EntityKind, ContentTypeInfo>,
}

impl ContentTypeRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a kind, replacing any earlier entry.
    #[must_use]
    pub fn register(mut self, kind: EntityKind, info: ContentTypeInfo) -> Self {
        self.entries.insert(kind, info);
        self
    }

    /// Look up a kind.
    #[must_use]
    pub fn get(&self, kind: EntityKind) -> Option<&ContentTypeInfo> {
        self.entries.get(&kind)
    }

    /// Registered kinds, sorted.
    #[must_use]
    pub fn kinds(&self) -> Vec<EntityKind> {
        let mut kinds: Vec<EntityKind> = self.entries.keys().copied().collect();
        kinds.sort_unstable();
        kinds
    }
}
