//! Changelist configuration types.
//!
//! A [`ModelAdmin`] describes how one model is listed: its columns, filters,
//! search fields, default ordering, inlines and bulk actions. Column sort
//! expressions, filter predicates and search expressions refer to the columns
//! produced by the admin's source query.

use serde::Serialize;

use super::AdminModel;
use super::actions::{ActionHandler, ActionRegistry};

/// Default changelist page size.
pub const DEFAULT_LIST_PER_PAGE: u32 = 10;

/// Column definition for a changelist.
#[derive(Debug, Clone, Serialize)]
pub struct ListColumn {
    /// Unique key for the column.
    pub key: String,
    /// Display label for the column header.
    pub label: String,
    /// Expression to sort by, if the column is sortable.
    #[serde(skip)]
    pub sort_expr: Option<String>,
    /// Whether the value can be edited from the list.
    pub editable: bool,
    /// Whether the value is computed rather than stored.
    pub computed: bool,
}

impl ListColumn {
    /// Create a column sortable by the source column of the same name.
    #[must_use]
    pub fn sortable(key: &str, label: &str) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            sort_expr: Some(key.to_string()),
            editable: false,
            computed: false,
        }
    }

    /// Create a non-sortable column.
    #[must_use]
    pub fn new(key: &str, label: &str) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            sort_expr: None,
            editable: false,
            computed: false,
        }
    }

    /// Sort this column by another expression.
    #[must_use]
    pub fn sort_by(mut self, expr: &str) -> Self {
        self.sort_expr = Some(expr.to_string());
        self
    }

    /// Allow editing this column from the list.
    #[must_use]
    pub const fn editable(mut self) -> Self {
        self.editable = true;
        self
    }

    /// Mark the column as computed.
    #[must_use]
    pub const fn computed(mut self) -> Self {
        self.computed = true;
        self
    }
}

/// How a filter turns its chosen value into a condition.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum FilterKind {
    /// Fixed options; the value must be one of them.
    Select,
    /// Foreign key; the value is the related row's id.
    Related {
        /// Related table.
        #[serde(skip)]
        table: String,
        /// Label expression over the related table.
        #[serde(skip)]
        label_expr: String,
    },
}

/// Option for select filters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterOption {
    /// Option value.
    pub value: String,
    /// Display label.
    pub label: String,
    /// Condition used instead of `expr = value`.
    #[serde(skip)]
    pub predicate: Option<String>,
}

impl FilterOption {
    /// Create a new filter option matching `expr = value`.
    #[must_use]
    pub fn new(value: &str, label: &str) -> Self {
        Self {
            value: value.to_string(),
            label: label.to_string(),
            predicate: None,
        }
    }

    /// Create an option with its own condition.
    #[must_use]
    pub fn when(value: &str, label: &str, predicate: &str) -> Self {
        Self {
            value: value.to_string(),
            label: label.to_string(),
            predicate: Some(predicate.to_string()),
        }
    }
}

/// Filter definition for a changelist.
#[derive(Debug, Clone, Serialize)]
pub struct ListFilter {
    /// Filter parameter key.
    pub key: String,
    /// Display label.
    pub label: String,
    /// Source column compared with the chosen value.
    #[serde(skip)]
    pub expr: String,
    /// Filter kind.
    pub kind: FilterKind,
    /// Available options (select filters).
    pub options: Vec<FilterOption>,
}

impl ListFilter {
    /// Create a select filter.
    #[must_use]
    pub fn select(key: &str, label: &str, expr: &str, options: Vec<FilterOption>) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            expr: expr.to_string(),
            kind: FilterKind::Select,
            options,
        }
    }

    /// Create a filter on a foreign key, labelled from the related table.
    #[must_use]
    pub fn related(key: &str, label: &str, expr: &str, table: &str, label_expr: &str) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            expr: expr.to_string(),
            kind: FilterKind::Related {
                table: table.to_string(),
                label_expr: label_expr.to_string(),
            },
            options: vec![],
        }
    }
}

/// A searchable source column, matched case-insensitively anywhere in the
/// value.
#[derive(Debug, Clone, Serialize)]
pub struct SearchField {
    /// Source column.
    pub expr: String,
}

impl SearchField {
    /// Match values containing the term.
    #[must_use]
    pub fn contains(expr: &str) -> Self {
        Self {
            expr: expr.to_string(),
        }
    }

    /// `LIKE` pattern for a term, with wildcards in the term escaped.
    #[must_use]
    pub fn pattern(&self, term: &str) -> String {
        format!("%{}%", escape_like(term))
    }
}

fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Tabular inline editor shown on a parent's change page.
#[derive(Debug, Clone, Serialize)]
pub struct InlineConfig {
    /// Inline key.
    pub key: String,
    /// Display label.
    pub label: String,
    /// Fewest rows the parent may keep.
    pub min_num: u32,
    /// Most rows the parent may have.
    pub max_num: Option<u32>,
}

impl InlineConfig {
    /// Create an unbounded inline.
    #[must_use]
    pub fn new(key: &str, label: &str) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            min_num: 0,
            max_num: None,
        }
    }

    /// Bound the number of rows.
    #[must_use]
    pub const fn bounds(mut self, min_num: u32, max_num: u32) -> Self {
        self.min_num = min_num;
        self.max_num = Some(max_num);
        self
    }
}

/// Changelist configuration for one model.
#[derive(Debug, Clone)]
pub struct ModelAdmin {
    /// The model listed.
    pub model: AdminModel,
    /// Query producing one row per object; listings wrap it as a subquery.
    pub source: &'static str,
    /// Column definitions, in display order.
    pub columns: Vec<ListColumn>,
    /// Filter definitions.
    pub filters: Vec<ListFilter>,
    /// Searchable columns.
    pub search_fields: Vec<SearchField>,
    /// Default sort keys (`-key` for descending).
    pub ordering: Vec<String>,
    /// Rows per page.
    pub list_per_page: u32,
    /// Inline editors.
    pub inlines: Vec<InlineConfig>,
    /// Bulk actions.
    pub actions: ActionRegistry,
}

impl ModelAdmin {
    /// Create a new model admin over a source query.
    #[must_use]
    pub fn new(model: AdminModel, source: &'static str) -> Self {
        Self {
            model,
            source,
            columns: vec![],
            filters: vec![],
            search_fields: vec![],
            ordering: vec![],
            list_per_page: DEFAULT_LIST_PER_PAGE,
            inlines: vec![],
            actions: ActionRegistry::new(),
        }
    }

    /// Add a column.
    #[must_use]
    pub fn column(mut self, column: ListColumn) -> Self {
        self.columns.push(column);
        self
    }

    /// Add a filter.
    #[must_use]
    pub fn filter(mut self, filter: ListFilter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Add a search field.
    #[must_use]
    pub fn search(mut self, field: SearchField) -> Self {
        self.search_fields.push(field);
        self
    }

    /// Set the default ordering.
    #[must_use]
    pub fn ordering(mut self, keys: &[&str]) -> Self {
        self.ordering = keys.iter().map(ToString::to_string).collect();
        self
    }

    /// Set the page size.
    #[must_use]
    pub const fn per_page(mut self, per_page: u32) -> Self {
        self.list_per_page = per_page;
        self
    }

    /// Add an inline editor.
    #[must_use]
    pub fn inline(mut self, inline: InlineConfig) -> Self {
        self.inlines.push(inline);
        self
    }

    /// Register a bulk action.
    #[must_use]
    pub fn action(
        mut self,
        name: &'static str,
        description: &'static str,
        handler: ActionHandler,
    ) -> Self {
        self.actions = self.actions.register(name, description, handler);
        self
    }

    /// Look up a column by key.
    #[must_use]
    pub fn get_column(&self, key: &str) -> Option<&ListColumn> {
        self.columns.iter().find(|c| c.key == key)
    }

    /// Look up a filter by key.
    #[must_use]
    pub fn get_filter(&self, key: &str) -> Option<&ListFilter> {
        self.filters.iter().find(|f| f.key == key)
    }

    /// Look up an inline by key.
    #[must_use]
    pub fn get_inline(&self, key: &str) -> Option<&InlineConfig> {
        self.inlines.iter().find(|i| i.key == key)
    }

    /// Keys of the list-editable columns.
    #[must_use]
    pub fn editable_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.editable)
            .map(|c| c.key.as_str())
            .collect()
    }
}
