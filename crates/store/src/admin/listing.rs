//! Changelist queries: filtering, search, sorting and pagination over a
//! model admin's source query.

use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};

use super::table::{FilterKind, ListColumn, ModelAdmin};
use super::{AdminError, AdminModel};

/// Parameters for one changelist request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListQuery {
    /// 1-based page number; the first page when absent.
    pub page: Option<u32>,
    /// Comma-separated column keys, `-key` for descending.
    pub sort: Option<String>,
    /// Filter key/value pairs; every pair must match.
    pub filters: Vec<(String, String)>,
    /// Search terms, split on whitespace; every term must match a search field.
    pub search: Option<String>,
}

impl ListQuery {
    /// Create an empty query (first page, default ordering).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a page.
    #[must_use]
    pub const fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    /// Sort by column keys.
    #[must_use]
    pub fn sort(mut self, sort: &str) -> Self {
        self.sort = Some(sort.to_string());
        self
    }

    /// Add a filter.
    #[must_use]
    pub fn filter(mut self, key: &str, value: &str) -> Self {
        self.filters.push((key.to_string(), value.to_string()));
        self
    }

    /// Set the search text.
    #[must_use]
    pub fn search(mut self, search: &str) -> Self {
        self.search = Some(search.to_string());
        self
    }
}

/// One changelist row, rendered as display strings in column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListRow {
    /// Primary key of the object.
    pub id: i32,
    /// Cell values, one per column.
    pub cells: Vec<String>,
}

/// One page of a changelist.
#[derive(Debug, Clone, Serialize)]
pub struct ListPage {
    /// Model listed.
    pub model: AdminModel,
    /// Column definitions, in display order.
    pub columns: Vec<ListColumn>,
    /// Rows on this page.
    pub rows: Vec<ListRow>,
    /// Current page (1-based).
    pub page: u32,
    /// Number of pages (at least 1).
    pub num_pages: u32,
    /// Rows per page.
    pub per_page: u32,
    /// Rows matching the filters and search across all pages.
    pub total: i64,
}

impl ListPage {
    /// Values of one column down the page.
    #[must_use]
    pub fn column_values(&self, key: &str) -> Vec<&str> {
        let Some(index) = self.columns.iter().position(|c| c.key == key) else {
            return vec![];
        };
        self.rows
            .iter()
            .filter_map(|r| r.cells.get(index).map(String::as_str))
            .collect()
    }

    /// Ids of the rows on this page.
    #[must_use]
    pub fn ids(&self) -> Vec<i32> {
        self.rows.iter().map(|r| r.id).collect()
    }

    /// Whether a later page exists.
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.page < self.num_pages
    }
}

/// A row of a model admin's source query.
pub trait ChangeListRow: for<'r> FromRow<'r, SqliteRow> + Send + Unpin {
    /// Primary key.
    fn id(&self) -> i32;

    /// Display strings, in the admin's column order.
    fn cells(&self) -> Vec<String>;

    /// Render into a [`ListRow`].
    fn into_row(self) -> ListRow
    where
        Self: Sized,
    {
        ListRow {
            id: self.id(),
            cells: self.cells(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Value {
    Int(i64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Condition {
    Raw(String),
    Equals { expr: String, value: Value },
    AnyLike(Vec<(String, String)>),
}

fn conditions(admin: &ModelAdmin, query: &ListQuery) -> Result<Vec<Condition>, AdminError> {
    let mut out = Vec::new();

    for (key, value) in &query.filters {
        let filter = admin
            .get_filter(key)
            .ok_or_else(|| AdminError::UnknownFilter {
                model: admin.model,
                filter: key.clone(),
            })?;
        let invalid = || AdminError::InvalidFilterValue {
            filter: key.clone(),
            value: value.clone(),
        };

        let condition = match &filter.kind {
            FilterKind::Select => {
                let option = filter
                    .options
                    .iter()
                    .find(|o| o.value == *value)
                    .ok_or_else(invalid)?;
                option.predicate.as_ref().map_or_else(
                    || Condition::Equals {
                        expr: filter.expr.clone(),
                        value: Value::Text(option.value.clone()),
                    },
                    |p| Condition::Raw(p.clone()),
                )
            }
            FilterKind::Related { .. } => {
                let id: i64 = value.trim().parse().map_err(|_| invalid())?;
                Condition::Equals {
                    expr: filter.expr.clone(),
                    value: Value::Int(id),
                }
            }
        };
        out.push(condition);
    }

    if let Some(search) = query.search.as_deref()
        && !admin.search_fields.is_empty()
    {
        for term in search.split_whitespace() {
            out.push(Condition::AnyLike(
                admin
                    .search_fields
                    .iter()
                    .map(|f| (f.expr.clone(), f.pattern(term)))
                    .collect(),
            ));
        }
    }

    Ok(out)
}

fn push_conditions(qb: &mut QueryBuilder<'_, Sqlite>, conditions: &[Condition]) {
    for (i, condition) in conditions.iter().enumerate() {
        qb.push(if i == 0 { " WHERE " } else { " AND " });
        match condition {
            Condition::Raw(sql) => {
                qb.push("(").push(sql).push(")");
            }
            Condition::Equals { expr, value } => {
                qb.push(expr).push(" = ");
                match value {
                    Value::Int(v) => qb.push_bind(*v),
                    Value::Text(v) => qb.push_bind(v.clone()),
                };
            }
            Condition::AnyLike(fields) => {
                qb.push("(");
                for (j, (expr, pattern)) in fields.iter().enumerate() {
                    if j > 0 {
                        qb.push(" OR ");
                    }
                    qb.push(expr)
                        .push(" LIKE ")
                        .push_bind(pattern.clone())
                        .push(" ESCAPE '\\'");
                }
                qb.push(")");
            }
        }
    }
}

/// Build the `ORDER BY` list for a sort parameter, falling back to the
/// admin's default ordering. The primary key always breaks ties.
fn order_clause(admin: &ModelAdmin, sort: Option<&str>) -> Result<String, AdminError> {
    let keys: Vec<&str> = match sort.map(str::trim) {
        Some(sort) if !sort.is_empty() => sort
            .split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .collect(),
        _ => admin.ordering.iter().map(String::as_str).collect(),
    };

    let mut parts = Vec::with_capacity(keys.len() + 1);
    for key in keys {
        let (name, descending) = key
            .strip_prefix('-')
            .map_or((key, false), |name| (name, true));
        let expr = admin
            .get_column(name)
            .and_then(|c| c.sort_expr.as_deref())
            .ok_or_else(|| AdminError::UnknownSortKey {
                model: admin.model,
                key: name.to_string(),
            })?;
        parts.push(format!("{expr} {}", if descending { "DESC" } else { "ASC" }));
    }
    parts.push("id ASC".to_string());

    Ok(parts.join(", "))
}

fn page_count(total: i64, per_page: u32) -> u32 {
    let per_page = i64::from(per_page.max(1));
    let pages = (total.max(0) + per_page - 1) / per_page;
    u32::try_from(pages).unwrap_or(u32::MAX).max(1)
}

/// Run a changelist query for one page.
pub(crate) async fn changelist<R: ChangeListRow>(
    pool: &SqlitePool,
    admin: &ModelAdmin,
    query: &ListQuery,
) -> Result<ListPage, AdminError> {
    let conditions = conditions(admin, query)?;
    let order = order_clause(admin, query.sort.as_deref())?;

    let mut count_qb =
        QueryBuilder::<Sqlite>::new(format!("SELECT COUNT(*) FROM ({}) AS cl", admin.source));
    push_conditions(&mut count_qb, &conditions);
    let total: i64 = count_qb.build_query_scalar().fetch_one(pool).await?;

    let per_page = admin.list_per_page.max(1);
    let num_pages = page_count(total, per_page);
    let page = query.page.unwrap_or(1);
    if page == 0 || page > num_pages {
        return Err(AdminError::InvalidPage { page, num_pages });
    }

    let mut qb = QueryBuilder::<Sqlite>::new(format!("SELECT * FROM ({}) AS cl", admin.source));
    push_conditions(&mut qb, &conditions);
    qb.push(" ORDER BY ")
        .push(order)
        .push(" LIMIT ")
        .push_bind(i64::from(per_page))
        .push(" OFFSET ")
        .push_bind(i64::from(page - 1) * i64::from(per_page));

    let rows = qb.build_query_as::<R>().fetch_all(pool).await?;

    Ok(ListPage {
        model: admin.model,
        columns: admin.columns.clone(),
        rows: rows.into_iter().map(ChangeListRow::into_row).collect(),
        page,
        num_pages,
        per_page,
        total,
    })
}

/// Fetch a single changelist row.
pub(crate) async fn fetch_row<R: ChangeListRow>(
    pool: &SqlitePool,
    admin: &ModelAdmin,
    id: i32,
) -> Result<Option<ListRow>, AdminError> {
    let row = sqlx::query_as::<_, R>(&format!(
        "SELECT * FROM ({}) AS cl WHERE id = ?",
        admin.source
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(ChangeListRow::into_row))
}
