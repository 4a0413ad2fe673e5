//! Changelist argument handling.
//!
//! # Usage
//!
//! ```bash
//! storehouse list customers --filter membership=G --sort -orders_count
//! storehouse list products --search chess --page 2
//! storehouse edit products 3 unit_price 19.99
//! storehouse action products delete_selected --ids 4,5
//! ```

use thiserror::Error;

use storehouse_store::ListQuery;

/// Errors in changelist arguments.
#[derive(Debug, Error)]
pub enum ArgError {
    /// Filter is not of the form `key=value`.
    #[error("Invalid filter '{0}': expected key=value")]
    Filter(String),
}

/// Build a changelist query from command-line arguments.
///
/// # Errors
///
/// Returns `ArgError::Filter` for a filter without `=` or with an empty key.
pub fn list_query(
    page: Option<u32>,
    sort: Option<String>,
    filters: &[String],
    search: Option<String>,
) -> Result<ListQuery, ArgError> {
    let filters = filters
        .iter()
        .map(|f| match f.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() => {
                Ok((key.trim().to_owned(), value.trim().to_owned()))
            }
            _ => Err(ArgError::Filter(f.clone())),
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ListQuery {
        page,
        sort,
        filters,
        search,
    })
}
