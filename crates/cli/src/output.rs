//! Rendering command results as text or JSON on stdout.

use serde::Serialize;

use storehouse_store::admin::{ListPage, ListRow};
use storehouse_store::models::OrderDetail;
use storehouse_store::PriceSummary;

use crate::commands::seed::SeedSummary;
use crate::commands::tags::TagView;

/// Print a value as pretty JSON, or as the text produced by `text`.
///
/// # Errors
///
/// Returns `serde_json::Error` if the value cannot be serialized.
#[allow(clippy::print_stdout)]
pub fn render<T: Serialize>(
    json: bool,
    value: &T,
    text: impl FnOnce(&T) -> String,
) -> Result<(), serde_json::Error> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        println!("{}", text(value));
    }
    Ok(())
}

fn line(cells: &[&str], widths: &[usize]) -> String {
    cells
        .iter()
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_owned()
}

fn table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    let rule: Vec<&str> = rule.iter().map(String::as_str).collect();

    let mut out = vec![line(headers, &widths), line(&rule, &widths)];
    for row in rows {
        let cells: Vec<&str> = row.iter().map(String::as_str).collect();
        out.push(line(&cells, &widths));
    }
    out.join("\n")
}

pub fn list_page(page: &ListPage) -> String {
    let mut headers = vec!["id"];
    headers.extend(page.columns.iter().map(|c| c.label.as_str()));
    let rows: Vec<Vec<String>> = page
        .rows
        .iter()
        .map(|r| {
            let mut cells = vec![r.id.to_string()];
            cells.extend(r.cells.iter().cloned());
            cells
        })
        .collect();

    format!(
        "{}\n\nPage {} of {} ({} {})",
        table(&headers, &rows),
        page.page,
        page.num_pages,
        page.total,
        page.model.plural()
    )
}

pub fn list_row(row: &ListRow) -> String {
    format!("{}: {}", row.id, row.cells.join(" | "))
}

pub fn order_detail(detail: &OrderDetail) -> String {
    let headers = ["product", "quantity", "unit price", "total"];
    let rows: Vec<Vec<String>> = detail
        .lines
        .iter()
        .map(|line| {
            vec![
                line.product.title.clone(),
                line.item.quantity.to_string(),
                line.item.unit_price.to_string(),
                format!("{:.2}", line.item.line_total()),
            ]
        })
        .collect();

    format!(
        "Order #{} placed {} by {} ({})\n\n{}\n\nTotal: {:.2}",
        detail.order.id,
        detail.order.placed_at.format("%Y-%m-%d %H:%M"),
        detail.customer,
        detail.order.payment_status.label(),
        table(&headers, &rows),
        detail.total()
    )
}

pub fn tag_view(view: &TagView) -> String {
    let label = view.label.as_deref().unwrap_or("(deleted)");
    if view.tags.is_empty() {
        format!("{} {label}: no tags", view.target)
    } else {
        format!("{} {label}: {}", view.target, view.tags.join(", "))
    }
}

pub fn price_summary(summary: &PriceSummary) -> String {
    let show = |value: Option<rust_decimal::Decimal>| {
        value.map_or_else(|| "-".to_owned(), |v| format!("{v:.2}"))
    };
    format!(
        "count:   {}\nmin:     {}\nmax:     {}\naverage: {}\ntotal:   {:.2}",
        summary.count,
        show(summary.min),
        show(summary.max),
        show(summary.average),
        summary.total
    )
}

pub fn seed_summary(summary: &SeedSummary) -> String {
    format!(
        "Seeded {} collections, {} promotions, {} products, {} customers ({} addresses), {} orders; tagged {} products.",
        summary.collections,
        summary.promotions,
        summary.products,
        summary.customers,
        summary.addresses,
        summary.orders,
        summary.tagged
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_pads_columns() {
        let out = table(
            &["id", "title"],
            &[
                vec!["1".to_owned(), "Chess".to_owned()],
                vec!["12".to_owned(), "Go".to_owned()],
            ],
        );
        assert_eq!(out, "id  title\n--  -----\n1   Chess\n12  Go");
    }
}
