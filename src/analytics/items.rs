//! Item ranking and category breakdown.

use super::grouping::{
    group_by, item_key, resolved_category, sort_desc_by, Accumulator, Groups, SalesTotals,
};
use crate::models::{CategoryRow, CategoryShare, ItemRow, SalesLine};

/// Item totals plus the resolved category of the first line seen.
#[derive(Debug, Clone, Default)]
pub(crate) struct ItemTotals {
    pub(crate) totals: SalesTotals,
    pub(crate) category: Option<String>,
}

impl Accumulator for ItemTotals {
    fn add(&mut self, line: &SalesLine) {
        self.totals.add(line);
        if self.category.is_none() {
            self.category = Some(resolved_category(line));
        }
    }

    fn merge(&mut self, other: Self) {
        self.totals.merge(other.totals);
        if self.category.is_none() {
            self.category = other.category;
        }
    }
}

#[derive(Debug, Clone, Default)]
struct CategoryTotals {
    totals: SalesTotals,
    items: Groups<String, ItemTotals>,
}

impl Accumulator for CategoryTotals {
    fn add(&mut self, line: &SalesLine) {
        self.totals.add(line);
        if let Some(item) = item_key(line) {
            self.items.entry(item).add(line);
        }
    }

    fn merge(&mut self, other: Self) {
        self.totals.merge(other.totals);
        self.items.merge(other.items);
    }
}

/// `Math.round`-style rounding: halves go up.
pub(crate) fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

fn share_of(part: f64, whole: f64) -> i64 {
    round_half_up(part / whole * 100.0)
}

fn to_item_rows(items: Groups<String, ItemTotals>) -> Vec<ItemRow> {
    let mut rows: Vec<ItemRow> = items
        .into_entries()
        .into_iter()
        .map(|(name, item)| ItemRow {
            name,
            category: item.category.unwrap_or_default(),
            quantity: item.totals.quantity,
            total_value: item.totals.total_value,
            sales_count: item.totals.lines,
            unit_value: if item.totals.quantity != 0.0 {
                item.totals.total_value / item.totals.quantity
            } else {
                0.0
            },
        })
        .collect();
    sort_desc_by(&mut rows, |r| r.total_value);
    rows
}

/// Items ranked by revenue, descending. Items with equal revenue keep the
/// order in which they first appear in `records`.
pub fn item_ranking(records: &[SalesLine]) -> Vec<ItemRow> {
    to_item_rows(group_by(records, item_key))
}

pub fn top_items(records: &[SalesLine], limit: usize) -> Vec<ItemRow> {
    let mut ranking = item_ranking(records);
    ranking.truncate(limit);
    ranking
}

fn group_categories(records: &[SalesLine]) -> Option<(Groups<String, CategoryTotals>, f64)> {
    let groups: Groups<String, CategoryTotals> = group_by(records, |r| Some(resolved_category(r)));
    let whole: f64 = groups.iter().map(|(_, c)| c.totals.total_value).sum();
    if whole == 0.0 {
        return None;
    }
    Some((groups, whole))
}

/// Categories ranked by revenue with their own item rankings nested.
///
/// Empty when the total revenue is zero.
pub fn category_breakdown(records: &[SalesLine]) -> Vec<CategoryRow> {
    let Some((groups, whole)) = group_categories(records) else {
        return Vec::new();
    };

    let mut rows: Vec<CategoryRow> = groups
        .into_entries()
        .into_iter()
        .map(|(name, category)| {
            let items = to_item_rows(category.items);
            CategoryRow {
                name,
                total_value: category.totals.total_value,
                quantity: category.totals.quantity,
                item_count: items.len(),
                percentage: share_of(category.totals.total_value, whole),
                items,
            }
        })
        .collect();
    sort_desc_by(&mut rows, |r| r.total_value);
    rows
}

/// Share of total revenue per category, in first-seen category order.
pub fn category_shares(records: &[SalesLine]) -> Vec<CategoryShare> {
    let Some((groups, whole)) = group_categories(records) else {
        return Vec::new();
    };

    groups
        .iter()
        .map(|(name, category)| CategoryShare {
            name: name.clone(),
            total_value: category.totals.total_value,
            percentage: share_of(category.totals.total_value, whole),
        })
        .collect()
}
