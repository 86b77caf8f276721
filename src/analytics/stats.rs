use chrono::Timelike;
use std::collections::BTreeSet;

use super::grouping::{category_label, group_by, non_empty, Groups, SalesTotals};
use crate::models::{FilterOptions, HourlyRow, SalesLine, SalesStats};

pub fn sales_stats(records: &[SalesLine]) -> SalesStats {
    if records.is_empty() {
        return SalesStats::default();
    }

    let total_sales: f64 = records.iter().map(|r| r.total_value).sum();
    let total_orders = records.len();
    let active_waiters = records
        .iter()
        .filter_map(|r| non_empty(r.waiter_name.as_ref()))
        .collect::<BTreeSet<_>>()
        .len();

    SalesStats {
        total_sales,
        total_orders,
        average_ticket: total_sales / total_orders as f64,
        active_waiters,
    }
}

/// Revenue by hour of day, earliest hour first. Lines without a time of day
/// are skipped.
pub fn hourly_breakdown(records: &[SalesLine]) -> Vec<HourlyRow> {
    let groups: Groups<u32, SalesTotals> = group_by(records, |r| r.fiscal_time.map(|t| t.hour()));

    let mut hours = groups.into_entries();
    hours.sort_by_key(|(hour, _)| *hour);

    hours
        .into_iter()
        .map(|(hour, totals)| HourlyRow {
            hour: format!("{:02}:00", hour),
            revenue: totals.total_value,
            order_count: totals.lines,
            average_ticket: totals.average_ticket(),
        })
        .collect()
}

/// Distinct values for the filter pickers, sorted.
pub fn filter_options(records: &[SalesLine]) -> FilterOptions {
    let mut categories = BTreeSet::new();
    let mut waiters = BTreeSet::new();
    let mut points_of_sale = BTreeSet::new();

    for r in records {
        if let Some(c) = category_label(r) {
            categories.insert(c.to_string());
        }
        if let Some(w) = non_empty(r.waiter_name.as_ref()) {
            waiters.insert(w.to_string());
        }
        if let Some(p) = non_empty(Some(&r.point_of_sale)) {
            points_of_sale.insert(p.to_string());
        }
    }

    FilterOptions {
        categories: categories.into_iter().collect(),
        waiters: waiters.into_iter().collect(),
        points_of_sale: points_of_sale.into_iter().collect(),
    }
}
