//! Current period versus the previous calendar month.
//!
//! Both sides are grouped independently and joined on the current period's
//! keys. Keys that only exist in the prior period are not reported.

use super::grouping::{
    group_by, item_key, sort_desc_by, waiter_or, Groups, SalesTotals, WAITER_NOT_INFORMED,
};
use super::items::ItemTotals;
use crate::models::{ItemGrowthRow, SalesLine, WaiterGrowthRow};

/// Percentage change from `prior` to `current`.
///
/// A zero baseline reports 100, also when `current` is zero as well.
pub fn growth_percent(current: f64, prior: f64) -> f64 {
    if prior == 0.0 {
        100.0
    } else {
        (current - prior) / prior * 100.0
    }
}

pub fn item_growth(current: &[SalesLine], prior: &[SalesLine]) -> Vec<ItemGrowthRow> {
    let now: Groups<String, ItemTotals> = group_by(current, item_key);
    let before: Groups<String, SalesTotals> = group_by(prior, item_key);

    let mut rows: Vec<ItemGrowthRow> = now
        .iter()
        .map(|(name, item)| {
            let cur = item.totals;
            let last = before.get(name).copied().unwrap_or_default();
            ItemGrowthRow {
                name: name.clone(),
                category: item.category.clone().unwrap_or_default(),
                current_quantity: cur.quantity,
                prior_quantity: last.quantity,
                quantity_growth: growth_percent(cur.quantity, last.quantity),
                current_revenue: cur.total_value,
                prior_revenue: last.total_value,
                revenue_growth: growth_percent(cur.total_value, last.total_value),
            }
        })
        .collect();

    sort_desc_by(&mut rows, |r| r.revenue_growth);
    rows
}

pub fn waiter_growth(current: &[SalesLine], prior: &[SalesLine]) -> Vec<WaiterGrowthRow> {
    let key = |r: &SalesLine| Some(waiter_or(r, WAITER_NOT_INFORMED));
    let now: Groups<String, SalesTotals> = group_by(current, key);
    let before: Groups<String, SalesTotals> = group_by(prior, key);

    let mut rows: Vec<WaiterGrowthRow> = now
        .iter()
        .map(|(name, cur)| {
            let last = before.get(name).copied().unwrap_or_default();
            let (cur_ticket, last_ticket) = (cur.average_ticket(), last.average_ticket());
            WaiterGrowthRow {
                name: name.clone(),
                current_orders: cur.lines,
                prior_orders: last.lines,
                orders_growth: growth_percent(cur.lines as f64, last.lines as f64),
                current_revenue: cur.total_value,
                prior_revenue: last.total_value,
                revenue_growth: growth_percent(cur.total_value, last.total_value),
                current_ticket: cur_ticket,
                prior_ticket: last_ticket,
                ticket_growth: growth_percent(cur_ticket, last_ticket),
                current_items: cur.quantity,
                prior_items: last.quantity,
            }
        })
        .collect();

    sort_desc_by(&mut rows, |r| r.revenue_growth);
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::grouping::fixtures::*;
    use crate::analytics::grouping::UNCATEGORIZED;

    #[test]
    fn test_growth_percent_policy() {
        assert_eq!(growth_percent(50.0, 0.0), 100.0);
        assert_eq!(growth_percent(0.0, 0.0), 100.0);
        assert_eq!(growth_percent(25.0, 50.0), -50.0);
        assert_eq!(growth_percent(75.0, 50.0), 50.0);
        assert_eq!(growth_percent(0.0, 50.0), -100.0);
    }

    #[test]
    fn test_item_growth_scenario() {
        let current = vec![line("X", 1.0, 50.0), line("Y", 1.0, 25.0)];
        let prior = vec![line("Y", 2.0, 50.0)];

        let rows = item_growth(&current, &prior);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].name, "X");
        assert_eq!(rows[0].prior_revenue, 0.0);
        assert_eq!(rows[0].revenue_growth, 100.0);
        assert_eq!(rows[1].name, "Y");
        assert_eq!(rows[1].revenue_growth, -50.0);
        assert_eq!(rows[1].quantity_growth, -50.0);
    }

    #[test]
    fn test_prior_only_keys_are_excluded() {
        let current = vec![line("Kept", 1.0, 10.0)];
        let prior = vec![line("Kept", 1.0, 10.0), line("Dropped", 5.0, 500.0)];

        let rows = item_growth(&current, &prior);

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "Kept");
        assert_eq!(rows[0].revenue_growth, 0.0);
    }

    #[test]
    fn test_item_growth_carries_category() {
        let current = vec![in_category(line("Beer", 1.0, 10.0), "Drinks")];
        let rows = item_growth(&current, &[]);
        assert_eq!(rows[0].category, "Drinks");
    }

    #[test]
    fn test_item_growth_category_from_first_line_seen() {
        let current = vec![
            line("Soda", 1.0, 5.0),
            in_category(line("Beer", 1.0, 10.0), "Drinks"),
            in_category(line("Beer", 1.0, 10.0), "Promo"),
            in_category(line("Soda", 1.0, 5.0), "Drinks"),
        ];

        let rows = item_growth(&current, &[]);

        let beer = rows.iter().find(|r| r.name == "Beer").unwrap();
        let soda = rows.iter().find(|r| r.name == "Soda").unwrap();
        assert_eq!(beer.category, "Drinks");
        assert_eq!(soda.category, UNCATEGORIZED);
    }

    #[test]
    fn test_empty_current_period() {
        assert!(item_growth(&[], &[line("X", 1.0, 1.0)]).is_empty());
        assert!(waiter_growth(&[], &[]).is_empty());
    }

    #[test]
    fn test_waiter_growth_metrics() {
        let current = vec![
            by_waiter(line("A", 2.0, 60.0), "Ana"),
            by_waiter(line("B", 1.0, 40.0), "Ana"),
            line("C", 1.0, 10.0),
        ];
        let prior = vec![by_waiter(line("A", 1.0, 80.0), "Ana")];

        let rows = waiter_growth(&current, &prior);

        assert_eq!(rows.len(), 2);
        let missing = rows.iter().find(|r| r.name == WAITER_NOT_INFORMED).unwrap();
        assert_eq!(missing.revenue_growth, 100.0);

        let ana = rows.iter().find(|r| r.name == "Ana").unwrap();
        assert_eq!(ana.current_orders, 2);
        assert_eq!(ana.prior_orders, 1);
        assert_eq!(ana.orders_growth, 100.0);
        assert_eq!(ana.revenue_growth, 25.0);
        assert_eq!(ana.current_ticket, 50.0);
        assert_eq!(ana.ticket_growth, -37.5);
        assert_eq!(ana.current_items, 3.0);

        // 100% growth sorts above 25%
        assert_eq!(rows[0].name, WAITER_NOT_INFORMED);
    }
}
