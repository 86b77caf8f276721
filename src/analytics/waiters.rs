use super::grouping::{
    group_by, non_empty, sort_desc_by, waiter_or, Groups, SalesTotals, NOT_IDENTIFIED,
};
use super::period::active_span_days;
use crate::models::{SalesLine, WaiterPdvRow, WaiterPerformanceRow, WaiterSummaryRow};

/// Share of the prorated goal reached, floored and clamped to `0..=100`.
pub fn attainment_percent(revenue: f64, daily_goal: f64, span_days: i64) -> u8 {
    let target = daily_goal * span_days as f64;
    if target <= 0.0 {
        return if revenue > 0.0 { 100 } else { 0 };
    }
    let pct = (revenue / target * 100.0).floor();
    pct.clamp(0.0, 100.0) as u8
}

/// Waiters ranked by revenue with goal attainment over the active span.
///
/// The span comes from the earliest and latest fiscal dates in `records`,
/// not from the filter that selected them.
pub fn waiter_performance(records: &[SalesLine], daily_goal: f64) -> Vec<WaiterPerformanceRow> {
    let groups: Groups<String, SalesTotals> =
        group_by(records, |r| Some(waiter_or(r, NOT_IDENTIFIED)));
    let span_days = active_span_days(records);

    let mut waiters = groups.into_entries();
    sort_desc_by(&mut waiters, |(_, t)| t.total_value);

    waiters
        .into_iter()
        .enumerate()
        .map(|(index, (name, totals))| WaiterPerformanceRow {
            rank: index + 1,
            name,
            revenue: totals.total_value,
            order_count: totals.lines,
            attainment_percent: attainment_percent(totals.total_value, daily_goal, span_days),
        })
        .collect()
}

/// One waiter's revenue split by point of sale.
pub fn waiter_pdv_breakdown(records: &[SalesLine], waiter: &str) -> Vec<WaiterPdvRow> {
    let groups: Groups<String, SalesTotals> = group_by(records, |r| {
        if non_empty(r.waiter_name.as_ref()) != Some(waiter) {
            return None;
        }
        Some(
            non_empty(Some(&r.point_of_sale))
                .unwrap_or(NOT_IDENTIFIED)
                .to_string(),
        )
    });

    let mut rows: Vec<WaiterPdvRow> = groups
        .into_entries()
        .into_iter()
        .map(|(point_of_sale, totals)| WaiterPdvRow {
            point_of_sale,
            revenue: totals.total_value,
            order_count: totals.lines,
        })
        .collect();
    sort_desc_by(&mut rows, |r| r.revenue);
    rows
}

/// Revenue, orders, items and average ticket per named waiter. Lines without
/// a waiter are left out.
pub fn waiter_summary(records: &[SalesLine]) -> Vec<WaiterSummaryRow> {
    let groups: Groups<String, SalesTotals> =
        group_by(records, |r| non_empty(r.waiter_name.as_ref()).map(str::to_string));

    let mut rows: Vec<WaiterSummaryRow> = groups
        .into_entries()
        .into_iter()
        .map(|(name, totals)| WaiterSummaryRow {
            name,
            revenue: totals.total_value,
            order_count: totals.lines,
            items_sold: totals.quantity,
            average_ticket: totals.average_ticket(),
        })
        .collect();
    sort_desc_by(&mut rows, |r| r.revenue);
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::grouping::fixtures::*;

    #[test]
    fn test_ana_scenario() {
        let records = vec![
            on(by_waiter(line("A", 1.0, 600.0), "Ana"), 2024, 3, 1),
            on(by_waiter(line("B", 1.0, 400.0), "Ana"), 2024, 3, 2),
        ];

        let rows = waiter_performance(&records, 2000.0);

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "Ana");
        assert_eq!(rows[0].revenue, 1000.0);
        assert_eq!(rows[0].order_count, 2);
        assert_eq!(rows[0].attainment_percent, 25);
        assert_eq!(rows[0].rank, 1);
    }

    #[test]
    fn test_attainment_is_clamped() {
        assert_eq!(attainment_percent(10_000.0, 2000.0, 1), 100);
        assert_eq!(attainment_percent(0.0, 2000.0, 3), 0);
        assert_eq!(attainment_percent(-50.0, 2000.0, 1), 0);
        assert_eq!(attainment_percent(1999.99, 2000.0, 1), 99);
        for revenue in [0.0, 1.0, 500.5, 3999.0, 1e9] {
            for span in 1..10 {
                assert!(attainment_percent(revenue, 2000.0, span) <= 100);
            }
        }
    }

    #[test]
    fn test_ranking_and_default_name() {
        let records = vec![
            on(by_waiter(line("A", 1.0, 100.0), "Bia"), 2024, 3, 3),
            on(line("A", 1.0, 300.0), 2024, 3, 1),
            on(by_waiter(line("A", 1.0, 200.0), "Caio"), 2024, 3, 2),
        ];

        let rows = waiter_performance(&records, 100.0);
        let names: Vec<_> = rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec![NOT_IDENTIFIED, "Caio", "Bia"]);
        let ranks: Vec<_> = rows.iter().map(|r| r.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3]);
        assert!(rows.iter().all(|r| r.has_medal()));

        // span is 3 days -> target 300
        assert_eq!(rows[0].attainment_percent, 100);
        assert_eq!(rows[1].attainment_percent, 66);
        assert_eq!(rows[2].attainment_percent, 33);
    }

    #[test]
    fn test_empty_records() {
        assert!(waiter_performance(&[], 2000.0).is_empty());
        assert!(waiter_pdv_breakdown(&[], "Ana").is_empty());
        assert!(waiter_summary(&[]).is_empty());
    }

    #[test]
    fn test_pdv_breakdown() {
        let records = vec![
            at_pdv(by_waiter(line("A", 1.0, 10.0), "Ana"), "Bar"),
            at_pdv(by_waiter(line("A", 1.0, 50.0), "Ana"), "Terrace"),
            at_pdv(by_waiter(line("A", 1.0, 15.0), "Ana"), "Bar"),
            at_pdv(by_waiter(line("A", 1.0, 99.0), "Bia"), "Bar"),
            at_pdv(by_waiter(line("A", 1.0, 1.0), "Ana"), ""),
        ];

        let rows = waiter_pdv_breakdown(&records, "Ana");

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].point_of_sale, "Terrace");
        assert_eq!(rows[1].point_of_sale, "Bar");
        assert_eq!(rows[1].revenue, 25.0);
        assert_eq!(rows[1].order_count, 2);
        assert_eq!(rows[2].point_of_sale, NOT_IDENTIFIED);
    }

    #[test]
    fn test_waiter_summary_drops_unnamed() {
        let records = vec![
            by_waiter(line("A", 2.0, 30.0), "Ana"),
            by_waiter(line("B", 1.0, 10.0), "Ana"),
            line("C", 1.0, 500.0),
        ];

        let rows = waiter_summary(&records);

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].order_count, 2);
        assert_eq!(rows[0].items_sold, 3.0);
        assert_eq!(rows[0].average_ticket, 20.0);
    }
}
