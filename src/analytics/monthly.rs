use chrono::NaiveDate;

use super::grouping::{group_by, Groups, SalesTotals};
use super::period::{first_day_of_month, month_key, month_label, series_months};
use crate::models::{MonthlyPoint, SalesLine};

/// Trailing six-month revenue series ending at `today`'s month, oldest first.
///
/// Always returns six points; months without sales carry `revenue = 0`.
/// Records outside the window are ignored.
pub fn monthly_series(records: &[SalesLine], today: NaiveDate, monthly_goal: f64) -> Vec<MonthlyPoint> {
    let months = series_months(today);
    let by_month: Groups<NaiveDate, SalesTotals> =
        group_by(records, |r| Some(first_day_of_month(r.fiscal_date)));

    months
        .into_iter()
        .map(|month| MonthlyPoint {
            month: month_key(month),
            label: month_label(month),
            revenue: by_month.get(&month).map_or(0.0, |t| t.total_value),
            goal: monthly_goal,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::grouping::fixtures::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    #[test]
    fn test_empty_input_yields_six_zero_points() {
        let series = monthly_series(&[], today(), 50000.0);

        assert_eq!(series.len(), 6);
        assert!(series.iter().all(|p| p.revenue == 0.0 && p.goal == 50000.0));
        assert_eq!(series[0].month, "2023-10");
        assert_eq!(series[5].month, "2024-03");
        assert_eq!(series[5].label, "Mar");
    }

    #[test]
    fn test_sums_revenue_per_month_and_zero_fills() {
        let records = vec![
            on(line("A", 1.0, 100.0), 2024, 3, 1),
            on(line("B", 1.0, 50.0), 2024, 3, 14),
            on(line("A", 1.0, 25.0), 2023, 12, 31),
        ];

        let series = monthly_series(&records, today(), 1000.0);

        assert_eq!(series.len(), 6);
        let revenue: Vec<f64> = series.iter().map(|p| p.revenue).collect();
        assert_eq!(revenue, vec![0.0, 0.0, 25.0, 0.0, 0.0, 150.0]);
    }

    #[test]
    fn test_same_month_of_other_year_is_not_merged() {
        // March 2023 is outside the window and must not land on March 2024
        let records = vec![
            on(line("A", 1.0, 999.0), 2023, 3, 10),
            on(line("A", 1.0, 10.0), 2024, 3, 10),
        ];

        let series = monthly_series(&records, today(), 0.0);

        assert_eq!(series[5].revenue, 10.0);
        assert_eq!(series.iter().map(|p| p.revenue).sum::<f64>(), 10.0);
    }
}
