//! Calendar arithmetic used to pick report periods.

use chrono::{Datelike, Months, NaiveDate};

use crate::models::{DateRange, SalesLine};

/// Length of the monthly revenue series.
pub const SERIES_MONTHS: u32 = 6;

pub fn first_day_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

pub fn last_day_of_month(date: NaiveDate) -> NaiveDate {
    first_day_of_month(date)
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(date)
}

pub fn current_month(today: NaiveDate) -> DateRange {
    DateRange::new(first_day_of_month(today), last_day_of_month(today))
}

/// The full calendar month before `today`'s month. This does not depend on how
/// long the selected current period is.
pub fn prior_month(today: NaiveDate) -> DateRange {
    let start = first_day_of_month(today)
        .checked_sub_months(Months::new(1))
        .unwrap_or(today);
    DateRange::new(start, last_day_of_month(start))
}

/// How a report turns the selected range into its current period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodPolicy {
    /// Each missing bound comes from the current month.
    FillFromMonth,
    /// Only the bounds given are applied. No selection means the current month.
    GivenBounds,
    /// The selection counts only when both bounds are set.
    CompleteRange,
}

/// Resolves the current period for a report.
///
/// A bound filled in from the current month never inverts the range: when the
/// filled range would end before it starts, the filled bound is left open.
pub fn current_period(selected: Option<DateRange>, today: NaiveDate, policy: PeriodPolicy) -> DateRange {
    let month = current_month(today);
    let Some(range) = selected.filter(|r| r.from.is_some() || r.to.is_some()) else {
        return month;
    };

    match policy {
        PeriodPolicy::GivenBounds => range,
        PeriodPolicy::CompleteRange => {
            if range.from.is_some() && range.to.is_some() {
                range
            } else {
                month
            }
        }
        PeriodPolicy::FillFromMonth => {
            let filled = DateRange {
                from: range.from.or(month.from),
                to: range.to.or(month.to),
            };
            match (filled.from, filled.to) {
                (Some(from), Some(to)) if from > to => range,
                _ => filled,
            }
        }
    }
}

/// First day of the month `SERIES_MONTHS - 1` months before `today`'s month.
pub fn series_window_start(today: NaiveDate) -> NaiveDate {
    first_day_of_month(today)
        .checked_sub_months(Months::new(SERIES_MONTHS - 1))
        .unwrap_or(today)
}

/// The `SERIES_MONTHS` month starts ending at `today`'s month, oldest first.
pub fn series_months(today: NaiveDate) -> Vec<NaiveDate> {
    let start = series_window_start(today);
    (0..SERIES_MONTHS)
        .filter_map(|offset| start.checked_add_months(Months::new(offset)))
        .collect()
}

/// Days between the earliest and latest fiscal date present, inclusive.
/// Zero for an empty slice.
pub fn active_span_days(records: &[SalesLine]) -> i64 {
    let first = records.iter().map(|r| r.fiscal_date).min();
    let last = records.iter().map(|r| r.fiscal_date).max();
    match (first, last) {
        (Some(first), Some(last)) => (last - first).num_days() + 1,
        _ => 0,
    }
}

pub fn month_label(date: NaiveDate) -> String {
    date.format("%b").to_string()
}

pub fn month_key(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::grouping::fixtures::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_month_bounds() {
        assert_eq!(first_day_of_month(d(2024, 2, 17)), d(2024, 2, 1));
        assert_eq!(last_day_of_month(d(2024, 2, 17)), d(2024, 2, 29));
        assert_eq!(last_day_of_month(d(2023, 2, 1)), d(2023, 2, 28));
        assert_eq!(last_day_of_month(d(2024, 12, 31)), d(2024, 12, 31));
    }

    #[test]
    fn test_prior_month_is_calendar_month() {
        assert_eq!(prior_month(d(2024, 3, 31)), DateRange::new(d(2024, 2, 1), d(2024, 2, 29)));
        assert_eq!(prior_month(d(2024, 1, 5)), DateRange::new(d(2023, 12, 1), d(2023, 12, 31)));
    }

    #[test]
    fn test_current_period_fills_open_bounds() {
        let today = d(2024, 5, 14);
        let month = DateRange::new(d(2024, 5, 1), d(2024, 5, 31));
        assert_eq!(current_period(None, today, PeriodPolicy::FillFromMonth), month);
        assert_eq!(current_period(Some(DateRange::default()), today, PeriodPolicy::GivenBounds), month);

        let half_open = DateRange {
            from: Some(d(2024, 5, 10)),
            to: None,
        };
        assert_eq!(
            current_period(Some(half_open), today, PeriodPolicy::FillFromMonth),
            DateRange::new(d(2024, 5, 10), d(2024, 5, 31))
        );
    }

    #[test]
    fn test_current_period_with_only_an_earlier_end() {
        let today = d(2024, 3, 15);
        let to_only = DateRange {
            from: None,
            to: Some(d(2024, 1, 31)),
        };

        let filled = current_period(Some(to_only), today, PeriodPolicy::FillFromMonth);
        assert_eq!(filled, to_only);

        assert_eq!(current_period(Some(to_only), today, PeriodPolicy::GivenBounds), to_only);
        assert_eq!(
            current_period(Some(to_only), today, PeriodPolicy::CompleteRange),
            DateRange::new(d(2024, 3, 1), d(2024, 3, 31))
        );
    }

    #[test]
    fn test_current_period_never_inverts() {
        let today = d(2024, 3, 15);
        let candidates = [
            DateRange { from: None, to: Some(d(2023, 12, 31)) },
            DateRange { from: Some(d(2024, 6, 1)), to: None },
            DateRange { from: Some(d(2024, 3, 20)), to: None },
        ];
        for policy in [PeriodPolicy::FillFromMonth, PeriodPolicy::GivenBounds, PeriodPolicy::CompleteRange] {
            for range in candidates {
                let resolved = current_period(Some(range), today, policy);
                if let (Some(from), Some(to)) = (resolved.from, resolved.to) {
                    assert!(from <= to, "{:?} inverted {:?}", policy, range);
                }
            }
        }
    }

    #[test]
    fn test_series_window() {
        assert_eq!(series_window_start(d(2024, 3, 15)), d(2023, 10, 1));
        let months = series_months(d(2024, 3, 15));
        assert_eq!(months.len(), 6);
        assert_eq!(months[0], d(2023, 10, 1));
        assert_eq!(months[5], d(2024, 3, 1));
    }

    #[test]
    fn test_active_span_uses_min_and_max() {
        assert_eq!(active_span_days(&[]), 0);

        let records = vec![
            on(line("A", 1.0, 1.0), 2024, 3, 5),
            on(line("A", 1.0, 1.0), 2024, 3, 1),
            on(line("A", 1.0, 1.0), 2024, 3, 3),
        ];
        assert_eq!(active_span_days(&records), 5);
        assert_eq!(active_span_days(&records[..1]), 1);
    }
}
