use chrono::NaiveDate;

use crate::analytics::period::{self, PeriodPolicy};
use crate::analytics::{self, DetailedReport, DetailedRows};
use crate::cache::ReportCache;
use crate::commands::sales;
use crate::db::DatabaseExt;
use crate::error::Result;
use crate::models::{
    CategoryShare, DateRange, FilterSpec, ItemRow, MonthlyPoint, SalesLine, SalesStats,
    Selection, WaiterPdvRow, WaiterPerformanceRow,
};
use crate::state::AppState;

/// Number of rows on the dashboard's top items card.
pub const TOP_ITEMS_LIMIT: usize = 5;

/// Fetches through the short-lived result cache.
fn fetch(app: &AppState, filter: &FilterSpec) -> Result<Vec<SalesLine>> {
    let key = ReportCache::key("sales", filter);
    app.cache.get_or_compute(&key, || sales::query(app.db(), filter))
}

fn current_filter(filter: &FilterSpec, today: NaiveDate, policy: PeriodPolicy) -> FilterSpec {
    filter.with_date_range(period::current_period(filter.date_range, today, policy))
}

fn prior_filter(filter: &FilterSpec, today: NaiveDate) -> FilterSpec {
    filter.with_date_range(period::prior_month(today))
}

pub fn get_monthly_sales(app: &AppState, filter: &FilterSpec, today: NaiveDate) -> Result<Vec<MonthlyPoint>> {
    let window = DateRange {
        from: Some(period::series_window_start(today)),
        to: None,
    };
    let lines = fetch(app, &filter.with_date_range(window))?;
    Ok(analytics::monthly_series(
        &lines,
        today,
        app.config.goals.monthly_revenue,
    ))
}

pub fn get_top_items(
    app: &AppState,
    filter: &FilterSpec,
    today: NaiveDate,
    limit: Option<usize>,
) -> Result<Vec<ItemRow>> {
    let lines = fetch(app, &current_filter(filter, today, PeriodPolicy::FillFromMonth))?;
    Ok(analytics::top_items(&lines, limit.unwrap_or(TOP_ITEMS_LIMIT)))
}

/// Category shares for the selected range, or month-to-date when no range is
/// selected.
pub fn get_category_sales(app: &AppState, filter: &FilterSpec, today: NaiveDate) -> Result<Vec<CategoryShare>> {
    let selected = filter.date_range.unwrap_or_default();
    let range = DateRange {
        from: selected.from.or(Some(period::first_day_of_month(today))),
        to: selected.to.or(Some(today)),
    };
    let lines = fetch(app, &filter.with_date_range(range))?;
    Ok(analytics::category_shares(&lines))
}

pub fn get_detailed_report(
    app: &AppState,
    kind: DetailedReport,
    filter: &FilterSpec,
    today: NaiveDate,
) -> Result<DetailedRows> {
    let current = fetch(app, &current_filter(filter, today, PeriodPolicy::GivenBounds))?;
    let prior = if kind.needs_prior_period() {
        fetch(app, &prior_filter(filter, today))?
    } else {
        Vec::new()
    };

    tracing::debug!(
        "Building {} report from {} current and {} prior lines",
        kind,
        current.len(),
        prior.len()
    );
    let rows = analytics::detailed_report(kind, &current, &prior);
    tracing::info!("Report {} produced {} rows", kind, rows.len());
    Ok(rows)
}

/// Waiter ranking with goal attainment. The category filter does not apply.
pub fn get_waiter_performance(
    app: &AppState,
    filter: &FilterSpec,
    today: NaiveDate,
) -> Result<Vec<WaiterPerformanceRow>> {
    let scoped = current_filter(&filter.without_categories(), today, PeriodPolicy::CompleteRange);
    let lines = fetch(app, &scoped)?;
    Ok(analytics::waiter_performance(&lines, app.config.goals.waiter_daily))
}

pub fn get_waiter_pdv_details(
    app: &AppState,
    waiter: &str,
    filter: &FilterSpec,
    today: NaiveDate,
) -> Result<Vec<WaiterPdvRow>> {
    let scoped = FilterSpec {
        date_range: Some(period::current_period(
            filter.date_range,
            today,
            PeriodPolicy::CompleteRange,
        )),
        waiter: Selection::Only(waiter.to_string()),
        ..FilterSpec::default()
    };
    let lines = fetch(app, &scoped)?;
    Ok(analytics::waiter_pdv_breakdown(&lines, waiter))
}

/// Headline numbers over exactly the filter given; no period defaults.
pub fn get_sales_stats(app: &AppState, filter: &FilterSpec) -> Result<SalesStats> {
    let lines = fetch(app, filter)?;
    Ok(analytics::sales_stats(&lines))
}
