//! Pure report builders over already-fetched sales lines.
//!
//! Nothing in here touches the store or returns an error. An empty input gives
//! each report's zero shape: an empty list, or the zero-filled monthly series.

pub mod growth;
pub mod grouping;
pub mod items;
pub mod monthly;
pub mod period;
pub mod stats;
pub mod waiters;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::models::{
    CategoryRow, HourlyRow, ItemGrowthRow, ItemRow, SalesLine, WaiterGrowthRow, WaiterSummaryRow,
};

pub use growth::{growth_percent, item_growth, waiter_growth};
pub use grouping::{group_by, Accumulator, Groups, SalesTotals};
pub use items::{category_breakdown, category_shares, item_ranking, top_items};
pub use monthly::monthly_series;
pub use stats::{filter_options, hourly_breakdown, sales_stats};
pub use waiters::{attainment_percent, waiter_pdv_breakdown, waiter_performance, waiter_summary};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DetailedReport {
    ByItem,
    ByWaiter,
    ByGrowth,
    ByHour,
    ByCategory,
    ByWaiterPerformance,
}

impl DetailedReport {
    pub const ALL: [DetailedReport; 6] = [
        DetailedReport::ByItem,
        DetailedReport::ByWaiter,
        DetailedReport::ByGrowth,
        DetailedReport::ByHour,
        DetailedReport::ByCategory,
        DetailedReport::ByWaiterPerformance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DetailedReport::ByItem => "by-item",
            DetailedReport::ByWaiter => "by-waiter",
            DetailedReport::ByGrowth => "by-growth",
            DetailedReport::ByHour => "by-hour",
            DetailedReport::ByCategory => "by-category",
            DetailedReport::ByWaiterPerformance => "by-waiter-performance",
        }
    }

    /// Whether the report reads the prior month at all.
    pub fn needs_prior_period(&self) -> bool {
        matches!(self, DetailedReport::ByGrowth | DetailedReport::ByWaiterPerformance)
    }
}

impl fmt::Display for DetailedReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DetailedReport {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DetailedReport::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| format!("unknown report type: {}", s))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DetailedRows {
    Items(Vec<ItemRow>),
    Waiters(Vec<WaiterSummaryRow>),
    ItemGrowth(Vec<ItemGrowthRow>),
    Hours(Vec<HourlyRow>),
    Categories(Vec<CategoryRow>),
    WaiterGrowth(Vec<WaiterGrowthRow>),
}

impl DetailedRows {
    pub fn len(&self) -> usize {
        match self {
            DetailedRows::Items(rows) => rows.len(),
            DetailedRows::Waiters(rows) => rows.len(),
            DetailedRows::ItemGrowth(rows) => rows.len(),
            DetailedRows::Hours(rows) => rows.len(),
            DetailedRows::Categories(rows) => rows.len(),
            DetailedRows::WaiterGrowth(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub fn detailed_report(kind: DetailedReport, current: &[SalesLine], prior: &[SalesLine]) -> DetailedRows {
    match kind {
        DetailedReport::ByItem => DetailedRows::Items(item_ranking(current)),
        DetailedReport::ByWaiter => DetailedRows::Waiters(waiter_summary(current)),
        DetailedReport::ByGrowth => DetailedRows::ItemGrowth(item_growth(current, prior)),
        DetailedReport::ByHour => DetailedRows::Hours(hourly_breakdown(current)),
        DetailedReport::ByCategory => DetailedRows::Categories(category_breakdown(current)),
        DetailedReport::ByWaiterPerformance => DetailedRows::WaiterGrowth(waiter_growth(current, prior)),
    }
}

#[cfg(test)]
mod tests {
    use super::grouping::fixtures::*;
    use super::*;

    #[test]
    fn test_report_names_round_trip() {
        for kind in DetailedReport::ALL {
            assert_eq!(kind.as_str().parse::<DetailedReport>(), Ok(kind));
        }
        assert!("by-table".parse::<DetailedReport>().is_err());
    }

    #[test]
    fn test_detailed_report_dispatch() {
        let current = vec![in_category(by_waiter(line("Beer", 1.0, 10.0), "Ana"), "Drinks")];

        for kind in DetailedReport::ALL {
            let rows = detailed_report(kind, &current, &[]);
            match (kind, &rows) {
                (DetailedReport::ByHour, DetailedRows::Hours(h)) => assert!(h.is_empty()),
                (DetailedReport::ByHour, _) => panic!("wrong shape for {kind}"),
                _ => assert_eq!(rows.len(), 1, "{kind}"),
            }
        }
    }

    #[test]
    fn test_empty_input_never_panics() {
        for kind in DetailedReport::ALL {
            assert!(detailed_report(kind, &[], &[]).is_empty());
        }
    }
}
