use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SalesLine {
    pub id: i64,
    pub fiscal_date: NaiveDate,
    #[serde(default)]
    pub fiscal_time: Option<NaiveTime>,
    pub point_of_sale: String,
    pub item_name: String,
    pub quantity: f64,
    pub unit_price: f64,
    pub discount: f64,
    pub service_charge: f64,
    pub total_value: f64,
    pub waiter_name: Option<String>,
    pub category: Option<String>,
    pub fallback_category: Option<String>,
    #[serde(default)]
    pub created_at: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct NewSalesLine {
    pub fiscal_date: NaiveDate,
    pub fiscal_time: Option<NaiveTime>,
    pub point_of_sale: String,
    pub item_name: String,
    pub quantity: f64,
    pub unit_price: f64,
    pub discount: f64,
    pub service_charge: f64,
    pub total_value: f64,
    pub waiter_name: Option<String>,
    pub category: Option<String>,
    pub fallback_category: Option<String>,
}

impl From<SalesLine> for NewSalesLine {
    fn from(line: SalesLine) -> Self {
        NewSalesLine {
            fiscal_date: line.fiscal_date,
            fiscal_time: line.fiscal_time,
            point_of_sale: line.point_of_sale,
            item_name: line.item_name,
            quantity: line.quantity,
            unit_price: line.unit_price,
            discount: line.discount,
            service_charge: line.service_charge,
            total_value: line.total_value,
            waiter_name: line.waiter_name,
            category: line.category,
            fallback_category: line.fallback_category,
        }
    }
}

/// Inclusive date bounds; either side may be open.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Self {
        DateRange {
            from: Some(from),
            to: Some(to),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Selection {
    #[default]
    All,
    Only(String),
}

impl Selection {
    pub fn from_arg(value: Option<String>) -> Self {
        match value {
            Some(v) if !v.trim().is_empty() && v != "all" => Selection::Only(v),
            _ => Selection::All,
        }
    }

    pub fn as_only(&self) -> Option<&str> {
        match self {
            Selection::All => None,
            Selection::Only(v) => Some(v.as_str()),
        }
    }
}

/// Which records are in scope for a report.
///
/// An empty `categories` set means no category restriction.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct FilterSpec {
    pub date_range: Option<DateRange>,
    #[serde(default)]
    pub categories: BTreeSet<String>,
    #[serde(default)]
    pub waiter: Selection,
    #[serde(default)]
    pub point_of_sale: Selection,
}

impl FilterSpec {
    pub fn with_date_range(&self, range: DateRange) -> Self {
        FilterSpec {
            date_range: Some(range),
            ..self.clone()
        }
    }

    pub fn without_categories(&self) -> Self {
        FilterSpec {
            categories: BTreeSet::new(),
            ..self.clone()
        }
    }
}

// ===== Report rows =====

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ItemRow {
    pub name: String,
    pub category: String,
    pub quantity: f64,
    pub total_value: f64,
    pub sales_count: u32,
    pub unit_value: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CategoryRow {
    pub name: String,
    pub total_value: f64,
    pub quantity: f64,
    pub item_count: usize,
    pub percentage: i64,
    pub items: Vec<ItemRow>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CategoryShare {
    pub name: String,
    pub total_value: f64,
    pub percentage: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MonthlyPoint {
    pub month: String, // "YYYY-MM"
    pub label: String,
    pub revenue: f64,
    pub goal: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ItemGrowthRow {
    pub name: String,
    pub category: String,
    pub current_quantity: f64,
    pub prior_quantity: f64,
    pub quantity_growth: f64,
    pub current_revenue: f64,
    pub prior_revenue: f64,
    pub revenue_growth: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WaiterGrowthRow {
    pub name: String,
    pub current_orders: u32,
    pub prior_orders: u32,
    pub orders_growth: f64,
    pub current_revenue: f64,
    pub prior_revenue: f64,
    pub revenue_growth: f64,
    pub current_ticket: f64,
    pub prior_ticket: f64,
    pub ticket_growth: f64,
    pub current_items: f64,
    pub prior_items: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WaiterPerformanceRow {
    pub rank: usize,
    pub name: String,
    pub revenue: f64,
    pub order_count: u32,
    pub attainment_percent: u8,
}

impl WaiterPerformanceRow {
    /// Ranks 1 to 3 get a medal on the dashboard.
    pub fn has_medal(&self) -> bool {
        (1..=3).contains(&self.rank)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WaiterPdvRow {
    pub point_of_sale: String,
    pub revenue: f64,
    pub order_count: u32,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WaiterSummaryRow {
    pub name: String,
    pub revenue: f64,
    pub order_count: u32,
    pub items_sold: f64,
    pub average_ticket: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct HourlyRow {
    pub hour: String, // "HH:00"
    pub revenue: f64,
    pub order_count: u32,
    pub average_ticket: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct SalesStats {
    pub total_sales: f64,
    pub total_orders: usize,
    pub average_ticket: f64,
    pub active_waiters: usize,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct FilterOptions {
    pub categories: Vec<String>,
    pub waiters: Vec<String>,
    pub points_of_sale: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub read: usize,
    pub rejected: usize,
    pub duplicates: usize,
    pub inserted: usize,
}
