//! Keyed folding of sales lines.
//!
//! Every report reduces a flat record slice into per-key accumulators. The
//! accumulators are sums and counts, so two groupings over disjoint batches can
//! be merged in any order and give the same result.

use std::collections::HashMap;
use std::hash::Hash;

use crate::models::SalesLine;

pub const UNCATEGORIZED: &str = "uncategorized";
pub const WAITER_NOT_INFORMED: &str = "not informed";
pub const NOT_IDENTIFIED: &str = "not identified";

pub trait Accumulator: Default {
    fn add(&mut self, line: &SalesLine);

    fn merge(&mut self, other: Self);
}

/// Quantity, revenue and line count for one key.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SalesTotals {
    pub quantity: f64,
    pub total_value: f64,
    pub lines: u32,
}

impl SalesTotals {
    /// Revenue per line, 0 when there are no lines.
    pub fn average_ticket(&self) -> f64 {
        if self.lines > 0 {
            self.total_value / self.lines as f64
        } else {
            0.0
        }
    }
}

impl Accumulator for SalesTotals {
    fn add(&mut self, line: &SalesLine) {
        self.quantity += line.quantity;
        self.total_value += line.total_value;
        self.lines += 1;
    }

    fn merge(&mut self, other: Self) {
        self.quantity += other.quantity;
        self.total_value += other.total_value;
        self.lines += other.lines;
    }
}

/// Result of [`group_by`]: accumulators addressable by key, iterable in
/// first-seen order so callers get a deterministic base for stable sorts.
#[derive(Debug, Clone)]
pub struct Groups<K, A> {
    index: HashMap<K, usize>,
    entries: Vec<(K, A)>,
}

impl<K, A> Default for Groups<K, A> {
    fn default() -> Self {
        Groups {
            index: HashMap::new(),
            entries: Vec::new(),
        }
    }
}

impl<K, A> Groups<K, A>
where
    K: Eq + Hash + Clone,
    A: Accumulator,
{
    pub fn entry(&mut self, key: K) -> &mut A {
        let slot = match self.index.get(&key) {
            Some(&slot) => slot,
            None => {
                self.entries.push((key.clone(), A::default()));
                self.index.insert(key, self.entries.len() - 1);
                self.entries.len() - 1
            }
        };
        &mut self.entries[slot].1
    }

    pub fn get(&self, key: &K) -> Option<&A> {
        self.index.get(key).map(|&slot| &self.entries[slot].1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &A)> {
        self.entries.iter().map(|(k, a)| (k, a))
    }

    /// Folds another grouping into this one. Keys new to `self` are appended
    /// after the existing ones.
    pub fn merge(&mut self, other: Groups<K, A>) {
        for (key, acc) in other.entries {
            self.entry(key).merge(acc);
        }
    }

    pub fn into_entries(self) -> Vec<(K, A)> {
        self.entries
    }
}

/// Groups `records` by the key `key_fn` extracts. Records for which the
/// extractor returns `None` are dropped.
pub fn group_by<K, A, F>(records: &[SalesLine], mut key_fn: F) -> Groups<K, A>
where
    K: Eq + Hash + Clone,
    A: Accumulator,
    F: FnMut(&SalesLine) -> Option<K>,
{
    let mut groups: Groups<K, A> = Groups::default();
    for line in records {
        if let Some(key) = key_fn(line) {
            groups.entry(key).add(line);
        }
    }
    groups
}

pub(crate) fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty())
}

/// `category`, then `fallback_category`, without the final default.
pub fn category_label(line: &SalesLine) -> Option<&str> {
    non_empty(line.category.as_ref()).or_else(|| non_empty(line.fallback_category.as_ref()))
}

pub fn resolved_category(line: &SalesLine) -> String {
    category_label(line).unwrap_or(UNCATEGORIZED).to_string()
}

pub fn item_key(line: &SalesLine) -> Option<String> {
    non_empty(Some(&line.item_name)).map(str::to_string)
}

pub fn waiter_or(line: &SalesLine, default: &str) -> String {
    non_empty(line.waiter_name.as_ref())
        .unwrap_or(default)
        .to_string()
}

/// Stable descending sort on an `f64` metric; equal values keep their order.
pub fn sort_desc_by<T, F>(rows: &mut [T], metric: F)
where
    F: Fn(&T) -> f64,
{
    rows.sort_by(|a, b| metric(b).total_cmp(&metric(a)));
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::NaiveDate;

    use crate::models::SalesLine;

    pub fn line(item: &str, quantity: f64, total: f64) -> SalesLine {
        SalesLine {
            id: 0,
            fiscal_date: NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
            fiscal_time: None,
            point_of_sale: "Bar".to_string(),
            item_name: item.to_string(),
            quantity,
            unit_price: 0.0,
            discount: 0.0,
            service_charge: 0.0,
            total_value: total,
            waiter_name: None,
            category: None,
            fallback_category: None,
            created_at: String::new(),
        }
    }

    pub fn on(mut line: SalesLine, y: i32, m: u32, d: u32) -> SalesLine {
        line.fiscal_date = NaiveDate::from_ymd_opt(y, m, d).unwrap();
        line
    }

    pub fn in_category(mut line: SalesLine, category: &str) -> SalesLine {
        line.category = Some(category.to_string());
        line
    }

    pub fn by_waiter(mut line: SalesLine, waiter: &str) -> SalesLine {
        line.waiter_name = Some(waiter.to_string());
        line
    }

    pub fn at_pdv(mut line: SalesLine, pdv: &str) -> SalesLine {
        line.point_of_sale = pdv.to_string();
        line
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_group_by_sums_and_counts() {
        let records = vec![line("Beer", 1.0, 10.0), line("Wine", 1.0, 30.0), line("Beer", 2.0, 20.0)];

        let groups: Groups<String, SalesTotals> = group_by(&records, item_key);

        assert_eq!(groups.len(), 2);
        let beer = groups.get(&"Beer".to_string()).unwrap();
        assert_eq!(beer.quantity, 3.0);
        assert_eq!(beer.total_value, 30.0);
        assert_eq!(beer.lines, 2);
    }

    #[test]
    fn test_group_by_drops_missing_keys() {
        let records = vec![line("", 1.0, 10.0), line("  ", 1.0, 5.0), line("Beer", 1.0, 7.0)];

        let groups: Groups<String, SalesTotals> = group_by(&records, item_key);

        assert_eq!(groups.len(), 1);
        assert!(groups.get(&"Beer".to_string()).is_some());
    }

    #[test]
    fn test_group_by_keeps_first_seen_order() {
        let records = vec![line("B", 1.0, 1.0), line("A", 1.0, 1.0), line("B", 1.0, 1.0)];

        let groups: Groups<String, SalesTotals> = group_by(&records, item_key);
        let keys: Vec<_> = groups.iter().map(|(k, _)| k.clone()).collect();

        assert_eq!(keys, vec!["B", "A"]);
    }

    #[test]
    fn test_merge_matches_single_pass() {
        let records = vec![
            line("Beer", 1.0, 10.0),
            line("Wine", 2.0, 40.0),
            line("Beer", 3.0, 15.0),
            line("Water", 1.0, 3.0),
        ];
        let whole: Groups<String, SalesTotals> = group_by(&records, item_key);

        // Merge the halves in reverse order
        let mut merged: Groups<String, SalesTotals> = group_by(&records[2..], item_key);
        merged.merge(group_by(&records[..2], item_key));

        assert_eq!(merged.len(), whole.len());
        for (key, totals) in whole.iter() {
            assert_eq!(merged.get(key), Some(totals));
        }
    }

    #[test]
    fn test_category_resolution_order() {
        let mut l = line("Beer", 1.0, 1.0);
        assert_eq!(resolved_category(&l), UNCATEGORIZED);

        l.fallback_category = Some("Drinks".to_string());
        assert_eq!(resolved_category(&l), "Drinks");

        l.category = Some("".to_string());
        assert_eq!(resolved_category(&l), "Drinks");

        l.category = Some("Beers".to_string());
        assert_eq!(resolved_category(&l), "Beers");
    }

    #[test]
    fn test_sort_desc_is_stable() {
        let mut rows = vec![("a", 5.0), ("b", 10.0), ("c", 5.0), ("d", 10.0)];
        sort_desc_by(&mut rows, |r| r.1);
        let names: Vec<_> = rows.iter().map(|r| r.0).collect();
        assert_eq!(names, vec!["b", "d", "a", "c"]);
    }
}
