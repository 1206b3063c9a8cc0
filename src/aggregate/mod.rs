// src/aggregate/mod.rs
pub mod stats;

pub use stats::{BoxStats, DensityCurve, Histogram};

use crate::derive::DerivedTable;
use arrow::array::{Array, Float64Array, StringArray};
use serde::Serialize;
use std::{
    cmp::Ordering,
    collections::{BTreeMap, HashMap},
};

/// How many products the ranking keeps.
pub const TOP_PRODUCTS: usize = 10;

/// A grouping key (month, year, product, category).
///
/// Keys that parse as numbers order numerically and before all other keys;
/// the rest order as plain strings. `"2"` therefore sorts before `"10"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupKey(String);

impl GroupKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn numeric(&self) -> Option<f64> {
        self.0.parse::<f64>().ok().filter(|v| v.is_finite())
    }
}

impl Ord for GroupKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.numeric(), other.numeric()) {
            (Some(a), Some(b)) => a.total_cmp(&b).then_with(|| self.0.cmp(&other.0)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for GroupKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// One bar / point of an aggregate view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Grouped<V> {
    pub key: String,
    pub value: V,
}

/// `sum(values)` per key, in key order.
pub fn sum_by(keys: &StringArray, values: &Float64Array) -> Vec<Grouped<f64>> {
    let mut groups: BTreeMap<GroupKey, f64> = BTreeMap::new();
    for (i, v) in values.values().iter().enumerate().take(keys.len()) {
        *groups.entry(GroupKey(keys.value(i).to_string())).or_insert(0.0) += v;
    }
    groups
        .into_iter()
        .map(|(k, value)| Grouped { key: k.0, value })
        .collect()
}

/// Row count per key, in key order.
pub fn count_by(keys: &StringArray) -> Vec<Grouped<usize>> {
    let mut groups: BTreeMap<GroupKey, usize> = BTreeMap::new();
    for i in 0..keys.len() {
        *groups.entry(GroupKey(keys.value(i).to_string())).or_insert(0) += 1;
    }
    groups
        .into_iter()
        .map(|(k, value)| Grouped { key: k.0, value })
        .collect()
}

/// Descending by count, ties left in key order, cut to `limit`.
pub fn top_counts(mut groups: Vec<Grouped<usize>>, limit: usize) -> Vec<Grouped<usize>> {
    groups.sort_by(|a, b| b.value.cmp(&a.value));
    groups.truncate(limit);
    groups
}

/// Descending by sum, ties left in key order.
pub fn rank_sums(mut groups: Vec<Grouped<f64>>) -> Vec<Grouped<f64>> {
    groups.sort_by(|a, b| b.value.total_cmp(&a.value));
    groups
}

/// Values split by key, groups in order of first appearance.
pub fn partition_by(keys: &StringArray, values: &Float64Array) -> Vec<(String, Vec<f64>)> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut parts: Vec<(String, Vec<f64>)> = Vec::new();
    for (i, v) in values.values().iter().enumerate().take(keys.len()) {
        let key = keys.value(i);
        let slot = *index.entry(key).or_insert_with(|| {
            parts.push((key.to_string(), Vec::new()));
            parts.len() - 1
        });
        parts[slot].1.push(*v);
    }
    parts
}

/// Revenue spread for one category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySpread {
    pub category: String,
    pub stats: BoxStats,
}

/// Histogram plus optional density overlay.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Distribution {
    pub histogram: Option<Histogram>,
    pub density: Option<DensityCurve>,
}

impl Distribution {
    pub fn from_values(values: &[f64]) -> Self {
        let histogram = Histogram::from_values(values);
        let density = histogram
            .as_ref()
            .and_then(|h| DensityCurve::estimate(values, h.bin_width()));
        Self { histogram, density }
    }
}

/// Every view the dashboard shows, computed fresh from one derived table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Aggregates {
    pub sales_by_month: Vec<Grouped<f64>>,
    pub sales_by_year: Vec<Grouped<f64>>,
    pub top_products: Vec<Grouped<usize>>,
    pub sales_by_category: Vec<Grouped<f64>>,
    pub total_invoice: f64,
    pub revenue_distribution: Distribution,
    pub revenue_by_category: Vec<CategorySpread>,
}

impl Aggregates {
    pub fn compute(derived: &DerivedTable) -> Self {
        let table = derived.table();
        let revenue = derived.total_venta();

        let revenue_by_category = partition_by(table.categoria(), revenue)
            .into_iter()
            .filter_map(|(category, values)| {
                BoxStats::from_values(&values).map(|stats| CategorySpread { category, stats })
            })
            .collect();

        Self {
            sales_by_month: sum_by(table.mes(), revenue),
            sales_by_year: sum_by(table.anio(), revenue),
            top_products: top_counts(count_by(table.producto()), TOP_PRODUCTS),
            sales_by_category: rank_sums(sum_by(table.categoria(), revenue)),
            total_invoice: total_invoice(revenue),
            revenue_distribution: Distribution::from_values(revenue.values()),
            revenue_by_category,
        }
    }
}

/// Sum of every `Total_Venta`; zero for an empty table.
pub fn total_invoice(revenue: &Float64Array) -> f64 {
    arrow::compute::sum(revenue).unwrap_or(0.0)
}
