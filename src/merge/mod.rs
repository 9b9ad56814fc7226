// src/merge/mod.rs

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::config::Config;
use crate::document::DocumentSource;
use crate::error::Result;
use crate::extract::{
    aggregate_burden_share, extract_point_estimates, normalize, BurdenShares, DiscoveryReport,
    PointEstimates,
};

/// One `(year, geography)` value of a single metric.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricRecord {
    pub year: u16,
    pub geo_name: String,
    pub value: Option<f64>,
}

/// A tidy single-metric table.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricTable {
    pub metric: String,
    pub records: Vec<MetricRecord>,
}

impl MetricTable {
    /// Normalize every estimate; a cell that isn't a number fails the table.
    pub fn from_estimates(metric: &str, year: u16, estimates: &PointEstimates) -> Result<Self> {
        let records = estimates
            .values
            .iter()
            .map(|(geo, cell)| {
                Ok(MetricRecord {
                    year,
                    geo_name: geo.clone(),
                    value: normalize(cell)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            metric: metric.to_string(),
            records,
        })
    }

    pub fn from_shares(metric: &str, year: u16, shares: &BurdenShares) -> Self {
        let records = shares
            .shares
            .iter()
            .map(|(geo, share)| MetricRecord {
                year,
                geo_name: geo.clone(),
                value: *share,
            })
            .collect();
        Self {
            metric: metric.to_string(),
            records,
        }
    }

    /// `(year, geo_name)` → value. A repeated key keeps its first value.
    fn index(&self) -> HashMap<(u16, &str), Option<f64>> {
        let mut map = HashMap::with_capacity(self.records.len());
        for r in &self.records {
            map.entry((r.year, r.geo_name.as_str())).or_insert(r.value);
        }
        map
    }
}

/// All metrics for one `(year, geography)`.
///
/// Field order is the serialized column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WideRecord {
    pub year: u16,
    pub geo_name: String,
    pub median_household_income: Option<f64>,
    pub median_home_value: Option<f64>,
    pub median_gross_rent: Option<f64>,
    pub owner_cost_burdened_share: Option<f64>,
    pub price_to_income: Option<f64>,
    pub rent_to_income: Option<f64>,
    /// Written as `null` on every record that has no benchmark.
    #[serde(default)]
    pub hud_fmr_2br: Option<f64>,
}

impl WideRecord {
    /// Build a record and derive both ratios from the medians.
    pub fn new(
        year: u16,
        geo_name: impl Into<String>,
        income: Option<f64>,
        home_value: Option<f64>,
        rent: Option<f64>,
        burden_share: Option<f64>,
    ) -> Self {
        Self {
            year,
            geo_name: geo_name.into(),
            median_household_income: income,
            median_home_value: home_value,
            median_gross_rent: rent,
            owner_cost_burdened_share: burden_share,
            price_to_income: ratio(home_value, income),
            rent_to_income: ratio(rent.map(|r| r * 12.0), income),
            hud_fmr_2br: None,
        }
    }
}

/// `num / den`, or `None` when either side is missing or `den` is zero.
pub fn ratio(num: Option<f64>, den: Option<f64>) -> Option<f64> {
    match (num, den) {
        (Some(n), Some(d)) if d != 0.0 => Some(n / d),
        _ => None,
    }
}

/// income ⋈ home value ⋈ rent (inner) ⟕ burden (left), in income-table order.
pub fn join_metrics(
    income: &MetricTable,
    home_value: &MetricTable,
    rent: &MetricTable,
    burden: &MetricTable,
) -> Vec<WideRecord> {
    let home_idx = home_value.index();
    let rent_idx = rent.index();
    let burden_idx = burden.index();

    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(income.records.len());
    for rec in &income.records {
        let key = (rec.year, rec.geo_name.as_str());
        if !seen.insert(key) {
            continue;
        }
        let (Some(home), Some(rent)) = (home_idx.get(&key), rent_idx.get(&key)) else {
            debug!(year = rec.year, geo = %rec.geo_name, "dropped: missing from a core table");
            continue;
        };
        let burden = burden_idx.get(&key).copied().flatten();
        out.push(WideRecord::new(
            rec.year,
            rec.geo_name.clone(),
            rec.value,
            *home,
            *rent,
            burden,
        ));
    }
    out
}

/// Keep only rows whose `geo_name` is in `allowlist`, matched exactly.
pub fn filter_allowlist(records: Vec<WideRecord>, allowlist: &HashSet<String>) -> Vec<WideRecord> {
    records
        .into_iter()
        .filter(|r| allowlist.contains(&r.geo_name))
        .collect()
}

/// Primary wide table, plus every discovery fallback taken while building it.
#[derive(Debug, Clone, PartialEq)]
pub struct WideTable {
    pub records: Vec<WideRecord>,
    pub report: DiscoveryReport,
}

/// Loads and joins the four census tables for each year.
pub struct MetricMerger<'a> {
    source: &'a dyn DocumentSource,
    config: &'a Config,
}

impl<'a> MetricMerger<'a> {
    pub fn new(source: &'a dyn DocumentSource, config: &'a Config) -> Self {
        Self { source, config }
    }

    /// Years are processed in order and concatenated; the allowlist filter
    /// runs over the concatenation. Any primary table failure aborts.
    #[instrument(level = "info", skip(self, allowlist), fields(years = years.len()))]
    pub fn build_wide_table(&self, years: &[u16], allowlist: &HashSet<String>) -> Result<WideTable> {
        let mut report = DiscoveryReport::default();
        let mut all = Vec::new();
        for &year in years {
            let rows = self.build_year(year, &mut report)?;
            info!(year, rows = rows.len(), "joined census tables");
            all.extend(rows);
        }
        let records = filter_allowlist(all, allowlist);
        info!(records = records.len(), "filtered to allowlist");
        Ok(WideTable { records, report })
    }

    fn build_year(&self, year: u16, report: &mut DiscoveryReport) -> Result<Vec<WideRecord>> {
        let tables = &self.config.primary;
        let income = self.point_table(year, &tables.income, "median_household_income", report)?;
        let home = self.point_table(year, &tables.home_value, "median_home_value", report)?;
        let rent = self.point_table(year, &tables.rent, "median_gross_rent", report)?;

        let doc = self.source.primary(year, &tables.owner_cost_burden)?;
        let shares = aggregate_burden_share(&doc, &self.config.rules)?;
        report.note(year, &doc.name, &self.config.rules.total_row.name, shares.total_row);
        let burden = MetricTable::from_shares("owner_cost_burdened_share", year, &shares);

        Ok(join_metrics(&income, &home, &rent, &burden))
    }

    fn point_table(
        &self,
        year: u16,
        table_id: &str,
        metric: &str,
        report: &mut DiscoveryReport,
    ) -> Result<MetricTable> {
        let doc = self.source.primary(year, table_id)?;
        let estimates = extract_point_estimates(&doc, &self.config.rules)?;
        report.note(year, &doc.name, &self.config.rules.median_row.name, estimates.row);
        MetricTable::from_estimates(metric, year, &estimates)
    }
}
