// src/check/mod.rs

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::merge::WideRecord;

/// Count/mean/min/max over the non-null values of one field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stats {
    pub count: usize,
    pub mean: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl Stats {
    pub fn of(values: impl IntoIterator<Item = Option<f64>>) -> Self {
        let present: Vec<f64> = values.into_iter().flatten().filter(|v| !v.is_nan()).collect();
        if present.is_empty() {
            return Self {
                count: 0,
                mean: None,
                min: None,
                max: None,
            };
        }
        let sum: f64 = present.iter().sum();
        Self {
            count: present.len(),
            mean: Some(sum / present.len() as f64),
            min: present.iter().copied().reduce(f64::min),
            max: present.iter().copied().reduce(f64::max),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeoSummary {
    pub geo_name: String,
    pub price_to_income: Stats,
    pub rent_to_income: Stats,
    pub owner_cost_burdened_share: Stats,
}

/// Shape and completeness of a built dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityReport {
    pub records: usize,
    pub geographies: Vec<String>,
    pub years: Vec<u16>,
    /// Null count per numeric field.
    pub missing: BTreeMap<String, usize>,
    pub summaries: Vec<GeoSummary>,
}

type Field = (&'static str, fn(&WideRecord) -> Option<f64>);

const NUMERIC_FIELDS: [Field; 7] = [
    ("median_household_income", |r| r.median_household_income),
    ("median_home_value", |r| r.median_home_value),
    ("median_gross_rent", |r| r.median_gross_rent),
    ("owner_cost_burdened_share", |r| r.owner_cost_burdened_share),
    ("price_to_income", |r| r.price_to_income),
    ("rent_to_income", |r| r.rent_to_income),
    ("hud_fmr_2br", |r| r.hud_fmr_2br),
];

pub fn check_dataset(records: &[WideRecord]) -> QualityReport {
    let geographies: Vec<String> = records
        .iter()
        .map(|r| r.geo_name.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let years: Vec<u16> = records
        .iter()
        .map(|r| r.year)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let missing = NUMERIC_FIELDS
        .iter()
        .map(|(name, get)| {
            let n = records.iter().filter(|r| get(r).is_none()).count();
            (name.to_string(), n)
        })
        .collect();

    let summaries = geographies
        .iter()
        .map(|geo| {
            let rows: Vec<&WideRecord> = records.iter().filter(|r| &r.geo_name == geo).collect();
            GeoSummary {
                geo_name: geo.clone(),
                price_to_income: Stats::of(rows.iter().map(|r| r.price_to_income)),
                rent_to_income: Stats::of(rows.iter().map(|r| r.rent_to_income)),
                owner_cost_burdened_share: Stats::of(
                    rows.iter().map(|r| r.owner_cost_burdened_share),
                ),
            }
        })
        .collect();

    QualityReport {
        records: records.len(),
        geographies,
        years,
        missing,
        summaries,
    }
}
