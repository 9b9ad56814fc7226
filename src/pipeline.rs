// src/pipeline.rs

use tracing::{info, instrument, warn};

use crate::config::Config;
use crate::document::DocumentSource;
use crate::error::{Error, Result};
use crate::extract::DiscoveryReport;
use crate::merge::{MetricMerger, WideRecord};
use crate::output::{distinct_geographies, Payload};
use crate::secondary::{load_secondary, merge_secondary};

/// A finished build.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub geographies: Vec<String>,
    pub metrics: Vec<WideRecord>,
    pub report: DiscoveryReport,
    /// Benchmark rows that were available for merging.
    pub secondary_rows: usize,
    /// Why benchmark values were dropped, when the secondary load failed.
    pub secondary_error: Option<String>,
}

impl Dataset {
    pub fn into_payload(self) -> Payload {
        Payload {
            geographies: self.geographies,
            metrics: self.metrics,
        }
    }
}

/// Primary tables for every configured year, then secondary benchmarks.
///
/// Any primary failure is returned. Secondary failures are logged and the
/// dataset is built without benchmark values.
#[instrument(level = "info", skip_all, fields(years = config.years.len()))]
pub fn build_dataset(config: &Config, source: &dyn DocumentSource) -> Result<Dataset> {
    let wide = MetricMerger::new(source, config).build_wide_table(&config.years, &config.allowlist())?;

    let mut secondary_error = None;
    let secondary = match load_secondary(
        source,
        &config.years,
        &config.rules,
        &config.secondary.targets,
    ) {
        Ok(rows) => rows,
        Err(e) => {
            let e = Error::SecondarySourceUnavailable(e.to_string());
            warn!(error = %e, "continuing with primary data only");
            secondary_error = Some(e.to_string());
            Vec::new()
        }
    };

    let metrics = if secondary.is_empty() {
        info!("no secondary rows; skipping benchmark merge");
        wide.records
    } else {
        merge_secondary(wide.records, &secondary)
    };

    info!(
        records = metrics.len(),
        fallbacks = wide.report.fallback_count(),
        "dataset built"
    );
    Ok(Dataset {
        geographies: distinct_geographies(&metrics),
        metrics,
        report: wide.report,
        secondary_rows: secondary.len(),
        secondary_error,
    })
}
