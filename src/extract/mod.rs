// src/extract/mod.rs

pub mod burden;
pub mod estimates;
pub mod numeric;
pub mod rules;

pub use burden::{aggregate_burden_share, BurdenShares};
pub use estimates::{extract_point_estimates, PointEstimates};
pub use numeric::normalize;
pub use rules::{DiscoveryRules, Fallback, RowPick, RowSetRule};

use serde::Serialize;
use tracing::warn;

/// A row rule that found nothing and substituted its fallback row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FallbackEvent {
    pub year: u16,
    pub document: String,
    pub rule: String,
}

/// Every fallback taken during a build, so a substituted row is never
/// indistinguishable from a matched one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiscoveryReport {
    pub fallbacks: Vec<FallbackEvent>,
}

impl DiscoveryReport {
    /// Record `pick` if it came from a fallback.
    pub fn note(&mut self, year: u16, document: &str, rule: &str, pick: RowPick) {
        if pick.matched {
            return;
        }
        warn!(year, document, rule, row = pick.index, "no labelled row matched, fell back");
        self.fallbacks.push(FallbackEvent {
            year,
            document: document.to_string(),
            rule: rule.to_string(),
        });
    }

    pub fn fallback_count(&self) -> usize {
        self.fallbacks.len()
    }

    pub fn is_clean(&self) -> bool {
        self.fallbacks.is_empty()
    }
}
