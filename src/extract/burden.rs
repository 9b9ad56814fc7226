use tracing::debug;

use super::numeric::normalize;
use super::rules::{DiscoveryRules, RowPick};
use crate::document::RawDocument;
use crate::error::{Error, Result};

/// Share of owner households paying ≥ 30% of income on housing, per geography.
#[derive(Debug, Clone, PartialEq)]
pub struct BurdenShares {
    /// Baseline row the shares are divided by.
    pub total_row: RowPick,
    /// Bucket rows that were summed.
    pub bucket_rows: Vec<usize>,
    /// `(geo_name, share)` in column order; `None` when the baseline is
    /// missing or zero.
    pub shares: Vec<(String, Option<f64>)>,
}

/// Sum the cost-burdened bucket rows of a B25091 export and divide by its
/// `Total:` row, per estimate column.
///
/// Missing bucket cells count as zero. A missing or zero baseline yields a
/// `None` share rather than a division.
pub fn aggregate_burden_share(doc: &RawDocument, rules: &DiscoveryRules) -> Result<BurdenShares> {
    let label_col = doc.column_index(&rules.label_column).ok_or_else(|| {
        Error::schema(
            &doc.name,
            format!(
                "expected `{}` column, found columns: {:?}",
                rules.label_column, doc.headers
            ),
        )
    })?;
    let labels = doc.column_text(label_col);

    let total_row = rules
        .total_row
        .pick(labels.as_slice())
        .ok_or_else(|| Error::schema(&doc.name, "no baseline row"))?;
    let bucket_rows = rules.burden_rows.select_all(labels.as_slice());

    let estimate_cols = rules.estimate_columns.select_all(&doc.headers);
    if estimate_cols.is_empty() {
        return Err(Error::schema(
            &doc.name,
            format!("no estimate columns found; columns: {:?}", doc.headers),
        ));
    }

    let mut shares = Vec::with_capacity(estimate_cols.len());
    for col in estimate_cols {
        let geo = rules.geo_name(&doc.headers[col]).to_string();
        let total = normalize(doc.cell(total_row.index, col))?;

        let mut burden_sum = 0.0;
        for &row in &bucket_rows {
            burden_sum += normalize(doc.cell(row, col))?.unwrap_or(0.0);
        }

        let share = match total {
            Some(t) if t != 0.0 => Some(burden_sum / t),
            _ => None,
        };
        shares.push((geo, share));
    }

    debug!(
        document = %doc.name,
        total_row = total_row.index,
        matched = total_row.matched,
        buckets = bucket_rows.len(),
        geographies = shares.len(),
        "aggregated burden share"
    );
    Ok(BurdenShares {
        total_row,
        bucket_rows,
        shares,
    })
}
