use tracing::debug;

use super::rules::{DiscoveryRules, RowPick};
use crate::document::{Cell, RawDocument};
use crate::error::{Error, Result};

/// Per-geography point estimates taken from one row of an export.
#[derive(Debug, Clone, PartialEq)]
pub struct PointEstimates {
    /// The row the values came from.
    pub row: RowPick,
    /// `(geo_name, raw cell)` in column order.
    pub values: Vec<(String, Cell)>,
}

/// Find the median row and every `!!Estimate` column of a census export.
///
/// Errors with `Schema` when the label column is absent, the document has
/// no data rows, or no estimate column exists. When no label matches, the
/// first data row is used and `row.matched` is false.
pub fn extract_point_estimates(doc: &RawDocument, rules: &DiscoveryRules) -> Result<PointEstimates> {
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
    let row = rules
        .median_row
        .pick(labels.as_slice())
        .ok_or_else(|| Error::schema(&doc.name, "no data row to take estimates from"))?;

    let estimate_cols = rules.estimate_columns.select_all(&doc.headers);
    if estimate_cols.is_empty() {
        return Err(Error::schema(
            &doc.name,
            format!("no estimate columns found; columns: {:?}", doc.headers),
        ));
    }

    let values: Vec<(String, Cell)> = estimate_cols
        .into_iter()
        .map(|col| {
            let geo = rules.geo_name(&doc.headers[col]).to_string();
            (geo, doc.cell(row.index, col).clone())
        })
        .collect();

    debug!(
        document = %doc.name,
        row = row.index,
        matched = row.matched,
        geographies = values.len(),
        "extracted point estimates"
    );
    Ok(PointEstimates { row, values })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::csv_export::read_csv;
    use std::io::Cursor;

    const B25077: &str = "Label (Grouping),\"Otter Tail County, Minnesota!!Estimate\",\"Otter Tail County, Minnesota!!Margin of Error\",\"Hennepin County, Minnesota!!Estimate\",\"Hennepin County, Minnesota!!Margin of Error\"\nOwner-occupied housing units,\"30,000\",±500,\"300,000\",\"±1,000\"\nMedian value (dollars),\"185,400\",\"±3,512\",\"277,600\",\"±1,203\"\n";

    #[test]
    fn picks_median_row_and_estimate_columns() -> Result<()> {
        let doc = read_csv("b25077", Cursor::new(B25077))?;
        let est = extract_point_estimates(&doc, &DiscoveryRules::default())?;
        assert_eq!(
            est.row,
            RowPick {
                index: 1,
                matched: true
            }
        );
        assert_eq!(
            est.values,
            vec![
                (
                    "Otter Tail County, Minnesota".to_string(),
                    Cell::Text("185,400".into())
                ),
                (
                    "Hennepin County, Minnesota".to_string(),
                    Cell::Text("277,600".into())
                ),
            ]
        );
        Ok(())
    }

    #[test]
    fn unlabelled_export_falls_back_to_first_row() -> Result<()> {
        let csv = "Label (Grouping),X County!!Estimate\nEstimate,\"1,200\"\nOther,5\n";
        let doc = read_csv("b25064", Cursor::new(csv))?;
        let est = extract_point_estimates(&doc, &DiscoveryRules::default())?;
        assert!(!est.row.matched);
        assert_eq!(est.row.index, 0);
        assert_eq!(est.values[0].1, Cell::Text("1,200".into()));
        Ok(())
    }

    #[test]
    fn missing_label_column_is_schema_error() -> Result<()> {
        let doc = read_csv("bad", Cursor::new("Label,X!!Estimate\nMedian,1\n"))?;
        let err = extract_point_estimates(&doc, &DiscoveryRules::default()).unwrap_err();
        assert!(matches!(err, Error::Schema { .. }));
        Ok(())
    }

    #[test]
    fn no_estimate_columns_is_schema_error() -> Result<()> {
        let doc = read_csv(
            "moe-only",
            Cursor::new("Label (Grouping),X!!Margin of Error\nMedian,1\n"),
        )?;
        let err = extract_point_estimates(&doc, &DiscoveryRules::default()).unwrap_err();
        assert!(matches!(err, Error::Schema { .. }));
        Ok(())
    }

    #[test]
    fn header_only_export_is_schema_error() -> Result<()> {
        let doc = read_csv("empty", Cursor::new("Label (Grouping),X!!Estimate\n"))?;
        assert!(extract_point_estimates(&doc, &DiscoveryRules::default()).is_err());
        Ok(())
    }

    #[test]
    fn extraction_is_repeatable() -> Result<()> {
        let doc = read_csv("b25077", Cursor::new(B25077))?;
        let rules = DiscoveryRules::default();
        assert_eq!(
            extract_point_estimates(&doc, &rules)?,
            extract_point_estimates(&doc, &rules)?
        );
        Ok(())
    }
}
