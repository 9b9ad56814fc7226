// src/secondary/mod.rs
//
// HUD Fair Market Rent benchmarks. Everything here is best-effort: a year
// whose workbook is unmapped, missing or unreadable simply has no values.

use std::collections::HashMap;

use tracing::{debug, info, instrument, warn};

use crate::document::{DocumentSource, RawDocument, SecondaryLookup};
use crate::error::{Error, Result};
use crate::extract::{normalize, DiscoveryRules};
use crate::merge::WideRecord;

/// One benchmark value, keyed the way the secondary document names it.
#[derive(Debug, Clone, PartialEq)]
pub struct SecondaryRecord {
    pub year: u16,
    pub geo_name: String,
    pub value: Option<f64>,
}

/// Substring patterns derived from target geographies: the part before the
/// first comma, lowercased. Blank patterns are dropped so they can't match
/// every row.
pub fn target_patterns(targets: &[String]) -> Vec<String> {
    targets
        .iter()
        .filter_map(|t| {
            let head = t.split(',').next().unwrap_or_default().trim().to_lowercase();
            (!head.is_empty()).then_some(head)
        })
        .collect()
}

/// Load benchmark rows for every year that has a readable document.
///
/// Only a document whose geography or value column can't be discovered is an
/// error, and it ends the whole load.
#[instrument(level = "info", skip(source, rules, targets), fields(years = years.len()))]
pub fn load_secondary(
    source: &dyn DocumentSource,
    years: &[u16],
    rules: &DiscoveryRules,
    targets: &[String],
) -> Result<Vec<SecondaryRecord>> {
    let patterns = target_patterns(targets);
    let mut out = Vec::new();

    for &year in years {
        let doc = match source.secondary(year) {
            Ok(SecondaryLookup::Loaded(doc)) => doc,
            Ok(SecondaryLookup::Unmapped) => {
                warn!(year, "no secondary document configured, skipping");
                continue;
            }
            Ok(SecondaryLookup::Missing(path)) => {
                warn!(year, path = %path.display(), "secondary document not found, skipping");
                continue;
            }
            Err(e) => {
                warn!(year, error = %e, "failed to read secondary document, skipping");
                continue;
            }
        };

        let rows = extract_year(&doc, year, rules, &patterns)?;
        debug!(year, rows = rows.len(), document = %doc.name, "secondary rows kept");
        out.extend(rows);
    }

    info!(rows = out.len(), "loaded secondary benchmarks");
    Ok(out)
}

fn extract_year(
    doc: &RawDocument,
    year: u16,
    rules: &DiscoveryRules,
    patterns: &[String],
) -> Result<Vec<SecondaryRecord>> {
    let geo_col = rules.secondary_geo_column.first(&doc.headers).ok_or_else(|| {
        Error::schema(
            &doc.name,
            format!("no geography-name column among {:?}", doc.headers),
        )
    })?;
    let value_col = rules.secondary_value_column.first(&doc.headers).ok_or_else(|| {
        Error::schema(
            &doc.name,
            format!("no 2-bedroom value column among {:?}", doc.headers),
        )
    })?;

    let mut rows = Vec::new();
    for row in 0..doc.row_count() {
        let geo = doc.cell(row, geo_col).as_text();
        let lowered = geo.to_lowercase();
        if !patterns.iter().any(|p| lowered.contains(p.as_str())) {
            continue;
        }
        let value = match normalize(doc.cell(row, value_col)) {
            Ok(v) => v,
            Err(e) => {
                warn!(year, geo = %geo, error = %e, "unparseable benchmark value, using null");
                None
            }
        };
        rows.push(SecondaryRecord {
            year,
            geo_name: geo,
            value,
        });
    }
    Ok(rows)
}

/// Left-join benchmark values onto `primary` by exact `(year, geo_name)`.
///
/// With no secondary rows at all, `primary` is returned untouched. A key
/// repeated in `secondary` contributes its first value only.
pub fn merge_secondary(primary: Vec<WideRecord>, secondary: &[SecondaryRecord]) -> Vec<WideRecord> {
    if secondary.is_empty() {
        return primary;
    }
    let mut lookup: HashMap<(u16, &str), Option<f64>> = HashMap::new();
    for s in secondary {
        lookup.entry((s.year, s.geo_name.as_str())).or_insert(s.value);
    }

    primary
        .into_iter()
        .map(|mut rec| {
            rec.hud_fmr_2br = lookup
                .get(&(rec.year, rec.geo_name.as_str()))
                .copied()
                .flatten();
            rec
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{csv_export::read_csv, Cell, MemorySource};
    use std::io::Cursor;

    fn hud(body: &str) -> RawDocument {
        read_csv("fmr.csv", Cursor::new(body.to_string())).unwrap()
    }

    fn targets() -> Vec<String> {
        vec!["Otter Tail County, MN".into(), "Hennepin County, MN".into()]
    }

    const FY20: &str = "fips2010,fmr0,fmr1,fmr2,areaname,countyname\n2711199999,600,650,\"1,000\",Otter Tail County,Otter Tail County\n2705399999,900,1000,1300,Minneapolis-St. Paul HMFA,Hennepin County\n2700199999,500,550,700,Aitkin County,Aitkin County\n";

    #[test]
    fn patterns_take_text_before_comma() {
        let p = target_patterns(&["Otter Tail County, MN".into(), " , MN".into(), "Solo".into()]);
        assert_eq!(p, vec!["otter tail county".to_string(), "solo".to_string()]);
    }

    #[test]
    fn keeps_only_target_rows() -> Result<()> {
        let source = MemorySource::new().with_secondary(2020, hud(FY20));
        let rows = load_secondary(&source, &[2020], &DiscoveryRules::default(), &targets())?;
        // areaname comes before countyname, so the HMFA row isn't a Hennepin match
        assert_eq!(
            rows,
            vec![SecondaryRecord {
                year: 2020,
                geo_name: "Otter Tail County".into(),
                value: Some(1000.0),
            }]
        );
        Ok(())
    }

    #[test]
    fn matching_ignores_case() -> Result<()> {
        let doc = hud("County_Name,FMR_2BR\nOTTER TAIL COUNTY,812\n");
        let source = MemorySource::new().with_secondary(2016, doc);
        let rows = load_secondary(&source, &[2016], &DiscoveryRules::default(), &targets())?;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].value, Some(812.0));
        Ok(())
    }

    #[test]
    fn unreadable_year_is_skipped() -> Result<()> {
        let source = MemorySource::new()
            .with_secondary(2022, hud(FY20))
            .with_unreadable_secondary(2023);
        let rows = load_secondary(
            &source,
            &[2021, 2022, 2023],
            &DiscoveryRules::default(),
            &targets(),
        )?;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].year, 2022);
        Ok(())
    }

    #[test]
    fn missing_value_column_aborts_the_load() {
        let source = MemorySource::new()
            .with_secondary(2020, hud(FY20))
            .with_secondary(2021, hud("countyname,fmr1\nOtter Tail County,650\n"));
        let err = load_secondary(&source, &[2020, 2021], &DiscoveryRules::default(), &targets())
            .unwrap_err();
        assert!(matches!(err, Error::Schema { .. }));
    }

    #[test]
    fn garbage_value_becomes_null() -> Result<()> {
        let doc = RawDocument::new(
            "fmr.xlsx",
            vec!["countyname".into(), "fmr2".into()],
            vec![
                vec![Cell::Text("Otter Tail County".into()), Cell::Text("n.a.".into())],
                vec![Cell::Text("Hennepin County".into()), Cell::Number(1450.0)],
            ],
        );
        let source = MemorySource::new().with_secondary(2019, doc);
        let rows = load_secondary(&source, &[2019], &DiscoveryRules::default(), &targets())?;
        assert_eq!(rows[0].value, None);
        assert_eq!(rows[1].value, Some(1450.0));
        Ok(())
    }

    fn primary() -> Vec<WideRecord> {
        vec![
            WideRecord::new(2020, "Otter Tail County", Some(1.0), Some(1.0), Some(1.0), None),
            WideRecord::new(2020, "Hennepin County, Minnesota", Some(1.0), Some(1.0), Some(1.0), None),
            WideRecord::new(2021, "Otter Tail County", Some(1.0), Some(1.0), Some(1.0), None),
        ]
    }

    #[test]
    fn merge_is_left_join_first_wins() {
        let secondary = vec![
            SecondaryRecord { year: 2020, geo_name: "Otter Tail County".into(), value: Some(1000.0) },
            SecondaryRecord { year: 2020, geo_name: "Otter Tail County".into(), value: Some(5.0) },
            SecondaryRecord { year: 2022, geo_name: "Otter Tail County".into(), value: Some(9.0) },
        ];
        let merged = merge_secondary(primary(), &secondary);
        assert_eq!(merged.len(), 3);
        assert_eq!(merged[0].hud_fmr_2br, Some(1000.0));
        assert_eq!(merged[1].hud_fmr_2br, None);
        assert_eq!(merged[2].hud_fmr_2br, None);
    }

    #[test]
    fn empty_secondary_passes_primary_through() {
        assert_eq!(merge_secondary(primary(), &[]), primary());
    }
}
