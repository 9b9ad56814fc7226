// src/extract/rules.rs
//
// Row and column discovery as data. Each rule is an ordered list of
// matchers; the first matcher that hits anything wins, and within a
// matcher the first row/column in document order wins.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Exact,
    Contains,
    EndsWith,
}

/// Tests trimmed text against any of `any_of`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Matcher {
    pub kind: MatchKind,
    pub any_of: Vec<String>,
    #[serde(default)]
    pub ignore_case: bool,
}

impl Matcher {
    pub fn new(kind: MatchKind, any_of: &[&str], ignore_case: bool) -> Self {
        Self {
            kind,
            any_of: any_of.iter().map(|s| s.to_string()).collect(),
            ignore_case,
        }
    }

    pub fn matches(&self, text: &str) -> bool {
        let text = text.trim();
        let text = if self.ignore_case {
            text.to_lowercase()
        } else {
            text.to_string()
        };
        self.any_of.iter().any(|needle| {
            let needle = if self.ignore_case {
                needle.to_lowercase()
            } else {
                needle.clone()
            };
            match self.kind {
                MatchKind::Exact => text == needle,
                MatchKind::Contains => text.contains(&needle),
                MatchKind::EndsWith => text.ends_with(&needle),
            }
        })
    }
}

/// What a row rule does when none of its matchers hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Fallback {
    /// Use the first data row and record the substitution.
    FirstRow,
    /// Treat the document as malformed.
    Fail,
}

/// A selected row, and whether a matcher picked it or the fallback did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RowPick {
    pub index: usize,
    pub matched: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowRule {
    pub name: String,
    pub matchers: Vec<Matcher>,
    pub fallback: Fallback,
}

impl RowRule {
    /// Pick one row from `labels`. `None` if the document has no rows, or
    /// nothing matched and the fallback is `Fail`.
    pub fn pick<S: AsRef<str>>(&self, labels: &[S]) -> Option<RowPick> {
        for matcher in &self.matchers {
            if let Some(index) = labels.iter().position(|l| matcher.matches(l.as_ref())) {
                return Some(RowPick {
                    index,
                    matched: true,
                });
            }
        }
        match self.fallback {
            Fallback::FirstRow if !labels.is_empty() => Some(RowPick {
                index: 0,
                matched: false,
            }),
            _ => None,
        }
    }
}

/// Selects every matching row. There is no fallback: an empty selection
/// is valid, so a `fallback` key is rejected rather than ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RowSetRule {
    pub name: String,
    pub matchers: Vec<Matcher>,
}

impl RowSetRule {
    /// Every row matched by any matcher, in document order.
    pub fn select_all<S: AsRef<str>>(&self, labels: &[S]) -> Vec<usize> {
        labels
            .iter()
            .enumerate()
            .filter(|(_, l)| self.matchers.iter().any(|m| m.matches(l.as_ref())))
            .map(|(i, _)| i)
            .collect()
    }
}

/// Column rules have no fallback: finding nothing is a schema error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRule {
    pub name: String,
    pub matchers: Vec<Matcher>,
}

impl ColumnRule {
    pub fn first(&self, headers: &[String]) -> Option<usize> {
        self.matchers
            .iter()
            .find_map(|m| headers.iter().position(|h| m.matches(h)))
    }

    pub fn select_all(&self, headers: &[String]) -> Vec<usize> {
        headers
            .iter()
            .enumerate()
            .filter(|(_, h)| self.matchers.iter().any(|m| m.matches(h)))
            .map(|(i, _)| i)
            .collect()
    }
}

/// Owner cost ≥ 30% of household income.
pub const COST_BURDENED_LABELS: [&str; 4] = [
    "30.0 to 34.9 percent",
    "35.0 to 39.9 percent",
    "40.0 to 49.9 percent",
    "50.0 percent or more",
];

/// The full rule set used against census exports and benchmark workbooks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryRules {
    /// Column holding the row labels.
    pub label_column: String,
    /// Separates geography from measurement kind in column names.
    pub key_delimiter: String,
    pub estimate_columns: ColumnRule,
    pub median_row: RowRule,
    pub total_row: RowRule,
    pub burden_rows: RowSetRule,
    pub secondary_geo_column: ColumnRule,
    pub secondary_value_column: ColumnRule,
}

impl DiscoveryRules {
    /// Geography part of a composite column name: everything before the
    /// first delimiter.
    pub fn geo_name<'a>(&self, column: &'a str) -> &'a str {
        match column.split_once(self.key_delimiter.as_str()) {
            Some((geo, _)) => geo,
            None => column,
        }
    }
}

impl Default for DiscoveryRules {
    fn default() -> Self {
        Self {
            label_column: "Label (Grouping)".into(),
            key_delimiter: "!!".into(),
            estimate_columns: ColumnRule {
                name: "estimate_columns".into(),
                matchers: vec![Matcher::new(MatchKind::EndsWith, &["!!Estimate"], false)],
            },
            median_row: RowRule {
                name: "median_row".into(),
                matchers: vec![Matcher::new(MatchKind::Contains, &["Median"], true)],
                fallback: Fallback::FirstRow,
            },
            total_row: RowRule {
                name: "total_row".into(),
                matchers: vec![Matcher::new(MatchKind::Exact, &["Total:"], false)],
                fallback: Fallback::FirstRow,
            },
            burden_rows: RowSetRule {
                name: "burden_rows".into(),
                matchers: vec![Matcher::new(
                    MatchKind::Exact,
                    &COST_BURDENED_LABELS,
                    false,
                )],
            },
            secondary_geo_column: ColumnRule {
                name: "secondary_geo_column".into(),
                matchers: vec![Matcher::new(MatchKind::Contains, &["name", "area"], true)],
            },
            secondary_value_column: ColumnRule {
                name: "secondary_value_column".into(),
                matchers: vec![Matcher::new(
                    MatchKind::Contains,
                    &["2br", "2 br", "fmr2"],
                    true,
                )],
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn median_row_matches_case_insensitively() {
        let rules = DiscoveryRules::default();
        let labels = ["Total:", "MEDIAN gross rent", "Median again"];
        assert_eq!(
            rules.median_row.pick(&labels[..]),
            Some(RowPick {
                index: 1,
                matched: true
            })
        );
    }

    #[test]
    fn median_row_falls_back_to_first_row() {
        let rules = DiscoveryRules::default();
        let labels = ["Estimate", "Something else"];
        assert_eq!(
            rules.median_row.pick(&labels[..]),
            Some(RowPick {
                index: 0,
                matched: false
            })
        );
        let none: [&str; 0] = [];
        assert_eq!(rules.median_row.pick(&none[..]), None);
    }

    #[test]
    fn fail_fallback_yields_none() {
        let rule = RowRule {
            name: "strict".into(),
            matchers: vec![Matcher::new(MatchKind::Exact, &["Total:"], false)],
            fallback: Fallback::Fail,
        };
        assert_eq!(rule.pick(&["Owner-occupied"][..]), None);
    }

    #[test]
    fn total_row_is_exact_after_trim() {
        let rules = DiscoveryRules::default();
        let labels = ["Total: owner units", "  Total:  "];
        assert_eq!(rules.total_row.pick(&labels[..]).map(|p| p.index), Some(1));
    }

    #[test]
    fn burden_rows_select_every_bucket() {
        let rules = DiscoveryRules::default();
        let labels = [
            "Total:",
            "\u{a0}\u{a0}Less than 20.0 percent",
            "\u{a0}\u{a0}30.0 to 34.9 percent",
            "\u{a0}\u{a0}35.0 to 39.9 percent",
            "\u{a0}\u{a0}Not computed",
            "\u{a0}\u{a0}50.0 percent or more",
        ];
        assert_eq!(rules.burden_rows.select_all(&labels[..]), vec![2, 3, 5]);
    }

    #[test]
    fn estimate_columns_and_geo_names() {
        let rules = DiscoveryRules::default();
        let hs = headers(&[
            "Label (Grouping)",
            "Hennepin County, Minnesota!!Estimate",
            "Hennepin County, Minnesota!!Margin of Error",
            "Minneapolis city, Minnesota!!Estimate",
        ]);
        let cols = rules.estimate_columns.select_all(&hs);
        assert_eq!(cols, vec![1, 3]);
        assert_eq!(rules.geo_name(&hs[1]), "Hennepin County, Minnesota");
        assert_eq!(rules.geo_name("no delimiter"), "no delimiter");
    }

    #[test]
    fn secondary_columns_first_match_wins() {
        let rules = DiscoveryRules::default();
        let hs = headers(&["fips2010", "fmr0", "fmr1", "FMR2", "areaname", "countyname"]);
        assert_eq!(rules.secondary_geo_column.first(&hs), Some(4));
        assert_eq!(rules.secondary_value_column.first(&hs), Some(3));
        assert_eq!(rules.secondary_value_column.first(&headers(&["fmr1"])), None);
    }

    #[test]
    fn rules_deserialize_with_defaults() {
        let yaml = "median_row:\n  name: median_row\n  matchers:\n    - kind: contains\n      any_of: [\"Median\", \"Mediana\"]\n      ignore_case: true\n  fallback: fail\n";
        let rules: DiscoveryRules = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(rules.median_row.fallback, Fallback::Fail);
        assert_eq!(rules.label_column, "Label (Grouping)");
    }

    #[test]
    fn burden_rows_take_no_fallback() {
        let yaml = "burden_rows:\n  name: burden_rows\n  matchers:\n    - kind: exact\n      any_of: [\"50.0 percent or more\"]\n";
        let rules: DiscoveryRules = serde_yaml::from_str(yaml).unwrap();
        assert!(rules.burden_rows.select_all(&["Total:"][..]).is_empty());

        let with_fallback = format!("{}  fallback: first_row\n", yaml);
        assert!(serde_yaml::from_str::<DiscoveryRules>(&with_fallback).is_err());
    }
}
