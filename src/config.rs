// src/config.rs

use std::{
    collections::{BTreeMap, HashSet},
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::extract::DiscoveryRules;

/// Everything a build needs, passed explicitly into the pipeline.
/// Every section has defaults, so an empty file is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding one folder per year.
    pub data_root: PathBuf,
    /// Where the combined JSON dataset is written.
    pub output: PathBuf,
    pub years: Vec<u16>,
    /// key → canonical display name; the display names form the allowlist.
    pub geographies: BTreeMap<String, String>,
    pub primary: PrimaryTables,
    pub secondary: SecondaryConfig,
    pub rules: DiscoveryRules,
}

/// Census export naming: `<file_prefix><year>.<table>*.csv`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrimaryTables {
    pub file_prefix: String,
    pub income: String,
    pub home_value: String,
    pub rent: String,
    pub owner_cost_burden: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecondaryConfig {
    /// year → benchmark workbook, relative to `data_root`.
    pub files: BTreeMap<u16, PathBuf>,
    /// Geographies whose name (before the first comma) selects benchmark rows.
    pub targets: Vec<String>,
}

impl Config {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        // an empty document deserializes to unit, not to an empty map
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).context("Failed to parse YAML configuration")
    }

    /// Display names every output row is restricted to.
    pub fn allowlist(&self) -> HashSet<String> {
        self.geographies.values().cloned().collect()
    }
}

impl Default for Config {
    fn default() -> Self {
        let geographies = [
            ("fergus_falls_city", "Fergus Falls city, Minnesota"),
            ("otter_tail_county", "Otter Tail County, Minnesota"),
            ("minneapolis_city", "Minneapolis city, Minnesota"),
            ("hennepin_county", "Hennepin County, Minnesota"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            data_root: PathBuf::from("."),
            output: PathBuf::from("processed/housing_affordability_timeseries.json"),
            years: (2013..=2023).collect(),
            geographies,
            primary: PrimaryTables::default(),
            secondary: SecondaryConfig::default(),
            rules: DiscoveryRules::default(),
        }
    }
}

impl Default for PrimaryTables {
    fn default() -> Self {
        Self {
            file_prefix: "ACSDT5Y".into(),
            income: "B19013".into(),
            home_value: "B25077".into(),
            rent: "B25064".into(),
            owner_cost_burden: "B25091".into(),
        }
    }
}

impl Default for SecondaryConfig {
    fn default() -> Self {
        let files = [
            (2013, "2013/FY2013_4050_Final.xls"),
            (2014, "2014/FY2014_4050_RevFinal.xls"),
            (2015, "2015/FY2015_4050_RevFinal (1).xls"),
            (2016, "2016/FY2016F-4050-RevFinal4.xlsx"),
            (2017, "2017/FY2017-4050-County-Level_Data.xlsx"),
            (2018, "2018/FY18_4050_FMRs_rev (1).xlsx"),
            (2019, "2019/FY2019_4050_FMRs_rev2.xlsx"),
            (2020, "2020/FY20_4050_FMRs_rev.xlsx"),
            (2021, "2021/FY21_4050_FMRs_rev.xlsx"),
            (2022, "2022/FY22_FMRs_revised.xlsx"),
            (2023, "2023/FY23_FMRs_revised.xlsx"),
        ]
        .into_iter()
        .map(|(year, p)| (year, PathBuf::from(p)))
        .collect();

        Self {
            files,
            targets: vec![
                "Otter Tail County, MN".into(),
                "Hennepin County, MN".into(),
            ],
        }
    }
}
