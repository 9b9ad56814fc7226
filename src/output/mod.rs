use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeSet,
    fs,
    io::Write,
    path::Path,
};
use tracing::info;

use crate::merge::WideRecord;

/// The persisted dataset: `{"geographies": [...], "metrics": [...]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    /// Distinct `geo_name`s of `metrics`, sorted.
    pub geographies: Vec<String>,
    pub metrics: Vec<WideRecord>,
}

impl Payload {
    pub fn new(metrics: Vec<WideRecord>) -> Self {
        Self {
            geographies: distinct_geographies(&metrics),
            metrics,
        }
    }
}

pub fn distinct_geographies(records: &[WideRecord]) -> Vec<String> {
    records
        .iter()
        .map(|r| r.geo_name.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Write `payload` to `path` as pretty JSON with a trailing newline.
///
/// The file is written beside its target and renamed into place, so readers
/// never see a partial document. Parent directories are created as needed.
#[tracing::instrument(level = "info", skip(payload), fields(path = %path.display()))]
pub fn write_payload(path: &Path, payload: &Payload) -> Result<()> {
    let dir = match path.parent() {
        Some(d) if !d.as_os_str().is_empty() => d,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).with_context(|| format!("creating {:?}", dir))?;

    let file_name = path
        .file_name()
        .with_context(|| format!("{:?} has no file name", path))?
        .to_string_lossy();
    let tmp_path = dir.join(format!(".{}.tmp", file_name));
    let mut tmp =
        fs::File::create(&tmp_path).with_context(|| format!("creating {:?}", tmp_path))?;

    serde_json::to_writer_pretty(&mut tmp, payload).context("serializing dataset")?;
    tmp.write_all(b"\n")?;
    tmp.sync_all()?;
    drop(tmp);

    fs::rename(&tmp_path, path)
        .with_context(|| format!("renaming {:?} -> {:?}", tmp_path, path))?;

    info!(
        records = payload.metrics.len(),
        geographies = payload.geographies.len(),
        "wrote dataset"
    );
    Ok(())
}

pub fn read_payload(path: &Path) -> Result<Payload> {
    let f = fs::File::open(path).with_context(|| format!("opening {:?}", path))?;
    serde_json::from_reader(f).with_context(|| format!("parsing {:?}", path))
}
