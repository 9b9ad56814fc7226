use std::path::{Path, PathBuf};

use glob::{glob, Pattern};
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Resolves `(year, table_id)` to one census export under
/// `<root>/<year>/<prefix><year>.<table_id>*.csv`.
#[derive(Debug, Clone)]
pub struct TableLocator {
    root: PathBuf,
    prefix: String,
}

impl TableLocator {
    pub fn new(root: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            prefix: prefix.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Find the export for `table_id` in `year`.
    ///
    /// Errors with `NotFound` when the year directory is missing or nothing
    /// matches. Several matches are tolerated: the first in sort order wins.
    pub fn locate(&self, year: u16, table_id: &str) -> Result<PathBuf> {
        let year_dir = self.root.join(year.to_string());
        if !year_dir.is_dir() {
            return Err(Error::NotFound(format!(
                "expected year directory not found: {}",
                year_dir.display()
            )));
        }

        let stem = format!("{}{}.{}", self.prefix, year, table_id);
        let pattern = format!(
            "{}/{}*.csv",
            Pattern::escape(&year_dir.to_string_lossy()),
            Pattern::escape(&stem)
        );
        let mut matches: Vec<PathBuf> = glob(&pattern)
            .map_err(|e| Error::NotFound(format!("bad pattern {}: {}", pattern, e)))?
            .filter_map(|entry| entry.ok())
            .filter(|p| p.is_file())
            .collect();
        matches.sort();

        match matches.len() {
            0 => Err(Error::NotFound(format!(
                "no export for year {} and table {} in {}",
                year,
                table_id,
                year_dir.display()
            ))),
            1 => {
                debug!(year, table_id, path = %matches[0].display(), "located table");
                Ok(matches.remove(0))
            }
            n => {
                let chosen = matches.remove(0);
                warn!(
                    year,
                    table_id,
                    candidates = n,
                    chosen = %chosen.display(),
                    "multiple exports match, using the first"
                );
                Ok(chosen)
            }
        }
    }
}
