use std::{
    collections::{BTreeMap, HashMap, HashSet},
    io,
    path::PathBuf,
};

use tracing::debug;

use super::{csv_export::load_csv, workbook, RawDocument, TableLocator};
use crate::error::{Error, Result};

/// Outcome of asking for a year's secondary benchmark document.
#[derive(Debug)]
pub enum SecondaryLookup {
    /// No document configured for the year.
    Unmapped,
    /// Configured, but nothing at the path.
    Missing(PathBuf),
    Loaded(RawDocument),
}

/// Where the pipeline gets its documents from.
///
/// `primary` errors are fatal to a build. `secondary` errors only ever cost
/// the year its benchmark values.
pub trait DocumentSource {
    /// The census export for `(year, table_id)`.
    fn primary(&self, year: u16, table_id: &str) -> Result<RawDocument>;

    /// The secondary benchmark document configured for `year`.
    fn secondary(&self, year: u16) -> Result<SecondaryLookup>;
}

/// Reads exports from a directory tree laid out one folder per year.
#[derive(Debug, Clone)]
pub struct FileSystemSource {
    locator: TableLocator,
    secondary_files: BTreeMap<u16, PathBuf>,
}

impl FileSystemSource {
    /// `secondary_files` paths are taken relative to the locator's root
    /// unless already absolute.
    pub fn new(locator: TableLocator, secondary_files: &BTreeMap<u16, PathBuf>) -> Self {
        let secondary_files = secondary_files
            .iter()
            .map(|(year, p)| (*year, locator.root().join(p)))
            .collect();
        Self {
            locator,
            secondary_files,
        }
    }
}

impl DocumentSource for FileSystemSource {
    fn primary(&self, year: u16, table_id: &str) -> Result<RawDocument> {
        let path = self.locator.locate(year, table_id)?;
        load_csv(&path)
    }

    fn secondary(&self, year: u16) -> Result<SecondaryLookup> {
        let path = match self.secondary_files.get(&year) {
            Some(p) => p,
            None => return Ok(SecondaryLookup::Unmapped),
        };
        if !path.exists() {
            return Ok(SecondaryLookup::Missing(path.clone()));
        }
        debug!(year, path = %path.display(), "loading secondary document");
        let doc = if workbook::is_workbook(path) {
            workbook::load_workbook(path)?
        } else {
            load_csv(path)?
        };
        Ok(SecondaryLookup::Loaded(doc))
    }
}

/// Documents held in memory, keyed the same way the filesystem source
/// resolves them. Useful for tests and for callers that already hold
/// parsed exports.
#[derive(Debug, Default, Clone)]
pub struct MemorySource {
    primary: HashMap<(u16, String), RawDocument>,
    secondary: HashMap<u16, RawDocument>,
    unreadable: HashSet<u16>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_primary(mut self, year: u16, table_id: &str, doc: RawDocument) -> Self {
        self.primary.insert((year, table_id.to_string()), doc);
        self
    }

    pub fn with_secondary(mut self, year: u16, doc: RawDocument) -> Self {
        self.secondary.insert(year, doc);
        self
    }

    /// Mark `year`'s secondary document as present but unreadable.
    pub fn with_unreadable_secondary(mut self, year: u16) -> Self {
        self.unreadable.insert(year);
        self
    }
}

impl DocumentSource for MemorySource {
    fn primary(&self, year: u16, table_id: &str) -> Result<RawDocument> {
        self.primary
            .get(&(year, table_id.to_string()))
            .cloned()
            .ok_or_else(|| {
                Error::NotFound(format!(
                    "no export for year {} and table {}",
                    year, table_id
                ))
            })
    }

    fn secondary(&self, year: u16) -> Result<SecondaryLookup> {
        if self.unreadable.contains(&year) {
            return Err(Error::io(
                format!("memory://secondary/{}", year),
                io::Error::new(io::ErrorKind::InvalidData, "document could not be parsed"),
            ));
        }
        Ok(match self.secondary.get(&year) {
            Some(doc) => SecondaryLookup::Loaded(doc.clone()),
            None => SecondaryLookup::Unmapped,
        })
    }
}
