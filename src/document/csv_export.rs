use std::{fs::File, io::Read, path::Path};

use csv::{ByteRecord, ReaderBuilder};
use tracing::{debug, warn};

use super::{Cell, RawDocument};
use crate::error::{Error, Result};

/// Load a wide-by-geography CSV export: first record is the header row,
/// every following record a data row.
#[tracing::instrument(level = "debug", skip(path), fields(path = %path.as_ref().display()))]
pub fn load_csv<P: AsRef<Path>>(path: P) -> Result<RawDocument> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    read_csv(path.display().to_string(), file)
}

/// Same as [`load_csv`] but from any reader; `name` labels the document.
pub fn read_csv<R: Read>(name: impl Into<String>, reader: R) -> Result<RawDocument> {
    let name = name.into();
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = rdr
        .byte_headers()?
        .iter()
        .enumerate()
        .map(|(i, raw)| {
            let header = String::from_utf8_lossy(raw);
            // strip a BOM the reader left on the first header
            if i == 0 {
                header.trim_start_matches('\u{feff}').to_string()
            } else {
                header.into_owned()
            }
        })
        .collect();

    let mut rows = Vec::new();
    let mut record = ByteRecord::new();
    while rdr.read_byte_record(&mut record)? {
        if record.len() > headers.len() {
            warn!(
                document = %name,
                cells = record.len(),
                headers = headers.len(),
                "row has more cells than headers"
            );
        }
        let row: Vec<Cell> = record
            .iter()
            .map(|field| Cell::from_field(&String::from_utf8_lossy(field)))
            .collect();
        rows.push(row);
    }

    debug!(document = %name, columns = headers.len(), rows = rows.len(), "loaded csv");
    Ok(RawDocument::new(name, headers, rows))
}
