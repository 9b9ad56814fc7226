use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use tracing::debug;

use super::{format_number, Cell, RawDocument};
use crate::error::{Error, Result};

/// Extensions routed through calamine rather than the CSV reader.
pub const WORKBOOK_EXTENSIONS: &[&str] = &["xls", "xlsx", "xlsm", "xlsb", "ods"];

pub fn is_workbook(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| WORKBOOK_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Load the first worksheet of an Excel/ODS workbook. The first row of the
/// used range becomes the header row.
#[tracing::instrument(level = "debug", skip(path), fields(path = %path.as_ref().display()))]
pub fn load_workbook<P: AsRef<Path>>(path: P) -> Result<RawDocument> {
    let path = path.as_ref();
    let name = path.display().to_string();
    let mut workbook = open_workbook_auto(path)?;

    let sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| Error::schema(&name, "workbook contains no sheets"))?;
    let range = workbook.worksheet_range(&sheet)?;

    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(header_row) => header_row
            .iter()
            .enumerate()
            .map(|(i, cell)| header_text(i, cell))
            .collect(),
        None => return Err(Error::schema(&name, format!("sheet `{}` is empty", sheet))),
    };
    let body: Vec<Vec<Cell>> = rows.map(|r| r.iter().map(to_cell).collect()).collect();

    debug!(document = %name, sheet = %sheet, columns = headers.len(), rows = body.len(), "loaded workbook");
    Ok(RawDocument::new(name, headers, body))
}

fn header_text(index: usize, cell: &Data) -> String {
    match to_cell(cell) {
        Cell::Empty => format!("Unnamed: {}", index),
        other => other.as_text(),
    }
}

pub(crate) fn to_cell(cell: &Data) -> Cell {
    match cell {
        Data::Empty | Data::Error(_) => Cell::Empty,
        Data::String(s) => Cell::from_field(s),
        Data::Float(n) => Cell::Number(*n),
        Data::Int(n) => Cell::Number(*n as f64),
        Data::Bool(b) => Cell::Text(if *b { "True" } else { "False" }.to_string()),
        Data::DateTime(dt) => Cell::Text(format_number(dt.as_f64())),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use calamine::CellErrorType;

    #[test]
    fn converts_calamine_values() {
        assert_eq!(to_cell(&Data::Float(1234.0)), Cell::Number(1234.0));
        assert_eq!(to_cell(&Data::Int(7)), Cell::Number(7.0));
        assert_eq!(to_cell(&Data::String("N/A".into())), Cell::Empty);
        assert_eq!(to_cell(&Data::Error(CellErrorType::NA)), Cell::Empty);
        assert_eq!(to_cell(&Data::Empty), Cell::Empty);
    }

    #[test]
    fn blank_headers_get_positional_names() {
        assert_eq!(header_text(3, &Data::Empty), "Unnamed: 3");
        assert_eq!(header_text(0, &Data::String("fmr2".into())), "fmr2");
    }

    #[test]
    fn workbook_extensions() {
        assert!(is_workbook(Path::new("2016/FY2016F-4050-RevFinal4.xlsx")));
        assert!(is_workbook(Path::new("2013/FY2013_4050_Final.XLS")));
        assert!(!is_workbook(Path::new("2013/ACSDT5Y2013.B19013-Data.csv")));
    }

    /// A two-row HUD-style sheet with one blank value cell.
    pub(crate) fn write_fmr_workbook(path: &Path) -> anyhow::Result<()> {
        let mut workbook = rust_xlsxwriter::Workbook::new();
        let sheet = workbook.add_worksheet();
        for (col, name) in ["fips2010", "areaname", "fmr2"].iter().enumerate() {
            sheet.write_string(0, col as u16, *name)?;
        }
        sheet.write_number(1, 0, 2711199999.0)?;
        sheet.write_string(1, 1, "Otter Tail County")?;
        sheet.write_number(1, 2, 812.0)?;
        sheet.write_number(2, 0, 2705399999.0)?;
        sheet.write_string(2, 1, "Hennepin County")?;
        workbook.save(path)?;
        Ok(())
    }

    #[test]
    fn reads_headers_and_rows_from_xlsx() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("FY20_4050_FMRs_rev.xlsx");
        write_fmr_workbook(&path)?;

        let doc = load_workbook(&path)?;
        assert_eq!(doc.headers, vec!["fips2010", "areaname", "fmr2"]);
        assert_eq!(doc.row_count(), 2);
        assert_eq!(doc.cell(0, 0), &Cell::Number(2711199999.0));
        assert_eq!(doc.cell(0, 1), &Cell::Text("Otter Tail County".into()));
        assert_eq!(doc.cell(0, 2), &Cell::Number(812.0));
        assert_eq!(doc.cell(1, 2), &Cell::Empty);
        Ok(())
    }

    #[test]
    fn corrupt_workbook_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("FY23_FMRs_revised.xlsx");
        std::fs::write(&path, b"not a zip archive").unwrap();
        assert!(load_workbook(&path).is_err());
    }
}
