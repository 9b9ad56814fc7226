// src/document/mod.rs

pub mod csv_export;
pub mod locate;
pub mod source;
pub mod workbook;

pub use locate::TableLocator;
pub use source::{DocumentSource, FileSystemSource, MemorySource, SecondaryLookup};

/// Field contents that count as missing, on top of the empty string.
/// Same set pandas treats as NA when reading an export.
const MISSING_MARKERS: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// True when `raw` (after trimming) is empty or one of the NA markers.
pub fn is_missing_marker(raw: &str) -> bool {
    let s = raw.trim();
    s.is_empty() || MISSING_MARKERS.contains(&s)
}

/// One cell of a loaded export.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
}

static EMPTY: Cell = Cell::Empty;

impl Cell {
    /// Text fields arrive raw from CSV or string cells; NA markers collapse to `Empty`.
    pub fn from_field(raw: &str) -> Self {
        if is_missing_marker(raw) {
            Cell::Empty
        } else {
            Cell::Text(raw.to_string())
        }
    }

    /// String form used for label and substring matching.
    pub fn as_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Number(n) => format_number(*n),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }
}

/// Integers without a trailing `.0`, everything else as `f64` prints it.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// An export held in memory: a header row and the data rows below it.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDocument {
    /// Where the document came from; used in error messages and logs.
    pub name: String,
    /// Column names from the header row. Census exports encode
    /// `<geography>!!<measurement>` here.
    pub headers: Vec<String>,
    /// Data rows. Rows may be shorter than `headers`; missing cells read as `Empty`.
    pub rows: Vec<Vec<Cell>>,
}

impl RawDocument {
    pub fn new(name: impl Into<String>, headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self {
            name: name.into(),
            headers,
            rows,
        }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&EMPTY)
    }

    /// Text of every cell in column `col`, top to bottom.
    pub fn column_text(&self, col: usize) -> Vec<String> {
        (0..self.rows.len())
            .map(|row| self.cell(row, col).as_text())
            .collect()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}
