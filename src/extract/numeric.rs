use crate::document::{is_missing_marker, Cell};
use crate::error::{Error, Result};

/// Raw cell → optional number.
///
/// Empty cells, NA markers and NaN are `None`. Numbers pass through. Text
/// is trimmed and stripped of thousands separators before parsing; text that
/// still isn't a number is an `InvalidNumber` error.
pub fn normalize(cell: &Cell) -> Result<Option<f64>> {
    match cell {
        Cell::Empty => Ok(None),
        Cell::Number(n) if n.is_nan() => Ok(None),
        Cell::Number(n) => Ok(Some(*n)),
        Cell::Text(raw) => normalize_str(raw),
    }
}

pub fn normalize_str(raw: &str) -> Result<Option<f64>> {
    if is_missing_marker(raw) {
        return Ok(None);
    }
    let cleaned = raw.replace(',', "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return Ok(None);
    }
    match cleaned.parse::<f64>() {
        Ok(v) if v.is_nan() => Ok(None),
        Ok(v) => Ok(Some(v)),
        Err(_) => Err(Error::InvalidNumber {
            raw: raw.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grouped_strings_parse() -> Result<()> {
        assert_eq!(normalize(&Cell::Text("96,339".into()))?, Some(96339.0));
        assert_eq!(normalize(&Cell::Text(" 1,234,567.5 ".into()))?, Some(1234567.5));
        assert_eq!(normalize(&Cell::Text("0".into()))?, Some(0.0));
        Ok(())
    }

    #[test]
    fn numbers_pass_through() -> Result<()> {
        assert_eq!(normalize(&Cell::Number(1200.0))?, Some(1200.0));
        assert_eq!(normalize(&Cell::Number(f64::NAN))?, None);
        Ok(())
    }

    #[test]
    fn blanks_and_markers_are_none() -> Result<()> {
        assert_eq!(normalize(&Cell::Empty)?, None);
        assert_eq!(normalize(&Cell::Text("   ".into()))?, None);
        assert_eq!(normalize(&Cell::Text(",".into()))?, None);
        assert_eq!(normalize(&Cell::Text("N/A".into()))?, None);
        Ok(())
    }

    #[test]
    fn non_numeric_text_is_an_error() {
        let err = normalize(&Cell::Text("250,000+".into())).unwrap_err();
        match err {
            Error::InvalidNumber { raw } => assert_eq!(raw, "250,000+"),
            other => panic!("unexpected error {:?}", other),
        }
        assert!(normalize(&Cell::Text("(X)".into())).is_err());
    }
}
