//! Header-keyed view over one tabular row, shared by the CSV and Excel paths.

use calamine::Data;
use std::sync::Arc;

/// A raw export row. Cells are looked up by the exact header text the
/// platform uses ("Order No.", "LEGAL/CURRENCY", ...), so each mapper reads
/// the columns its export format actually names.
#[derive(Debug, Clone)]
pub struct RawRow {
    headers: Arc<Vec<String>>,
    values: Vec<String>,
}

impl RawRow {
    pub fn new(headers: Arc<Vec<String>>, values: Vec<String>) -> Self {
        RawRow { headers, values }
    }

    /// Raw cell under `header`, or None when the column is missing.
    pub fn get(&self, header: &str) -> Option<&str> {
        let idx = self.headers.iter().position(|h| h == header)?;
        self.values.get(idx).map(String::as_str)
    }

    /// Trimmed cell, None when missing or blank. Most mappers want this.
    pub fn get_nonblank(&self, header: &str) -> Option<&str> {
        let value = self.get(header)?.trim();
        if value.is_empty() {
            None
        } else {
            Some(value)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values.iter().all(|v| v.trim().is_empty())
    }
}

/// Render a calamine cell as text. Spreadsheet exports mix typed cells
/// (floats, dates) with strings in the same column, so everything funnels
/// through a string and the defensive parsers take it from there.
pub fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) => {
            // Integral floats print without the trailing ".0" Excel adds
            if f.fract() == 0.0 && f.abs() < 1e15 {
                format!("{}", *f as i64)
            } else {
                f.to_string()
            }
        }
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|naive| naive.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default(),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Error(_) | Data::Empty => String::new(),
    }
}

/// Build a row from literal header/value pairs. Test helper for the mappers.
#[cfg(test)]
pub(crate) fn row_from(pairs: &[(&str, &str)]) -> RawRow {
    let headers = Arc::new(pairs.iter().map(|(h, _)| h.to_string()).collect());
    let values = pairs.iter().map(|(_, v)| v.to_string()).collect();
    RawRow::new(headers, values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_exact_header() {
        let row = row_from(&[("Order No.", "123"), ("Type", "SELL")]);
        assert_eq!(row.get("Order No."), Some("123"));
        assert_eq!(row.get("Missing"), None);
    }

    #[test]
    fn nonblank_skips_whitespace_cells() {
        let row = row_from(&[("Status", "   "), ("Side", " BUY ")]);
        assert_eq!(row.get_nonblank("Status"), None);
        assert_eq!(row.get_nonblank("Side"), Some("BUY"));
    }

    #[test]
    fn float_cells_render_without_scientific_artifacts() {
        assert_eq!(cell_to_string(&Data::Float(250.0)), "250");
        assert_eq!(cell_to_string(&Data::Float(0.5)), "0.5");
        assert_eq!(cell_to_string(&Data::Int(7)), "7");
        assert_eq!(cell_to_string(&Data::Empty), "");
    }
}
