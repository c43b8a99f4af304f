use calamine::{open_workbook_auto, Data, Reader, Sheets};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::app::ports::WorkbookPort;
use crate::error::{Result, RosterError};
use crate::normalize::excel_serial_to_date;
use crate::types::SheetRows;

/// `.xlsx`/`.xls`/`.ods` workbook opened through calamine.
pub struct CalamineWorkbook {
    path: PathBuf,
    sheets: Sheets<BufReader<File>>,
}

impl CalamineWorkbook {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Err(RosterError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("workbook not found: {}", path.display()),
            )));
        }
        let sheets = open_workbook_auto(&path)?;
        debug!("Opened workbook {}", path.display());
        Ok(Self { path, sheets })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Cell text as a person reading the sheet would see it. Whole floats lose their `.0`.
pub fn cell_text(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.trim().to_string(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => {
            if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64 {
                (*f as i64).to_string()
            } else {
                f.to_string()
            }
        }
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => excel_serial_to_date(dt.as_f64())
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| dt.as_f64().to_string()),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
        Data::Error(_) | Data::Empty => String::new(),
    }
}

impl WorkbookPort for CalamineWorkbook {
    fn sheet_names(&self) -> Vec<String> {
        self.sheets.sheet_names()
    }

    fn read_sheet(&mut self, name: &str) -> Result<SheetRows> {
        if !self.sheets.sheet_names().iter().any(|s| s == name) {
            return Err(RosterError::MissingSheet(format!(
                "{} (in {})",
                name,
                self.path.display()
            )));
        }
        let range = self.sheets.worksheet_range(name)?;

        // calamine trims leading empty rows/columns; pad them back so header_row means A1-relative
        let (row_offset, col_offset) = range
            .start()
            .map(|(r, c)| (r as usize, c as usize))
            .unwrap_or((0, 0));
        let mut rows: Vec<Vec<String>> = vec![Vec::new(); row_offset];
        rows.extend(range.rows().map(|r| {
            let mut cells = vec![String::new(); col_offset];
            cells.extend(r.iter().map(cell_text));
            cells
        }));
        Ok(SheetRows::new(name, rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_text() {
        assert_eq!(cell_text(&Data::String(" 张三 ".into())), "张三");
        assert_eq!(cell_text(&Data::Float(13812345678.0)), "13812345678");
        assert_eq!(cell_text(&Data::Float(1.5)), "1.5");
        assert_eq!(cell_text(&Data::Int(42)), "42");
        assert_eq!(cell_text(&Data::Empty), "");
    }

    #[test]
    fn test_open_missing_workbook() {
        let err = CalamineWorkbook::open("does/not/exist.xlsx").err().unwrap();
        assert!(matches!(err, RosterError::Io(_)));
    }
}
