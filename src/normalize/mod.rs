//! Row normalization: turns sheet text into roster records.

pub mod phones;
pub mod staff;
pub mod student;

use chrono::{Duration, NaiveDate};

use crate::error::Result;
use crate::types::SheetRows;

pub use phones::authorized_phones;
pub use staff::{StaffColumn, StaffNormalizer, STAFF_SCHEMA};
pub use student::{StudentColumns, StudentNormalizer};

/// Per-sheet tally of emitted and filtered rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetSummary {
    pub sheet: String,
    pub emitted: usize,
    pub skipped: usize,
}

pub trait SheetNormalizer {
    type Record;

    /// Normalizes every data row of `sheet`, appending to the records collected so far.
    fn normalize_sheet(&mut self, sheet: &SheetRows) -> Result<SheetSummary>;

    fn into_records(self) -> Vec<Self::Record>;
}

/// Drops spreadsheet float artifacts: everything from the first `.` on.
pub fn normalize_phone(raw: &str) -> String {
    let trimmed = raw.trim();
    match trimmed.split_once('.') {
        Some((digits, _)) => digits.to_string(),
        None => trimmed.to_string(),
    }
}

/// Excel serial day number (1900 date system) to a calendar date.
pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_signed(Duration::days(serial.floor() as i64))
}

/// Serial numbers in this open range are treated as dates when a date column holds a number.
const SERIAL_DATE_RANGE: (f64, f64) = (30000.0, 50000.0);

/// Renders a date cell as `YYYY-MM-DD`, converting bare serial numbers; other text passes through.
pub fn normalize_date_text(raw: &str) -> String {
    let trimmed = raw.trim();
    match trimmed.parse::<f64>() {
        Ok(serial) if serial > SERIAL_DATE_RANGE.0 && serial < SERIAL_DATE_RANGE.1 => {
            excel_serial_to_date(serial)
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| trimmed.to_string())
        }
        _ => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_phone_truncates_at_first_dot() {
        assert_eq!(normalize_phone("13812345678.0"), "13812345678");
        assert_eq!(normalize_phone("13812345678"), "13812345678");
        assert_eq!(normalize_phone(" 139.5.1 "), "139");
        assert_eq!(normalize_phone(""), "");
    }

    #[test]
    fn test_excel_serial_to_date() {
        assert_eq!(excel_serial_to_date(43831.0), NaiveDate::from_ymd_opt(2020, 1, 1));
        assert_eq!(excel_serial_to_date(43831.75), NaiveDate::from_ymd_opt(2020, 1, 1));
        assert_eq!(excel_serial_to_date(f64::NAN), None);
    }

    #[test]
    fn test_normalize_date_text() {
        assert_eq!(normalize_date_text("43831"), "2020-01-01");
        assert_eq!(normalize_date_text("2019-06-01"), "2019-06-01");
        // Outside the serial window: left alone
        assert_eq!(normalize_date_text("20190601"), "20190601");
        assert_eq!(normalize_date_text(""), "");
    }
}
