use serde::{Deserialize, Serialize};

/// One row of the staff contact sheet, as published to `kt_staff.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffRecord {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub role: String,
    pub gender: String,
    pub assigned_classes: Vec<String>,
}

/// One student row, as published to `kt_students.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRecord {
    pub id: String,
    pub name: String,
    pub gender: String,
    pub class_name: String,
    pub parent_name: String,
    pub parent_phone: String,
    pub birth_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// A sheet's cells rendered as trimmed text, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetRows {
    pub name: String,
    pub rows: Vec<Vec<String>>,
}

impl SheetRows {
    pub fn new(name: impl Into<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }

    /// Cell text at `col`, or empty when the row is short.
    pub fn cell(row: &[String], col: usize) -> &str {
        row.get(col).map(|s| s.as_str()).unwrap_or("")
    }
}
