use std::collections::HashSet;
use tracing::{debug, warn};

use super::{normalize_date_text, normalize_phone, SheetNormalizer, SheetSummary};
use crate::constants::{FEMALE, MALE, STUDENT_ID_PREFIX};
use crate::error::{Result, RosterError};
use crate::types::{SheetRows, StudentRecord};

// Header aliases, most specific first
const NAME_ALIASES: &[&str] = &["姓名", "学生姓名", "幼儿姓名", "name"];
const PARENT_PHONE_ALIASES: &[&str] = &["家长电话", "联系电话", "手机", "phone"];
const CLASS_ALIASES: &[&str] = &["班级", "所在班级", "class"];
const GENDER_ALIASES: &[&str] = &["性别", "gender"];
const BIRTH_DATE_ALIASES: &[&str] = &["出生日期", "生日", "出生年月", "birthday"];
const PARENT_NAME_ALIASES: &[&str] = &["家长姓名", "父母姓名", "监护人", "家长"];
const STUDENT_NUMBER_ALIASES: &[&str] = &["学号", "编号"];
const ADDRESS_ALIASES: &[&str] = &["家庭地址", "住址", "地址"];

/// Column positions resolved from a student sheet's header row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentColumns {
    pub name: usize,
    pub parent_phone: Option<usize>,
    pub class_name: Option<usize>,
    pub gender: Option<usize>,
    pub birth_date: Option<usize>,
    pub parent_name: Option<usize>,
    pub student_number: Option<usize>,
    pub address: Option<usize>,
}

/// Exact header match wins over a substring match; aliases are tried in order.
fn find_column(headers: &[String], aliases: &[&str]) -> Option<usize> {
    let normalized: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();
    for alias in aliases {
        if let Some(i) = normalized.iter().position(|h| h == alias) {
            return Some(i);
        }
    }
    for alias in aliases {
        if let Some(i) = normalized.iter().position(|h| !h.is_empty() && h.contains(alias)) {
            return Some(i);
        }
    }
    None
}

impl StudentColumns {
    pub fn resolve(sheet: &str, headers: &[String]) -> Result<Self> {
        let name = find_column(headers, NAME_ALIASES).ok_or_else(|| RosterError::Schema {
            sheet: sheet.to_string(),
            message: format!("no name column among headers {:?}", headers),
        })?;

        Ok(Self {
            name,
            parent_phone: find_column(headers, PARENT_PHONE_ALIASES),
            class_name: find_column(headers, CLASS_ALIASES),
            gender: find_column(headers, GENDER_ALIASES),
            birth_date: find_column(headers, BIRTH_DATE_ALIASES),
            parent_name: find_column(headers, PARENT_NAME_ALIASES),
            student_number: find_column(headers, STUDENT_NUMBER_ALIASES),
            address: find_column(headers, ADDRESS_ALIASES),
        })
    }
}

fn optional_cell(row: &[String], col: Option<usize>) -> &str {
    col.map(|c| SheetRows::cell(row, c).trim()).unwrap_or("")
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn last_four(phone: &str) -> String {
    let chars: Vec<char> = phone.chars().collect();
    chars[chars.len().saturating_sub(4)..].iter().collect()
}

/// `stu_<name>_<phone tail>_<class>` with whitespace removed; stable across re-imports.
pub fn student_id(name: &str, parent_phone: &str, class_name: &str) -> String {
    format!(
        "{}{}_{}_{}",
        STUDENT_ID_PREFIX,
        name,
        last_four(parent_phone),
        class_name
    )
    .chars()
    .filter(|c| !c.is_whitespace())
    .collect()
}

/// Normalizer for the student workbook, one class per sheet. Duplicate ids keep the first row.
pub struct StudentNormalizer {
    header_row: usize,
    records: Vec<StudentRecord>,
    seen_ids: HashSet<String>,
}

impl StudentNormalizer {
    pub fn new(header_row: usize) -> Self {
        Self {
            header_row,
            records: Vec::new(),
            seen_ids: HashSet::new(),
        }
    }

    fn record_from_row(
        columns: &StudentColumns,
        sheet_name: &str,
        row: &[String],
    ) -> Option<StudentRecord> {
        let name = SheetRows::cell(row, columns.name).trim();
        if name.is_empty() {
            return None;
        }

        let parent_phone = normalize_phone(optional_cell(row, columns.parent_phone));
        let class_name = match optional_cell(row, columns.class_name) {
            "" => sheet_name.trim(),
            class => class,
        };
        let gender = if optional_cell(row, columns.gender) == FEMALE {
            FEMALE
        } else {
            MALE
        };

        Some(StudentRecord {
            id: student_id(name, &parent_phone, class_name),
            name: name.to_string(),
            gender: gender.to_string(),
            class_name: class_name.to_string(),
            parent_name: optional_cell(row, columns.parent_name).to_string(),
            parent_phone,
            birth_date: normalize_date_text(optional_cell(row, columns.birth_date)),
            student_number: non_empty(optional_cell(row, columns.student_number)),
            address: non_empty(optional_cell(row, columns.address)),
        })
    }
}

impl SheetNormalizer for StudentNormalizer {
    type Record = StudentRecord;

    fn normalize_sheet(&mut self, sheet: &SheetRows) -> Result<SheetSummary> {
        // Template sheets with only a header (or nothing) carry no students.
        if sheet.rows.len() <= self.header_row + 1 {
            debug!("Student sheet '{}' has no data rows", sheet.name);
            return Ok(SheetSummary {
                sheet: sheet.name.clone(),
                emitted: 0,
                skipped: 0,
            });
        }

        let columns = StudentColumns::resolve(&sheet.name, &sheet.rows[self.header_row])?;

        let mut emitted = 0;
        let mut skipped = 0;
        for row in sheet.rows.iter().skip(self.header_row + 1) {
            let Some(record) = Self::record_from_row(&columns, &sheet.name, row) else {
                skipped += 1;
                continue;
            };
            if !self.seen_ids.insert(record.id.clone()) {
                warn!(
                    "Skipping duplicate student {} ({})",
                    record.name, record.class_name
                );
                skipped += 1;
                continue;
            }
            self.records.push(record);
            emitted += 1;
        }

        debug!(
            "Student sheet '{}': {} records, {} rows skipped",
            sheet.name, emitted, skipped
        );
        Ok(SheetSummary {
            sheet: sheet.name.clone(),
            emitted,
            skipped,
        })
    }

    fn into_records(self) -> Vec<StudentRecord> {
        self.records
    }
}
