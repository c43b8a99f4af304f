use tracing::debug;

use super::{normalize_phone, SheetNormalizer, SheetSummary};
use crate::constants::{DEFAULT_STAFF_ROLE, STAFF_ID_PREFIX, STAFF_NAME_HEADER};
use crate::error::{Result, RosterError};
use crate::types::{SheetRows, StaffRecord};

/// Columns of the staff contact sheet, by source position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaffColumn {
    Name,
    Phone,
    Gender,
    Class,
    Role,
}

/// Expected column order. A header narrower than this fails the sheet.
pub const STAFF_SCHEMA: [StaffColumn; 5] = [
    StaffColumn::Name,
    StaffColumn::Phone,
    StaffColumn::Gender,
    StaffColumn::Class,
    StaffColumn::Role,
];

impl StaffColumn {
    pub const fn position(self) -> usize {
        match self {
            StaffColumn::Name => 0,
            StaffColumn::Phone => 1,
            StaffColumn::Gender => 2,
            StaffColumn::Class => 3,
            StaffColumn::Role => 4,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            StaffColumn::Name => "name",
            StaffColumn::Phone => "phone",
            StaffColumn::Gender => "gender",
            StaffColumn::Class => "class",
            StaffColumn::Role => "role",
        }
    }
}

/// Normalizer for the staff contact workbook. Ids run across every sheet fed to it.
pub struct StaffNormalizer {
    header_row: usize,
    records: Vec<StaffRecord>,
}

impl StaffNormalizer {
    pub fn new(header_row: usize) -> Self {
        Self {
            header_row,
            records: Vec::new(),
        }
    }

    fn field<'a>(row: &'a [String], column: StaffColumn) -> &'a str {
        SheetRows::cell(row, column.position()).trim()
    }

    fn check_header(&self, sheet: &SheetRows) -> Result<()> {
        let header = sheet.rows.get(self.header_row).ok_or_else(|| RosterError::Schema {
            sheet: sheet.name.clone(),
            message: format!(
                "header row {} is missing (sheet has {} rows)",
                self.header_row,
                sheet.rows.len()
            ),
        })?;

        if header.len() < STAFF_SCHEMA.len() {
            let expected: Vec<&str> = STAFF_SCHEMA.iter().map(|c| c.label()).collect();
            return Err(RosterError::Schema {
                sheet: sheet.name.clone(),
                message: format!(
                    "expected {} columns ({}), header has {}",
                    STAFF_SCHEMA.len(),
                    expected.join(", "),
                    header.len()
                ),
            });
        }
        Ok(())
    }

    /// `None` for rows that are blank or a repeated header.
    fn record_from_row(&self, row: &[String]) -> Option<StaffRecord> {
        let name = Self::field(row, StaffColumn::Name);
        if name.is_empty() || name == STAFF_NAME_HEADER {
            return None;
        }

        let role = match Self::field(row, StaffColumn::Role) {
            "" => DEFAULT_STAFF_ROLE,
            role => role,
        };
        let assigned_classes = match Self::field(row, StaffColumn::Class) {
            "" => Vec::new(),
            class => vec![class.to_string()],
        };

        Some(StaffRecord {
            id: format!("{}{}", STAFF_ID_PREFIX, self.records.len() + 1),
            name: name.to_string(),
            phone: normalize_phone(Self::field(row, StaffColumn::Phone)),
            role: role.to_string(),
            gender: Self::field(row, StaffColumn::Gender).to_string(),
            assigned_classes,
        })
    }
}

impl SheetNormalizer for StaffNormalizer {
    type Record = StaffRecord;

    fn normalize_sheet(&mut self, sheet: &SheetRows) -> Result<SheetSummary> {
        self.check_header(sheet)?;

        let mut emitted = 0;
        let mut skipped = 0;
        for row in sheet.rows.iter().skip(self.header_row + 1) {
            match self.record_from_row(row) {
                Some(record) => {
                    self.records.push(record);
                    emitted += 1;
                }
                None => skipped += 1,
            }
        }

        debug!(
            "Staff sheet '{}': {} records, {} rows skipped",
            sheet.name, emitted, skipped
        );
        Ok(SheetSummary {
            sheet: sheet.name.clone(),
            emitted,
            skipped,
        })
    }

    fn into_records(self) -> Vec<StaffRecord> {
        self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    fn sheet(data: Vec<Vec<String>>) -> SheetRows {
        let mut rows = vec![
            row(&["教职工通讯录", "", "", "", ""]),
            row(&["姓名", "手机号码", "性别", "班级", "岗位"]),
        ];
        rows.extend(data);
        SheetRows::new("Sheet1", rows)
    }

    fn normalize(data: Vec<Vec<String>>) -> (SheetSummary, Vec<StaffRecord>) {
        let mut normalizer = StaffNormalizer::new(1);
        let summary = normalizer.normalize_sheet(&sheet(data)).unwrap();
        (summary, normalizer.into_records())
    }

    #[test]
    fn test_staff_row_becomes_record() {
        let (_, records) = normalize(vec![row(&["张三", "13812345678.0", "男", "一年级", ""])]);
        assert_eq!(
            records,
            vec![StaffRecord {
                id: "staff_1".into(),
                name: "张三".into(),
                phone: "13812345678".into(),
                role: "教师".into(),
                gender: "男".into(),
                assigned_classes: vec!["一年级".into()],
            }]
        );
    }

    #[test]
    fn test_serialized_shape() {
        let (_, records) = normalize(vec![row(&["张三", "13812345678.0", "男", "一年级", ""])]);
        let value = serde_json::to_value(&records[0]).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "id": "staff_1",
                "name": "张三",
                "phone": "13812345678",
                "role": "教师",
                "gender": "男",
                "assignedClasses": ["一年级"]
            })
        );
    }

    #[test]
    fn test_leaked_header_and_blank_rows_are_skipped() {
        let (summary, records) = normalize(vec![
            row(&["姓名", "手机号码", "性别", "班级", "岗位"]),
            row(&["", "13800000000", "女", "", ""]),
            row(&["  ", "", "", "", ""]),
            row(&["李四", "13900000000", "女", "", "园长"]),
        ]);
        assert_eq!(summary.emitted, 1);
        assert_eq!(summary.skipped, 3);
        assert_eq!(records[0].name, "李四");
        assert_eq!(records[0].role, "园长");
    }

    #[test]
    fn test_ids_count_only_emitted_records() {
        let (_, records) = normalize(vec![
            row(&["张三", "1", "", "", ""]),
            row(&["", "2", "", "", ""]),
            row(&["李四", "3", "", "", ""]),
        ]);
        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["staff_1", "staff_2"]);
    }

    #[test]
    fn test_empty_class_gives_no_assignment() {
        let (_, records) = normalize(vec![row(&["王五", "13700000000", "", "  ", "保育员"])]);
        assert!(records[0].assigned_classes.is_empty());
        assert_eq!(records[0].gender, "");
    }

    #[test]
    fn test_short_rows_read_as_blank_cells() {
        let (_, records) = normalize(vec![row(&["赵六", "13600000000"])]);
        assert_eq!(records[0].role, DEFAULT_STAFF_ROLE);
        assert!(records[0].assigned_classes.is_empty());
    }

    #[test]
    fn test_ids_continue_across_sheets() {
        let mut normalizer = StaffNormalizer::new(1);
        normalizer
            .normalize_sheet(&sheet(vec![row(&["张三", "1", "", "", ""])]))
            .unwrap();
        normalizer
            .normalize_sheet(&sheet(vec![row(&["李四", "2", "", "", ""])]))
            .unwrap();
        let records = normalizer.into_records();
        assert_eq!(records[1].id, "staff_2");
    }

    #[test]
    fn test_missing_header_row_fails() {
        let mut normalizer = StaffNormalizer::new(1);
        let err = normalizer
            .normalize_sheet(&SheetRows::new("Empty", vec![row(&["教职工通讯录"])]))
            .unwrap_err();
        assert!(matches!(err, RosterError::Schema { .. }));
    }

    #[test]
    fn test_narrow_header_fails() {
        let mut normalizer = StaffNormalizer::new(0);
        let err = normalizer
            .normalize_sheet(&SheetRows::new("Narrow", vec![row(&["姓名", "手机号码", "性别"])]))
            .unwrap_err();
        match err {
            RosterError::Schema { sheet, message } => {
                assert_eq!(sheet, "Narrow");
                assert!(message.contains("header has 3"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
