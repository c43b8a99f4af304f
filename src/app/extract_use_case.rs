use tracing::{info, instrument};

use crate::app::ports::WorkbookPort;
use crate::error::{Result, RosterError};
use crate::metrics::ExtractMetrics;
use crate::normalize::{SheetNormalizer, StaffNormalizer, StudentNormalizer};
use crate::types::{StaffRecord, StudentRecord};

/// Which sheets of a workbook feed an extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SheetSelection {
    #[default]
    First,
    Named(String),
    All,
}

/// Shape of one sheet, for eyeballing a workbook before extracting it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetPreview {
    pub name: String,
    pub row_count: usize,
    pub column_count: usize,
    pub rows: Vec<Vec<String>>,
}

/// Use case for turning a workbook into roster records
pub struct ExtractUseCase {
    workbook: Box<dyn WorkbookPort>,
}

impl ExtractUseCase {
    pub fn new(workbook: Box<dyn WorkbookPort>) -> Self {
        Self { workbook }
    }

    fn selected_sheets(&self, selection: &SheetSelection) -> Result<Vec<String>> {
        let names = self.workbook.sheet_names();
        match selection {
            SheetSelection::First => names
                .into_iter()
                .next()
                .map(|n| vec![n])
                .ok_or_else(|| RosterError::MissingSheet("workbook has no sheets".to_string())),
            SheetSelection::Named(name) => {
                if names.iter().any(|n| n == name) {
                    Ok(vec![name.clone()])
                } else {
                    Err(RosterError::MissingSheet(name.clone()))
                }
            }
            SheetSelection::All => Ok(names),
        }
    }

    fn run<N: SheetNormalizer>(
        &mut self,
        kind: &'static str,
        mut normalizer: N,
        sheets: Vec<String>,
    ) -> Result<Vec<N::Record>> {
        for sheet_name in sheets {
            let sheet = self.workbook.read_sheet(&sheet_name)?;
            let summary = normalizer.normalize_sheet(&sheet)?;
            info!(
                "Sheet '{}': {} {} records, {} rows skipped",
                summary.sheet, summary.emitted, kind, summary.skipped
            );
            ExtractMetrics::record_sheet(kind, summary.emitted, summary.skipped);
        }
        Ok(normalizer.into_records())
    }

    #[instrument(skip(self))]
    pub fn extract_staff(
        &mut self,
        header_row: usize,
        selection: &SheetSelection,
    ) -> Result<Vec<StaffRecord>> {
        let sheets = self.selected_sheets(selection)?;
        self.run("staff", StaffNormalizer::new(header_row), sheets)
    }

    /// Every sheet is read; each is expected to hold one class.
    #[instrument(skip(self))]
    pub fn extract_students(&mut self, header_row: usize) -> Result<Vec<StudentRecord>> {
        let sheets = self.selected_sheets(&SheetSelection::All)?;
        self.run("student", StudentNormalizer::new(header_row), sheets)
    }

    pub fn inspect(&mut self, preview_rows: usize) -> Result<Vec<SheetPreview>> {
        let mut previews = Vec::new();
        for name in self.workbook.sheet_names() {
            let sheet = self.workbook.read_sheet(&name)?;
            previews.push(SheetPreview {
                name: sheet.name,
                row_count: sheet.rows.len(),
                column_count: sheet.rows.iter().map(Vec::len).max().unwrap_or(0),
                rows: sheet.rows.into_iter().take(preview_rows).collect(),
            });
        }
        Ok(previews)
    }
}
