use super::{SheetLimits, SheetNames, TabularSink};
use crate::error::{ExportError, Result};
use log::debug;
use rust_xlsxwriter::{Workbook, XlsxError};
use std::path::{Path, PathBuf};

/// Longest worksheet name a workbook accepts.
pub const MAX_SHEET_NAME_LEN: usize = 31;

/// Longest string a worksheet cell holds.
pub const MAX_CELL_CHARS: usize = 32_767;

/// Rows per worksheet.
pub const MAX_ROWS: u32 = 1_048_576;

/// Office Open XML workbook, one worksheet per sheet.
///
/// Worksheets run in constant-memory mode: each finished row is flushed to a
/// temporary file, so memory stays bounded by one row rather than the whole
/// export. Rows therefore have to arrive in order, which the sink guarantees.
/// The archive itself is assembled on [`finish`](TabularSink::finish).
pub struct WorkbookSink {
    workbook: Workbook,
    path: PathBuf,
    sheet: Option<usize>,
    next_row: u32,
    names: SheetNames,
}

impl WorkbookSink {
    pub fn create<P: AsRef<Path>>(path: P) -> Self {
        Self {
            workbook: Workbook::new(),
            path: path.as_ref().to_path_buf(),
            sheet: None,
            next_row: 0,
            names: SheetNames::default(),
        }
    }

    fn write_cells(&mut self, cells: &[String]) -> Result<()> {
        let index = self.sheet.ok_or_else(|| {
            ExportError::storage("Row written before any sheet was started", None::<XlsxError>)
        })?;
        let row = self.next_row;
        if row >= MAX_ROWS {
            return Err(ExportError::storage(
                format!("Worksheet is full at {MAX_ROWS} rows"),
                None::<XlsxError>,
            ));
        }
        let worksheet = self.workbook.worksheet_from_index(index).map_err(xlsx)?;
        for (column, cell) in cells.iter().enumerate() {
            let column = u16::try_from(column).map_err(|_| {
                ExportError::storage("Too many columns for a worksheet", None::<XlsxError>)
            })?;
            if !cell.is_empty() {
                worksheet.write_string(row, column, cell).map_err(xlsx)?;
            }
        }
        self.next_row += 1;
        Ok(())
    }

    /// Unique worksheet name: forbidden characters replaced, at most 31 characters.
    fn sheet_name(&mut self, name: &str) -> String {
        let cleaned: String = name
            .chars()
            .map(|c| match c {
                '[' | ']' | ':' | '*' | '?' | '/' | '\\' => '_',
                c => c,
            })
            .collect();
        self.names.claim(&cleaned, Some(MAX_SHEET_NAME_LEN))
    }
}

impl TabularSink for WorkbookSink {
    fn start_sheet(&mut self, name: &str, header: &[String]) -> Result<()> {
        let sheet_name = self.sheet_name(name);
        if sheet_name != name {
            debug!("Sheet {name} stored as {sheet_name}");
        }
        let worksheet = self.workbook.add_worksheet_with_constant_memory();
        worksheet.set_name(&sheet_name).map_err(xlsx)?;
        self.sheet = Some(self.sheet.map_or(0, |i| i + 1));
        self.next_row = 0;
        self.write_cells(header)
    }

    fn write_row(&mut self, cells: &[String]) -> Result<()> {
        self.write_cells(cells)
    }

    fn limits(&self) -> SheetLimits {
        SheetLimits {
            max_cell_chars: Some(MAX_CELL_CHARS),
            max_rows: Some(MAX_ROWS),
        }
    }

    fn finish(mut self: Box<Self>) -> Result<()> {
        self.workbook.save(&self.path).map_err(|e| {
            ExportError::storage(format!("Failed to save workbook {}", self.path.display()), Some(e))
        })?;
        debug!("Saved workbook {}", self.path.display());
        Ok(())
    }
}

fn xlsx(err: XlsxError) -> ExportError {
    ExportError::storage("Workbook error", Some(err))
}
