use super::{SheetLimits, TabularSink};
use crate::error::{ExportError, Result};
use std::sync::{Arc, RwLock};

/// One sheet captured by [`MemoryTables`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sheet {
    pub name: String,
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Sink that keeps sheets in memory. Clones share the same tables.
#[derive(Debug, Clone, Default)]
pub struct MemoryTables {
    sheets: Arc<RwLock<Vec<Sheet>>>,
    limits: SheetLimits,
}

impl MemoryTables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tables that enforce the given capacity, for exercising sheet overflow
    /// without writing a million rows to a real workbook.
    pub fn with_limits(limits: SheetLimits) -> Self {
        Self {
            limits,
            ..Self::default()
        }
    }

    /// Snapshot of everything written so far.
    pub fn sheets(&self) -> Vec<Sheet> {
        self.sheets
            .read()
            .map(|sheets| sheets.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    pub fn sheet(&self, name: &str) -> Option<Sheet> {
        self.sheets().into_iter().find(|s| s.name == name)
    }
}

impl TabularSink for MemoryTables {
    fn start_sheet(&mut self, name: &str, header: &[String]) -> Result<()> {
        let mut sheets = self.sheets.write().map_err(|_| poisoned())?;
        sheets.push(Sheet {
            name: name.to_string(),
            header: header.to_vec(),
            rows: Vec::new(),
        });
        Ok(())
    }

    fn write_row(&mut self, cells: &[String]) -> Result<()> {
        let mut sheets = self.sheets.write().map_err(|_| poisoned())?;
        let sheet = sheets.last_mut().ok_or_else(|| {
            ExportError::storage("Row written before any sheet was started", None::<std::io::Error>)
        })?;
        if let Some(max) = self.limits.max_data_rows() {
            if sheet.rows.len() as u64 >= max {
                return Err(ExportError::storage(
                    format!("Sheet {} is full", sheet.name),
                    None::<std::io::Error>,
                ));
            }
        }
        if let Some(max) = self.limits.max_cell_chars {
            if cells.iter().any(|c| c.chars().count() > max) {
                return Err(ExportError::storage(
                    format!("Cell longer than {max} characters"),
                    None::<std::io::Error>,
                ));
            }
        }
        sheet.rows.push(cells.to_vec());
        Ok(())
    }

    fn limits(&self) -> SheetLimits {
        self.limits
    }

    fn finish(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}

fn poisoned() -> ExportError {
    ExportError::storage("Memory tables lock poisoned", None::<std::io::Error>)
}
