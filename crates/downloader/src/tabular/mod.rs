//! Sinks for tabular output.
//!
//! A sink receives named sheets, each a header followed by rows of text
//! cells. Sheets are written one after another and never reopened.
//!
//! - [`ZipTsvSink`]: a zip archive with one tab-separated `<sheet>.tsv` entry per sheet
//! - [`WorkbookSink`]: an `.xlsx` workbook with one worksheet per sheet
//! - [`MemoryTables`]: keeps everything in memory for inspection

mod memory;
mod workbook;
mod zip_tsv;

pub use memory::{MemoryTables, Sheet};
pub use workbook::{WorkbookSink, MAX_CELL_CHARS, MAX_ROWS, MAX_SHEET_NAME_LEN};
pub use zip_tsv::ZipTsvSink;

use crate::error::Result;
use std::collections::HashSet;

/// Capacity of one sheet in a sink. `None` means unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SheetLimits {
    /// Longest cell, counted in characters.
    pub max_cell_chars: Option<usize>,
    /// Most rows per sheet, header included.
    pub max_rows: Option<u32>,
}

impl SheetLimits {
    /// Data rows that fit below the header.
    pub fn max_data_rows(&self) -> Option<u64> {
        self.max_rows.map(|rows| u64::from(rows.saturating_sub(1)))
    }
}

/// Destination of tabular output.
pub trait TabularSink {
    /// Begin a new sheet and write its header. Ends the previous sheet.
    fn start_sheet(&mut self, name: &str, header: &[String]) -> Result<()>;

    /// Append a row to the current sheet.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Storage`](crate::ExportError::Storage) when no
    /// sheet has been started or the underlying file cannot be written.
    fn write_row(&mut self, cells: &[String]) -> Result<()>;

    /// Complete the output. Nothing written is guaranteed to be readable before this.
    fn finish(self: Box<Self>) -> Result<()>;

    /// Cell and row capacity. Writing past it fails in `write_row`.
    fn limits(&self) -> SheetLimits {
        SheetLimits::default()
    }
}

/// Cut every cell longer than `max` characters down to `max`. Returns the
/// column and original length of each cut cell.
pub(crate) fn truncate_cells(cells: &mut [String], max: usize) -> Vec<(usize, usize)> {
    let mut cut = Vec::new();
    for (column, cell) in cells.iter_mut().enumerate() {
        let length = cell.chars().count();
        if length > max {
            *cell = cell.chars().take(max).collect();
            cut.push((column, length));
        }
    }
    cut
}

/// Sheet names already taken in one output, compared case-insensitively.
///
/// A clashing name gets a `~n` suffix, cut so the result stays within
/// `max_len` characters when one is given.
#[derive(Debug, Default)]
pub(crate) struct SheetNames {
    taken: HashSet<String>,
}

impl SheetNames {
    pub(crate) fn claim(&mut self, base: &str, max_len: Option<usize>) -> String {
        let base: String = match max_len {
            Some(len) => base.chars().take(len).collect(),
            None => base.to_string(),
        };
        let mut candidate = base.clone();
        let mut counter = 1;
        while self.taken.contains(&candidate.to_lowercase()) {
            let suffix = format!("~{counter}");
            let keep = max_len.map_or(usize::MAX, |len| len.saturating_sub(suffix.chars().count()));
            candidate = format!("{}{suffix}", base.chars().take(keep).collect::<String>());
            counter += 1;
        }
        self.taken.insert(candidate.to_lowercase());
        candidate
    }
}

/// Tabular sink chosen by output file extension: `.xlsx`/`.xls` is a workbook,
/// anything else a zip of TSV files.
pub fn is_workbook_path(path: &std::path::Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("xlsx") || e.eq_ignore_ascii_case("xls"))
        .unwrap_or(false)
}
