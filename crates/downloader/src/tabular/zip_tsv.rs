use super::{SheetNames, TabularSink};
use crate::error::{ExportError, Result};
use log::{debug, warn};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use zip::write::FileOptions;
use zip::ZipWriter;

/// Zip archive holding one tab-separated file per sheet.
///
/// Entry names are unique ignoring case. A sheet whose name is already
/// taken, such as a data entity called `attributes` next to the metadata
/// sheet of that name, is stored as `<name>~n.tsv`.
pub struct ZipTsvSink {
    zip: ZipWriter<File>,
    path: PathBuf,
    in_sheet: bool,
    names: SheetNames,
}

impl ZipTsvSink {
    /// Create (or truncate) the archive at `path`.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path).map_err(|e| {
            ExportError::storage(format!("Failed to create archive {}", path.display()), Some(e))
        })?;
        Ok(Self {
            zip: ZipWriter::new(file),
            path,
            in_sheet: false,
            names: SheetNames::default(),
        })
    }

    fn write_record(&mut self, cells: &[String]) -> Result<()> {
        let mut buffer = Vec::new();
        {
            let mut wtr = csv::WriterBuilder::new()
                .delimiter(b'\t')
                .from_writer(&mut buffer);
            wtr.write_record(cells)
                .map_err(|e| ExportError::serialization("Failed to encode TSV record", Some(e)))?;
            wtr.flush()
                .map_err(|e| ExportError::storage("Failed to encode TSV record", Some(e)))?;
        }
        self.zip
            .write_all(&buffer)
            .map_err(|e| ExportError::storage("Failed to write archive entry", Some(e)))
    }
}

impl TabularSink for ZipTsvSink {
    fn start_sheet(&mut self, name: &str, header: &[String]) -> Result<()> {
        let entry = self.names.claim(name, None);
        if entry != name {
            warn!("Sheet name {name} is already used, storing it as {entry}.tsv");
        }
        debug!("Adding {entry}.tsv to {}", self.path.display());
        let options = FileOptions::default().compression_method(zip::CompressionMethod::Deflated);
        self.zip
            .start_file(format!("{entry}.tsv"), options)
            .map_err(|e| ExportError::storage(format!("Failed to add {entry}.tsv"), Some(e)))?;
        self.in_sheet = true;
        self.write_record(header)
    }

    fn write_row(&mut self, cells: &[String]) -> Result<()> {
        if !self.in_sheet {
            return Err(ExportError::storage(
                "Row written before any sheet was started",
                None::<std::io::Error>,
            ));
        }
        self.write_record(cells)
    }

    fn finish(mut self: Box<Self>) -> Result<()> {
        self.zip
            .finish()
            .map_err(|e| ExportError::storage("Failed to finish archive", Some(e)))?;
        debug!("Closed archive {}", self.path.display());
        Ok(())
    }
}
