use super::Statement;
use crate::error::{ExportError, Result};
use std::io::Write;

/// Streams statements as N-Triples. Named graphs are dropped.
pub struct NTriplesWriter<W: Write> {
    out: W,
}

impl<W: Write> NTriplesWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn write(&mut self, statement: &Statement) -> Result<()> {
        writeln!(self.out, "{statement}")
            .map_err(|e| ExportError::storage("Failed to write N-Triples", Some(e)))
    }

    /// Flush and hand back the underlying writer.
    pub fn finish(mut self) -> Result<W> {
        self.out
            .flush()
            .map_err(|e| ExportError::storage("Failed to flush N-Triples", Some(e)))?;
        Ok(self.out)
    }
}
