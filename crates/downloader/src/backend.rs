//! Output backends of an export run.
//!
//! An [`ExportBackend`] receives the schema, then the rows of each entity in
//! turn. [`open_backend`] picks the backend from the run configuration and
//! enforces the overwrite rule before anything is created.

use crate::config::{ExportConfig, OutputFormat};
use crate::encode::{AttributeIndex, EncodingError, GraphRowEncoder, TabularRowEncoder};
use crate::error::{ExportError, Result};
use crate::graph::TripleStore;
use crate::metadata_writer::write_metadata;
use crate::rdf::{GraphSyntax, DEFAULT_NAMESPACES};
use crate::tabular::{truncate_cells, TabularSink, WorkbookSink, ZipTsvSink};
use downloader_api::{Entity, MetadataRepository, MolgenisVersion, Row};
use log::{debug, info, warn};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Prefix registered for the instance namespace.
pub const INSTANCE_PREFIX: &str = "data";

/// What one row turned into.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowOutcome {
    /// Table rows or new statements written
    pub units: u64,
    /// Values that were skipped
    pub errors: Vec<EncodingError>,
}

/// Destination of one export run.
pub trait ExportBackend {
    /// Write the schema. Called at most once, before any entity.
    fn write_metadata(
        &mut self,
        metadata: &MetadataRepository,
        version: MolgenisVersion,
    ) -> Result<()>;

    /// Prepare for the rows of `entity`.
    ///
    /// # Errors
    ///
    /// Non-fatal errors ([`ExportError::is_fatal`]) mean the entity cannot be
    /// written and is skipped.
    fn begin_entity(
        &mut self,
        metadata: &MetadataRepository,
        entity: &Entity,
        version: MolgenisVersion,
    ) -> Result<()>;

    fn write_row(&mut self, row: &Row) -> Result<RowOutcome>;

    fn end_entity(&mut self) -> Result<()>;

    /// Flush and release all resources.
    fn close(self: Box<Self>) -> Result<()>;
}

/// Open the backend described by `config`.
///
/// # Errors
///
/// Returns [`ExportError::OutputConflict`] if the output exists and
/// overwriting is not allowed; nothing is created in that case.
pub fn open_backend(config: &ExportConfig) -> Result<Box<dyn ExportBackend>> {
    let path = config.output.as_path();
    prepare_output(path, config.overwrite)?;

    let backend: Box<dyn ExportBackend> = match config.output_format() {
        OutputFormat::Zip => Box::new(TabularBackend::new(Box::new(ZipTsvSink::create(path)?))),
        OutputFormat::Workbook => {
            if has_extension(path, "xls") {
                warn!(
                    "{} will be written in the .xlsx workbook format",
                    path.display()
                );
            }
            Box::new(TabularBackend::new(Box::new(WorkbookSink::create(path))))
        }
        OutputFormat::GraphFile(syntax) => {
            Box::new(GraphBackend::to_file(path, syntax, &config.namespace)?)
        }
        OutputFormat::GraphStore => Box::new(GraphBackend::persistent(path, &config.namespace)?),
    };
    info!("Opened {:?} output at {}", config.output_format(), path.display());
    Ok(backend)
}

fn prepare_output(path: &Path, overwrite: bool) -> Result<()> {
    if !path.exists() {
        return Ok(());
    }
    if !overwrite {
        return Err(ExportError::OutputConflict {
            path: path.to_path_buf(),
        });
    }

    info!("Overwriting {}", path.display());
    let removed = if path.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    removed.map_err(|e| {
        ExportError::storage(format!("Failed to remove {}", path.display()), Some(e))
    })
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map_or(false, |e| e.eq_ignore_ascii_case(extension))
}

/// Sheets per entity, named by the entity's full name.
///
/// Rows are fitted to the sink's [`SheetLimits`](crate::tabular::SheetLimits).
/// An oversize cell is truncated and the row kept, with a
/// [`EncodingError::CellTooLong`] per cut cell. Once a sheet is full the
/// remaining rows of that entity are skipped and reported once as
/// [`EncodingError::SheetFull`].
pub struct TabularBackend {
    sink: Box<dyn TabularSink>,
    sheet: Option<SheetState>,
}

struct SheetState {
    entity: String,
    encoder: TabularRowEncoder,
    rows: u64,
    full: bool,
}

impl TabularBackend {
    pub fn new(sink: Box<dyn TabularSink>) -> Self {
        Self { sink, sheet: None }
    }
}

impl ExportBackend for TabularBackend {
    fn write_metadata(
        &mut self,
        metadata: &MetadataRepository,
        _version: MolgenisVersion,
    ) -> Result<()> {
        write_metadata(self.sink.as_mut(), metadata)
    }

    fn begin_entity(
        &mut self,
        metadata: &MetadataRepository,
        entity: &Entity,
        _version: MolgenisVersion,
    ) -> Result<()> {
        let encoder = TabularRowEncoder::new(&AttributeIndex::new(metadata, entity));
        self.sink.start_sheet(&entity.full_name, encoder.header())?;
        self.sheet = Some(SheetState {
            entity: entity.full_name.clone(),
            encoder,
            rows: 0,
            full: false,
        });
        Ok(())
    }

    fn write_row(&mut self, row: &Row) -> Result<RowOutcome> {
        let limits = self.sink.limits();
        let sheet = self.sheet.as_mut().ok_or_else(no_entity)?;

        if limits.max_data_rows().is_some_and(|max| sheet.rows >= max) {
            let mut errors = Vec::new();
            if !sheet.full {
                sheet.full = true;
                warn!("Sheet {} is full, skipping its remaining rows", sheet.entity);
                errors.push(EncodingError::SheetFull {
                    entity: sheet.entity.clone(),
                    rows: sheet.rows,
                });
            }
            return Ok(RowOutcome { units: 0, errors });
        }

        let mut cells = sheet.encoder.encode(row);
        let mut errors = Vec::new();
        if let Some(limit) = limits.max_cell_chars {
            let header = sheet.encoder.header();
            for (column, length) in truncate_cells(&mut cells, limit) {
                errors.push(EncodingError::CellTooLong {
                    attribute: header.get(column).cloned().unwrap_or_default(),
                    length,
                    limit,
                });
            }
        }
        self.sink.write_row(&cells)?;
        sheet.rows += 1;
        Ok(RowOutcome { units: 1, errors })
    }

    fn end_entity(&mut self) -> Result<()> {
        self.sheet = None;
        Ok(())
    }

    fn close(self: Box<Self>) -> Result<()> {
        self.sink.finish()
    }
}

/// Statements in a triple store, optionally serialized to a file on close.
pub struct GraphBackend {
    store: TripleStore,
    encoder: Option<GraphRowEncoder>,
    output: Option<(PathBuf, GraphSyntax)>,
    namespace: String,
    // declared last: removed only after the store is closed
    scratch: Option<TempDir>,
}

impl GraphBackend {
    /// Graph written to `path` on close; the store lives in a temporary directory.
    pub fn to_file(path: &Path, syntax: GraphSyntax, namespace: &str) -> Result<Self> {
        let (store, scratch) = scratch_store()?;
        let mut backend = Self {
            store,
            encoder: None,
            output: Some((path.to_path_buf(), syntax)),
            namespace: namespace.to_string(),
            scratch,
        };
        backend.register_namespaces()?;
        Ok(backend)
    }

    /// Graph kept in a store directory at `path`.
    #[cfg(feature = "rocksdb-backend")]
    pub fn persistent(path: &Path, namespace: &str) -> Result<Self> {
        Self::with_store(TripleStore::open(path)?, namespace)
    }

    #[cfg(not(feature = "rocksdb-backend"))]
    pub fn persistent(path: &Path, _namespace: &str) -> Result<Self> {
        Err(ExportError::storage(
            format!(
                "Cannot create a triple store at {} without the rocksdb-backend feature",
                path.display()
            ),
            None::<std::io::Error>,
        ))
    }

    /// Graph kept in the given store, never written to a file.
    pub fn with_store(store: TripleStore, namespace: &str) -> Result<Self> {
        let mut backend = Self {
            store,
            encoder: None,
            output: None,
            namespace: namespace.to_string(),
            scratch: None,
        };
        backend.register_namespaces()?;
        Ok(backend)
    }

    fn register_namespaces(&mut self) -> Result<()> {
        for (prefix, namespace) in DEFAULT_NAMESPACES {
            self.store.set_namespace(prefix, namespace)?;
        }
        self.store.set_namespace(INSTANCE_PREFIX, &self.namespace)
    }

    fn serialize(&mut self) -> Result<()> {
        self.store.flush()?;
        let Some((path, syntax)) = &self.output else {
            return Ok(());
        };

        let file = File::create(path).map_err(|e| {
            ExportError::storage(format!("Failed to create {}", path.display()), Some(e))
        })?;
        let out = BufWriter::new(file);
        match syntax {
            GraphSyntax::NTriples => self.store.write_ntriples(out)?,
            GraphSyntax::Turtle => self.store.write_turtle(out)?,
        };
        info!(
            "Wrote {} statements to {}",
            self.store.len(),
            path.display()
        );
        Ok(())
    }
}

#[cfg(feature = "rocksdb-backend")]
fn scratch_store() -> Result<(TripleStore, Option<TempDir>)> {
    let dir = TempDir::new()
        .map_err(|e| ExportError::storage("Failed to create scratch directory", Some(e)))?;
    debug!("Scratch triple store at {}", dir.path().display());
    let store = TripleStore::open(dir.path())?;
    Ok((store, Some(dir)))
}

#[cfg(not(feature = "rocksdb-backend"))]
fn scratch_store() -> Result<(TripleStore, Option<TempDir>)> {
    debug!("Scratch triple store in memory");
    Ok((TripleStore::in_memory(), None))
}

impl ExportBackend for GraphBackend {
    fn write_metadata(
        &mut self,
        _metadata: &MetadataRepository,
        _version: MolgenisVersion,
    ) -> Result<()> {
        debug!("Graph output carries no schema");
        Ok(())
    }

    fn begin_entity(
        &mut self,
        metadata: &MetadataRepository,
        entity: &Entity,
        version: MolgenisVersion,
    ) -> Result<()> {
        let encoder = GraphRowEncoder::new(metadata, entity, version, &self.namespace)?;
        if !encoder.is_annotated() {
            debug!("{} has no associated tags, no statements will be written", entity.full_name);
        }
        self.encoder = Some(encoder);
        Ok(())
    }

    fn write_row(&mut self, row: &Row) -> Result<RowOutcome> {
        let encoder = self.encoder.as_ref().ok_or_else(no_entity)?;
        let encoded = encoder.encode(row);
        let added = self.store.add_all(&encoded.statements)?;
        Ok(RowOutcome {
            units: added as u64,
            errors: encoded.errors,
        })
    }

    fn end_entity(&mut self) -> Result<()> {
        self.encoder = None;
        Ok(())
    }

    fn close(mut self: Box<Self>) -> Result<()> {
        let written = self.serialize();
        let GraphBackend { store, scratch, .. } = *self;
        let closed = store.close();
        drop(scratch);
        written.and(closed)
    }
}

fn no_entity() -> ExportError {
    ExportError::storage("Row written outside an entity", None::<std::io::Error>)
}
