//! # downloader
//!
//! Metadata-driven export of the datasets held by a MOLGENIS server.
//!
//! ## Outputs
//!
//! - **Tabular**: one sheet per entity in a ZIP archive of TSV files or an
//!   `.xlsx` workbook, optionally preceded by the EMX metadata sheets
//! - **Graph**: RDF statements for the tagged attributes of each entity,
//!   serialized as N-Triples or Turtle, or kept in a persistent triple store
//!
//! ## Architecture
//!
//! ```text
//! MolgenisClient (schema, paged rows)
//!     ↓
//! Exporter (selection, per-entity streaming, exception report)
//!     ↓
//! ExportBackend (tabular sinks, graph encoder)
//!     ↓
//! Output (zip, xlsx, nt/ttl via TripleStore, RocksDB)
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use downloader::{run, ExportConfig};
//! use downloader::downloader_api::{Credentials, MolgenisClient};
//!
//! fn export_people(client: &mut dyn MolgenisClient) -> downloader::Result<()> {
//!     let config = ExportConfig::tabular("people.zip")
//!         .with_entities(["Person"])
//!         .with_metadata(true);
//!     let report = run(client, &Credentials::new("admin", "admin"), &config)?;
//!     for exception in &report.exceptions {
//!         eprintln!("{exception}");
//!     }
//!     Ok(())
//! }
//! ```

#![deny(unsafe_code)]

pub mod backend;
pub mod config;
pub mod encode;
pub mod error;
pub mod exporter;
pub mod graph;
pub mod metadata_writer;
pub mod rdf;
pub mod report;
pub mod selection;
pub mod storage;
pub mod tabular;

pub use downloader_api;

// Re-export main types
pub use backend::{open_backend, ExportBackend, GraphBackend, RowOutcome, TabularBackend};
pub use config::{ExportConfig, OutputFormat, TargetKind, DEFAULT_NAMESPACE};
pub use encode::EncodingError;
pub use error::{ExportError, Result};
pub use exporter::{run, Exporter};
pub use graph::TripleStore;
pub use report::{EntityStats, ExportException, ExportReport};
pub use selection::select_targets;
#[cfg(feature = "rocksdb-backend")]
pub use storage::RocksDBBackend;
pub use storage::{MemoryBackend, StorageBackend};
