//! Error types for export runs.
//!
//! [`ExportError`] covers the failures that abort a run. Problems that only
//! affect one entity or one row are collected as
//! [`ExportException`](crate::ExportException) values instead.

use crate::encode::EncodingError;
use downloader_api::{ClientError, MetadataError};
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for export operations.
pub type Result<T> = std::result::Result<T, ExportError>;

/// Error type for export operations.
#[derive(Error, Debug)]
pub enum ExportError {
    /// Credentials were rejected before any export stage ran
    #[error("Authentication failed: {0}")]
    Authentication(#[source] ClientError),

    /// The filtered schema misses an entity a requested entity depends on
    #[error(transparent)]
    IncompleteMetadata(MetadataError),

    /// Output path exists and overwriting was not allowed
    #[error("File {} already exists, please use the overwrite option to overwrite.", path.display())]
    OutputConflict {
        /// Conflicting output path
        path: PathBuf,
    },

    /// Output backend failure (file I/O, archive, workbook, RocksDB)
    #[error("Storage error: {message}")]
    Storage {
        /// Detailed error message
        message: String,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Serialization/deserialization error
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error details
        message: String,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Service failure outside per-entity streaming
    #[error("Client error: {0}")]
    Client(#[source] ClientError),

    /// Schema could not be used
    #[error("Metadata error: {0}")]
    Metadata(#[source] MetadataError),

    /// Entity cannot be encoded for the selected target
    #[error(transparent)]
    Encoding(#[from] EncodingError),
}

impl ExportError {
    /// Create a storage error from a message and optional source.
    pub fn storage<E>(message: impl Into<String>, source: Option<E>) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Storage {
            message: message.into(),
            source: source.map(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>),
        }
    }

    /// Create a serialization error from a message and optional source.
    pub fn serialization<E>(message: impl Into<String>, source: Option<E>) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Serialization {
            message: message.into(),
            source: source.map(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>),
        }
    }

    /// Whether the run must stop. Non-fatal errors only skip the entity at hand.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, ExportError::Encoding(_))
    }
}

impl From<ClientError> for ExportError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Authentication(_) => ExportError::Authentication(err),
            ClientError::Metadata(inner) => inner.into(),
            other => ExportError::Client(other),
        }
    }
}

impl From<MetadataError> for ExportError {
    fn from(err: MetadataError) -> Self {
        match err {
            MetadataError::IncompleteMetadata { .. } => ExportError::IncompleteMetadata(err),
            other => ExportError::Metadata(other),
        }
    }
}
