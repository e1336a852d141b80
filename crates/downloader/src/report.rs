//! Outcome of an export run.

use crate::encode::EncodingError;
use crate::error::ExportError;
use downloader_api::ClientError;
use std::time::Duration;
use thiserror::Error;

/// Problem recorded during a run that did not stop it.
#[derive(Error, Debug)]
pub enum ExportException {
    /// The service does not know the entity
    #[error("entity: {entity} does not exist")]
    EntityNotFound {
        entity: String,
        #[source]
        source: ClientError,
    },

    /// Rows of the entity could not be read
    #[error("Failed to stream entity {entity}: {source}")]
    Stream {
        entity: String,
        #[source]
        source: ClientError,
    },

    /// One value or row could not be written as read
    #[error("Entity {entity}, row {row}: {source}")]
    Encoding {
        entity: String,
        /// Zero-based row number within the entity
        row: u64,
        #[source]
        source: EncodingError,
    },

    /// The entity as a whole could not be exported
    #[error("Entity {entity} skipped: {source}")]
    Entity {
        entity: String,
        #[source]
        source: ExportError,
    },
}

impl ExportException {
    /// Classify a client failure for `entity`.
    pub fn from_client(entity: &str, source: ClientError) -> Self {
        match source {
            ClientError::NotFound(_) => ExportException::EntityNotFound {
                entity: entity.to_string(),
                source,
            },
            source => ExportException::Stream {
                entity: entity.to_string(),
                source,
            },
        }
    }

    /// Entity the exception is about.
    pub fn entity(&self) -> &str {
        match self {
            ExportException::EntityNotFound { entity, .. }
            | ExportException::Stream { entity, .. }
            | ExportException::Encoding { entity, .. }
            | ExportException::Entity { entity, .. } => entity,
        }
    }
}

/// Counts for one exported entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityStats {
    pub entity: String,
    /// Rows read from the service
    pub rows: u64,
    /// Output units written: table rows or new statements
    pub units: u64,
}

/// Result of an export run.
#[derive(Debug, Default)]
pub struct ExportReport {
    pub entities: Vec<EntityStats>,
    pub exceptions: Vec<ExportException>,
    pub elapsed: Duration,
}

impl ExportReport {
    pub fn has_exceptions(&self) -> bool {
        !self.exceptions.is_empty()
    }

    pub fn stats(&self, entity: &str) -> Option<&EntityStats> {
        self.entities.iter().find(|s| s.entity == entity)
    }

    /// Exceptions recorded for `entity`.
    pub fn exceptions_for<'a>(
        &'a self,
        entity: &'a str,
    ) -> impl Iterator<Item = &'a ExportException> {
        self.exceptions.iter().filter(move |e| e.entity() == entity)
    }
}
