//! Type-directed row encoding.
//!
//! A row is a map from attribute name to optional text. Both encoders look
//! attributes up through an [`AttributeIndex`], which only holds leaf
//! attributes, so a compound attribute can never be used as a row key.
//!
//! - [`TabularRowEncoder`]: one cell per leaf attribute, text copied verbatim
//! - [`GraphRowEncoder`]: zero or more statements per tagged attribute

mod graph;
mod tabular;

pub use graph::{GraphRowEncoder, RowStatements};
pub use tabular::TabularRowEncoder;

use downloader_api::{Attribute, DataType, Entity, MetadataRepository};
use std::collections::HashMap;
use thiserror::Error;

/// Failure to encode one value. Affects a single statement or row, never the run.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EncodingError {
    /// Text does not parse as the declared type
    #[error("Value '{value}' of attribute '{attribute}' is not a valid {data_type}: {reason}")]
    InvalidValue {
        /// Attribute name
        attribute: String,
        /// Declared type
        data_type: DataType,
        /// Offending text
        value: String,
        /// Parser message
        reason: String,
    },

    /// Type has no graph representation
    #[error("DataType {data_type} of attribute '{attribute}' is not supported")]
    UnsupportedDataType {
        /// Attribute name
        attribute: String,
        /// Declared type
        data_type: DataType,
    },

    /// Tagged entity without an id attribute
    #[error("Entity '{entity}' has no id attribute")]
    MissingIdAttribute {
        /// Entity key
        entity: String,
    },

    /// Row without a value for the id attribute
    #[error("Row of entity '{entity}' has no value for id attribute '{attribute}'")]
    MissingIdValue {
        /// Entity key
        entity: String,
        /// Id attribute name
        attribute: String,
    },

    /// Reference attribute without a target entity
    #[error("Reference attribute '{attribute}' has no reference entity")]
    MissingRefEntity {
        /// Attribute name
        attribute: String,
    },

    /// Value longer than an output cell; the cell was cut to `limit` characters
    #[error("Value of attribute '{attribute}' has {length} characters, truncated to {limit}")]
    CellTooLong {
        /// Attribute name
        attribute: String,
        /// Characters in the value
        length: usize,
        /// Characters kept
        limit: usize,
    },

    /// Sheet has no room left; this and all later rows of the entity were dropped
    #[error("Sheet for entity '{entity}' is full after {rows} rows, remaining rows skipped")]
    SheetFull {
        /// Entity full name
        entity: String,
        /// Data rows written
        rows: u64,
    },
}

/// Leaf attributes of an entity, in declared order, addressable by name.
#[derive(Debug, Clone)]
pub struct AttributeIndex<'a> {
    leaves: Vec<&'a Attribute>,
    by_name: HashMap<&'a str, usize>,
}

impl<'a> AttributeIndex<'a> {
    /// Index the flattened leaves of `entity`, inherited attributes first.
    pub fn new(metadata: &'a MetadataRepository, entity: &'a Entity) -> Self {
        let leaves = metadata.flatten(entity);
        let by_name = leaves
            .iter()
            .enumerate()
            .map(|(position, attribute)| (attribute.name.as_str(), position))
            .collect();
        Self { leaves, by_name }
    }

    pub fn leaves(&self) -> &[&'a Attribute] {
        &self.leaves
    }

    pub fn get(&self, name: &str) -> Option<&'a Attribute> {
        self.by_name.get(name).map(|&position| self.leaves[position])
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }
}
