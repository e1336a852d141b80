//! In-memory schema model.
//!
//! - [`Entity`]: a dataset type with ordered attributes and optional superclass
//! - [`Attribute`]: a field definition; compound attributes nest children
//! - [`DataType`]: closed set of attribute types
//! - [`Tag`], [`Package`], [`Language`]: annotations and grouping
//! - [`MetadataRepository`]: the arena holding all of the above

mod attribute;
mod data_type;
mod entity;
mod repository;
mod tag;

pub use attribute::{Attribute, AttributeFlags, AttributeId};
pub use data_type::DataType;
pub use entity::Entity;
pub use repository::MetadataRepository;
pub use tag::{Language, Package, Tag, IS_ASSOCIATED_WITH};
