//! Downloader API
//!
//! Schema model and service contract shared by the export engine and the
//! clients that talk to a MOLGENIS server.
//!
//! - **Schema model**: [`Entity`], [`Attribute`] (arena-addressed compound trees),
//!   [`DataType`], [`Tag`], held by a read-only [`MetadataRepository`]
//! - **Versioning**: [`MolgenisVersion`] and [`resolve_key`], the single place
//!   where version-specific entity identity is decided
//! - **Client contract**: [`MolgenisClient`] delivering schema and lazy row pages
//! - **Errors**: [`ClientError`], [`MetadataError`]
//!
//! # Example
//!
//! ```rust
//! use downloader_api::{Attribute, DataType, Entity, MetadataRepository};
//!
//! let mut repo = MetadataRepository::new();
//! repo.add_entity(Entity::named("Person"));
//! repo.add_attribute("Person", Attribute::new("id").id_attribute()).unwrap();
//! repo.add_attribute("Person", Attribute::of_type("birth", DataType::Date)).unwrap();
//!
//! let person = repo.entity("Person").unwrap();
//! assert_eq!(repo.flatten(person).len(), 2);
//! ```

pub mod client;
pub mod config;
pub mod errors;
pub mod metadata;
pub mod version;

// Re-export commonly used types
pub use client::{EntityPages, MolgenisClient, Page, Row, DEFAULT_PAGE_SIZE};
pub use config::Credentials;
pub use errors::{ClientError, ClientResult, MetadataError, MetadataResult};
pub use metadata::{
    Attribute, AttributeFlags, AttributeId, DataType, Entity, Language, MetadataRepository,
    Package, Tag, IS_ASSOCIATED_WITH,
};
pub use version::{resolve_key, MolgenisVersion};
