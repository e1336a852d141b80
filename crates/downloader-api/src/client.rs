//! Contract of the remote data service.

use crate::config::Credentials;
use crate::errors::ClientResult;
use crate::metadata::MetadataRepository;
use crate::version::MolgenisVersion;
use std::collections::BTreeMap;

/// One data row: attribute name to textual value, `None` for null.
pub type Row = BTreeMap<String, Option<String>>;

/// One page of rows as delivered by the server.
pub type Page = Vec<Row>;

/// Lazy, finite, forward-only sequence of pages for one entity.
///
/// Each call to `next` may block on the network; an `Err` item ends the
/// sequence for that entity.
pub type EntityPages<'a> = Box<dyn Iterator<Item = ClientResult<Page>> + 'a>;

/// Page size used when the caller does not request one.
pub const DEFAULT_PAGE_SIZE: usize = 1000;

/// Client of the remote data-management service.
///
/// Implementations own authentication, pagination and retries; the export
/// engine only pulls pages and schema through this trait.
pub trait MolgenisClient {
    /// Authenticate the session.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Authentication`](crate::ClientError::Authentication)
    /// for rejected credentials.
    fn login(&mut self, credentials: &Credentials) -> ClientResult<()>;

    /// End the session. Returns `false` if there was no session to end.
    fn logout(&mut self) -> ClientResult<bool>;

    /// Version of the server.
    fn get_version(&self) -> ClientResult<MolgenisVersion>;

    /// Complete schema of the server, keyed under `version`
    /// (see [`MetadataRepository::for_version`]).
    fn get_metadata(&self, version: MolgenisVersion) -> ClientResult<MetadataRepository>;

    /// Schema restricted to `entities` and their dependencies.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError::IncompleteMetadata`](crate::MetadataError::IncompleteMetadata)
    /// if a referenced entity is not available.
    fn get_filtered_metadata(
        &self,
        version: MolgenisVersion,
        entities: &[String],
    ) -> ClientResult<MetadataRepository> {
        let metadata = self.get_metadata(version)?;
        Ok(metadata.filtered(entities, version)?)
    }

    /// Schema slice describing a single entity. The slice contains at least
    /// the entity itself and its superclasses.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotFound`](crate::ClientError::NotFound) if the
    /// entity does not exist.
    fn get_entity(&self, name: &str) -> ClientResult<MetadataRepository>;

    /// Open the row stream of an entity. `None` selects the server default page size.
    fn stream_entity_data(
        &self,
        name: &str,
        page_size: Option<usize>,
    ) -> ClientResult<EntityPages<'_>>;
}
