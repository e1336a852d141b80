#![allow(dead_code)]

use downloader::downloader_api::{
    resolve_key, Attribute, ClientError, ClientResult, Credentials, DataType, Entity, EntityPages,
    MetadataRepository, MolgenisClient, MolgenisVersion, Row, Tag, DEFAULT_PAGE_SIZE,
};
use std::cell::Cell;
use std::collections::BTreeMap;

pub const PASSWORD: &str = "admin";
pub const BIRTH_IRI: &str = "http://ex/birth";

/// In-process stand-in for a MOLGENIS server.
pub struct FakeClient {
    pub metadata: MetadataRepository,
    pub version: MolgenisVersion,
    pub data: BTreeMap<String, Vec<Row>>,
    pub logged_in: bool,
    pub logouts: u32,
    pub requested_page_sizes: Cell<Vec<Option<usize>>>,
}

impl FakeClient {
    pub fn new(metadata: MetadataRepository) -> Self {
        Self {
            metadata,
            version: MolgenisVersion::new(7, 0, 0),
            data: BTreeMap::new(),
            logged_in: false,
            logouts: 0,
            requested_page_sizes: Cell::new(Vec::new()),
        }
    }

    pub fn with_rows(mut self, entity: &str, rows: Vec<Row>) -> Self {
        self.data.insert(entity.to_string(), rows);
        self
    }

    pub fn page_sizes(&self) -> Vec<Option<usize>> {
        let sizes = self.requested_page_sizes.take();
        self.requested_page_sizes.set(sizes.clone());
        sizes
    }
}

impl MolgenisClient for FakeClient {
    fn login(&mut self, credentials: &Credentials) -> ClientResult<()> {
        if credentials.password != PASSWORD {
            return Err(ClientError::Authentication(format!(
                "invalid password for {}",
                credentials.username
            )));
        }
        self.logged_in = true;
        Ok(())
    }

    fn logout(&mut self) -> ClientResult<bool> {
        let was = self.logged_in;
        self.logged_in = false;
        self.logouts += 1;
        Ok(was)
    }

    fn get_version(&self) -> ClientResult<MolgenisVersion> {
        Ok(self.version)
    }

    fn get_metadata(&self, version: MolgenisVersion) -> ClientResult<MetadataRepository> {
        Ok(self.metadata.clone().with_version(version))
    }

    fn get_entity(&self, name: &str) -> ClientResult<MetadataRepository> {
        let metadata = self.metadata.clone().with_version(self.version);
        let entity = metadata
            .entity(name)
            .ok_or_else(|| ClientError::NotFound(name.to_string()))?;
        let lineage: Vec<String> = metadata
            .lineage(entity)
            .iter()
            .map(|e| resolve_key(e, self.version).to_string())
            .collect();
        Ok(metadata.filtered(&lineage, self.version)?)
    }

    fn stream_entity_data(
        &self,
        name: &str,
        page_size: Option<usize>,
    ) -> ClientResult<EntityPages<'_>> {
        let mut sizes = self.requested_page_sizes.take();
        sizes.push(page_size);
        self.requested_page_sizes.set(sizes);

        if self.metadata.entity_by_key(name, self.version).is_none() {
            return Err(ClientError::NotFound(name.to_string()));
        }
        let rows = self.data.get(name).cloned().unwrap_or_default();
        let size = page_size.unwrap_or(DEFAULT_PAGE_SIZE).max(1);
        let pages: Vec<ClientResult<Vec<Row>>> =
            rows.chunks(size).map(|chunk| Ok(chunk.to_vec())).collect();
        Ok(Box::new(pages.into_iter()))
    }
}

pub fn row(values: &[(&str, &str)]) -> Row {
    values
        .iter()
        .map(|(k, v)| (k.to_string(), Some(v.to_string())))
        .collect()
}

/// `Person(id, name, birth)`, with only `birth` tagged for graph output.
pub fn person_schema() -> MetadataRepository {
    let mut repo = MetadataRepository::new();
    repo.add_entity(Entity::named("Person").with_label("Person"));
    repo.add_attribute("Person", Attribute::new("id").id_attribute())
        .unwrap();
    repo.add_attribute(
        "Person",
        Attribute::of_type("name", DataType::String),
    )
    .unwrap();
    repo.add_attribute(
        "Person",
        Attribute::of_type("birth", DataType::Date)
            .with_tag(Tag::associated_with("birth-tag", BIRTH_IRI)),
    )
    .unwrap();
    repo
}

pub fn ann() -> Row {
    row(&[("id", "1"), ("name", "Ann"), ("birth", "2000-01-01")])
}

pub fn person_client() -> FakeClient {
    FakeClient::new(person_schema()).with_rows("Person", vec![ann()])
}
