//! Graph exports end to end against an in-process client

#[path = "../common/mod.rs"]
mod common;

use common::{ann, person_client, person_schema, row, FakeClient, BIRTH_IRI};
use downloader::downloader_api::{
    Attribute, DataType, Entity, MetadataRepository, MolgenisVersion, Tag,
};
use downloader::{ExportConfig, ExportException, Exporter, TripleStore};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

#[test]
fn test_ntriples_output() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("out.nt");
    let client = person_client();

    let report = Exporter::new(&client)
        .export(&ExportConfig::graph(&output).with_entities(["Person"]))
        .unwrap();

    assert!(!report.has_exceptions());
    assert_eq!(report.stats("Person").unwrap().units, 1);
    assert_eq!(
        std::fs::read_to_string(&output).unwrap(),
        concat!(
            "<http://molgenis.org/entities/Person/1> <http://ex/birth> ",
            "\"2000-01-01\"^^<http://www.w3.org/2001/XMLSchema#date> .\n",
        )
    );
}

#[test]
fn test_turtle_output_declares_prefixes() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("out.ttl");
    let client = person_client();

    Exporter::new(&client)
        .export(
            &ExportConfig::graph(&output)
                .with_entities(["Person"])
                .with_namespace("http://example.org/data/"),
        )
        .unwrap();

    let turtle = std::fs::read_to_string(&output).unwrap();
    assert!(turtle.contains("@prefix data: <http://example.org/data/> ."));
    assert!(turtle.contains("@prefix xsd: <http://www.w3.org/2001/XMLSchema#> ."));
    assert!(turtle.contains("\"2000-01-01\"^^xsd:date"));
    assert!(turtle.trim_end().ends_with('.'));
}

#[test]
fn test_store_directory_output() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("store");
    let client = person_client();

    Exporter::new(&client)
        .export(&ExportConfig::graph(&output).with_entities(["Person"]))
        .unwrap();

    let store = TripleStore::open(&output).unwrap();
    assert_eq!(store.len(), 1);
    let birth = store
        .statements_matching(None, Some(BIRTH_IRI), None)
        .unwrap();
    assert_eq!(birth.len(), 1);
    assert_eq!(
        birth[0].subject,
        "http://molgenis.org/entities/Person/1".to_string()
    );
}

#[test]
fn test_bad_value_is_recorded_with_row_number() {
    let client = FakeClient::new(person_schema()).with_rows(
        "Person",
        vec![
            row(&[("id", "1"), ("birth", "2000-01-01")]),
            row(&[("id", "2"), ("birth", "not a date")]),
        ],
    );
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("out.nt");

    let report = Exporter::new(&client)
        .export(&ExportConfig::graph(&output).with_entities(["Person"]))
        .unwrap();

    assert_eq!(report.stats("Person").unwrap().rows, 2);
    assert_eq!(report.stats("Person").unwrap().units, 1);
    assert_eq!(report.exceptions.len(), 1);
    assert!(matches!(
        &report.exceptions[0],
        ExportException::Encoding { entity, row: 1, .. } if entity == "Person"
    ));
}

#[test]
fn test_identity_key_follows_server_version() {
    let mut schema = MetadataRepository::new();
    schema.add_entity(Entity::new("aaaa01", "Person"));
    schema
        .add_attribute("aaaa01", Attribute::new("id").id_attribute())
        .unwrap();
    schema
        .add_attribute(
            "aaaa01",
            Attribute::of_type("birth", DataType::Date)
                .with_tag(Tag::associated_with("birth-tag", BIRTH_IRI)),
        )
        .unwrap();
    let mut client = FakeClient::new(schema).with_rows("aaaa01", vec![ann()]);
    client.version = MolgenisVersion::new(8, 0, 0);
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("out.nt");

    let report = Exporter::new(&client)
        .export(&ExportConfig::graph(&output).with_entities(["aaaa01"]))
        .unwrap();

    assert_eq!(report.stats("aaaa01").unwrap().units, 1);
    let ntriples = std::fs::read_to_string(&output).unwrap();
    assert!(ntriples.starts_with("<http://molgenis.org/entities/aaaa01/1> "));
}
