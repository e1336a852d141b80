//! Row encoding for tabular and graph output

#[path = "../common/mod.rs"]
mod common;

use common::{ann, person_schema, row, BIRTH_IRI};
use downloader::downloader_api::{
    Attribute, DataType, Entity, MetadataRepository, MolgenisVersion, Tag,
};
use downloader::encode::{AttributeIndex, GraphRowEncoder, TabularRowEncoder};
use downloader::rdf::{xsd, Literal, Statement, Term};
use downloader::{EncodingError, DEFAULT_NAMESPACE};
use pretty_assertions::assert_eq;

const V7: MolgenisVersion = MolgenisVersion::new(7, 0, 0);

fn flags_schema() -> MetadataRepository {
    let mut repo = MetadataRepository::new();
    repo.add_entity(Entity::named("City"));
    repo.add_attribute("City", Attribute::new("id").id_attribute())
        .unwrap();
    repo.add_entity(Entity::named("Sample"));
    repo.add_attribute("Sample", Attribute::new("id").id_attribute())
        .unwrap();
    repo.add_attribute(
        "Sample",
        Attribute::of_type("active", DataType::Bool)
            .with_tag(Tag::associated_with("active", "http://ex/active")),
    )
    .unwrap();
    repo.add_attribute(
        "Sample",
        Attribute::of_type("cities", DataType::Mref)
            .with_ref_entity("City")
            .with_tag(Tag::associated_with("cities", "http://ex/city")),
    )
    .unwrap();
    repo.add_attribute("Sample", Attribute::of_type("note", DataType::Text))
        .unwrap();
    repo
}

fn sample_encoder(repo: &MetadataRepository) -> GraphRowEncoder {
    let sample = repo.entity("Sample").unwrap();
    GraphRowEncoder::new(repo, sample, V7, DEFAULT_NAMESPACE).unwrap()
}

#[test]
fn test_bool_value_gives_one_typed_statement() {
    let repo = flags_schema();
    let encoded = sample_encoder(&repo).encode(&row(&[("id", "s1"), ("active", "true")]));

    assert!(encoded.errors.is_empty());
    assert_eq!(
        encoded.statements,
        vec![Statement::new(
            "http://molgenis.org/entities/Sample/s1",
            "http://ex/active",
            Literal::typed("true", xsd::BOOLEAN),
        )]
    );
}

#[test]
fn test_mref_value_gives_one_statement_per_reference_in_order() {
    let repo = flags_schema();
    let encoded = sample_encoder(&repo).encode(&row(&[("id", "s1"), ("cities", "1,2,3")]));

    let objects: Vec<Term> = encoded.statements.into_iter().map(|s| s.object).collect();
    assert_eq!(
        objects,
        vec![
            Term::iri("http://molgenis.org/entities/City/1"),
            Term::iri("http://molgenis.org/entities/City/2"),
            Term::iri("http://molgenis.org/entities/City/3"),
        ]
    );
}

#[test]
fn test_untagged_entity_gives_no_statements() {
    let mut repo = MetadataRepository::new();
    repo.add_entity(Entity::named("Plain"));
    repo.add_attribute("Plain", Attribute::new("note")).unwrap();
    let plain = repo.entity("Plain").unwrap();

    let encoder = GraphRowEncoder::new(&repo, plain, V7, DEFAULT_NAMESPACE).unwrap();
    assert!(!encoder.is_annotated());
    let encoded = encoder.encode(&row(&[("note", "anything")]));
    assert!(encoded.statements.is_empty());
    assert!(encoded.errors.is_empty());
}

#[test]
fn test_invalid_value_skips_only_that_statement() {
    let repo = flags_schema();
    let encoded = sample_encoder(&repo).encode(&row(&[
        ("id", "s1"),
        ("active", "maybe"),
        ("cities", "7"),
    ]));

    assert_eq!(
        encoded.statements,
        vec![Statement::new(
            "http://molgenis.org/entities/Sample/s1",
            "http://ex/city",
            Term::iri("http://molgenis.org/entities/City/7"),
        )]
    );
    assert_eq!(encoded.errors.len(), 1);
    assert!(matches!(
        &encoded.errors[0],
        EncodingError::InvalidValue { attribute, data_type: DataType::Bool, .. } if attribute == "active"
    ));
}

#[test]
fn test_missing_id_value_is_reported() {
    let repo = person_schema();
    let person = repo.entity("Person").unwrap();
    let encoder = GraphRowEncoder::new(&repo, person, V7, DEFAULT_NAMESPACE).unwrap();

    let encoded = encoder.encode(&row(&[("id", ""), ("birth", "2000-01-01")]));
    assert!(encoded.statements.is_empty());
    assert!(matches!(
        encoded.errors.as_slice(),
        [EncodingError::MissingIdValue { .. }]
    ));
}

#[test]
fn test_date_literal() {
    let repo = person_schema();
    let person = repo.entity("Person").unwrap();
    let encoder = GraphRowEncoder::new(&repo, person, V7, DEFAULT_NAMESPACE).unwrap();

    let encoded = encoder.encode(&ann());
    assert_eq!(encoded.statements.len(), 1);
    assert_eq!(encoded.statements[0].predicate, BIRTH_IRI);
    assert_eq!(
        encoded.statements[0].to_string(),
        "<http://molgenis.org/entities/Person/1> <http://ex/birth> \"2000-01-01\"^^<http://www.w3.org/2001/XMLSchema#date> ."
    );
}

#[test]
fn test_tabular_cells_match_header() {
    let repo = flags_schema();
    let sample = repo.entity("Sample").unwrap();
    let encoder = TabularRowEncoder::new(&AttributeIndex::new(&repo, sample));

    assert_eq!(encoder.header(), ["id", "active", "cities", "note"]);

    let mut input = row(&[("id", "s1"), ("cities", "1,2"), ("note", "a\tb")]);
    input.insert("active".to_string(), None);
    assert_eq!(encoder.encode(&input), vec!["s1", "", "1,2", "a\tb"]);
}
