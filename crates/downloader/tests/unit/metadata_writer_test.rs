//! EMX metadata sheets

use downloader::downloader_api::{
    Attribute, DataType, Entity, Language, MetadataRepository, Package, Tag,
};
use downloader::metadata_writer::{write_metadata, ATTRIBUTES, ENTITIES, PACKAGES, TAGS};
use downloader::tabular::{MemoryTables, Sheet};
use pretty_assertions::assert_eq;

fn schema() -> MetadataRepository {
    let mut repo = MetadataRepository::new();
    repo.add_package(Package::new("biobank"));
    repo.add_language(Language::new("nl", "Nederlands"));
    repo.add_entity(
        Entity::named("biobank_Sample")
            .with_name("Sample")
            .with_package("biobank")
            .with_label_in("nl", "Monster"),
    );
    repo.add_attribute("biobank_Sample", Attribute::new("id").id_attribute())
        .unwrap();
    repo.add_attribute(
        "biobank_Sample",
        Attribute::of_type("collected", DataType::Date)
            .with_tag(Tag::associated_with("collected", "http://ex/collected")),
    )
    .unwrap();
    repo
}

fn render(repo: &MetadataRepository) -> Vec<Sheet> {
    let tables = MemoryTables::new();
    let mut sink = tables.clone();
    write_metadata(&mut sink, repo).unwrap();
    tables.sheets()
}

#[test]
fn test_metadata_is_written_identically_twice() {
    let repo = schema();
    assert_eq!(render(&repo), render(&repo));
}

#[test]
fn test_metadata_sheets() {
    let sheets = render(&schema());
    let names: Vec<&str> = sheets.iter().map(|s| s.name.as_str()).collect();
    for expected in [PACKAGES, ENTITIES, ATTRIBUTES, TAGS] {
        assert!(names.contains(&expected), "missing sheet {expected}");
    }

    let attributes = sheets.iter().find(|s| s.name == ATTRIBUTES).unwrap();
    assert_eq!(attributes.rows.len(), 2);

    let entities = sheets.iter().find(|s| s.name == ENTITIES).unwrap();
    assert!(entities.header.contains(&"label-nl".to_string()));
}
