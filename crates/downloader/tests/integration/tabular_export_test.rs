//! Tabular exports end to end against an in-process client

#[path = "../common/mod.rs"]
mod common;

use common::{person_client, person_schema, row, FakeClient, PASSWORD};
use downloader::downloader_api::{Attribute, Credentials, DataType, Entity, MetadataRepository};
use downloader::metadata_writer::{ATTRIBUTES, ENTITIES};
use downloader::{run, EncodingError, ExportConfig, ExportError, ExportException, Exporter};
use pretty_assertions::assert_eq;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tempfile::TempDir;

fn read_entry(archive: &Path, name: &str) -> String {
    let mut zip = zip::ZipArchive::new(File::open(archive).unwrap()).unwrap();
    let mut entry = zip.by_name(name).unwrap();
    let mut content = String::new();
    entry.read_to_string(&mut content).unwrap();
    content
}

/// Entry names in archive order.
fn entry_names(archive: &Path) -> Vec<String> {
    let mut zip = zip::ZipArchive::new(File::open(archive).unwrap()).unwrap();
    (0..zip.len())
        .map(|i| zip.by_index(i).unwrap().name().to_string())
        .collect()
}

fn tsv_records(content: &str) -> Vec<Vec<String>> {
    csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .from_reader(content.as_bytes())
        .records()
        .map(|r| r.unwrap().iter().map(str::to_string).collect())
        .collect()
}

#[test]
fn test_export_person_to_zip() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("out.zip");
    let mut client = person_client();
    let config = ExportConfig::tabular(&output).with_entities(["Person"]);

    let report = run(&mut client, &Credentials::new("admin", PASSWORD), &config).unwrap();

    assert!(!report.has_exceptions());
    assert_eq!(report.stats("Person").unwrap().rows, 1);
    assert_eq!(entry_names(&output), vec!["Person.tsv".to_string()]);
    assert_eq!(
        tsv_records(&read_entry(&output, "Person.tsv")),
        vec![
            vec!["id", "name", "birth"],
            vec!["1", "Ann", "2000-01-01"],
        ]
    );
    assert!(!client.logged_in);
    assert_eq!(client.logouts, 1);
}

#[test]
fn test_metadata_sheets_precede_data() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("out.zip");
    let client = person_client();
    let config = ExportConfig::tabular(&output)
        .with_entities(["Person"])
        .with_metadata(true);

    Exporter::new(&client).export(&config).unwrap();

    let names = entry_names(&output);
    let entities = names.iter().position(|n| *n == format!("{ENTITIES}.tsv")).unwrap();
    let attributes = names.iter().position(|n| *n == format!("{ATTRIBUTES}.tsv")).unwrap();
    let person = names.iter().position(|n| n == "Person.tsv").unwrap();
    assert!(entities < person);
    assert!(attributes < person);
}

#[test]
fn test_existing_output_is_kept_without_overwrite() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("out.zip");
    std::fs::write(&output, b"keep me").unwrap();
    let client = person_client();

    let err = Exporter::new(&client)
        .export(&ExportConfig::tabular(&output).with_entities(["Person"]))
        .unwrap_err();

    assert!(matches!(err, ExportError::OutputConflict { .. }));
    assert_eq!(std::fs::read(&output).unwrap(), b"keep me");

    let report = Exporter::new(&client)
        .export(
            &ExportConfig::tabular(&output)
                .with_entities(["Person"])
                .with_overwrite(true),
        )
        .unwrap();
    assert_eq!(report.stats("Person").unwrap().rows, 1);
}

#[test]
fn test_workbook_output() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("out.xlsx");
    let client = person_client();

    Exporter::new(&client)
        .export(
            &ExportConfig::tabular(&output)
                .with_entities(["Person"])
                .with_metadata(true),
        )
        .unwrap();

    assert!(entry_names(&output).contains(&"xl/workbook.xml".to_string()));
}

#[test]
fn test_missing_entity_is_reported_and_others_exported() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("out.zip");
    let client = person_client();

    let report = Exporter::new(&client)
        .export(&ExportConfig::tabular(&output).with_entities(["Ghost", "Person"]))
        .unwrap();

    assert_eq!(report.exceptions.len(), 1);
    assert!(matches!(
        &report.exceptions[0],
        ExportException::EntityNotFound { entity, .. } if entity == "Ghost"
    ));
    assert_eq!(report.exceptions[0].to_string(), "entity: Ghost does not exist");
    assert_eq!(report.stats("Person").unwrap().rows, 1);
    assert_eq!(entry_names(&output), vec!["Person.tsv".to_string()]);
}

#[test]
fn test_rejected_credentials_stop_before_output() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("out.zip");
    let mut client = person_client();

    let err = run(
        &mut client,
        &Credentials::new("admin", "wrong"),
        &ExportConfig::tabular(&output),
    )
    .unwrap_err();

    assert!(matches!(err, ExportError::Authentication(_)));
    assert!(!output.exists());
    assert_eq!(client.logouts, 0);
}

#[test]
fn test_incomplete_metadata_stops_before_output() {
    let mut repo = MetadataRepository::new();
    repo.add_entity(Entity::named("Sample"));
    repo.add_attribute("Sample", Attribute::new("id").id_attribute())
        .unwrap();
    repo.add_attribute(
        "Sample",
        Attribute::of_type("site", DataType::Xref).with_ref_entity("Site"),
    )
    .unwrap();
    let client = FakeClient::new(repo);
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("out.zip");

    let err = Exporter::new(&client)
        .export(
            &ExportConfig::tabular(&output)
                .with_entities(["Sample"])
                .with_metadata(true),
        )
        .unwrap_err();

    assert!(matches!(err, ExportError::IncompleteMetadata(_)));
    assert!(!output.exists());
}

#[test]
fn test_rows_are_streamed_in_pages() {
    let rows = (0..5)
        .map(|i| row(&[("id", i.to_string().as_str()), ("name", "n")]))
        .collect();
    let client = FakeClient::new(person_schema()).with_rows("Person", rows);
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("out.zip");

    let report = Exporter::new(&client)
        .export(
            &ExportConfig::tabular(&output)
                .with_entities(["Person"])
                .with_page_size(2),
        )
        .unwrap();

    assert_eq!(report.stats("Person").unwrap().rows, 5);
    assert_eq!(client.page_sizes(), vec![Some(2)]);
    assert_eq!(tsv_records(&read_entry(&output, "Person.tsv")).len(), 6);

    let zero = dir.path().join("zero.zip");
    Exporter::new(&client)
        .export(
            &ExportConfig::tabular(&zero)
                .with_entities(["Person"])
                .with_page_size(0),
        )
        .unwrap();
    assert_eq!(client.page_sizes(), vec![Some(2), None]);
}

#[test]
fn test_oversize_workbook_cell_is_truncated_and_reported() {
    let long_name = "x".repeat(40_000);
    let rows = vec![
        row(&[("id", "1"), ("name", long_name.as_str())]),
        row(&[("id", "2"), ("name", "Bob")]),
    ];
    let client = FakeClient::new(person_schema()).with_rows("Person", rows);
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("out.xlsx");

    let report = Exporter::new(&client)
        .export(&ExportConfig::tabular(&output).with_entities(["Person"]))
        .unwrap();

    assert_eq!(report.exceptions.len(), 1);
    match &report.exceptions[0] {
        ExportException::Encoding { entity, row, source } => {
            assert_eq!(entity, "Person");
            assert_eq!(*row, 0);
            assert_eq!(
                source,
                &EncodingError::CellTooLong {
                    attribute: "name".into(),
                    length: 40_000,
                    limit: 32_767,
                }
            );
        }
        other => panic!("unexpected exception {other:?}"),
    }
    let stats = report.stats("Person").unwrap();
    assert_eq!(stats.rows, 2);
    assert_eq!(stats.units, 2);

    let sheet: String = entry_names(&output)
        .iter()
        .filter(|name| name.starts_with("xl/") && name.ends_with(".xml"))
        .map(|name| read_entry(&output, name))
        .collect();
    assert!(sheet.contains("Bob"));
    assert!(sheet.contains(&"x".repeat(32_767)));
    assert!(!sheet.contains(&"x".repeat(32_768)));
}

#[test]
fn test_entity_named_like_metadata_sheet_gets_own_entry() {
    let mut repo = MetadataRepository::new();
    repo.add_entity(Entity::named("attributes"));
    repo.add_attribute("attributes", Attribute::new("id").id_attribute())
        .unwrap();
    let client = FakeClient::new(repo).with_rows("attributes", vec![row(&[("id", "7")])]);
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("out.zip");

    let report = Exporter::new(&client)
        .export(
            &ExportConfig::tabular(&output)
                .with_entities(["attributes"])
                .with_metadata(true),
        )
        .unwrap();

    assert!(!report.has_exceptions());
    assert_eq!(
        entry_names(&output),
        vec![
            format!("{ENTITIES}.tsv"),
            format!("{ATTRIBUTES}.tsv"),
            "attributes~1.tsv".to_string(),
        ]
    );
    assert_eq!(
        tsv_records(&read_entry(&output, "attributes~1.tsv")),
        vec![vec!["id"], vec!["7"]]
    );
    assert_eq!(tsv_records(&read_entry(&output, "attributes.tsv"))[1][0], "id");
}

#[test]
fn test_corrupt_attribute_tree_skips_entity() {
    let mut json = serde_json::to_value(person_schema()).unwrap();
    json["entities"][0]["attributes"] = serde_json::json!([0, 99]);
    let corrupt: MetadataRepository = serde_json::from_value(json).unwrap();
    let client = FakeClient::new(corrupt).with_rows("Person", vec![common::ann()]);
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("out.zip");

    let report = Exporter::new(&client)
        .export(&ExportConfig::tabular(&output).with_entities(["Person"]))
        .unwrap();

    assert_eq!(report.exceptions.len(), 1);
    assert!(matches!(
        &report.exceptions[0],
        ExportException::Entity { entity, .. } if entity == "Person"
    ));
    assert!(report.stats("Person").is_none());

    let err = Exporter::new(&client)
        .export(
            &ExportConfig::tabular(dir.path().join("meta.zip"))
                .with_entities(["Person"])
                .with_metadata(true),
        )
        .unwrap_err();
    assert!(matches!(err, ExportError::Metadata(_)));
}
