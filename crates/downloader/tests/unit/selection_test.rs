//! Entity selection against a schema

use downloader::downloader_api::{Entity, MetadataRepository, MolgenisVersion};
use downloader::select_targets;
use pretty_assertions::assert_eq;

const OLD: MolgenisVersion = MolgenisVersion::new(2, 4, 0);
const NEW: MolgenisVersion = MolgenisVersion::new(7, 0, 0);

fn schema() -> MetadataRepository {
    let mut repo = MetadataRepository::new();
    repo.add_entity(Entity::new("aaaa01", "base_Thing").abstract_class());
    repo.add_entity(Entity::new("aaaa02", "biobank_Sample").extending("aaaa01"));
    repo.add_entity(Entity::new("aaaa03", "biobank_Donor"));
    repo.add_entity(Entity::new("aaaa04", "biobank_Site"));
    repo
}

fn names(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

#[test]
fn test_empty_request_selects_all_concrete_entities() {
    assert_eq!(
        select_targets(&[], &schema(), OLD),
        names(&["biobank_Sample", "biobank_Donor", "biobank_Site"])
    );
}

#[test]
fn test_abstract_entity_is_never_selected() {
    assert!(select_targets(&names(&["base_Thing"]), &schema(), OLD).is_empty());
}

#[test]
fn test_selection_keeps_schema_order_and_drops_duplicates() {
    let requested = names(&["biobank_Site", "biobank_Sample", "biobank_Site"]);
    assert_eq!(
        select_targets(&requested, &schema(), OLD),
        names(&["biobank_Sample", "biobank_Site"])
    );
}

#[test]
fn test_unknown_names_are_dropped() {
    let requested = names(&["Ghost", "biobank_Donor"]);
    assert_eq!(
        select_targets(&requested, &schema(), OLD),
        names(&["biobank_Donor"])
    );
}

#[test]
fn test_version_selects_identity_key() {
    let by_name = names(&["biobank_Donor"]);
    let by_id = names(&["aaaa03"]);

    assert_eq!(select_targets(&by_name, &schema(), OLD), by_name);
    assert!(select_targets(&by_id, &schema(), OLD).is_empty());

    assert_eq!(select_targets(&by_id, &schema(), NEW), by_id);
    assert!(select_targets(&by_name, &schema(), NEW).is_empty());
}
