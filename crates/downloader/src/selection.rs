//! Choice of the entities whose data is exported.

use downloader_api::{resolve_key, MetadataRepository, MolgenisVersion};
use std::collections::HashSet;

/// Keys of the entities to stream, in schema order.
///
/// An empty request selects every entity. Abstract entities are never
/// selected; they only matter as superclasses and reference targets.
/// Requested names that match no entity are dropped.
pub fn select_targets(
    requested: &[String],
    metadata: &MetadataRepository,
    version: MolgenisVersion,
) -> Vec<String> {
    let wanted: HashSet<&str> = requested.iter().map(String::as_str).collect();
    let mut seen: HashSet<&str> = HashSet::new();

    metadata
        .entities()
        .iter()
        .filter(|entity| !entity.abstract_class)
        .map(|entity| resolve_key(entity, version))
        .filter(|key| wanted.is_empty() || wanted.contains(key))
        .filter(|key| seen.insert(*key))
        .map(str::to_string)
        .collect()
}

/// Requested names that match no entity of the schema.
pub fn unmatched_requests<'r>(
    requested: &'r [String],
    metadata: &MetadataRepository,
    version: MolgenisVersion,
) -> Vec<&'r str> {
    requested
        .iter()
        .map(String::as_str)
        .filter(|name| metadata.entity_by_key(name, version).is_none())
        .collect()
}
