//! Schema output in EMX layout.
//!
//! The schema is written as sheets before any data:
//!
//! | sheet       | written when            |
//! |-------------|-------------------------|
//! | `packages`  | the schema has packages |
//! | `entities`  | always                  |
//! | `attributes`| always                  |
//! | `tags`      | any tag is used         |
//! | `languages` | languages are declared  |
//!
//! Localized labels and descriptions become `label-<code>` and
//! `description-<code>` columns, codes in sorted order. Output depends only
//! on the schema, so writing the same schema twice gives identical sheets.

use crate::error::Result;
use crate::tabular::{truncate_cells, TabularSink};
use downloader_api::{Attribute, Entity, MetadataRepository, Tag};
use log::{debug, warn};
use std::collections::{BTreeMap, BTreeSet};

pub const PACKAGES: &str = "packages";
pub const ENTITIES: &str = "entities";
pub const ATTRIBUTES: &str = "attributes";
pub const TAGS: &str = "tags";
pub const LANGUAGES: &str = "languages";

const ENTITY_COLUMNS: &[&str] = &[
    "name",
    "package",
    "label",
    "description",
    "abstract",
    "extends",
    "backend",
    "tags",
];

const ATTRIBUTE_COLUMNS: &[&str] = &[
    "name",
    "entity",
    "dataType",
    "refEntity",
    "nillable",
    "idAttribute",
    "description",
    "rangeMin",
    "rangeMax",
    "lookupAttribute",
    "label",
    "aggregateable",
    "labelAttribute",
    "readOnly",
    "tags",
    "validationExpression",
    "visible",
    "defaultValue",
    "partOfAttribute",
    "expression",
    "enumOptions",
    "auto",
    "unique",
    "visibleExpression",
    "orderBy",
    "mappedBy",
];

/// Write the schema sheets to `sink`.
pub fn write_metadata(sink: &mut dyn TabularSink, metadata: &MetadataRepository) -> Result<()> {
    if !metadata.packages().is_empty() {
        write_packages(sink, metadata)?;
    }
    write_entities(sink, metadata)?;
    write_attributes(sink, metadata)?;

    let tags = metadata.tags();
    if !tags.is_empty() {
        write_tags(sink, &tags)?;
    }
    if !metadata.languages().is_empty() {
        write_languages(sink, metadata)?;
    }
    debug!(
        "Wrote metadata for {} entities and {} tags",
        metadata.len(),
        tags.len()
    );
    Ok(())
}

fn write_packages(sink: &mut dyn TabularSink, metadata: &MetadataRepository) -> Result<()> {
    sink.start_sheet(
        PACKAGES,
        &header(&["name", "label", "description", "parent", "tags"], &[]),
    )?;
    for package in metadata.packages() {
        write_row(sink, &[
            package.id.clone(),
            text(&package.label),
            text(&package.description),
            text(&package.parent),
            tag_ids(&package.tags),
        ])?;
    }
    Ok(())
}

fn write_entities(sink: &mut dyn TabularSink, metadata: &MetadataRepository) -> Result<()> {
    let codes = language_codes(
        metadata,
        metadata
            .entities()
            .iter()
            .flat_map(|e| e.labels.keys().chain(e.descriptions.keys())),
    );
    sink.start_sheet(ENTITIES, &header(ENTITY_COLUMNS, &codes))?;

    for entity in metadata.entities() {
        let name = if entity.package.is_some() {
            entity.name.clone()
        } else {
            entity.full_name.clone()
        };
        let mut row = vec![
            name,
            text(&entity.package),
            text(&entity.label),
            text(&entity.description),
            flag(entity.abstract_class),
            entity
                .extends
                .as_deref()
                .map(|key| full_name(metadata, key))
                .unwrap_or_default(),
            text(&entity.backend),
            tag_ids(&entity.tags),
        ];
        row.extend(localized(&codes, &entity.labels, &entity.descriptions));
        write_row(sink, &row)?;
    }
    Ok(())
}

fn write_attributes(sink: &mut dyn TabularSink, metadata: &MetadataRepository) -> Result<()> {
    let declared: Vec<(&Entity, Vec<&Attribute>)> = metadata
        .entities()
        .iter()
        .map(|entity| (entity, metadata.declared_attributes(entity)))
        .collect();
    let codes = language_codes(
        metadata,
        declared
            .iter()
            .flat_map(|(_, attributes)| attributes.iter())
            .flat_map(|a| a.labels.keys().chain(a.descriptions.keys())),
    );
    sink.start_sheet(ATTRIBUTES, &header(ATTRIBUTE_COLUMNS, &codes))?;

    for (entity, attributes) in &declared {
        for attribute in attributes {
            let mut row = attribute_row(metadata, entity, attribute);
            row.extend(localized(&codes, &attribute.labels, &attribute.descriptions));
            write_row(sink, &row)?;
        }
    }
    Ok(())
}

fn attribute_row(
    metadata: &MetadataRepository,
    entity: &Entity,
    attribute: &Attribute,
) -> Vec<String> {
    let flags = &attribute.flags;
    let part_of = attribute
        .compound()
        .and_then(|id| metadata.get_attribute(id))
        .map(|parent| parent.name.clone())
        .unwrap_or_default();

    vec![
        attribute.name.clone(),
        entity.full_name.clone(),
        attribute.data_type.emx_name().to_string(),
        attribute
            .ref_entity
            .as_deref()
            .map(|key| full_name(metadata, key))
            .unwrap_or_default(),
        flag(flags.nillable),
        flag(flags.id_attribute),
        text(&attribute.description),
        number(attribute.range_min),
        number(attribute.range_max),
        flag(flags.lookup_attribute),
        text(&attribute.label),
        flag(flags.aggregateable),
        flag(flags.label_attribute),
        flag(flags.read_only),
        tag_ids(&attribute.tags),
        text(&attribute.validation_expression),
        flag(flags.visible),
        text(&attribute.default_value),
        part_of,
        text(&attribute.expression),
        text(&attribute.enum_options),
        flag(flags.auto),
        flag(flags.unique),
        text(&attribute.visible_expression),
        text(&attribute.order_by),
        text(&attribute.mapped_by),
    ]
}

fn write_tags(sink: &mut dyn TabularSink, tags: &[&Tag]) -> Result<()> {
    sink.start_sheet(
        TAGS,
        &header(
            &[
                "identifier",
                "label",
                "objectIRI",
                "relationLabel",
                "relationIRI",
                "codeSystem",
            ],
            &[],
        ),
    )?;
    for tag in tags {
        write_row(sink, &[
            tag.id.clone(),
            text(&tag.label),
            tag.object_iri.clone(),
            text(&tag.relation_label),
            tag.relation_iri.clone(),
            text(&tag.code_system),
        ])?;
    }
    Ok(())
}

fn write_languages(sink: &mut dyn TabularSink, metadata: &MetadataRepository) -> Result<()> {
    sink.start_sheet(LANGUAGES, &header(&["code", "name"], &[]))?;
    for language in metadata.languages() {
        write_row(sink, &[language.code.clone(), language.name.clone()])?;
    }
    Ok(())
}

/// Write `row`, cutting cells that exceed the sink's cell limit.
fn write_row(sink: &mut dyn TabularSink, row: &[String]) -> Result<()> {
    if let Some(max) = sink.limits().max_cell_chars {
        if row.iter().any(|cell| cell.chars().count() > max) {
            let mut row = row.to_vec();
            for (column, length) in truncate_cells(&mut row, max) {
                warn!("Metadata cell in column {column} cut from {length} to {max} characters");
            }
            return sink.write_row(&row);
        }
    }
    sink.write_row(row)
}

/// Declared language codes plus any code used by a localized value.
fn language_codes<'a>(
    metadata: &MetadataRepository,
    used: impl Iterator<Item = &'a String>,
) -> Vec<String> {
    let mut codes: BTreeSet<String> = metadata
        .languages()
        .iter()
        .map(|l| l.code.clone())
        .collect();
    codes.extend(used.cloned());
    codes.into_iter().collect()
}

fn header(columns: &[&str], codes: &[String]) -> Vec<String> {
    let mut header: Vec<String> = columns.iter().map(|c| c.to_string()).collect();
    header.extend(codes.iter().map(|code| format!("label-{code}")));
    header.extend(codes.iter().map(|code| format!("description-{code}")));
    header
}

fn localized(
    codes: &[String],
    labels: &BTreeMap<String, String>,
    descriptions: &BTreeMap<String, String>,
) -> Vec<String> {
    codes
        .iter()
        .map(|code| labels.get(code).cloned().unwrap_or_default())
        .chain(
            codes
                .iter()
                .map(|code| descriptions.get(code).cloned().unwrap_or_default()),
        )
        .collect()
}

fn full_name(metadata: &MetadataRepository, key: &str) -> String {
    metadata
        .entity(key)
        .map_or_else(|| key.to_string(), |entity| entity.full_name.clone())
}

fn text(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

fn number(value: Option<i64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn flag(value: bool) -> String {
    let text = if value { "TRUE" } else { "FALSE" };
    text.to_string()
}

fn tag_ids(tags: &[Tag]) -> String {
    tags.iter()
        .map(|t| t.id.as_str())
        .collect::<Vec<_>>()
        .join(",")
}
