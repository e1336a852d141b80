use super::{AttributeIndex, EncodingError};
use crate::rdf::{Literal, Statement, Term};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use downloader_api::{
    resolve_key, Attribute, DataType, Entity, MetadataRepository, MolgenisVersion, Row,
};
use log::trace;

const MAIL_TO: &str = "mailto:";

/// Statements produced for one row, plus the values that could not be encoded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowStatements {
    pub statements: Vec<Statement>,
    pub errors: Vec<EncodingError>,
}

#[derive(Debug, Clone)]
struct TaggedAttribute {
    name: String,
    data_type: DataType,
    predicates: Vec<String>,
    /// IRI prefix of referenced instances
    ref_base: Option<String>,
}

/// Turns rows of one entity into statements.
///
/// Only attributes tagged `isAssociatedWith` take part; each such tag's
/// object IRI is a predicate. The subject is
/// `<namespace><entity key>/<id value>`, and references point at
/// `<namespace><referenced key>/<value>`.
#[derive(Debug, Clone)]
pub struct GraphRowEncoder {
    entity: String,
    subject_base: String,
    id_attribute: String,
    attributes: Vec<TaggedAttribute>,
}

impl GraphRowEncoder {
    /// # Errors
    ///
    /// Returns [`EncodingError::MissingIdAttribute`] if the entity has tagged
    /// attributes but no id attribute to build subjects from.
    pub fn new(
        metadata: &MetadataRepository,
        entity: &Entity,
        version: MolgenisVersion,
        namespace: &str,
    ) -> Result<Self, EncodingError> {
        let key = resolve_key(entity, version);
        let index = AttributeIndex::new(metadata, entity);

        let attributes: Vec<TaggedAttribute> = index
            .leaves()
            .iter()
            .filter_map(|attribute| tagged(attribute, namespace))
            .collect();

        let id_attribute = match metadata.id_attribute(entity) {
            Some(attribute) => attribute.name.clone(),
            None if attributes.is_empty() => String::new(),
            None => {
                return Err(EncodingError::MissingIdAttribute {
                    entity: key.to_string(),
                })
            }
        };

        Ok(Self {
            entity: key.to_string(),
            subject_base: instance_base(namespace, key),
            id_attribute,
            attributes,
        })
    }

    /// Whether any attribute can produce statements.
    pub fn is_annotated(&self) -> bool {
        !self.attributes.is_empty()
    }

    pub fn encode(&self, row: &Row) -> RowStatements {
        let mut out = RowStatements::default();
        if self.attributes.is_empty() {
            return out;
        }

        let Some(id) = value(row, &self.id_attribute) else {
            out.errors.push(EncodingError::MissingIdValue {
                entity: self.entity.clone(),
                attribute: self.id_attribute.clone(),
            });
            return out;
        };
        let subject = format!("{}{}", self.subject_base, urlencoding::encode(id));

        for attribute in &self.attributes {
            let Some(text) = value(row, &attribute.name) else {
                continue;
            };
            match encode_value(attribute, text) {
                Ok(objects) => {
                    for predicate in &attribute.predicates {
                        for object in &objects {
                            out.statements.push(Statement::new(
                                subject.as_str(),
                                predicate.as_str(),
                                object.clone(),
                            ));
                        }
                    }
                }
                Err(err) => {
                    trace!("Skipping {}.{}: {err}", self.entity, attribute.name);
                    out.errors.push(err);
                }
            }
        }
        out
    }
}

/// Reference targets are already keys under the server's identity rule,
/// so they are used verbatim in instance IRIs.
fn tagged(attribute: &Attribute, namespace: &str) -> Option<TaggedAttribute> {
    let predicates: Vec<String> = attribute
        .associated_tags()
        .map(|tag| tag.object_iri.clone())
        .collect();
    if predicates.is_empty() {
        return None;
    }

    let ref_base = attribute
        .ref_entity
        .as_deref()
        .map(|target| instance_base(namespace, target));

    Some(TaggedAttribute {
        name: attribute.name.clone(),
        data_type: attribute.data_type,
        predicates,
        ref_base,
    })
}

fn instance_base(namespace: &str, key: &str) -> String {
    format!("{namespace}{}/", urlencoding::encode(key))
}

/// Empty text counts as absent.
fn value<'r>(row: &'r Row, name: &str) -> Option<&'r str> {
    row.get(name)
        .and_then(|v| v.as_deref())
        .filter(|v| !v.is_empty())
}

fn encode_value(attribute: &TaggedAttribute, text: &str) -> Result<Vec<Term>, EncodingError> {
    let invalid = |reason: String| EncodingError::InvalidValue {
        attribute: attribute.name.clone(),
        data_type: attribute.data_type,
        value: text.to_string(),
        reason,
    };

    let term: Term = match attribute.data_type {
        DataType::Bool => Literal::boolean(parse_bool(text).ok_or_else(|| {
            invalid("expected true, false, 1 or 0".to_string())
        })?)
        .into(),
        DataType::Date => NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
            .map(Literal::date)
            .map_err(|e| invalid(e.to_string()))?
            .into(),
        DataType::DateTime => Literal::date_time(parse_instant(text).map_err(invalid)?).into(),
        DataType::Decimal => Literal::double(
            text.trim()
                .parse::<f64>()
                .map_err(|e| invalid(e.to_string()))?,
        )
        .into(),
        DataType::Long => Literal::long(
            text.trim()
                .parse::<i64>()
                .map_err(|e| invalid(e.to_string()))?,
        )
        .into(),
        DataType::Int => Literal::int(
            text.trim()
                .parse::<i32>()
                .map_err(|e| invalid(e.to_string()))?,
        )
        .into(),
        DataType::String
        | DataType::Text
        | DataType::Script
        | DataType::Html
        | DataType::Enum => Literal::string(text).into(),
        DataType::Email => {
            let address = text.trim();
            if !address.contains('@') || !is_iri_safe(address) {
                return Err(invalid("not an e-mail address".to_string()));
            }
            Term::iri(format!("{MAIL_TO}{address}"))
        }
        DataType::Hyperlink => {
            let link = text.trim();
            if !has_scheme(link) || !is_iri_safe(link) {
                return Err(invalid("not an absolute IRI".to_string()));
            }
            Term::iri(link)
        }
        DataType::Xref | DataType::Categorical => reference(attribute, text.trim())?,
        DataType::Mref | DataType::CategoricalMref => {
            return text
                .split(',')
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(|id| reference(attribute, id))
                .collect();
        }
        DataType::File | DataType::Compound => {
            return Err(EncodingError::UnsupportedDataType {
                attribute: attribute.name.clone(),
                data_type: attribute.data_type,
            })
        }
    };
    Ok(vec![term])
}

fn reference(attribute: &TaggedAttribute, id: &str) -> Result<Term, EncodingError> {
    let base = attribute
        .ref_base
        .as_deref()
        .ok_or_else(|| EncodingError::MissingRefEntity {
            attribute: attribute.name.clone(),
        })?;
    Ok(Term::iri(format!("{base}{}", urlencoding::encode(id))))
}

fn parse_bool(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

/// RFC 3339 first, then an offset without colon, then a local time read as UTC.
fn parse_instant(text: &str) -> Result<DateTime<Utc>, String> {
    let text = text.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(text) {
        return Ok(instant.with_timezone(&Utc));
    }
    if let Ok(instant) = DateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%z") {
        return Ok(instant.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S")
        .map(|naive| Utc.from_utc_datetime(&naive))
        .map_err(|e| e.to_string())
}

fn has_scheme(iri: &str) -> bool {
    match iri.split_once(':') {
        Some((scheme, rest)) => {
            !rest.is_empty()
                && scheme.starts_with(|c: char| c.is_ascii_alphabetic())
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        None => false,
    }
}

fn is_iri_safe(iri: &str) -> bool {
    !iri.chars().any(|c| {
        c.is_whitespace() || matches!(c, '<' | '>' | '"' | '{' | '}' | '|' | '^' | '`' | '\\')
    })
}
