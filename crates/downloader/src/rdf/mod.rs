//! RDF data model and text serializations.
//!
//! - [`Term`], [`Literal`], [`Statement`]: values stored in the triple store
//! - [`NTriplesWriter`]: one statement per line
//! - [`TurtleWriter`]: prefixed names, statements grouped by subject

mod ntriples;
mod term;
mod turtle;

pub use ntriples::NTriplesWriter;
pub use term::{escape_literal, xsd, Literal, Statement, Term};
pub use turtle::TurtleWriter;

/// Prefixes registered in every new graph.
pub const DEFAULT_NAMESPACES: &[(&str, &str)] = &[
    ("rdf", "http://www.w3.org/1999/02/22-rdf-syntax-ns#"),
    ("rdfs", "http://www.w3.org/2000/01/rdf-schema#"),
    ("xsd", xsd::NAMESPACE),
    ("owl", "http://www.w3.org/2002/07/owl#"),
    ("foaf", "http://xmlns.com/foaf/0.1/"),
    ("dcat", "http://www.w3.org/ns/dcat#"),
    ("dct", "http://purl.org/dc/terms/"),
    ("molgenis", "http://molgenis.org#"),
];

/// Serialization syntax of a graph file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphSyntax {
    NTriples,
    Turtle,
}

impl GraphSyntax {
    /// Syntax implied by a file extension (`nt` or `ttl`), case-insensitive.
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "nt" => Some(GraphSyntax::NTriples),
            "ttl" => Some(GraphSyntax::Turtle),
            _ => None,
        }
    }
}
