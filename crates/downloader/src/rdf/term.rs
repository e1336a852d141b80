//! RDF terms and statements.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// XML Schema datatype IRIs.
pub mod xsd {
    pub const NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema#";
    pub const STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
    pub const BOOLEAN: &str = "http://www.w3.org/2001/XMLSchema#boolean";
    pub const DATE: &str = "http://www.w3.org/2001/XMLSchema#date";
    pub const DATE_TIME: &str = "http://www.w3.org/2001/XMLSchema#dateTime";
    pub const DOUBLE: &str = "http://www.w3.org/2001/XMLSchema#double";
    pub const LONG: &str = "http://www.w3.org/2001/XMLSchema#long";
    pub const INT: &str = "http://www.w3.org/2001/XMLSchema#int";
}

/// Typed or language-tagged literal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Literal {
    /// Lexical form
    pub lexical: String,
    /// Datatype IRI
    pub datatype: String,
    /// Language tag, only for `rdf:langString`
    pub language: Option<String>,
}

impl Literal {
    pub fn typed(lexical: impl Into<String>, datatype: impl Into<String>) -> Self {
        Self {
            lexical: lexical.into(),
            datatype: datatype.into(),
            language: None,
        }
    }

    /// `xsd:string` literal.
    pub fn string(value: impl Into<String>) -> Self {
        Self::typed(value, xsd::STRING)
    }

    pub fn lang_string(value: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            lexical: value.into(),
            datatype: "http://www.w3.org/1999/02/22-rdf-syntax-ns#langString".to_string(),
            language: Some(language.into()),
        }
    }

    pub fn boolean(value: bool) -> Self {
        Self::typed(value.to_string(), xsd::BOOLEAN)
    }

    pub fn date(value: NaiveDate) -> Self {
        Self::typed(value.format("%Y-%m-%d").to_string(), xsd::DATE)
    }

    /// Instant in UTC, e.g. `2000-01-01T10:00:00Z`.
    pub fn date_time(value: DateTime<Utc>) -> Self {
        Self::typed(value.to_rfc3339_opts(SecondsFormat::AutoSi, true), xsd::DATE_TIME)
    }

    pub fn double(value: f64) -> Self {
        let lexical = if value.is_nan() {
            "NaN".to_string()
        } else if value.is_infinite() {
            let sign = if value > 0.0 { "" } else { "-" };
            format!("{sign}INF")
        } else {
            value.to_string()
        };
        Self::typed(lexical, xsd::DOUBLE)
    }

    pub fn long(value: i64) -> Self {
        Self::typed(value.to_string(), xsd::LONG)
    }

    pub fn int(value: i32) -> Self {
        Self::typed(value.to_string(), xsd::INT)
    }

    /// Plain strings print without a datatype.
    pub fn is_plain(&self) -> bool {
        self.language.is_none() && self.datatype == xsd::STRING
    }
}

/// Node in a statement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Term {
    Iri(String),
    Literal(Literal),
}

impl Term {
    pub fn iri(value: impl Into<String>) -> Self {
        Term::Iri(value.into())
    }

    pub fn as_iri(&self) -> Option<&str> {
        match self {
            Term::Iri(iri) => Some(iri),
            Term::Literal(_) => None,
        }
    }
}

impl From<Literal> for Term {
    fn from(literal: Literal) -> Self {
        Term::Literal(literal)
    }
}

/// N-Triples rendering.
impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Iri(iri) => write!(f, "<{}>", escape_iri(iri)),
            Term::Literal(literal) => {
                write!(f, "\"{}\"", escape_literal(&literal.lexical))?;
                if let Some(language) = &literal.language {
                    write!(f, "@{language}")
                } else if literal.is_plain() {
                    Ok(())
                } else {
                    write!(f, "^^<{}>", escape_iri(&literal.datatype))
                }
            }
        }
    }
}

/// One triple, optionally in a named graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Statement {
    /// Subject IRI
    pub subject: String,
    /// Predicate IRI
    pub predicate: String,
    /// Object term
    pub object: Term,
    /// Named graph, `None` for the default graph
    pub context: Option<String>,
}

impl Statement {
    pub fn new(
        subject: impl Into<String>,
        predicate: impl Into<String>,
        object: impl Into<Term>,
    ) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
            context: None,
        }
    }

    pub fn in_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

/// Statement as one N-Triples line, without the trailing newline.
impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} .",
            Term::Iri(self.subject.clone()),
            Term::Iri(self.predicate.clone()),
            self.object
        )
    }
}

/// Escape a literal's lexical form for N-Triples and Turtle.
pub fn escape_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out
}

fn escape_iri(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '<' | '>' | '"' | '{' | '}' | '|' | '^' | '`' | '\\' => {
                out.push_str(&format!("\\u{:04X}", c as u32))
            }
            c if (c as u32) <= 0x20 => out.push_str(&format!("\\u{:04X}", c as u32)),
            _ => out.push(c),
        }
    }
    out
}
