use super::{escape_literal, xsd, Literal, Statement, Term};
use crate::error::{ExportError, Result};
use std::io::Write;

/// Streams statements as Turtle.
///
/// Consecutive statements about the same subject share one block. IRIs
/// under a registered namespace are shortened when the local part is a
/// plain name.
pub struct TurtleWriter<W: Write> {
    out: W,
    prefixes: Vec<(String, String)>,
    subject: Option<String>,
}

impl<W: Write> TurtleWriter<W> {
    /// Write the `@prefix` header and return a writer ready for statements.
    pub fn new(mut out: W, prefixes: Vec<(String, String)>) -> Result<Self> {
        for (prefix, namespace) in &prefixes {
            writeln!(out, "@prefix {prefix}: <{namespace}> .").map_err(io_error)?;
        }
        if !prefixes.is_empty() {
            writeln!(out).map_err(io_error)?;
        }
        Ok(Self {
            out,
            prefixes,
            subject: None,
        })
    }

    pub fn write(&mut self, statement: &Statement) -> Result<()> {
        let predicate = self.iri(&statement.predicate);
        let object = self.term(&statement.object);

        if self.subject.as_deref() == Some(statement.subject.as_str()) {
            write!(self.out, " ;\n    {predicate} {object}").map_err(io_error)?;
            return Ok(());
        }

        if self.subject.is_some() {
            write!(self.out, " .\n\n").map_err(io_error)?;
        }
        let subject = self.iri(&statement.subject);
        write!(self.out, "{subject} {predicate} {object}").map_err(io_error)?;
        self.subject = Some(statement.subject.clone());
        Ok(())
    }

    /// Close the open block, flush and hand back the underlying writer.
    pub fn finish(mut self) -> Result<W> {
        if self.subject.is_some() {
            writeln!(self.out, " .").map_err(io_error)?;
        }
        self.out.flush().map_err(io_error)?;
        Ok(self.out)
    }

    fn iri(&self, iri: &str) -> String {
        self.compact(iri)
            .unwrap_or_else(|| Term::Iri(iri.to_string()).to_string())
    }

    fn term(&self, term: &Term) -> String {
        match term {
            Term::Iri(iri) => self.iri(iri),
            Term::Literal(literal) => self.literal(literal),
        }
    }

    fn literal(&self, literal: &Literal) -> String {
        let quoted = format!("\"{}\"", escape_literal(&literal.lexical));
        if let Some(language) = &literal.language {
            format!("{quoted}@{language}")
        } else if literal.datatype == xsd::STRING {
            quoted
        } else {
            format!("{quoted}^^{}", self.iri(&literal.datatype))
        }
    }

    /// Longest matching namespace wins.
    fn compact(&self, iri: &str) -> Option<String> {
        self.prefixes
            .iter()
            .filter(|(_, namespace)| iri.starts_with(namespace.as_str()))
            .filter(|(_, namespace)| is_local_name(&iri[namespace.len()..]))
            .max_by_key(|(_, namespace)| namespace.len())
            .map(|(prefix, namespace)| format!("{prefix}:{}", &iri[namespace.len()..]))
    }
}

fn is_local_name(local: &str) -> bool {
    let mut chars = local.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphanumeric() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn io_error(err: std::io::Error) -> ExportError {
    ExportError::storage("Failed to write Turtle", Some(err))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prefixes() -> Vec<(String, String)> {
        vec![
            ("xsd".to_string(), xsd::NAMESPACE.to_string()),
            ("ex".to_string(), "http://ex/".to_string()),
        ]
    }

    #[test]
    fn test_groups_statements_by_subject() {
        let mut writer = TurtleWriter::new(Vec::new(), prefixes()).unwrap();
        writer
            .write(&Statement::new("http://ex/a", "http://ex/p", Literal::string("x")))
            .unwrap();
        writer
            .write(&Statement::new("http://ex/a", "http://ex/q", Literal::boolean(true)))
            .unwrap();
        writer
            .write(&Statement::new("http://ex/b", "http://ex/p", Term::iri("http://other/o")))
            .unwrap();
        let text = String::from_utf8(writer.finish().unwrap()).unwrap();

        assert_eq!(
            text,
            "@prefix xsd: <http://www.w3.org/2001/XMLSchema#> .\n\
             @prefix ex: <http://ex/> .\n\
             \n\
             ex:a ex:p \"x\" ;\n    ex:q \"true\"^^xsd:boolean .\n\
             \n\
             ex:b ex:p <http://other/o> .\n"
        );
    }

    #[test]
    fn test_keeps_full_iri_for_complex_local_part() {
        let writer = TurtleWriter::new(Vec::new(), prefixes()).unwrap();
        assert_eq!(writer.iri("http://ex/Person/1"), "<http://ex/Person/1>");
        assert_eq!(writer.iri("http://ex/"), "<http://ex/>");
        assert_eq!(writer.iri("http://ex/Person"), "ex:Person");
    }

    #[test]
    fn test_empty_graph() {
        let writer = TurtleWriter::new(Vec::new(), Vec::new()).unwrap();
        assert!(writer.finish().unwrap().is_empty());
    }
}
