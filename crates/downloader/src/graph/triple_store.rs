//! Persistent RDF triple store with SPOC, POSC and COSP indexes.

use super::keys::{self, Quad, DEFAULT_CONTEXT};
use crate::error::{ExportError, Result};
use crate::rdf::{NTriplesWriter, Statement, Term, TurtleWriter};
use crate::storage::{BatchWrite, StorageBackend};
use log::{debug, info, trace};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Write;
#[cfg(feature = "rocksdb-backend")]
use std::path::Path;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct Counters {
    next_term: u64,
    statements: u64,
}

impl Default for Counters {
    fn default() -> Self {
        Self {
            next_term: 1,
            statements: 0,
        }
    }
}

/// Set of statements over a [`StorageBackend`].
///
/// Statements are deduplicated on (subject, predicate, object, context) and
/// remembered in insertion order. Every write is one atomic batch covering
/// new terms, the three index entries, the insertion log and the counters,
/// so a reopened store always sees a consistent state.
pub struct TripleStore {
    storage: Box<dyn StorageBackend>,
    counters: Counters,
}

impl TripleStore {
    /// Open a store on the given backend, picking up any statements it already holds.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Storage`] if the backend cannot be read and
    /// [`ExportError::Serialization`] if the stored counters are corrupt.
    pub fn with_backend(backend: Box<dyn StorageBackend>) -> Result<Self> {
        let counters = match backend.get(keys::COUNTERS)? {
            Some(value) => serde_json::from_slice(&value).map_err(|e| {
                ExportError::serialization("Failed to deserialize store counters", Some(e))
            })?,
            None => Counters::default(),
        };

        Ok(Self {
            storage: backend,
            counters,
        })
    }

    /// Open a persistent store in the given directory.
    ///
    /// ```no_run
    /// use downloader::graph::TripleStore;
    ///
    /// let store = TripleStore::open("./export.store").unwrap();
    /// println!("{} statements", store.len());
    /// ```
    #[cfg(feature = "rocksdb-backend")]
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        use crate::storage::RocksDBBackend;
        info!("Opening triple store at {:?}", path.as_ref());
        let backend = RocksDBBackend::open(path)?;
        Self::with_backend(Box::new(backend))
    }

    /// Create a store that lives only as long as the value.
    pub fn in_memory() -> Self {
        use crate::storage::MemoryBackend;
        Self {
            storage: Box::new(MemoryBackend::new()),
            counters: Counters::default(),
        }
    }

    /// Number of statements.
    pub fn len(&self) -> u64 {
        self.counters.statements
    }

    pub fn is_empty(&self) -> bool {
        self.counters.statements == 0
    }

    /// Register or replace a namespace prefix.
    pub fn set_namespace(&mut self, prefix: &str, namespace: &str) -> Result<()> {
        debug!("Registering namespace {prefix}: <{namespace}>");
        let mut key = keys::NAMESPACE.to_vec();
        key.extend_from_slice(prefix.as_bytes());
        self.storage.put(&key, namespace.as_bytes())
    }

    /// Registered prefixes, ordered by prefix.
    pub fn namespaces(&self) -> Result<Vec<(String, String)>> {
        self.storage
            .scan_prefix(keys::NAMESPACE)?
            .into_iter()
            .map(|(key, value)| {
                let prefix = utf8(&key[keys::NAMESPACE.len()..])?;
                Ok((prefix, utf8(&value)?))
            })
            .collect()
    }

    /// Add a statement. Returns `false` if it was already present.
    pub fn add(&mut self, statement: &Statement) -> Result<bool> {
        let mut batch = Vec::new();
        let mut interner = Interner {
            next_term: self.counters.next_term,
            fresh: HashMap::new(),
        };

        let quad = Quad {
            s: self.intern(&Term::iri(statement.subject.as_str()), &mut interner, &mut batch)?,
            p: self.intern(&Term::iri(statement.predicate.as_str()), &mut interner, &mut batch)?,
            o: self.intern(&statement.object, &mut interner, &mut batch)?,
            c: match &statement.context {
                Some(context) => {
                    self.intern(&Term::iri(context.as_str()), &mut interner, &mut batch)?
                }
                None => DEFAULT_CONTEXT,
            },
        };

        if interner.fresh.is_empty() && self.storage.exists(&quad.spoc())? {
            trace!("Skipping duplicate statement {statement}");
            return Ok(false);
        }

        let counters = Counters {
            next_term: interner.next_term,
            statements: self.counters.statements + 1,
        };
        batch.push(BatchWrite::put(quad.spoc(), Vec::new()));
        batch.push(BatchWrite::put(quad.posc(), Vec::new()));
        batch.push(BatchWrite::put(quad.cosp(), Vec::new()));
        batch.push(BatchWrite::put(
            keys::log_key(self.counters.statements),
            quad.to_bytes(),
        ));
        batch.push(BatchWrite::put(keys::COUNTERS, encode_counters(counters)?));

        self.storage.write_batch(batch)?;
        self.counters = counters;
        trace!("Added statement {statement}");
        Ok(true)
    }

    /// Add every statement, returning how many were new.
    pub fn add_all<'a, I>(&mut self, statements: I) -> Result<usize>
    where
        I: IntoIterator<Item = &'a Statement>,
    {
        let mut added = 0;
        for statement in statements {
            if self.add(statement)? {
                added += 1;
            }
        }
        Ok(added)
    }

    /// Visit every statement in insertion order.
    pub fn for_each_statement<F>(&self, mut visit: F) -> Result<()>
    where
        F: FnMut(Statement) -> Result<()>,
    {
        for seq in 0..self.counters.statements {
            let value = self.storage.get(&keys::log_key(seq))?.ok_or_else(|| {
                ExportError::serialization(
                    format!("Statement log entry {seq} is missing"),
                    None::<std::io::Error>,
                )
            })?;
            visit(self.resolve(Quad::from_bytes(&value)?)?)?;
        }
        Ok(())
    }

    /// All statements in insertion order.
    pub fn statements(&self) -> Result<Vec<Statement>> {
        let mut out = Vec::with_capacity(self.counters.statements as usize);
        self.for_each_statement(|statement| {
            out.push(statement);
            Ok(())
        })?;
        Ok(out)
    }

    /// Statements matching a pattern; `None` matches anything.
    ///
    /// A bound subject is answered from SPOC and a bound predicate from POSC;
    /// an object-only pattern scans SPOC. Results follow index order.
    pub fn statements_matching(
        &self,
        subject: Option<&str>,
        predicate: Option<&str>,
        object: Option<&Term>,
    ) -> Result<Vec<Statement>> {
        let lookup = |term: Option<Term>| -> Result<Option<Option<u64>>> {
            term.map(|t| self.lookup(&t)).transpose()
        };
        let s = lookup(subject.map(Term::iri))?;
        let p = lookup(predicate.map(Term::iri))?;
        let o = lookup(object.cloned())?;

        // a bound term the store never saw matches nothing
        if [s, p, o].iter().any(|bound| matches!(bound, Some(None))) {
            return Ok(Vec::new());
        }
        let (s, p, o) = (s.flatten(), p.flatten(), o.flatten());

        let quads: Vec<Quad> = match (s, p, o) {
            (Some(s), p, o) => {
                let bound: Vec<u64> = [Some(s), p, p.and(o)].into_iter().flatten().collect();
                self.scan(keys::SPOC, &bound, Quad::from_spoc)?
            }
            (None, Some(p), o) => {
                let bound: Vec<u64> = [Some(p), o].into_iter().flatten().collect();
                self.scan(keys::POSC, &bound, Quad::from_posc)?
            }
            (None, None, _) => self.scan(keys::SPOC, &[], Quad::from_spoc)?,
        };

        quads
            .into_iter()
            .filter(|q| p.map_or(true, |p| q.p == p) && o.map_or(true, |o| q.o == o))
            .map(|q| self.resolve(q))
            .collect()
    }

    /// Statements of one named graph, `None` for the default graph.
    pub fn statements_in_context(&self, context: Option<&str>) -> Result<Vec<Statement>> {
        let c = match context {
            Some(iri) => match self.lookup(&Term::iri(iri))? {
                Some(id) => id,
                None => return Ok(Vec::new()),
            },
            None => DEFAULT_CONTEXT,
        };
        self.scan(keys::COSP, &[c], Quad::from_cosp)?
            .into_iter()
            .map(|q| self.resolve(q))
            .collect()
    }

    /// Remove all statements and terms. Namespaces are kept.
    pub fn clear(&mut self) -> Result<()> {
        debug!("Clearing {} statements", self.counters.statements);
        let mut batch = Vec::new();
        for prefix in [
            keys::TERM,
            keys::TERM_KEY,
            keys::SPOC,
            keys::POSC,
            keys::COSP,
            keys::LOG,
        ] {
            for (key, _) in self.storage.scan_prefix(prefix)? {
                batch.push(BatchWrite::delete(key));
            }
        }
        let counters = Counters::default();
        batch.push(BatchWrite::put(keys::COUNTERS, encode_counters(counters)?));
        self.storage.write_batch(batch)?;
        self.counters = counters;
        Ok(())
    }

    /// Serialize all statements as N-Triples, in insertion order.
    pub fn write_ntriples<W: Write>(&self, out: W) -> Result<W> {
        let mut writer = NTriplesWriter::new(out);
        self.for_each_statement(|statement| writer.write(&statement))?;
        writer.finish()
    }

    /// Serialize all statements as Turtle using the registered prefixes.
    pub fn write_turtle<W: Write>(&self, out: W) -> Result<W> {
        let mut writer = TurtleWriter::new(out, self.namespaces()?)?;
        self.for_each_statement(|statement| writer.write(&statement))?;
        writer.finish()
    }

    pub fn flush(&mut self) -> Result<()> {
        debug!("Flushing triple store ({} statements)", self.counters.statements);
        self.storage.flush()
    }

    /// Flush and release the backend.
    pub fn close(mut self) -> Result<()> {
        self.flush()
    }

    fn scan<F>(&self, index: &[u8], bound: &[u64], decode: F) -> Result<Vec<Quad>>
    where
        F: Fn(&[u8]) -> Result<Quad>,
    {
        self.storage
            .scan_prefix(&keys::prefixed(index, bound))?
            .iter()
            .map(|(key, _)| decode(key.as_slice()))
            .collect()
    }

    fn lookup(&self, term: &Term) -> Result<Option<u64>> {
        let key = term_index_key(term)?;
        self.storage
            .get(&key)?
            .map(|value| keys::decode_id(&value))
            .transpose()
    }

    fn intern(
        &self,
        term: &Term,
        interner: &mut Interner,
        batch: &mut Vec<BatchWrite>,
    ) -> Result<u64> {
        let key = term_index_key(term)?;
        if let Some(id) = interner.fresh.get(&key) {
            return Ok(*id);
        }
        if let Some(value) = self.storage.get(&key)? {
            return keys::decode_id(&value);
        }

        let id = interner.next_term;
        interner.next_term += 1;
        let value = serde_json::to_vec(term)
            .map_err(|e| ExportError::serialization("Failed to serialize term", Some(e)))?;
        batch.push(BatchWrite::put(keys::term_key(id), value));
        batch.push(BatchWrite::put(key.clone(), id.to_be_bytes().to_vec()));
        interner.fresh.insert(key, id);
        Ok(id)
    }

    fn term(&self, id: u64) -> Result<Term> {
        let value = self.storage.get(&keys::term_key(id))?.ok_or_else(|| {
            ExportError::serialization(format!("Term {id} is missing"), None::<std::io::Error>)
        })?;
        serde_json::from_slice(&value)
            .map_err(|e| ExportError::serialization("Failed to deserialize term", Some(e)))
    }

    fn iri(&self, id: u64) -> Result<String> {
        match self.term(id)? {
            Term::Iri(iri) => Ok(iri),
            Term::Literal(_) => Err(ExportError::serialization(
                format!("Term {id} is a literal where an IRI is required"),
                None::<std::io::Error>,
            )),
        }
    }

    fn resolve(&self, quad: Quad) -> Result<Statement> {
        Ok(Statement {
            subject: self.iri(quad.s)?,
            predicate: self.iri(quad.p)?,
            object: self.term(quad.o)?,
            context: match quad.c {
                DEFAULT_CONTEXT => None,
                c => Some(self.iri(c)?),
            },
        })
    }
}

/// Terms minted by the batch being built.
struct Interner {
    next_term: u64,
    fresh: HashMap<Vec<u8>, u64>,
}

fn term_index_key(term: &Term) -> Result<Vec<u8>> {
    let mut key = keys::TERM_KEY.to_vec();
    serde_json::to_writer(&mut key, term)
        .map_err(|e| ExportError::serialization("Failed to serialize term", Some(e)))?;
    Ok(key)
}

fn encode_counters(counters: Counters) -> Result<Vec<u8>> {
    serde_json::to_vec(&counters)
        .map_err(|e| ExportError::serialization("Failed to serialize store counters", Some(e)))
}

fn utf8(bytes: &[u8]) -> Result<String> {
    String::from_utf8(bytes.to_vec())
        .map_err(|e| ExportError::serialization("Namespace is not valid UTF-8", Some(e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rdf::Literal;

    fn st(s: &str, p: &str, o: Term) -> Statement {
        Statement::new(s, p, o)
    }

    #[test]
    fn test_add_deduplicates() {
        let mut store = TripleStore::in_memory();
        let statement = st("http://ex/a", "http://ex/p", Literal::long(1).into());
        assert!(store.add(&statement).unwrap());
        assert!(!store.add(&statement).unwrap());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_same_term_in_two_positions() {
        let mut store = TripleStore::in_memory();
        let statement = st("http://ex/a", "http://ex/p", Term::iri("http://ex/a"));
        store.add(&statement).unwrap();
        assert_eq!(store.statements().unwrap(), vec![statement]);
    }

    #[test]
    fn test_insertion_order_is_kept() {
        let mut store = TripleStore::in_memory();
        let second = st("http://ex/b", "http://ex/p", Term::iri("http://ex/o"));
        let first = st("http://ex/z", "http://ex/p", Term::iri("http://ex/o"));
        store.add(&first).unwrap();
        store.add(&second).unwrap();
        assert_eq!(store.statements().unwrap(), vec![first, second]);
    }

    #[test]
    fn test_context_round_trip() {
        let mut store = TripleStore::in_memory();
        let named = st("http://ex/a", "http://ex/p", Literal::string("x").into())
            .in_context("http://ex/g");
        let default = st("http://ex/a", "http://ex/p", Literal::string("y").into());
        store.add(&named).unwrap();
        store.add(&default).unwrap();

        assert_eq!(
            store.statements_in_context(Some("http://ex/g")).unwrap(),
            vec![named]
        );
        assert_eq!(store.statements_in_context(None).unwrap(), vec![default]);
        assert!(store
            .statements_in_context(Some("http://ex/unknown"))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_counters_survive_reopen_on_shared_backend() {
        use crate::storage::MemoryBackend;
        let backend = MemoryBackend::new();
        {
            let mut store = TripleStore::with_backend(Box::new(backend.clone())).unwrap();
            store
                .add(&st("http://ex/a", "http://ex/p", Term::iri("http://ex/o")))
                .unwrap();
        }
        let mut store = TripleStore::with_backend(Box::new(backend)).unwrap();
        assert_eq!(store.len(), 1);
        store
            .add(&st("http://ex/b", "http://ex/p", Term::iri("http://ex/o")))
            .unwrap();
        assert_eq!(store.statements().unwrap().len(), 2);
    }
}
