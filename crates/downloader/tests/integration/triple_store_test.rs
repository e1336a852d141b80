//! TripleStore persistence over RocksDB

use downloader::rdf::{Literal, Statement, Term};
use downloader::{MemoryBackend, TripleStore};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn knows(subject: &str, object: &str) -> Statement {
    Statement::new(
        format!("http://ex/{subject}"),
        "http://xmlns.com/foaf/0.1/knows",
        Term::iri(format!("http://ex/{object}")),
    )
}

#[test]
fn test_statements_survive_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("store");

    {
        let mut store = TripleStore::open(&path).unwrap();
        store.set_namespace("ex", "http://ex/").unwrap();
        assert!(store.add(&knows("ann", "bob")).unwrap());
        assert!(store
            .add(&Statement::new("http://ex/ann", "http://ex/age", Literal::int(41)))
            .unwrap());
        store.close().unwrap();
    }

    let mut store = TripleStore::open(&path).unwrap();
    assert_eq!(store.len(), 2);
    assert_eq!(
        store.namespaces().unwrap(),
        vec![("ex".to_string(), "http://ex/".to_string())]
    );
    assert!(!store.add(&knows("ann", "bob")).unwrap());

    assert!(store.add(&knows("bob", "ann")).unwrap());
    assert_eq!(
        store.statements().unwrap(),
        vec![
            knows("ann", "bob"),
            Statement::new("http://ex/ann", "http://ex/age", Literal::int(41)),
            knows("bob", "ann"),
        ]
    );
}

#[test]
fn test_pattern_lookups() {
    let mut store = TripleStore::with_backend(Box::new(MemoryBackend::new())).unwrap();
    store
        .add_all(&[knows("ann", "bob"), knows("ann", "eve"), knows("bob", "eve")])
        .unwrap();

    assert_eq!(
        store
            .statements_matching(Some("http://ex/ann"), None, None)
            .unwrap()
            .len(),
        2
    );
    assert_eq!(
        store
            .statements_matching(None, None, Some(&Term::iri("http://ex/eve")))
            .unwrap()
            .len(),
        2
    );
    assert_eq!(
        store
            .statements_matching(
                Some("http://ex/bob"),
                Some("http://xmlns.com/foaf/0.1/knows"),
                Some(&Term::iri("http://ex/eve")),
            )
            .unwrap(),
        vec![knows("bob", "eve")]
    );
    assert!(store
        .statements_matching(Some("http://ex/nobody"), None, None)
        .unwrap()
        .is_empty());
}

#[test]
fn test_clear_keeps_namespaces() {
    let dir = TempDir::new().unwrap();
    let mut store = TripleStore::open(dir.path()).unwrap();
    store.set_namespace("ex", "http://ex/").unwrap();
    store.add(&knows("ann", "bob")).unwrap();

    store.clear().unwrap();

    assert!(store.is_empty());
    assert!(store.statements().unwrap().is_empty());
    assert_eq!(store.namespaces().unwrap().len(), 1);
    assert!(store.add(&knows("ann", "bob")).unwrap());
    assert_eq!(store.len(), 1);
}
