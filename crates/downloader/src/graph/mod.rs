//! Triple store holding graph output.
//!
//! [`TripleStore`] keeps statements over any
//! [`StorageBackend`](crate::storage::StorageBackend) with three index orders
//! (SPOC, POSC, COSP) and an insertion log used for export.

mod keys;
mod triple_store;

pub use triple_store::TripleStore;
