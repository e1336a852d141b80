//! Key layout of the triple store.
//!
//! ```text
//! meta:counters            JSON {next_term, statements}
//! term:<id>                JSON Term
//! term_key:<JSON Term>     id
//! spoc:<s><p><o><c>        empty
//! posc:<p><o><s><c>        empty
//! cosp:<c><o><s><p>        empty
//! log:<seq>                <s><p><o><c>
//! ns:<prefix>              namespace IRI
//! ```
//!
//! Ids are 8-byte big-endian so that key order equals numeric order.
//! Context id 0 is the default graph.

use crate::error::{ExportError, Result};

pub(crate) const COUNTERS: &[u8] = b"meta:counters";
pub(crate) const TERM: &[u8] = b"term:";
pub(crate) const TERM_KEY: &[u8] = b"term_key:";
pub(crate) const SPOC: &[u8] = b"spoc:";
pub(crate) const POSC: &[u8] = b"posc:";
pub(crate) const COSP: &[u8] = b"cosp:";
pub(crate) const LOG: &[u8] = b"log:";
pub(crate) const NAMESPACE: &[u8] = b"ns:";

pub(crate) const DEFAULT_CONTEXT: u64 = 0;

/// Term ids of one statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Quad {
    pub s: u64,
    pub p: u64,
    pub o: u64,
    pub c: u64,
}

impl Quad {
    pub fn to_bytes(self) -> Vec<u8> {
        ids(&[self.s, self.p, self.o, self.c])
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let [s, p, o, c] = decode4(bytes)?;
        Ok(Self { s, p, o, c })
    }

    pub fn spoc(self) -> Vec<u8> {
        prefixed(SPOC, &[self.s, self.p, self.o, self.c])
    }

    pub fn posc(self) -> Vec<u8> {
        prefixed(POSC, &[self.p, self.o, self.s, self.c])
    }

    pub fn cosp(self) -> Vec<u8> {
        prefixed(COSP, &[self.c, self.o, self.s, self.p])
    }

    pub fn from_spoc(key: &[u8]) -> Result<Self> {
        let [s, p, o, c] = decode4(strip(key, SPOC)?)?;
        Ok(Self { s, p, o, c })
    }

    pub fn from_posc(key: &[u8]) -> Result<Self> {
        let [p, o, s, c] = decode4(strip(key, POSC)?)?;
        Ok(Self { s, p, o, c })
    }

    pub fn from_cosp(key: &[u8]) -> Result<Self> {
        let [c, o, s, p] = decode4(strip(key, COSP)?)?;
        Ok(Self { s, p, o, c })
    }
}

pub(crate) fn prefixed(prefix: &[u8], values: &[u64]) -> Vec<u8> {
    let mut key = prefix.to_vec();
    key.extend(ids(values));
    key
}

pub(crate) fn term_key(id: u64) -> Vec<u8> {
    prefixed(TERM, &[id])
}

pub(crate) fn log_key(seq: u64) -> Vec<u8> {
    prefixed(LOG, &[seq])
}

pub(crate) fn decode_id(bytes: &[u8]) -> Result<u64> {
    let array: [u8; 8] = bytes
        .try_into()
        .map_err(|_| corrupt(format!("expected 8-byte id, found {} bytes", bytes.len())))?;
    Ok(u64::from_be_bytes(array))
}

fn ids(values: &[u64]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_be_bytes()).collect()
}

fn decode4(bytes: &[u8]) -> Result<[u64; 4]> {
    if bytes.len() != 32 {
        return Err(corrupt(format!("expected 32-byte quad, found {} bytes", bytes.len())));
    }
    let mut out = [0u64; 4];
    for (slot, chunk) in out.iter_mut().zip(bytes.chunks_exact(8)) {
        *slot = decode_id(chunk)?;
    }
    Ok(out)
}

fn strip<'a>(key: &'a [u8], prefix: &[u8]) -> Result<&'a [u8]> {
    key.strip_prefix(prefix)
        .ok_or_else(|| corrupt("index key with unexpected prefix".to_string()))
}

fn corrupt(message: String) -> ExportError {
    ExportError::serialization(
        format!("Corrupt triple store key: {message}"),
        None::<std::io::Error>,
    )
}
