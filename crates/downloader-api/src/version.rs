//! Server schema version.

use crate::errors::MetadataError;
use crate::metadata::Entity;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Version of the server that produced a schema.
///
/// Ordering is lexicographic on `(major, minor, patch)`, which is what the
/// compatibility rules compare against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MolgenisVersion {
    /// Major version
    pub major: u32,
    /// Minor version
    pub minor: u32,
    /// Patch version
    pub patch: u32,
}

impl MolgenisVersion {
    /// First version that identifies entities by an opaque id instead of their full name.
    pub const VERSION_3: MolgenisVersion = MolgenisVersion::new(3, 0, 0);

    /// Create a version from its components.
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// `true` when this version sorts before `other`.
    pub fn smaller_than(&self, other: MolgenisVersion) -> bool {
        *self < other
    }
}

/// Stable key of `entity` under the identity rules of `version`.
///
/// Servers before [`MolgenisVersion::VERSION_3`] only expose the full name;
/// later servers identify entities by their opaque id. Every comparison of
/// entity names against user input or references goes through here.
pub fn resolve_key(entity: &Entity, version: MolgenisVersion) -> &str {
    if version.smaller_than(MolgenisVersion::VERSION_3) {
        &entity.full_name
    } else {
        &entity.id
    }
}

impl fmt::Display for MolgenisVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for MolgenisVersion {
    type Err = MetadataError;

    /// Parse `"7.4.1"`, `"1.2"` or `"3"`. Trailing qualifiers such as
    /// `"-SNAPSHOT"` on the last component are ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || MetadataError::InvalidVersion(s.to_string());
        let mut parts = [0u32; 3];
        let mut count = 0;

        for (i, raw) in s.trim().split('.').enumerate() {
            if i >= 3 {
                return Err(invalid());
            }
            let digits: String = raw.chars().take_while(|c| c.is_ascii_digit()).collect();
            if digits.is_empty() {
                return Err(invalid());
            }
            parts[i] = digits.parse().map_err(|_| invalid())?;
            count += 1;
        }

        if count == 0 {
            return Err(invalid());
        }
        Ok(Self::new(parts[0], parts[1], parts[2]))
    }
}
