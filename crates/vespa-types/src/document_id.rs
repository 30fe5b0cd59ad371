use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::checksum::fnv1a_64;

/// A parsed document id.
///
/// The string form is `id:<namespace>:<doc_type>[:g=<group>]:<user_specific>`,
/// matching the original document-id grammar (see `original_source/`). We
/// keep the parsed components rather than treating the id as an opaque
/// string because bucket-id derivation and GC selection expressions both
/// need structured access to the namespace/type/group/key parts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentId {
    namespace: String,
    doc_type: String,
    group: Option<String>,
    user_specific: String,
    raw: String,
}

/// Errors produced while parsing a document id string.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DocumentIdError {
    #[error("document id must start with \"id:\": {0:?}")]
    MissingScheme(String),
    #[error("document id missing namespace, type, or key: {0:?}")]
    TooFewComponents(String),
    #[error("document id has empty namespace: {0:?}")]
    EmptyNamespace(String),
    #[error("document id has empty type: {0:?}")]
    EmptyType(String),
    #[error("document id has empty key: {0:?}")]
    EmptyKey(String),
}

impl DocumentId {
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn doc_type(&self) -> &str {
        &self.doc_type
    }

    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    pub fn user_specific(&self) -> &str {
        &self.user_specific
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// A 64-bit hash of the full document id, used as the seed for bucket-id
    /// derivation (spec §3, "a bucket id is derived from the document id by
    /// a stable hash").
    pub fn stable_hash(&self) -> u64 {
        fnv1a_64(self.raw.as_bytes())
    }

    /// Derives the 96-bit global id carried by a [`crate::Hit`]: a
    /// content-addressed fingerprint distinct from the bucket hash so
    /// colliding bucket ids don't also collide as global ids.
    pub fn global_id(&self) -> GlobalId {
        let lo = fnv1a_64(self.raw.as_bytes());
        let hi = fnv1a_64(format!("gid:{}", self.raw).as_bytes());
        GlobalId([
            (hi >> 24) as u8,
            (hi >> 16) as u8,
            (hi >> 8) as u8,
            hi as u8,
            (lo >> 56) as u8,
            (lo >> 48) as u8,
            (lo >> 40) as u8,
            (lo >> 32) as u8,
            (lo >> 24) as u8,
            (lo >> 16) as u8,
            (lo >> 8) as u8,
            lo as u8,
        ])
    }
}

impl FromStr for DocumentId {
    type Err = DocumentIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s
            .strip_prefix("id:")
            .ok_or_else(|| DocumentIdError::MissingScheme(s.to_string()))?;

        let mut parts = rest.splitn(3, ':');
        let namespace = parts
            .next()
            .ok_or_else(|| DocumentIdError::TooFewComponents(s.to_string()))?;
        let doc_type = parts
            .next()
            .ok_or_else(|| DocumentIdError::TooFewComponents(s.to_string()))?;
        let remainder = parts
            .next()
            .ok_or_else(|| DocumentIdError::TooFewComponents(s.to_string()))?;

        if namespace.is_empty() {
            return Err(DocumentIdError::EmptyNamespace(s.to_string()));
        }
        if doc_type.is_empty() {
            return Err(DocumentIdError::EmptyType(s.to_string()));
        }

        let (group, user_specific) = if let Some(g) = remainder.strip_prefix("g=") {
            let mut gparts = g.splitn(2, ':');
            let group = gparts.next().unwrap_or_default();
            let key = gparts
                .next()
                .ok_or_else(|| DocumentIdError::EmptyKey(s.to_string()))?;
            (Some(group.to_string()), key.to_string())
        } else if let Some(key) = remainder.strip_prefix(':') {
            // The optional `[:g=<group>]` segment was present but empty
            // (e.g. "id:ns:type::key"), leaving one extra leading colon.
            (None, key.to_string())
        } else {
            // No optional segment at all (e.g. "id:ns:type:key").
            (None, remainder.to_string())
        };

        if user_specific.is_empty() {
            return Err(DocumentIdError::EmptyKey(s.to_string()));
        }

        Ok(Self {
            namespace: namespace.to_string(),
            doc_type: doc_type.to_string(),
            group,
            user_specific,
            raw: s.to_string(),
        })
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

/// A 96-bit global document identifier, as carried by a [`crate::Hit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GlobalId([u8; 12]);

impl GlobalId {
    pub const fn from_bytes(bytes: [u8; 12]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(self) -> [u8; 12] {
        self.0
    }
}

impl fmt::Display for GlobalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_id() {
        let id: DocumentId = "id:music:song::my-key".parse().unwrap();
        assert_eq!(id.namespace(), "music");
        assert_eq!(id.doc_type(), "song");
        assert_eq!(id.group(), None);
        assert_eq!(id.user_specific(), "my-key");
    }

    #[test]
    fn parses_grouped_id() {
        let id: DocumentId = "id:music:song:g=artist-42:my-key".parse().unwrap();
        assert_eq!(id.group(), Some("artist-42"));
        assert_eq!(id.user_specific(), "my-key");
    }

    #[test]
    fn rejects_missing_scheme() {
        assert_eq!(
            "music:song::key".parse::<DocumentId>(),
            Err(DocumentIdError::MissingScheme("music:song::key".into()))
        );
    }

    #[test]
    fn rejects_empty_key() {
        assert!("id:music:song::".parse::<DocumentId>().is_err());
    }

    #[test]
    fn stable_hash_is_deterministic() {
        let a: DocumentId = "id:music:song::k1".parse().unwrap();
        let b: DocumentId = "id:music:song::k1".parse().unwrap();
        assert_eq!(a.stable_hash(), b.stable_hash());
        assert_eq!(a.global_id(), b.global_id());
    }

    #[test]
    fn distinct_ids_hash_differently() {
        let a: DocumentId = "id:music:song::k1".parse().unwrap();
        let b: DocumentId = "id:music:song::k2".parse().unwrap();
        assert_ne!(a.stable_hash(), b.stable_hash());
    }
}
