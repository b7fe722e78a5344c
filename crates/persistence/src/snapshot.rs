use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use common::SessionIdentity;
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{PersistenceError, Result};

/// Current layout of [`SessionSnapshot`]. Bumped on incompatible changes.
pub const SCHEMA_VERSION: u32 = 1;

/// A serialized copy of one session's cart and wishlist.
///
/// Each store owns a named section so that the cart and the wishlist can be
/// written independently while still sharing a single storage entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Layout version the snapshot was written with.
    pub schema_version: u32,

    /// The identity this snapshot belongs to.
    pub identity: SessionIdentity,

    /// When the snapshot was last written.
    pub saved_at: DateTime<Utc>,

    /// Serialized store state keyed by section name.
    #[serde(default)]
    pub sections: BTreeMap<String, serde_json::Value>,
}

impl SessionSnapshot {
    /// Creates an empty snapshot for an identity.
    pub fn new(identity: SessionIdentity) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            identity,
            saved_at: Utc::now(),
            sections: BTreeMap::new(),
        }
    }

    /// Replaces a section with the serialized form of `state`.
    pub fn set_section<T: Serialize>(&mut self, name: &str, state: &T) -> Result<()> {
        self.sections
            .insert(name.to_string(), serde_json::to_value(state)?);
        self.saved_at = Utc::now();
        Ok(())
    }

    /// Deserializes a section into a concrete type.
    ///
    /// Returns `Ok(None)` when the section was never written and
    /// `Corrupted` when it cannot be read back.
    pub fn section<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>> {
        match self.sections.get(name) {
            None => Ok(None),
            Some(value) => serde_json::from_value(value.clone()).map(Some).map_err(|e| {
                PersistenceError::Corrupted {
                    key: format!("{}#{name}", self.identity.storage_key()),
                    reason: e.to_string(),
                }
            }),
        }
    }

    /// Returns true if no section holds data.
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Encodes the snapshot for storage.
    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decodes a stored blob, rejecting malformed data and foreign schemas.
    pub fn decode(key: &str, blob: &str) -> Result<Self> {
        let snapshot: SessionSnapshot =
            serde_json::from_str(blob).map_err(|e| PersistenceError::Corrupted {
                key: key.to_string(),
                reason: e.to_string(),
            })?;

        if snapshot.schema_version != SCHEMA_VERSION {
            return Err(PersistenceError::UnsupportedSchema {
                found: snapshot.schema_version,
                expected: SCHEMA_VERSION,
            });
        }

        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::UserId;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct TestLine {
        id: String,
        quantity: u32,
    }

    fn alice() -> SessionIdentity {
        SessionIdentity::User(UserId::new("alice"))
    }

    #[test]
    fn new_snapshot_is_empty() {
        let snapshot = SessionSnapshot::new(alice());
        assert_eq!(snapshot.schema_version, SCHEMA_VERSION);
        assert_eq!(snapshot.identity, alice());
        assert!(snapshot.is_empty());
    }

    #[test]
    fn set_and_read_section() {
        let mut snapshot = SessionSnapshot::new(alice());
        let lines = vec![TestLine {
            id: "p-1".to_string(),
            quantity: 2,
        }];
        snapshot.set_section("cart", &lines).unwrap();

        let restored: Vec<TestLine> = snapshot.section("cart").unwrap().unwrap();
        assert_eq!(restored, lines);
        assert!(snapshot.section::<Vec<TestLine>>("wishlist").unwrap().is_none());
    }

    #[test]
    fn mistyped_section_is_corrupted() {
        let mut snapshot = SessionSnapshot::new(alice());
        snapshot.set_section("cart", &"not a list").unwrap();

        let err = snapshot.section::<Vec<TestLine>>("cart").unwrap_err();
        assert!(err.is_corrupted());
    }

    #[test]
    fn decode_rejects_garbage() {
        let err = SessionSnapshot::decode("session:anonymous", "{not json").unwrap_err();
        assert!(matches!(err, PersistenceError::Corrupted { .. }));
    }

    #[test]
    fn decode_rejects_foreign_schema() {
        let mut snapshot = SessionSnapshot::new(alice());
        snapshot.schema_version = 99;
        let blob = serde_json::to_string(&snapshot).unwrap();

        let err = SessionSnapshot::decode("k", &blob).unwrap_err();
        assert!(matches!(
            err,
            PersistenceError::UnsupportedSchema { found: 99, .. }
        ));
        assert!(err.is_corrupted());
    }

    #[test]
    fn encode_decode_preserves_sections() {
        let mut snapshot = SessionSnapshot::new(alice());
        snapshot.set_section("wishlist", &vec!["p-9"]).unwrap();

        let blob = snapshot.encode().unwrap();
        let decoded = SessionSnapshot::decode("k", &blob).unwrap();
        assert_eq!(decoded, snapshot);
    }
}
