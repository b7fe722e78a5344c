use std::sync::{Arc, PoisonError, RwLock};

use common::SessionIdentity;
use serde::Serialize;

use crate::{Result, SessionSnapshot, StorageAdapter};

/// Loads and saves session snapshots for the active identity.
///
/// Clones share both the storage backend and the active identity, so the
/// cart store, the wishlist store and the session bridge all see an identity
/// switch at the same moment.
#[derive(Clone)]
pub struct PersistenceAdapter {
    storage: Arc<dyn StorageAdapter>,
    identity: Arc<RwLock<SessionIdentity>>,
}

impl std::fmt::Debug for PersistenceAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistenceAdapter")
            .field("identity", &self.identity())
            .finish_non_exhaustive()
    }
}

impl PersistenceAdapter {
    /// Creates an adapter scoped to `identity`.
    pub fn new(storage: Arc<dyn StorageAdapter>, identity: SessionIdentity) -> Self {
        Self {
            storage,
            identity: Arc::new(RwLock::new(identity)),
        }
    }

    /// Returns the identity snapshots are currently scoped to.
    pub fn identity(&self) -> SessionIdentity {
        self.identity
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Rescopes all subsequent operations to `identity`.
    pub fn set_identity(&self, identity: SessionIdentity) {
        tracing::debug!(%identity, "persistence rescoped");
        *self.identity.write().unwrap_or_else(PoisonError::into_inner) = identity;
    }

    /// Loads the active identity's snapshot.
    ///
    /// Returns `Ok(None)` when nothing was stored and a corrupted error when
    /// the stored blob cannot be decoded.
    pub fn load(&self) -> Result<Option<SessionSnapshot>> {
        self.load_for(&self.identity())
    }

    /// Loads the snapshot stored for a specific identity.
    pub fn load_for(&self, identity: &SessionIdentity) -> Result<Option<SessionSnapshot>> {
        let key = identity.storage_key();
        let Some(blob) = self.storage.get(&key)? else {
            return Ok(None);
        };

        match SessionSnapshot::decode(&key, &blob) {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(e) => {
                metrics::counter!("persistence_corrupted_total").increment(1);
                Err(e)
            }
        }
    }

    /// Writes a full snapshot under the active identity.
    pub fn save(&self, snapshot: &SessionSnapshot) -> Result<()> {
        let key = self.identity().storage_key();
        self.storage.set(&key, &snapshot.encode()?)
    }

    /// Replaces one section of the active identity's snapshot.
    ///
    /// Other sections are preserved. An unreadable existing snapshot is
    /// replaced rather than propagated, since the caller holds the
    /// authoritative in-memory state.
    pub fn save_section<T: Serialize>(&self, name: &str, state: &T) -> Result<()> {
        let identity = self.identity();
        let mut snapshot = match self.load_for(&identity) {
            Ok(Some(existing)) => existing,
            Ok(None) => SessionSnapshot::new(identity.clone()),
            Err(e) if e.is_corrupted() => {
                tracing::warn!(error = %e, %identity, "overwriting unreadable snapshot");
                SessionSnapshot::new(identity.clone())
            }
            Err(e) => return Err(e),
        };
        snapshot.identity = identity;
        snapshot.set_section(name, state)?;
        self.save(&snapshot)
    }

    /// Removes the active identity's snapshot.
    pub fn clear(&self) -> Result<()> {
        self.clear_for(&self.identity())
    }

    /// Removes the snapshot stored for a specific identity.
    pub fn clear_for(&self, identity: &SessionIdentity) -> Result<()> {
        self.storage.clear(&identity.storage_key())
    }
}
