//! Restoring store contents from a persisted snapshot.

use persistence::{PersistenceAdapter, PersistenceError};
use serde::de::DeserializeOwned;

/// What happened when a store tried to restore its persisted contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreStatus {
    /// Nothing was stored; the store starts empty.
    Empty,

    /// The store was filled from the snapshot.
    Restored { entries: usize },

    /// The snapshot could not be used; the store starts empty.
    Degraded { reason: String },
}

impl RestoreStatus {
    /// Returns true if stored data was discarded.
    pub fn is_degraded(&self) -> bool {
        matches!(self, RestoreStatus::Degraded { .. })
    }
}

/// Reads one section of the active identity's snapshot.
pub(crate) fn load_section<T: DeserializeOwned>(
    persistence: &PersistenceAdapter,
    section: &str,
) -> Result<Option<T>, PersistenceError> {
    match persistence.load()? {
        Some(snapshot) => snapshot.section(section),
        None => Ok(None),
    }
}

/// Turns a failed restore into a degraded status, logging it.
pub(crate) fn degrade(store: &'static str, error: &dyn std::fmt::Display) -> RestoreStatus {
    tracing::warn!(store, error = %error, "discarding unreadable persisted state");
    RestoreStatus::Degraded {
        reason: error.to_string(),
    }
}
