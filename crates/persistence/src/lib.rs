//! Durable, identity-scoped storage for the session's cart and wishlist.
//!
//! The [`StorageAdapter`] trait is the injected capability (a keyed blob
//! store); [`PersistenceAdapter`] layers snapshot encoding and identity
//! scoping on top of it.

pub mod adapter;
pub mod error;
pub mod file;
pub mod memory;
pub mod snapshot;
pub mod storage;

pub use adapter::PersistenceAdapter;
pub use error::{PersistenceError, Result};
pub use file::FileStorage;
pub use memory::InMemoryStorage;
pub use snapshot::{SCHEMA_VERSION, SessionSnapshot};
pub use storage::StorageAdapter;
