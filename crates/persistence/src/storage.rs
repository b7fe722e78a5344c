use crate::Result;

/// A keyed blob store.
///
/// This is the only capability the session core needs from durable storage:
/// read, overwrite and remove a string value under a key. Implementations
/// must be cheap to call synchronously since every cart or wishlist mutation
/// writes through.
pub trait StorageAdapter: Send + Sync {
    /// Returns the blob stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores (or overwrites) the blob under `key`.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Removes the blob under `key`. Removing a missing key is not an error.
    fn clear(&self, key: &str) -> Result<()>;
}
