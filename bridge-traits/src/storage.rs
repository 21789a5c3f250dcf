//! Key-Value Storage Abstraction
//!
//! The player persists two small JSON records (session and widget position)
//! in a durable, same-origin key-value namespace shared by every page of the
//! application:
//! - Web: `localStorage`
//! - Desktop: SQLite-backed table
//! - Mobile: UserDefaults / SharedPreferences

use async_trait::async_trait;

use crate::error::Result;

/// Durable string key-value store.
///
/// Implementations must tolerate concurrent readers from other pages of the
/// same application; last writer wins.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::KeyValueStore;
///
/// async fn remember(store: &dyn KeyValueStore, json: &str) -> Result<()> {
///     store.set_string("globalPlayerState", json).await
/// }
/// ```
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Store a string value, replacing any previous one.
    async fn set_string(&self, key: &str, value: &str) -> Result<()>;

    /// Retrieve a string value. Returns `Ok(None)` when the key is absent.
    async fn get_string(&self, key: &str) -> Result<Option<String>>;

    /// Remove a value. Removing an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Check if a key exists.
    async fn has_key(&self, key: &str) -> Result<bool> {
        Ok(self.get_string(key).await?.is_some())
    }

    /// List all keys currently stored.
    async fn list_keys(&self) -> Result<Vec<String>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MapStore {
        values: Mutex<HashMap<String, String>>,
    }

    #[async_trait]
    impl KeyValueStore for MapStore {
        async fn set_string(&self, key: &str, value: &str) -> Result<()> {
            self.values
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
            Ok(())
        }

        async fn get_string(&self, key: &str) -> Result<Option<String>> {
            Ok(self.values.lock().unwrap().get(key).cloned())
        }

        async fn delete(&self, key: &str) -> Result<()> {
            self.values.lock().unwrap().remove(key);
            Ok(())
        }

        async fn list_keys(&self) -> Result<Vec<String>> {
            Ok(self.values.lock().unwrap().keys().cloned().collect())
        }
    }

    #[tokio::test]
    async fn has_key_defaults_to_get() {
        let store = MapStore::default();
        assert!(!store.has_key("globalPlayerState").await.unwrap());

        store.set_string("globalPlayerState", "{}").await.unwrap();
        assert!(store.has_key("globalPlayerState").await.unwrap());

        store.delete("globalPlayerState").await.unwrap();
        assert!(!store.has_key("globalPlayerState").await.unwrap());
    }
}
