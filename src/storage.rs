use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::BoxError;

/// Host-provided persistent key-value storage.
///
/// On mobile this is typically backed by the keychain / keystore or an
/// async storage module; the session only ever stores short strings.
///
/// # Example
///
/// ```rust,ignore
/// impl KeyValueStore for SecureStore {
///     async fn get(&self, key: &str) -> Result<Option<String>, BoxError> {
///         self.keychain.read(key).await.map_err(Into::into)
///     }
///
///     async fn set(&self, key: &str, value: &str) -> Result<(), BoxError> {
///         self.keychain.write(key, value).await.map_err(Into::into)
///     }
///
///     async fn remove(&self, key: &str) -> Result<(), BoxError> {
///         self.keychain.delete(key).await.map_err(Into::into)
///     }
/// }
/// ```
pub trait KeyValueStore: Send + Sync + 'static {
    /// Read a value. Missing keys are `Ok(None)`, not an error.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>, BoxError>> + Send;

    /// Write a value, replacing any previous one.
    fn set(&self, key: &str, value: &str) -> impl Future<Output = Result<(), BoxError>> + Send;

    /// Delete a value. Removing a missing key succeeds.
    fn remove(&self, key: &str) -> impl Future<Output = Result<(), BoxError>> + Send;
}

impl<T: KeyValueStore> KeyValueStore for Arc<T> {
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>, BoxError>> + Send {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> impl Future<Output = Result<(), BoxError>> + Send {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> impl Future<Output = Result<(), BoxError>> + Send {
        (**self).remove(key)
    }
}

/// In-process `KeyValueStore`.
///
/// Nothing survives a restart; intended for tests and hosts without
/// durable storage.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot read that does not go through the async trait.
    #[must_use]
    pub fn peek(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, BoxError> {
        Ok(self.peek(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), BoxError> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), BoxError> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }
}
