use std::time::Duration;

use crate::error::Error;

/// Persisted key names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeys {
    pub token: String,
    pub user_id: String,
    pub apple_user_id: String,
    pub auth_provider: String,
}

impl StorageKeys {
    /// Shared `token` / `userId` keys plus the two session-private keys
    /// under `prefix`.
    #[must_use]
    pub fn with_prefix(prefix: &str) -> Self {
        Self {
            token: "token".into(),
            user_id: "userId".into(),
            apple_user_id: format!("{prefix}_apple_user_id"),
            auth_provider: format!("{prefix}_auth_provider"),
        }
    }
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self::with_prefix(DEFAULT_PREFIX)
    }
}

const DEFAULT_PREFIX: &str = "bodhira";
const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_IDENTITY_TIMEOUT: Duration = Duration::from_secs(10);

/// Session manager configuration.
///
/// Use [`from_env()`](SessionConfig::from_env) for convention-based setup,
/// or [`default()`](SessionConfig::default) with `with_*` methods for full control.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub(crate) keys: StorageKeys,
    pub(crate) store_timeout: Duration,
    pub(crate) identity_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            keys: StorageKeys::default(),
            store_timeout: DEFAULT_STORE_TIMEOUT,
            identity_timeout: DEFAULT_IDENTITY_TIMEOUT,
        }
    }
}

impl SessionConfig {
    /// Create config from environment variables.
    ///
    /// # Optional env vars
    /// - `BODHIRA_STORE_TIMEOUT_MS`: deadline for each key-value store call
    /// - `BODHIRA_IDENTITY_TIMEOUT_MS`: deadline for each identity provider call
    /// - `BODHIRA_STORAGE_PREFIX`: prefix for the Apple id and provider keys
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a timeout is not a positive integer or the
    /// prefix is empty.
    pub fn from_env() -> Result<Self, Error> {
        let mut config = Self::default();

        if let Ok(ms) = std::env::var("BODHIRA_STORE_TIMEOUT_MS") {
            config = config.with_store_timeout(parse_millis("BODHIRA_STORE_TIMEOUT_MS", &ms)?);
        }
        if let Ok(ms) = std::env::var("BODHIRA_IDENTITY_TIMEOUT_MS") {
            config =
                config.with_identity_timeout(parse_millis("BODHIRA_IDENTITY_TIMEOUT_MS", &ms)?);
        }
        if let Ok(prefix) = std::env::var("BODHIRA_STORAGE_PREFIX") {
            let prefix = prefix.trim();
            if prefix.is_empty() {
                return Err(Error::Config("BODHIRA_STORAGE_PREFIX must not be empty".into()));
            }
            config = config.with_keys(StorageKeys::with_prefix(prefix));
        }

        Ok(config)
    }

    #[must_use]
    pub fn with_keys(mut self, keys: StorageKeys) -> Self {
        self.keys = keys;
        self
    }

    #[must_use]
    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_identity_timeout(mut self, timeout: Duration) -> Self {
        self.identity_timeout = timeout;
        self
    }

    #[must_use]
    pub fn keys(&self) -> &StorageKeys {
        &self.keys
    }

    #[must_use]
    pub fn store_timeout(&self) -> Duration {
        self.store_timeout
    }

    #[must_use]
    pub fn identity_timeout(&self) -> Duration {
        self.identity_timeout
    }
}

fn parse_millis(var: &str, value: &str) -> Result<Duration, Error> {
    match value.trim().parse::<u64>() {
        Ok(ms) if ms > 0 => Ok(Duration::from_millis(ms)),
        _ => Err(Error::Config(format!(
            "{var} must be a positive integer (milliseconds), got '{value}'"
        ))),
    }
}
