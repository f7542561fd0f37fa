/// Boxed error returned by host-provided collaborators.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Caller supplied an argument the session cannot accept.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Key-value store operation failed.
    #[error("Storage error during {operation} of '{key}': {detail}")]
    Storage {
        operation: &'static str,
        key: String,
        detail: String,
    },

    /// Identity provider call failed.
    #[error("Identity provider error during {operation}: {detail}")]
    IdentityProvider {
        operation: &'static str,
        detail: String,
    },

    /// A collaborator call did not complete within its deadline.
    #[error("Timed out during {operation}")]
    Timeout { operation: &'static str },

    #[error("Token decode error: {0}")]
    Token(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    pub(crate) fn storage(operation: &'static str, key: &str, source: &BoxError) -> Self {
        Self::Storage {
            operation,
            key: key.to_owned(),
            detail: source.to_string(),
        }
    }

    pub(crate) fn identity(operation: &'static str, source: &BoxError) -> Self {
        Self::IdentityProvider {
            operation,
            detail: source.to_string(),
        }
    }

    /// `true` for failures caused by the caller rather than a collaborator.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}
