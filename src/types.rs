use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// App-level user identifier (server-issued id, or the sign-in email).
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, From, Into,
)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Stable Apple ID user identifier, used to query credential state.
///
/// Only meaningful while the session was established through Sign in with Apple.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, From, Into,
)]
#[serde(transparent)]
pub struct AppleUserId(pub String);

impl AppleUserId {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for AppleUserId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// How the current session was established.
///
/// Persisted as a lowercase tag under the auth-provider key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthProvider {
    #[default]
    None,
    Password,
    #[serde(rename = "oauth")]
    OAuth,
    Apple,
}

impl AuthProvider {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Password => "password",
            Self::OAuth => "oauth",
            Self::Apple => "apple",
        }
    }

    /// Reads a stored tag. Unknown or missing tags mean no provider is known.
    #[must_use]
    pub fn from_stored(tag: Option<&str>) -> Self {
        tag.and_then(|t| t.parse().ok()).unwrap_or_default()
    }
}

impl std::fmt::Display for AuthProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AuthProvider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "password" => Ok(Self::Password),
            "oauth" => Ok(Self::OAuth),
            "apple" => Ok(Self::Apple),
            other => Err(Error::Validation(format!("unknown auth provider: {other}"))),
        }
    }
}

/// Apple ID credential state as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialState {
    Authorized,
    Revoked,
    NotFound,
}

impl CredentialState {
    /// `true` when the user must be signed out.
    #[must_use]
    pub fn is_invalid(self) -> bool {
        matches!(self, Self::Revoked | Self::NotFound)
    }
}
