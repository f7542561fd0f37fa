use serde::Serialize;

use crate::types::{AppleUserId, AuthProvider, UserId};

/// Coarse lifecycle position of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// Constructed, restore not yet started.
    Uninitialized,
    /// Startup restore in flight.
    Restoring,
    Authenticated,
    Unauthenticated,
}

/// Observable session snapshot.
///
/// Consumers must not treat `token` as authoritative until
/// `restore_complete` is `true`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub token: Option<String>,
    pub user_id: Option<UserId>,
    pub auth_provider: AuthProvider,
    /// Present only when `auth_provider` is [`AuthProvider::Apple`].
    pub apple_user_id: Option<AppleUserId>,
    /// `true` while an operation is in flight.
    pub loading: bool,
    /// Message of the last failed operation.
    pub error: Option<String>,
    /// Set once the startup restore has finished; never reverts.
    pub restore_complete: bool,
    pub phase: SessionPhase,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            token: None,
            user_id: None,
            auth_provider: AuthProvider::None,
            apple_user_id: None,
            loading: true,
            error: None,
            restore_complete: false,
            phase: SessionPhase::Uninitialized,
        }
    }
}

impl Session {
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Token and user id together, or nothing.
    #[must_use]
    pub fn credentials(&self) -> Option<(&str, &UserId)> {
        match (&self.token, &self.user_id) {
            (Some(token), Some(user_id)) => Some((token.as_str(), user_id)),
            _ => None,
        }
    }

    pub(crate) fn authenticate(
        &mut self,
        token: String,
        user_id: UserId,
        provider: AuthProvider,
        apple_user_id: Option<AppleUserId>,
    ) {
        self.token = Some(token);
        self.user_id = Some(user_id);
        self.auth_provider = provider;
        self.apple_user_id = if provider == AuthProvider::Apple {
            apple_user_id
        } else {
            None
        };
        self.phase = SessionPhase::Authenticated;
    }

    pub(crate) fn clear_identity(&mut self) {
        self.token = None;
        self.user_id = None;
        self.auth_provider = AuthProvider::None;
        self.apple_user_id = None;
        self.phase = SessionPhase::Unauthenticated;
    }
}
