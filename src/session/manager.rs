use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use time::OffsetDateTime;
use tokio::sync::{Mutex as AsyncMutex, mpsc, watch};

use super::state::{Session, SessionPhase};
use crate::cache::QueryCache;
use crate::config::SessionConfig;
use crate::error::{BoxError, Error};
use crate::identity::{AccessRevoker, CredentialStateProvider};
use crate::lifecycle::{AppState, AppStateTracker, LifecycleSubscription};
use crate::storage::KeyValueStore;
use crate::token;
use crate::types::{AppleUserId, AuthProvider, CredentialState, UserId};

/// Outcome of an Apple credential re-check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialCheck {
    /// Session kept (authorized, not an Apple session, or unverifiable).
    Valid,
    /// Credential revoked or unknown; the session has been cleared.
    Invalid,
}

/// Owns the authenticated-session lifecycle.
///
/// Collaborators are injected at construction. All mutating operations are
/// serialized, so a sign-out racing a foreground re-check completes one
/// before the other starts.
///
/// ```rust,ignore
/// let manager = Arc::new(SessionManager::new(
///     SessionConfig::from_env()?,
///     keychain,
///     google_sign_in,
///     apple_authentication,
///     query_client,
/// ));
/// manager.restore().await;
/// let _lifecycle = manager.spawn_lifecycle_listener(app_state_rx);
/// ```
pub struct SessionManager<S, R, C, Q> {
    config: SessionConfig,
    store: S,
    revoker: R,
    credentials: C,
    cache: Q,
    state: watch::Sender<Session>,
    gate: AsyncMutex<()>,
    app_state: Mutex<AppStateTracker>,
}

impl<S, R, C, Q> SessionManager<S, R, C, Q>
where
    S: KeyValueStore,
    R: AccessRevoker,
    C: CredentialStateProvider,
    Q: QueryCache,
{
    /// Create a manager in the `Uninitialized` phase.
    ///
    /// Call [`restore`](Self::restore) once at startup.
    #[must_use]
    pub fn new(config: SessionConfig, store: S, revoker: R, credentials: C, cache: Q) -> Self {
        let (state, _) = watch::channel(Session::default());
        Self {
            config,
            store,
            revoker,
            credentials,
            cache,
            state,
            gate: AsyncMutex::new(()),
            app_state: Mutex::new(AppStateTracker::new(AppState::Active)),
        }
    }

    // ── Observation ────────────────────────────────────────────────

    /// Current session snapshot.
    #[must_use]
    pub fn session(&self) -> Session {
        self.state.borrow().clone()
    }

    /// Receive every session change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.state.borrow().token.clone()
    }

    #[must_use]
    pub fn user_id(&self) -> Option<UserId> {
        self.state.borrow().user_id.clone()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    #[must_use]
    pub fn error(&self) -> Option<String> {
        self.state.borrow().error.clone()
    }

    #[must_use]
    pub fn restore_complete(&self) -> bool {
        self.state.borrow().restore_complete
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.state.borrow().phase
    }

    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    // ── Restore ────────────────────────────────────────────────────

    /// Restore the persisted session.
    ///
    /// Never fails: any store error clears the persisted token and user id
    /// and leaves the session unauthenticated. Always ends with
    /// `loading == false` and `restore_complete == true`.
    pub async fn restore(&self) {
        let _gate = self.gate.lock().await;
        tracing::info!("Restoring session");
        self.state.send_modify(|s| {
            s.loading = true;
            s.phase = SessionPhase::Restoring;
        });

        if let Err(e) = self.try_restore().await {
            tracing::error!(error = %e, "Failed to restore session");
            self.remove_logged(&self.config.keys.token).await;
            self.remove_logged(&self.config.keys.user_id).await;
            let message = e.to_string();
            self.state.send_modify(|s| {
                s.clear_identity();
                s.error = Some(message);
            });
        }

        self.state.send_modify(|s| {
            s.loading = false;
            s.restore_complete = true;
            s.phase = if s.token.is_some() {
                SessionPhase::Authenticated
            } else {
                SessionPhase::Unauthenticated
            };
        });
    }

    async fn try_restore(&self) -> Result<(), Error> {
        let keys = &self.config.keys;
        let (saved_token, saved_user_id) =
            tokio::join!(self.store_get(&keys.token), self.store_get(&keys.user_id));
        let (saved_token, saved_user_id) = (saved_token?, saved_user_id?);

        let Some(saved_token) = saved_token.filter(|t| !t.is_empty()) else {
            tracing::debug!("No saved session found");
            self.state.send_modify(Session::clear_identity);
            return Ok(());
        };

        let user_id = match saved_user_id.filter(|u| !u.is_empty()) {
            Some(user_id) if token::is_fresh(&saved_token, OffsetDateTime::now_utc()) => {
                UserId(user_id)
            }
            Some(_) => {
                tracing::info!("Saved token expired or unreadable, clearing");
                return self.discard_saved_credentials().await;
            }
            None => {
                tracing::warn!("Saved token has no user id, clearing");
                return self.discard_saved_credentials().await;
            }
        };

        let provider =
            AuthProvider::from_stored(self.store_get(&keys.auth_provider).await?.as_deref());
        let apple_user_id = if provider == AuthProvider::Apple {
            if self.check_apple_credential().await == CredentialCheck::Invalid {
                tracing::info!("Apple session revoked, not restoring");
                return Ok(());
            }
            self.store_get(&keys.apple_user_id).await?.map(AppleUserId)
        } else {
            None
        };

        tracing::info!(user_id = %user_id, provider = %provider, "Session restored");
        self.state.send_modify(|s| {
            s.authenticate(saved_token, user_id, provider, apple_user_id);
        });
        Ok(())
    }

    async fn discard_saved_credentials(&self) -> Result<(), Error> {
        let keys = &self.config.keys;
        self.store_remove(&keys.token).await?;
        self.store_remove(&keys.user_id).await?;
        self.state.send_modify(Session::clear_identity);
        Ok(())
    }

    // ── Credential re-check ────────────────────────────────────────

    /// Re-validate an Apple ID session against the platform.
    ///
    /// Only sessions whose stored provider is `apple` and that have a stored
    /// Apple user id are checked. If the platform cannot be reached the
    /// session is kept.
    pub async fn recheck_credential(&self) -> CredentialCheck {
        let _gate = self.gate.lock().await;
        self.check_apple_credential().await
    }

    async fn check_apple_credential(&self) -> CredentialCheck {
        match self.try_check_apple_credential().await {
            Ok(check) => check,
            Err(e) => {
                tracing::warn!(error = %e, "Apple credential check failed, keeping session");
                CredentialCheck::Valid
            }
        }
    }

    async fn try_check_apple_credential(&self) -> Result<CredentialCheck, Error> {
        let keys = &self.config.keys;
        let provider =
            AuthProvider::from_stored(self.store_get(&keys.auth_provider).await?.as_deref());
        if provider != AuthProvider::Apple {
            return Ok(CredentialCheck::Valid);
        }

        let Some(apple_user_id) = self.store_get(&keys.apple_user_id).await?.map(AppleUserId)
        else {
            tracing::debug!("No stored Apple user id, skipping credential check");
            return Ok(CredentialCheck::Valid);
        };

        let state = self.credential_state(&apple_user_id).await?;
        if !state.is_invalid() {
            return Ok(CredentialCheck::Valid);
        }

        tracing::info!(state = ?state, "Apple credential invalid, signing out");
        tokio::join!(
            self.remove_logged(&keys.token),
            self.remove_logged(&keys.user_id),
            self.remove_logged(&keys.apple_user_id),
            self.remove_logged(&keys.auth_provider),
        );
        self.state.send_modify(Session::clear_identity);
        self.cache.clear_all();
        Ok(CredentialCheck::Invalid)
    }

    // ── Lifecycle ──────────────────────────────────────────────────

    /// Feed an app lifecycle transition.
    ///
    /// Returning to the foreground while a token is held triggers the
    /// credential re-check; any other transition returns `None`.
    pub async fn handle_app_state(&self, next: AppState) -> Option<CredentialCheck> {
        let resumed = self
            .app_state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .transition(next);
        let has_token = self.state.borrow().token.is_some();
        if !(resumed && has_token) {
            return None;
        }

        tracing::info!("App foregrounded, checking Apple credential state");
        Some(self.recheck_credential().await)
    }

    /// Dispatch every lifecycle event from `events` to
    /// [`handle_app_state`](Self::handle_app_state) until the channel closes
    /// or the returned subscription is dropped.
    pub fn spawn_lifecycle_listener(
        self: &Arc<Self>,
        mut events: mpsc::Receiver<AppState>,
    ) -> LifecycleSubscription {
        let manager = Arc::clone(self);
        let handle = tokio::spawn(async move {
            while let Some(next) = events.recv().await {
                manager.handle_app_state(next).await;
            }
            tracing::debug!("Lifecycle channel closed");
        });
        LifecycleSubscription::new(handle)
    }

    // ── Mutations ──────────────────────────────────────────────────

    /// Set or clear the token outside the sign-in flows.
    ///
    /// An empty or absent `token` removes the persisted token and user id.
    /// When `user_id` is `None` the current user id is kept.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] when a token is given but no user id is
    /// known, or the store error if persisting fails. The failure message is
    /// also recorded in the session's `error`.
    pub async fn set_token(
        &self,
        token: Option<String>,
        user_id: Option<UserId>,
    ) -> Result<(), Error> {
        let _gate = self.gate.lock().await;
        self.begin();
        let result = self.try_set_token(token, user_id).await;
        self.finish("setToken", &result);
        result
    }

    async fn try_set_token(
        &self,
        token: Option<String>,
        user_id: Option<UserId>,
    ) -> Result<(), Error> {
        let keys = &self.config.keys;

        let Some(token) = token.filter(|t| !t.is_empty()) else {
            tracing::info!("Clearing auth token");
            let (token_removed, user_removed) = tokio::join!(
                self.store_remove(&keys.token),
                self.store_remove(&keys.user_id)
            );
            token_removed?;
            user_removed?;
            self.state.send_modify(Session::clear_identity);
            return Ok(());
        };

        let explicit_user_id = user_id.filter(|u| !u.as_str().is_empty());
        let (user_id, provider, apple_user_id) = {
            let current = self.state.borrow();
            let user_id = explicit_user_id.clone().or_else(|| current.user_id.clone());
            (user_id, current.auth_provider, current.apple_user_id.clone())
        };
        let user_id = user_id.ok_or_else(|| {
            Error::Validation("A user id is required when no session is held".into())
        })?;

        tracing::info!("Saving auth token");
        self.store_set(&keys.token, &token).await?;
        if let Some(new_user_id) = &explicit_user_id {
            self.store_set(&keys.user_id, new_user_id.as_str()).await?;
        }

        self.state.send_modify(|s| {
            s.authenticate(token, user_id, provider, apple_user_id);
        });
        Ok(())
    }

    /// Persist a token obtained from an email/password exchange.
    ///
    /// `password` is accepted for call-site parity with the credential
    /// exchange and is never stored or logged. `user_id` defaults to `email`.
    /// On success every cached query is invalidated.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for an empty token (before any store
    /// call), or the store error if persisting fails. The previous session
    /// is left untouched on failure.
    pub async fn sign_in(
        &self,
        email: &str,
        _password: &str,
        token: &str,
        user_id: Option<UserId>,
    ) -> Result<(), Error> {
        let _gate = self.gate.lock().await;
        self.begin();
        let result = self.try_sign_in(email, token, user_id).await;
        self.finish("signIn", &result);
        result
    }

    async fn try_sign_in(
        &self,
        email: &str,
        token: &str,
        user_id: Option<UserId>,
    ) -> Result<(), Error> {
        if token.is_empty() {
            return Err(Error::Validation("No token provided from server".into()));
        }
        let user_id = user_id
            .filter(|u| !u.as_str().is_empty())
            .unwrap_or_else(|| UserId::from(email));
        if user_id.as_str().is_empty() {
            return Err(Error::Validation("No user id or email provided".into()));
        }

        tracing::info!(user_id = %user_id, "Signing in");
        self.persist_credentials(token, &user_id).await?;

        let keys = &self.config.keys;
        self.remove_logged(&keys.apple_user_id).await;
        self.set_logged(&keys.auth_provider, AuthProvider::Password.as_str())
            .await;

        self.state.send_modify(|s| {
            s.authenticate(token.to_owned(), user_id, AuthProvider::Password, None);
        });
        self.cache.invalidate_all();
        tracing::info!("Sign in successful");
        Ok(())
    }

    /// Persist a token obtained from an OAuth or Sign in with Apple flow.
    ///
    /// With `apple_user_id` the session is marked as an Apple session and
    /// re-checked on every return to the foreground. Without it any stored
    /// Apple identity from an earlier session is removed.
    ///
    /// # Errors
    ///
    /// Same contract as [`sign_in`](Self::sign_in).
    pub async fn sign_in_with_token(
        &self,
        token: &str,
        user_id: UserId,
        apple_user_id: Option<AppleUserId>,
    ) -> Result<(), Error> {
        let _gate = self.gate.lock().await;
        self.begin();
        let result = self.try_sign_in_with_token(token, user_id, apple_user_id).await;
        self.finish("signInWithToken", &result);
        result
    }

    async fn try_sign_in_with_token(
        &self,
        token: &str,
        user_id: UserId,
        apple_user_id: Option<AppleUserId>,
    ) -> Result<(), Error> {
        if token.is_empty() {
            return Err(Error::Validation("No token provided from server".into()));
        }
        if user_id.as_str().is_empty() {
            return Err(Error::Validation("No user id provided from server".into()));
        }
        let apple_user_id = apple_user_id.filter(|a| !a.as_str().is_empty());

        tracing::info!(user_id = %user_id, "Signing in with token");
        self.persist_credentials(token, &user_id).await?;

        let keys = &self.config.keys;
        let provider = if let Some(apple_user_id) = &apple_user_id {
            let (id_saved, provider_saved) = tokio::join!(
                self.store_set(&keys.apple_user_id, apple_user_id.as_str()),
                self.store_set(&keys.auth_provider, AuthProvider::Apple.as_str()),
            );
            id_saved?;
            provider_saved?;
            tracing::debug!("Apple user id saved for credential state checks");
            AuthProvider::Apple
        } else {
            tokio::join!(
                self.remove_logged(&keys.apple_user_id),
                self.remove_logged(&keys.auth_provider),
            );
            self.set_logged(&keys.auth_provider, AuthProvider::OAuth.as_str())
                .await;
            AuthProvider::OAuth
        };

        self.state.send_modify(|s| {
            s.authenticate(token.to_owned(), user_id, provider, apple_user_id);
        });
        self.cache.invalidate_all();
        tracing::info!(provider = %provider, "Token sign in successful");
        Ok(())
    }

    /// Tear down the session.
    ///
    /// Remote revocation and every key removal are attempted independently;
    /// their failures are logged and never prevent the local session from
    /// being cleared. Every cached query is dropped.
    pub async fn sign_out(&self) {
        let _gate = self.gate.lock().await;
        self.begin();
        tracing::info!("Signing out");

        match self
            .identity_call("revoke access", self.revoker.revoke_access())
            .await
        {
            Ok(()) => tracing::debug!("Revoked provider access"),
            Err(e) => tracing::info!(error = %e, "Revoke access skipped"),
        }
        match self
            .identity_call("provider sign-out", self.revoker.sign_out())
            .await
        {
            Ok(()) => tracing::debug!("Signed out from provider"),
            Err(e) => tracing::info!(error = %e, "Provider sign-out skipped"),
        }

        let keys = &self.config.keys;
        tokio::join!(
            self.remove_logged(&keys.apple_user_id),
            self.remove_logged(&keys.auth_provider),
        );
        tokio::join!(
            self.remove_logged(&keys.token),
            self.remove_logged(&keys.user_id),
        );

        self.state.send_modify(|s| {
            s.clear_identity();
            s.error = None;
            s.loading = false;
        });
        self.cache.clear_all();
        tracing::info!("Signed out");
    }

    // ── Helpers ────────────────────────────────────────────────────

    fn begin(&self) {
        self.state.send_modify(|s| s.loading = true);
    }

    fn finish(&self, operation: &'static str, result: &Result<(), Error>) {
        if let Err(e) = result {
            tracing::error!(operation, error = %e, "Session operation failed");
        }
        let error = result.as_ref().err().map(ToString::to_string);
        self.state.send_modify(|s| {
            s.error = error;
            s.loading = false;
        });
    }

    async fn persist_credentials(&self, token: &str, user_id: &UserId) -> Result<(), Error> {
        let keys = &self.config.keys;
        let (token_saved, user_saved) = tokio::join!(
            self.store_set(&keys.token, token),
            self.store_set(&keys.user_id, user_id.as_str()),
        );
        token_saved?;
        user_saved
    }

    async fn store_get(&self, key: &str) -> Result<Option<String>, Error> {
        self.store_call("get", key, self.store.get(key)).await
    }

    async fn store_set(&self, key: &str, value: &str) -> Result<(), Error> {
        self.store_call("set", key, self.store.set(key, value))
            .await
    }

    async fn store_remove(&self, key: &str) -> Result<(), Error> {
        self.store_call("remove", key, self.store.remove(key)).await
    }

    /// Best-effort removal; failures are logged and dropped.
    async fn remove_logged(&self, key: &str) {
        if let Err(e) = self.store_remove(key).await {
            tracing::warn!(key, error = %e, "Failed to remove stored value");
        }
    }

    /// Best-effort write; failures are logged and dropped.
    async fn set_logged(&self, key: &str, value: &str) {
        if let Err(e) = self.store_set(key, value).await {
            tracing::warn!(key, error = %e, "Failed to write stored value");
        }
    }

    async fn store_call<T>(
        &self,
        operation: &'static str,
        key: &str,
        call: impl Future<Output = Result<T, BoxError>>,
    ) -> Result<T, Error> {
        with_deadline(self.config.store_timeout, operation, call)
            .await?
            .map_err(|e| Error::storage(operation, key, &e))
    }

    async fn identity_call<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = Result<T, BoxError>>,
    ) -> Result<T, Error> {
        with_deadline(self.config.identity_timeout, operation, call)
            .await?
            .map_err(|e| Error::identity(operation, &e))
    }

    async fn credential_state(&self, apple_user_id: &AppleUserId) -> Result<CredentialState, Error> {
        self.identity_call(
            "credential state query",
            self.credentials.get_credential_state(apple_user_id),
        )
        .await
    }
}

async fn with_deadline<F: Future>(
    deadline: Duration,
    operation: &'static str,
    call: F,
) -> Result<F::Output, Error> {
    tokio::time::timeout(deadline, call)
        .await
        .map_err(|_| Error::Timeout { operation })
}
