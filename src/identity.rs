use std::future::Future;
use std::sync::Arc;

use crate::error::BoxError;
use crate::types::{AppleUserId, CredentialState};

/// Third-party OAuth session teardown (e.g. Google Sign-In).
///
/// Called only during sign-out. Both calls are best-effort: a user who
/// never signed in through the provider, or whose grant already expired,
/// makes them fail, and that must not block local sign-out.
pub trait AccessRevoker: Send + Sync + 'static {
    /// Revoke the access grant issued to this app.
    fn revoke_access(&self) -> impl Future<Output = Result<(), BoxError>> + Send;

    /// End the provider's local sign-in session.
    fn sign_out(&self) -> impl Future<Output = Result<(), BoxError>> + Send;
}

/// Apple ID credential-state query.
///
/// Fails on transport errors (device offline, platform service unavailable).
pub trait CredentialStateProvider: Send + Sync + 'static {
    fn get_credential_state(
        &self,
        apple_user_id: &AppleUserId,
    ) -> impl Future<Output = Result<CredentialState, BoxError>> + Send;
}

impl<T: AccessRevoker> AccessRevoker for Arc<T> {
    fn revoke_access(&self) -> impl Future<Output = Result<(), BoxError>> + Send {
        (**self).revoke_access()
    }

    fn sign_out(&self) -> impl Future<Output = Result<(), BoxError>> + Send {
        (**self).sign_out()
    }
}

impl<T: CredentialStateProvider> CredentialStateProvider for Arc<T> {
    fn get_credential_state(
        &self,
        apple_user_id: &AppleUserId,
    ) -> impl Future<Output = Result<CredentialState, BoxError>> + Send {
        (**self).get_credential_state(apple_user_id)
    }
}

/// `AccessRevoker` for hosts without a third-party OAuth provider.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopRevoker;

impl AccessRevoker for NoopRevoker {
    async fn revoke_access(&self) -> Result<(), BoxError> {
        Ok(())
    }

    async fn sign_out(&self) -> Result<(), BoxError> {
        Ok(())
    }
}

/// `CredentialStateProvider` for platforms without Sign in with Apple.
///
/// Every credential is reported authorized, so Apple sessions are never
/// revoked from the client side.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysAuthorized;

impl CredentialStateProvider for AlwaysAuthorized {
    async fn get_credential_state(
        &self,
        _apple_user_id: &AppleUserId,
    ) -> Result<CredentialState, BoxError> {
        Ok(CredentialState::Authorized)
    }
}
