use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::api::ApiClient;
use crate::localization::{keys, Localizer};
use crate::models::{LoginRequest, UserRecord};

use super::credentials::PersistenceMode;
use super::{AuthError, CredentialStore};

/// Derived authentication status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Anonymous,
    Authenticated,
}

/// Result of an account operation.
///
/// `NotImplemented` is what the reserved operations return until the
/// backend grows an endpoint for them. It reports success exactly like
/// `Completed` so front ends need no special case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountOutcome {
    Completed,
    NotImplemented,
}

impl AccountOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, AccountOutcome::Completed | AccountOutcome::NotImplemented)
    }
}

/// The signed-in user's session.
///
/// Authenticated iff a profile is cached AND a credential is stored. The
/// profile lives in memory only; the credential lives in the
/// `CredentialStore` shared with the request pipeline, which may clear it
/// on its own when the server rejects it.
pub struct Session {
    api: ApiClient,
    credentials: Arc<CredentialStore>,
    localizer: Arc<Localizer>,
    user: RwLock<Option<UserRecord>>,
}

impl Session {
    /// Create a session. Nothing is fetched until the state is queried.
    pub fn new(api: ApiClient, localizer: Arc<Localizer>) -> Self {
        let credentials = Arc::clone(api.credentials());
        Self {
            api,
            credentials,
            localizer,
            user: RwLock::new(None),
        }
    }

    /// Sign in. On success the credential is stored (durable only when
    /// `remember_me` is set) and a minimal profile is cached.
    pub async fn login(&self, request: &LoginRequest) -> Result<UserRecord, AuthError> {
        let response = match self.api.login(request).await {
            Ok(response) => response,
            Err(e) => {
                warn!(usercode = %request.usercode, error = %e, "Login failed");
                return Err(AuthError::from_api(
                    e,
                    self.localizer.translate(keys::AUTH_AUTHENTICATION_FAILED),
                ));
            }
        };

        let Some(token) = response.token() else {
            warn!(usercode = %request.usercode, "Login response carried no token");
            return Err(AuthError::InvalidResponse(
                self.localizer.translate(keys::AUTH_INVALID_RESPONSE),
            ));
        };

        self.credentials.set(token, request.remember_me);
        let user = UserRecord::from_identifier(&request.usercode);
        self.set_user(Some(user.clone()));

        info!(usercode = %request.usercode, remember_me = request.remember_me, "Login successful");
        Ok(user)
    }

    /// Sign out. The backend is told on a best-effort basis; local state is
    /// always cleared, even if the call fails or this future is dropped.
    pub async fn logout(&self) {
        let _local = LocalSignOut { session: self };

        if let Err(e) = self.api.logout().await {
            warn!(
                error = %e,
                "{}",
                self.localizer.translate(keys::AUTH_LOGOUT_FAILED)
            );
        }
    }

    /// The signed-in user's profile, fetching it when only a credential is
    /// present. A rejected credential yields `Ok(None)`.
    pub async fn current_user(&self) -> Result<Option<UserRecord>, AuthError> {
        if !self.credentials.has_credential() {
            self.forget_user();
            return Ok(None);
        }

        if let Some(user) = self.cached_user() {
            return Ok(Some(user));
        }

        debug!("No cached profile, fetching");
        match self.api.user_info().await {
            Ok(user) => {
                self.set_user(Some(user.clone()));
                Ok(Some(user))
            }
            Err(e) if e.is_unauthorized() => {
                // The pipeline already dropped the credential
                self.forget_user();
                info!("Stored credential rejected, session is anonymous");
                Ok(None)
            }
            Err(e) => Err(AuthError::from_api(
                e,
                self.localizer.translate(keys::AUTH_GET_USER_FAILED),
            )),
        }
    }

    /// Fast check used by navigation. Never touches the network.
    pub fn is_authenticated(&self) -> bool {
        let has_credential = self.credentials.has_credential();
        let has_user = self.cached_user().is_some();

        if has_user && !has_credential {
            debug!("Credential gone, dropping cached profile");
            self.forget_user();
            return false;
        }
        has_user && has_credential
    }

    pub fn state(&self) -> SessionState {
        if self.is_authenticated() {
            SessionState::Authenticated
        } else {
            SessionState::Anonymous
        }
    }

    /// Swap the stored credential for a fresh one, keeping its persistence mode.
    pub async fn refresh_credential(&self) -> Result<(), AuthError> {
        let mode = self.credentials.mode();

        let response = match self.api.refresh_token().await {
            Ok(response) => response,
            Err(e) => {
                if e.is_unauthorized() {
                    self.forget_user();
                }
                return Err(AuthError::from_api(
                    e,
                    self.localizer.translate(keys::AUTH_AUTHENTICATION_FAILED),
                ));
            }
        };

        match response.token() {
            Some(token) => {
                self.credentials
                    .set(token, mode == Some(PersistenceMode::Durable));
                debug!("Credential refreshed");
                Ok(())
            }
            None => Err(AuthError::InvalidResponse(
                self.localizer.translate(keys::AUTH_INVALID_RESPONSE),
            )),
        }
    }

    /// Reserved: no backend endpoint yet.
    pub async fn reset_password(&self, email: &str) -> Result<AccountOutcome, AuthError> {
        debug!(email = email, "Password reset requested");
        Ok(AccountOutcome::NotImplemented)
    }

    /// Reserved: no backend endpoint yet.
    pub async fn change_password(
        &self,
        email: &str,
        recovery_code: &str,
    ) -> Result<AccountOutcome, AuthError> {
        debug!(email = email, has_code = !recovery_code.is_empty(), "Password change requested");
        Ok(AccountOutcome::NotImplemented)
    }

    /// Reserved: no backend endpoint yet.
    pub async fn create_account(
        &self,
        email: &str,
        _password: &str,
    ) -> Result<AccountOutcome, AuthError> {
        debug!(email = email, "Account creation requested");
        Ok(AccountOutcome::NotImplemented)
    }

    /// Drop the in-memory profile at application stop. The credential is
    /// left to its persistence mode.
    pub fn shutdown(self) {
        self.forget_user();
        debug!("Session shut down");
    }

    pub fn localizer(&self) -> &Arc<Localizer> {
        &self.localizer
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    fn cached_user(&self) -> Option<UserRecord> {
        self.user.read().ok().and_then(|u| u.clone())
    }

    fn set_user(&self, user: Option<UserRecord>) {
        if let Ok(mut slot) = self.user.write() {
            *slot = user;
        }
    }

    fn forget_user(&self) {
        self.set_user(None);
    }

    fn clear_local(&self) {
        self.forget_user();
        self.credentials.clear();
        info!("Signed out");
    }
}

/// Clears local session state when dropped.
struct LocalSignOut<'a> {
    session: &'a Session,
}

impl Drop for LocalSignOut<'_> {
    fn drop(&mut self) {
        self.session.clear_local();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::api::RequestPipeline;
    use crate::notify::ToastQueue;
    use crate::storage::MemoryStore;

    // Port 9 (discard) on localhost refuses connections, so nothing here
    // may depend on a response.
    fn offline_session() -> Session {
        let credentials = Arc::new(CredentialStore::in_memory());
        let pipeline = RequestPipeline::new(
            "http://127.0.0.1:9/api",
            Duration::from_millis(200),
            credentials,
            Arc::new(ToastQueue::new()),
        )
        .unwrap();
        let localizer = Arc::new(Localizer::new(Arc::new(MemoryStore::new())));
        Session::new(ApiClient::new(Arc::new(pipeline)), localizer)
    }

    #[test]
    fn test_new_session_is_anonymous() {
        let session = offline_session();
        assert!(!session.is_authenticated());
        assert_eq!(session.state(), SessionState::Anonymous);
    }

    #[test]
    fn test_profile_without_credential_self_heals() {
        let session = offline_session();
        session.set_user(Some(UserRecord::from_identifier("u1")));

        assert!(!session.is_authenticated());
        assert!(session.cached_user().is_none());
    }

    #[test]
    fn test_credential_without_profile_is_anonymous() {
        let session = offline_session();
        session.credentials.set("abc", false);
        assert!(!session.is_authenticated());
    }

    #[test]
    fn test_credential_cleared_elsewhere_ends_session() {
        let session = offline_session();
        session.credentials.set("abc", true);
        session.set_user(Some(UserRecord::from_identifier("u1")));
        assert!(session.is_authenticated());

        session.credentials.clear();
        assert!(!session.is_authenticated());
        assert!(session.cached_user().is_none());
    }

    #[tokio::test]
    async fn test_logout_clears_even_when_backend_unreachable() {
        let session = offline_session();
        session.credentials.set("abc", true);
        session.set_user(Some(UserRecord::from_identifier("u1")));

        session.logout().await;
        assert!(!session.is_authenticated());
        assert!(!session.credentials.has_credential());

        session.logout().await;
        assert_eq!(session.state(), SessionState::Anonymous);
        assert!(!session.credentials.has_credential());
    }

    #[tokio::test]
    async fn test_current_user_without_credential_is_none() {
        let session = offline_session();
        assert!(session.current_user().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_reserved_operations_report_success() {
        let session = offline_session();

        let outcomes = [
            session.reset_password("a@example.com").await.unwrap(),
            session.change_password("a@example.com", "123456").await.unwrap(),
            session.create_account("a@example.com", "secret").await.unwrap(),
        ];
        for outcome in outcomes {
            assert_eq!(outcome, AccountOutcome::NotImplemented);
            assert!(outcome.is_ok());
        }
        assert!(AccountOutcome::Completed.is_ok());
    }
}
