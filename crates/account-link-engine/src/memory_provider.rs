//! In-process authentication backend.
//!
//! Behaves like a hosted backend for the operations the demo uses: accounts
//! keyed by uid with an email index, anonymous accounts upgraded in place on
//! link, and collision errors when an email is already taken.

use crate::listeners::{SessionListeners, SessionSubscription};
use crate::provider::{AuthProvider, Credential, Session};
use crate::{AuthError, AuthResult};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone)]
struct Account {
    id: String,
    is_anonymous: bool,
    email: Option<String>,
    password: Option<String>,
    provider_ids: Vec<String>,
}

impl Account {
    fn session(&self) -> Session {
        Session {
            id: self.id.clone(),
            is_anonymous: self.is_anonymous,
            provider_ids: self.provider_ids.clone(),
            email: self.email.clone(),
        }
    }
}

#[derive(Default)]
struct Backend {
    accounts: HashMap<String, Account>,
    current: Option<String>,
}

impl Backend {
    fn current_account(&self) -> Option<&Account> {
        self.current.as_ref().and_then(|id| self.accounts.get(id))
    }

    fn current_session(&self) -> Option<Session> {
        self.current_account().map(Account::session)
    }

    fn find_by_email(&self, email: &str) -> Option<&Account> {
        self.accounts
            .values()
            .find(|a| a.email.as_deref().is_some_and(|e| e.eq_ignore_ascii_case(email)))
    }
}

/// In-memory [`AuthProvider`].
pub struct MemoryAuthProvider {
    backend: Mutex<Backend>,
    listeners: SessionListeners,
}

impl Default for MemoryAuthProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryAuthProvider {
    /// Empty backend, ready immediately, nobody signed in.
    pub fn new() -> Self {
        Self {
            backend: Mutex::new(Backend::default()),
            listeners: SessionListeners::new(None),
        }
    }

    /// Backend that is still restoring state: listeners hear nothing until
    /// [`finish_restore`](Self::finish_restore).
    pub fn restoring() -> Self {
        Self {
            backend: Mutex::new(Backend::default()),
            listeners: SessionListeners::pending(),
        }
    }

    /// Finish restoring and notify listeners with the current session.
    pub fn finish_restore(&self) {
        let current = self.backend.lock().current_session();
        self.listeners.notify(current);
    }

    /// Create a password account that is not signed in. Returns its uid.
    pub fn register_account(&self, email: &str, password: &str) -> String {
        let id = new_uid();
        self.backend.lock().accounts.insert(
            id.clone(),
            Account {
                id: id.clone(),
                is_anonymous: false,
                email: Some(email.to_string()),
                password: Some(password.to_string()),
                provider_ids: vec![crate::provider::PASSWORD_PROVIDER_ID.to_string()],
            },
        );
        id
    }

    /// Make `session` the signed-in session, as if restored from disk.
    ///
    /// Listeners are only notified when the backend is not restoring.
    pub fn restore_session(&self, session: Session) {
        let id = session.id.clone();
        self.backend.lock().accounts.insert(
            id.clone(),
            Account {
                id: session.id,
                is_anonymous: session.is_anonymous,
                email: session.email,
                password: None,
                provider_ids: session.provider_ids,
            },
        );

        if self.listeners.is_ready() {
            self.set_current(Some(id));
        } else {
            self.backend.lock().current = Some(id);
        }
    }

    /// Number of accounts held by the backend.
    pub fn account_count(&self) -> usize {
        self.backend.lock().accounts.len()
    }

    /// Whether an account exists for `email`.
    pub fn has_account(&self, email: &str) -> bool {
        self.backend.lock().find_by_email(email).is_some()
    }

    /// Listener registry, for inspection.
    pub fn listeners(&self) -> &SessionListeners {
        &self.listeners
    }

    fn set_current(&self, id: Option<String>) -> Option<Session> {
        let session = {
            let mut backend = self.backend.lock();
            backend.current = id;
            backend.current_session()
        };
        self.listeners.notify(session.clone());
        session
    }
}

#[async_trait]
impl AuthProvider for MemoryAuthProvider {
    fn current_session(&self) -> Option<Session> {
        self.backend.lock().current_session()
    }

    async fn sign_in_anonymously(&self) -> AuthResult<Session> {
        // An anonymous user that is already signed in is returned as-is.
        if let Some(session) = self.current_session().filter(|s| s.is_anonymous) {
            return Ok(session);
        }

        let id = new_uid();
        self.backend.lock().accounts.insert(
            id.clone(),
            Account {
                id: id.clone(),
                is_anonymous: true,
                email: None,
                password: None,
                provider_ids: Vec::new(),
            },
        );
        debug!(accounts = self.account_count(), "created anonymous account");

        self.set_current(Some(id))
            .ok_or(AuthError::MissingSession("anonymous sign-in"))
    }

    async fn sign_in_with_credential(&self, credential: &Credential) -> AuthResult<Session> {
        let id = {
            let backend = self.backend.lock();
            let account = backend
                .find_by_email(&credential.identifier)
                .ok_or_else(|| AuthError::UserNotFound(credential.identifier.clone()))?;

            if account.password.as_deref() != Some(credential.secret()) {
                return Err(AuthError::InvalidCredentials(
                    "The password is invalid".to_string(),
                ));
            }
            account.id.clone()
        };

        self.set_current(Some(id))
            .ok_or(AuthError::MissingSession("credential sign-in"))
    }

    async fn link_current_session(&self, credential: &Credential) -> AuthResult<Session> {
        let provider_id = credential.kind.provider_id();
        let mut backend = self.backend.lock();

        let current_id = backend
            .current
            .clone()
            .ok_or_else(|| AuthError::Provider("No user is signed in".to_string()))?;

        if let Some(owner) = backend.find_by_email(&credential.identifier) {
            if owner.id != current_id {
                return Err(AuthError::CredentialCollision(format!(
                    "The email address {} is already in use by another account",
                    credential.identifier
                )));
            }
        }

        let account = backend
            .accounts
            .get_mut(&current_id)
            .ok_or_else(|| AuthError::Provider("Signed-in account no longer exists".to_string()))?;

        if account.provider_ids.iter().any(|p| p == provider_id) {
            return Err(AuthError::Provider(format!(
                "User has already been linked to the {} provider",
                provider_id
            )));
        }

        account.is_anonymous = false;
        account.email = Some(credential.identifier.clone());
        account.password = Some(credential.secret().to_string());
        account.provider_ids.push(provider_id.to_string());

        Ok(account.session())
    }

    fn sign_out(&self) {
        let was_signed_in = self.backend.lock().current.is_some();
        if was_signed_in {
            self.set_current(None);
        }
    }

    async fn delete_current_session(&self) -> AuthResult<()> {
        {
            let mut backend = self.backend.lock();
            let id = backend
                .current
                .clone()
                .ok_or_else(|| AuthError::Provider("No user is signed in".to_string()))?;
            backend.accounts.remove(&id);
        }
        self.set_current(None);
        Ok(())
    }

    fn on_session_changed(&self) -> SessionSubscription {
        self.listeners.subscribe()
    }
}

fn new_uid() -> String {
    Uuid::new_v4().simple().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_credential() -> Credential {
        Credential::email_password("me@example.com", "123456789")
    }

    #[tokio::test]
    async fn test_anonymous_sign_in_creates_account() {
        let provider = MemoryAuthProvider::new();
        let session = provider.sign_in_anonymously().await.unwrap();

        assert!(session.is_anonymous);
        assert!(session.provider_ids.is_empty());
        assert_eq!(session.id.len(), 32);
        assert_eq!(provider.current_session(), Some(session));
        assert_eq!(provider.account_count(), 1);
    }

    #[tokio::test]
    async fn test_anonymous_sign_in_reuses_anonymous_user() {
        let provider = MemoryAuthProvider::new();
        let first = provider.sign_in_anonymously().await.unwrap();
        let second = provider.sign_in_anonymously().await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(provider.account_count(), 1);
    }

    #[tokio::test]
    async fn test_link_keeps_id() {
        let provider = MemoryAuthProvider::new();
        let anonymous = provider.sign_in_anonymously().await.unwrap();

        let linked = provider
            .link_current_session(&test_credential())
            .await
            .unwrap();

        assert_eq!(linked.id, anonymous.id);
        assert!(!linked.is_anonymous);
        assert_eq!(linked.provider_ids, vec!["password".to_string()]);
        assert_eq!(linked.email.as_deref(), Some("me@example.com"));
        assert_eq!(provider.current_session(), Some(linked));
    }

    #[tokio::test]
    async fn test_link_collision() {
        let provider = MemoryAuthProvider::new();
        provider.register_account("me@example.com", "123456789");
        provider.sign_in_anonymously().await.unwrap();

        let err = provider
            .link_current_session(&test_credential())
            .await
            .unwrap_err();

        assert!(err.is_collision());
        assert!(provider.current_session().unwrap().is_anonymous);
    }

    #[tokio::test]
    async fn test_link_without_session_fails() {
        let provider = MemoryAuthProvider::new();
        let err = provider
            .link_current_session(&test_credential())
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Provider(_)));
    }

    #[tokio::test]
    async fn test_sign_in_with_credential() {
        let provider = MemoryAuthProvider::new();
        let uid = provider.register_account("me@example.com", "123456789");

        let wrong = Credential::email_password("me@example.com", "nope");
        assert!(matches!(
            provider.sign_in_with_credential(&wrong).await,
            Err(AuthError::InvalidCredentials(_))
        ));

        let unknown = Credential::email_password("other@example.com", "123456789");
        assert!(matches!(
            provider.sign_in_with_credential(&unknown).await,
            Err(AuthError::UserNotFound(_))
        ));

        let session = provider
            .sign_in_with_credential(&test_credential())
            .await
            .unwrap();
        assert_eq!(session.id, uid);
        assert!(!session.is_anonymous);
    }

    #[tokio::test]
    async fn test_delete_removes_account_and_signs_out() {
        let provider = MemoryAuthProvider::new();
        provider.register_account("me@example.com", "123456789");
        provider
            .sign_in_with_credential(&test_credential())
            .await
            .unwrap();

        provider.delete_current_session().await.unwrap();

        assert!(provider.current_session().is_none());
        assert!(!provider.has_account("me@example.com"));
        assert!(provider.delete_current_session().await.is_err());
    }

    #[tokio::test]
    async fn test_listeners_hear_sign_in_and_out() {
        let provider = MemoryAuthProvider::new();
        let mut sub = provider.on_session_changed();
        assert_eq!(sub.recv().await, Some(None));

        let session = provider.sign_in_anonymously().await.unwrap();
        assert_eq!(sub.recv().await, Some(Some(session)));

        provider.sign_out();
        assert_eq!(sub.recv().await, Some(None));
    }

    #[tokio::test]
    async fn test_restoring_provider_defers_first_notification() {
        let provider = MemoryAuthProvider::restoring();
        provider.restore_session(Session::anonymous("restored-uid-123"));
        let mut sub = provider.on_session_changed();

        provider.finish_restore();
        let first = sub.recv().await.unwrap().unwrap();
        assert_eq!(first.id, "restored-uid-123");
    }
}
