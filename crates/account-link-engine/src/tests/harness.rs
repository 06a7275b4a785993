//! Test harness for controller integration tests.
//!
//! Provides:
//! - ScriptedProvider: wraps the in-memory backend, records every provider
//!   call and fails queued calls on demand
//! - TestHarness: a controller wired to a ScriptedProvider

use crate::listeners::SessionSubscription;
use crate::memory_provider::MemoryAuthProvider;
use crate::provider::{AuthProvider, Credential, Session};
use crate::{AccountSessionController, AuthError, AuthResult};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub const TEST_EMAIL: &str = "me@example.com";
pub const TEST_PASSWORD: &str = "123456789";

/// Provider operation, as recorded by the harness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Call {
    SignInAnonymously,
    SignInWithCredential,
    Link,
    SignOut,
    Delete,
    Subscribe,
}

/// Scripted outcome for the next call of an operation.
#[derive(Debug, Clone, Copy)]
pub enum Failure {
    /// Fail with a credential collision.
    Collision,
    /// Fail with invalid credentials.
    InvalidCredentials,
    /// Fail with a generic provider error.
    Provider,
    /// Succeed, but report no current session afterwards.
    LoseSession,
}

impl Failure {
    fn to_error(self) -> AuthError {
        match self {
            Failure::Collision => AuthError::CredentialCollision("EMAIL_EXISTS".to_string()),
            Failure::InvalidCredentials => {
                AuthError::InvalidCredentials("INVALID_PASSWORD".to_string())
            }
            Failure::Provider | Failure::LoseSession => {
                AuthError::Provider("backend unavailable".to_string())
            }
        }
    }
}

/// Provider that delegates to [`MemoryAuthProvider`] and records calls.
pub struct ScriptedProvider {
    inner: MemoryAuthProvider,
    calls: Mutex<Vec<Call>>,
    failures: Mutex<HashMap<Call, VecDeque<Failure>>>,
    session_lost: AtomicBool,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::wrap(MemoryAuthProvider::new())
    }

    pub fn restoring() -> Self {
        Self::wrap(MemoryAuthProvider::restoring())
    }

    fn wrap(inner: MemoryAuthProvider) -> Self {
        Self {
            inner,
            calls: Mutex::new(Vec::new()),
            failures: Mutex::new(HashMap::new()),
            session_lost: AtomicBool::new(false),
        }
    }

    pub fn backend(&self) -> &MemoryAuthProvider {
        &self.inner
    }

    /// Queue a failure for the next `call`.
    pub fn fail_next(&self, call: Call, failure: Failure) {
        self.failures
            .lock()
            .entry(call)
            .or_default()
            .push_back(failure);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn count(&self, call: Call) -> usize {
        self.calls().iter().filter(|c| **c == call).count()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    /// Record `call`; returns the error to fail it with, if one was queued.
    fn enter(&self, call: Call) -> Result<(), AuthError> {
        self.calls.lock().push(call);
        let next = self
            .failures
            .lock()
            .get_mut(&call)
            .and_then(VecDeque::pop_front);

        match next {
            None => Ok(()),
            Some(Failure::LoseSession) => {
                self.session_lost.store(true, Ordering::SeqCst);
                Ok(())
            }
            Some(failure) => Err(failure.to_error()),
        }
    }
}

#[async_trait]
impl AuthProvider for ScriptedProvider {
    fn current_session(&self) -> Option<Session> {
        if self.session_lost.load(Ordering::SeqCst) {
            return None;
        }
        self.inner.current_session()
    }

    async fn sign_in_anonymously(&self) -> AuthResult<Session> {
        self.enter(Call::SignInAnonymously)?;
        self.inner.sign_in_anonymously().await
    }

    async fn sign_in_with_credential(&self, credential: &Credential) -> AuthResult<Session> {
        self.enter(Call::SignInWithCredential)?;
        self.inner.sign_in_with_credential(credential).await
    }

    async fn link_current_session(&self, credential: &Credential) -> AuthResult<Session> {
        self.enter(Call::Link)?;
        self.inner.link_current_session(credential).await
    }

    fn sign_out(&self) {
        let _ = self.enter(Call::SignOut);
        self.session_lost.store(false, Ordering::SeqCst);
        self.inner.sign_out();
    }

    async fn delete_current_session(&self) -> AuthResult<()> {
        self.enter(Call::Delete)?;
        self.inner.delete_current_session().await
    }

    fn on_session_changed(&self) -> SessionSubscription {
        let _ = self.enter(Call::Subscribe);
        self.inner.on_session_changed()
    }
}

/// Controller wired to a scripted provider.
pub struct TestHarness {
    pub provider: Arc<ScriptedProvider>,
    pub controller: AccountSessionController,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_provider(ScriptedProvider::new())
    }

    pub fn with_provider(provider: ScriptedProvider) -> Self {
        let provider = Arc::new(provider);
        let controller = AccountSessionController::new(
            provider.clone(),
            Credential::email_password(TEST_EMAIL, TEST_PASSWORD),
        );
        Self {
            provider,
            controller,
        }
    }

    /// Harness whose controller is already initialized with an anonymous session.
    pub async fn initialized() -> Self {
        let harness = Self::new();
        harness.controller.initialize().await.unwrap();
        harness.provider.clear_calls();
        harness
    }

    pub fn log(&self) -> Vec<String> {
        self.controller.log_messages()
    }

    pub fn log_contains(&self, needle: &str) -> bool {
        self.log().iter().any(|line| line.contains(needle))
    }
}
