//! Authentication provider interface and the session model it exposes.
//!
//! The controller never creates or destroys sessions itself. It asks an
//! [`AuthProvider`] for transitions and reads back whatever session the
//! provider reports.

use crate::listeners::SessionSubscription;
use crate::AuthResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Provider id reported by the generic backend entry.
pub const GENERIC_PROVIDER_ID: &str = "firebase";

/// Provider id of email/password credentials.
pub const PASSWORD_PROVIDER_ID: &str = "password";

/// Authenticated session as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Unique, stable account identifier (preserved across linking).
    pub id: String,
    /// True while no durable credential is attached.
    pub is_anonymous: bool,
    /// Linked provider identifiers, in provider order.
    pub provider_ids: Vec<String>,
    /// Email of the linked password credential, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Session {
    /// Create an anonymous session with no linked providers.
    pub fn anonymous(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            is_anonymous: true,
            provider_ids: Vec::new(),
            email: None,
        }
    }
}

/// Kind of durable credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialKind {
    /// Email + password.
    Password,
}

impl CredentialKind {
    /// Provider id this credential shows up as once linked.
    pub fn provider_id(&self) -> &'static str {
        match self {
            CredentialKind::Password => PASSWORD_PROVIDER_ID,
        }
    }
}

/// A durable credential to sign in with or link to an anonymous session.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub kind: CredentialKind,
    /// Email for password credentials.
    pub identifier: String,
    secret: String,
}

impl Credential {
    /// Email/password credential.
    pub fn email_password(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            kind: CredentialKind::Password,
            identifier: email.into(),
            secret: password.into(),
        }
    }

    /// The secret part (password).
    pub fn secret(&self) -> &str {
        &self.secret
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("kind", &self.kind)
            .field("identifier", &self.identifier)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// External authentication backend.
///
/// Implementations own credential issuance, session lifecycle and error
/// classification. Every mutating call resolves once the backend answers.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Session currently held by the provider, if any.
    fn current_session(&self) -> Option<Session>;

    /// Start a new anonymous session.
    async fn sign_in_anonymously(&self) -> AuthResult<Session>;

    /// Sign in to an existing account with a durable credential.
    async fn sign_in_with_credential(&self, credential: &Credential) -> AuthResult<Session>;

    /// Attach `credential` to the current session, keeping its id.
    ///
    /// Fails with [`crate::AuthError::CredentialCollision`] when the
    /// credential already belongs to another account.
    async fn link_current_session(&self, credential: &Credential) -> AuthResult<Session>;

    /// Drop the current session locally.
    fn sign_out(&self);

    /// Delete the account behind the current session and sign out.
    async fn delete_current_session(&self) -> AuthResult<()>;

    /// Register for session-change notifications.
    ///
    /// The first delivery reports the session once the provider has finished
    /// restoring its state. Close the returned handle to unregister.
    fn on_session_changed(&self) -> SessionSubscription;
}
