//! Identity Toolkit REST adapter.
//!
//! Thin client over the `accounts:*` endpoints. The backend does all the
//! authentication work; this adapter keeps the current id token in memory
//! only and never refreshes it. Works against the hosted API or a local
//! emulator, depending on the configured base URL.
//!
//! The web API key is sent as a header and must never be part of a URL:
//! transport errors print the request URL, and those errors are logged.

use crate::error::{AuthError, AuthResult};
use crate::listeners::{SessionListeners, SessionSubscription};
use crate::provider::{AuthProvider, Credential, Session};
use crate::status::redact_id;
use async_trait::async_trait;
use link_config_and_utils::Config;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

/// Header carrying the web API key.
const API_KEY_HEADER: &str = "X-Goog-Api-Key";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SignUpRequest {
    return_secure_token: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LinkRequest<'a> {
    id_token: &'a str,
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct IdTokenRequest<'a> {
    id_token: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    id_token: String,
    local_id: String,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<UserRecord>,
}

/// Account as returned by `accounts:lookup`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserRecord {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    provider_user_info: Vec<ProviderUserInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProviderUserInfo {
    provider_id: String,
}

impl UserRecord {
    /// An account with no linked provider and no email is anonymous.
    fn into_session(self) -> Session {
        let is_anonymous = self.provider_user_info.is_empty() && self.email.is_none();
        Session {
            id: self.local_id,
            is_anonymous,
            provider_ids: self
                .provider_user_info
                .into_iter()
                .map(|p| p.provider_id)
                .collect(),
            email: self.email,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

struct SignedIn {
    session: Session,
    id_token: String,
}

/// [`AuthProvider`] backed by the Identity Toolkit REST API.
pub struct IdentityToolkitProvider {
    http_client: reqwest::Client,
    api_url: String,
    api_key: String,
    signed_in: Mutex<Option<SignedIn>>,
    listeners: SessionListeners,
}

impl IdentityToolkitProvider {
    /// Create a provider.
    ///
    /// # Arguments
    /// * `api_url` - API base, e.g. `https://identitytoolkit.googleapis.com/v1`
    /// * `api_key` - Web API key of the project
    pub fn new(api_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let api_url: String = api_url.into();
        Self {
            http_client: reqwest::Client::new(),
            api_url: api_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            signed_in: Mutex::new(None),
            listeners: SessionListeners::new(None),
        }
    }

    /// Create a provider from the validated base URL and API key in `config`.
    pub fn from_config(config: &Config) -> AuthResult<Self> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            AuthError::Config("api_key is required for the identity toolkit provider".to_string())
        })?;
        let api_url = config.identity_toolkit_url()?;
        Ok(Self::new(api_url.as_str(), api_key))
    }

    /// Build the URL for an `accounts:*` method.
    fn endpoint(&self, method: &str) -> String {
        format!("{}/accounts:{}", self.api_url, method)
    }

    async fn call<B, R>(&self, method: &str, body: &B) -> AuthResult<R>
    where
        B: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        debug!(method, "identity toolkit request");

        let response = self
            .http_client
            .post(self.endpoint(method))
            .header("Accept", "application/json")
            .header(API_KEY_HEADER, &self.api_key)
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let err = error_from_body(&body)
                .unwrap_or_else(|| AuthError::Provider(format!("{} failed: {}", method, status)));
            error!(method, status = %status, error = %err, "identity toolkit request failed");
            return Err(err);
        }

        Ok(response.json().await?)
    }

    async fn lookup(&self, id_token: &str) -> AuthResult<Session> {
        let response: LookupResponse = self.call("lookup", &IdTokenRequest { id_token }).await?;
        response
            .users
            .into_iter()
            .next()
            .map(UserRecord::into_session)
            .ok_or_else(|| AuthError::UserNotFound("lookup returned no account".to_string()))
    }

    fn current_token(&self) -> AuthResult<String> {
        self.signed_in
            .lock()
            .as_ref()
            .map(|s| s.id_token.clone())
            .ok_or_else(|| AuthError::Provider("No user is signed in".to_string()))
    }

    fn store(&self, session: Session, id_token: String, notify: bool) {
        *self.signed_in.lock() = Some(SignedIn {
            session: session.clone(),
            id_token,
        });
        if notify {
            self.listeners.notify(Some(session));
        }
    }

    fn clear(&self) {
        let had_session = self.signed_in.lock().take().is_some();
        if had_session {
            self.listeners.notify(None);
        }
    }
}

#[async_trait]
impl AuthProvider for IdentityToolkitProvider {
    fn current_session(&self) -> Option<Session> {
        self.signed_in.lock().as_ref().map(|s| s.session.clone())
    }

    async fn sign_in_anonymously(&self) -> AuthResult<Session> {
        if let Some(session) = self.current_session().filter(|s| s.is_anonymous) {
            return Ok(session);
        }

        let token: TokenResponse = self
            .call(
                "signUp",
                &SignUpRequest {
                    return_secure_token: true,
                },
            )
            .await?;

        let session = Session::anonymous(token.local_id);
        debug!(user_id = %redact_id(&session.id), "anonymous account created");
        self.store(session.clone(), token.id_token, true);
        Ok(session)
    }

    async fn sign_in_with_credential(&self, credential: &Credential) -> AuthResult<Session> {
        let token: TokenResponse = self
            .call(
                "signInWithPassword",
                &PasswordRequest {
                    email: &credential.identifier,
                    password: credential.secret(),
                    return_secure_token: true,
                },
            )
            .await?;

        let session = self.lookup(&token.id_token).await?;
        self.store(session.clone(), token.id_token, true);
        Ok(session)
    }

    async fn link_current_session(&self, credential: &Credential) -> AuthResult<Session> {
        let id_token = self.current_token()?;

        let token: TokenResponse = self
            .call(
                "update",
                &LinkRequest {
                    id_token: &id_token,
                    email: &credential.identifier,
                    password: credential.secret(),
                    return_secure_token: true,
                },
            )
            .await?;

        let session = self.lookup(&token.id_token).await?;
        self.store(session.clone(), token.id_token, false);
        Ok(session)
    }

    fn sign_out(&self) {
        self.clear();
    }

    async fn delete_current_session(&self) -> AuthResult<()> {
        let id_token = self.current_token()?;
        let _: serde_json::Value = self
            .call(
                "delete",
                &IdTokenRequest {
                    id_token: &id_token,
                },
            )
            .await?;
        self.clear();
        Ok(())
    }

    fn on_session_changed(&self) -> SessionSubscription {
        self.listeners.subscribe()
    }
}

/// Map an error response body to an [`AuthError`].
///
/// Messages look like `EMAIL_EXISTS` or `WEAK_PASSWORD : Password should be
/// at least 6 characters`; only the code before ` : ` is matched.
fn error_from_body(body: &str) -> Option<AuthError> {
    let envelope: ErrorEnvelope = serde_json::from_str(body).ok()?;
    Some(map_error_message(&envelope.error.message))
}

fn map_error_message(message: &str) -> AuthError {
    let code = message.split(" : ").next().unwrap_or(message).trim();
    match code {
        "EMAIL_EXISTS" | "CREDENTIAL_ALREADY_IN_USE" => {
            AuthError::CredentialCollision(message.to_string())
        }
        "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" => {
            AuthError::InvalidCredentials(message.to_string())
        }
        "EMAIL_NOT_FOUND" | "USER_NOT_FOUND" => AuthError::UserNotFound(message.to_string()),
        _ => AuthError::Provider(message.to_string()),
    }
}
