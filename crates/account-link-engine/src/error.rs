//! Authentication error types.

use thiserror::Error;

/// Authentication error type.
#[derive(Error, Debug)]
pub enum AuthError {
    /// Linking requires an existing (anonymous) session
    #[error("For test purposes you can not sign in without an anonymous account")]
    NoSession,

    /// The current session already has a durable credential
    #[error("Can't sign in, user is already authenticated")]
    AlreadyLinked,

    /// The credential being linked already belongs to another account
    #[error("Credential already in use by another account: {0}")]
    CredentialCollision(String),

    /// Wrong email or password
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// No account exists for the credential
    #[error("User not found: {0}")]
    UserNotFound(String),

    /// The provider reported success but exposes no current session
    #[error("Session missing after {0}")]
    MissingSession(&'static str),

    /// Any other failure reported by the provider
    #[error("Provider error: {0}")]
    Provider(String),

    /// Invalid state transition in the link FSM
    #[error("Invalid link state transition: {0}")]
    InvalidStateTransition(String),

    /// HTTP request error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AuthError {
    /// Returns true for the one failure that gets a remediation hint.
    pub fn is_collision(&self) -> bool {
        matches!(self, AuthError::CredentialCollision(_))
    }
}

impl From<link_config_and_utils::CoreError> for AuthError {
    fn from(err: link_config_and_utils::CoreError) -> Self {
        AuthError::Config(err.to_string())
    }
}

/// Result type alias using AuthError.
pub type AuthResult<T> = Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_collision() {
        assert!(AuthError::CredentialCollision("EMAIL_EXISTS".to_string()).is_collision());
        assert!(!AuthError::InvalidCredentials("bad password".to_string()).is_collision());
        assert!(!AuthError::NoSession.is_collision());
    }

    #[test]
    fn test_display_messages() {
        assert_eq!(
            AuthError::MissingSession("anonymous sign-in").to_string(),
            "Session missing after anonymous sign-in"
        );
        assert!(AuthError::CredentialCollision("EMAIL_EXISTS".to_string())
            .to_string()
            .contains("EMAIL_EXISTS"));
    }
}
