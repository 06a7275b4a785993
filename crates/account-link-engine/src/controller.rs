//! Account session controller.
//!
//! Wires demo actions to provider calls and keeps the two text displays of
//! the demo screen up to date: whether auth has initialized, and the last
//! rendered status. Every outcome is also appended to the activity log.
//!
//! Link lifecycle is tracked with a rust-fsm machine. The provider stays the
//! source of truth for the session: a transition the machine rejects is
//! logged and otherwise ignored.

use crate::activity_log::ActivityLog;
use crate::link_fsm::{LinkMachine, LinkMachineInput, LinkState};
use crate::provider::{AuthProvider, Credential, Session};
use crate::status::{redact_id, render_status, StatusReport};
use crate::{AuthError, AuthResult};
use link_config_and_utils::Config;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Logged after a failed link caused by a credential collision.
pub const COLLISION_HINT: &str = "Use RESET (unlink) to restart the sample.";

/// Snapshot of what the demo screen shows.
#[derive(Debug, Clone, Serialize)]
pub struct ControllerView {
    pub auth_initialized: bool,
    pub user_status: String,
    pub link_state: LinkState,
    pub log: Vec<String>,
}

impl ControllerView {
    /// Text of the auth-init display.
    pub fn auth_status(&self) -> String {
        format!("Auth initialized: {}", self.auth_initialized)
    }
}

struct ControllerState {
    auth_initialized: bool,
    user_status: String,
    log: ActivityLog,
    fsm: LinkMachine,
}

/// Drives the anonymous → linked → reset cycle against an [`AuthProvider`].
///
/// Cheap to clone; clones share the same displays and log.
#[derive(Clone)]
pub struct AccountSessionController {
    provider: Arc<dyn AuthProvider>,
    test_credential: Arc<Credential>,
    state: Arc<Mutex<ControllerState>>,
}

impl AccountSessionController {
    /// Create a controller that links `test_credential` on request.
    pub fn new(provider: Arc<dyn AuthProvider>, test_credential: Credential) -> Self {
        Self {
            provider,
            test_credential: Arc::new(test_credential),
            state: Arc::new(Mutex::new(ControllerState {
                auth_initialized: false,
                user_status: String::new(),
                log: ActivityLog::new(),
                fsm: LinkMachine::new(),
            })),
        }
    }

    /// Create a controller using the test credential from `config`.
    pub fn from_config(provider: Arc<dyn AuthProvider>, config: &Config) -> Self {
        Self::new(
            provider,
            Credential::email_password(&config.test_email, &config.test_password),
        )
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Wait for the provider's first session notification, then either show
    /// the restored session or sign in anonymously.
    ///
    /// The subscription is closed after the first delivery, so later session
    /// changes never re-run this branch.
    pub async fn initialize(&self) -> AuthResult<Session> {
        let mut subscription = self.provider.on_session_changed();
        let first = subscription.recv().await;
        subscription.close();

        let Some(session) = first else {
            return self.fail(
                "Could not initialize auth",
                AuthError::Provider("session listener closed before first notification".into()),
            );
        };

        self.state.lock().auth_initialized = true;
        self.record("Auth state initialized.");
        self.advance(LinkMachineInput::observed(session.as_ref()));

        match session {
            Some(session) => {
                info!(user_id = %redact_id(&session.id), "restored existing session");
                self.record("Found an existing session.");
                self.display(Some(&session));
                Ok(session)
            }
            None => {
                self.record("No authenticated session found.");
                self.sign_in_anonymously().await
            }
        }
    }

    /// Ask the provider for a new anonymous session.
    pub async fn sign_in_anonymously(&self) -> AuthResult<Session> {
        self.record("Going to sign in anonymously.");

        if let Err(e) = self.provider.sign_in_anonymously().await {
            return self.fail("Could not sign in anonymously", e);
        }

        let Some(session) = self.provider.current_session() else {
            return self.fail(
                "Could not sign in anonymously",
                AuthError::MissingSession("anonymous sign-in"),
            );
        };

        info!(user_id = %redact_id(&session.id), "signed in anonymously");
        self.record("Signed in anonymously.");
        self.advance(LinkMachineInput::AnonymousSignIn);
        self.display(Some(&session));
        Ok(session)
    }

    /// Attach the test credential to the current anonymous session.
    ///
    /// Without a session, or with an already linked one, no provider call is
    /// made.
    pub async fn link_with_test_credential(&self) -> AuthResult<Session> {
        self.record("Going to sign in the test user.");

        match self.provider.current_session() {
            None => return self.fail("Can't link", AuthError::NoSession),
            Some(s) if !s.is_anonymous => return self.fail("Can't link", AuthError::AlreadyLinked),
            Some(_) => {}
        }

        if let Err(e) = self
            .provider
            .link_current_session(&self.test_credential)
            .await
        {
            let collision = e.is_collision();
            let result = self.fail("Could not link anonymous account with email sign in", e);
            if collision {
                self.record(COLLISION_HINT);
            }
            return result;
        }

        let Some(session) = self.provider.current_session() else {
            return self.fail(
                "Could not link anonymous account with email sign in",
                AuthError::MissingSession("linking"),
            );
        };

        info!(
            user_id = %redact_id(&session.id),
            providers = ?session.provider_ids,
            "linked test credential to anonymous session"
        );
        self.record("Signed in with email and linked to the anonymous account.");
        self.advance(LinkMachineInput::LinkSucceeded);
        self.display(Some(&session));
        Ok(session)
    }

    /// Discard the current session.
    pub fn sign_out(&self) {
        self.record("Going to sign out.");
        self.provider.sign_out();
        self.advance(LinkMachineInput::SignedOut);
        self.display(self.provider.current_session().as_ref());
    }

    /// Delete the test account and start over.
    ///
    /// Signs out, signs in with the test credential and deletes that account.
    /// The first failing step ends the reset. On success the log is cleared
    /// and [`initialize`](Self::initialize) runs again.
    pub async fn reset_and_restart(&self) -> AuthResult<Session> {
        self.record("Going to reset the example.");

        self.provider.sign_out();
        self.advance(LinkMachineInput::SignedOut);
        self.display(self.provider.current_session().as_ref());

        self.record("Going to delete the test account.");
        if let Err(e) = self
            .provider
            .sign_in_with_credential(&self.test_credential)
            .await
        {
            return self.fail("Reset failed", e);
        }
        self.advance(LinkMachineInput::CredentialSignIn);

        if self.provider.current_session().is_none() {
            return self.fail(
                "Reset failed",
                AuthError::MissingSession("test credential sign-in"),
            );
        }

        if let Err(e) = self.provider.delete_current_session().await {
            return self.fail("Can't delete account", e);
        }
        self.advance(LinkMachineInput::AccountDeleted);
        info!("test account deleted, restarting");
        self.record("Test account deleted. Restarting.");

        self.clear_log();
        self.advance(LinkMachineInput::Restart);
        self.initialize().await
    }

    /// Empty the activity log.
    pub fn clear_log(&self) {
        self.state.lock().log.clear();
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Status of the provider's current session, derived fresh on each call.
    pub fn status_report(&self) -> Option<StatusReport> {
        self.provider
            .current_session()
            .as_ref()
            .map(StatusReport::from_session)
    }

    /// Rendered status of the provider's current session.
    pub fn render_status(&self) -> String {
        render_status(self.provider.current_session().as_ref())
    }

    /// Snapshot of the screen.
    pub fn view(&self) -> ControllerView {
        let state = self.state.lock();
        ControllerView {
            auth_initialized: state.auth_initialized,
            user_status: state.user_status.clone(),
            link_state: LinkState::from(state.fsm.state()),
            log: state.log.messages(),
        }
    }

    pub fn link_state(&self) -> LinkState {
        LinkState::from(self.state.lock().fsm.state())
    }

    /// Activity log rendered with its header.
    pub fn render_log(&self) -> String {
        self.state.lock().log.render()
    }

    pub fn log_messages(&self) -> Vec<String> {
        self.state.lock().log.messages()
    }

    pub fn provider(&self) -> &Arc<dyn AuthProvider> {
        &self.provider
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn record(&self, message: &str) {
        debug!(entry = message, "activity");
        self.state.lock().log.push(message);
    }

    fn display(&self, session: Option<&Session>) {
        self.state.lock().user_status = render_status(session);
    }

    /// Log `error` and hand it back to the caller.
    fn fail<T>(&self, context: &str, error: AuthError) -> AuthResult<T> {
        warn!(error = %error, "{}", context);
        self.record(&format!("Error: {}. {}", context, error));
        Err(error)
    }

    /// Apply an input to the link machine.
    fn transition(&self, input: &LinkMachineInput) -> AuthResult<LinkState> {
        let mut state = self.state.lock();
        let old_state = LinkState::from(state.fsm.state());

        state.fsm.consume(input).map_err(|_| {
            AuthError::InvalidStateTransition(format!(
                "Cannot apply {:?} in state {:?}",
                input, old_state
            ))
        })?;

        let new_state = LinkState::from(state.fsm.state());
        drop(state);

        if old_state != new_state {
            debug!(
                old_state = ?old_state,
                new_state = ?new_state,
                "Link state transition"
            );
        }

        Ok(new_state)
    }

    fn advance(&self, input: LinkMachineInput) {
        if let Err(e) = self.transition(&input) {
            warn!(error = %e, "ignoring link state transition");
        }
    }
}
