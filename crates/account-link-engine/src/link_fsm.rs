//! Account link state machine using rust-fsm.
//!
//! Tracks where the demo stands in the anonymous → linked cycle. The
//! provider stays the source of truth for the session itself; this machine
//! records which transitions the controller has observed.
//!
//! ## State Diagram
//!
//! ```text
//! ┌─────────────────┐
//! │  Uninitialized  │ (initial)
//! └────────┬────────┘
//!          │ NoSessionFound / AnonymousSessionFound / LinkedSessionFound
//!          ▼
//! ┌─────────────────┐  AnonymousSignIn   ┌──────────────────┐
//! │    NoSession    │ ─────────────────► │ AnonymousSession │
//! └──┬───────────┬──┘ ◄───────────────── └────────┬─────────┘
//!    │  ▲        │        SignedOut               │ LinkSucceeded
//!    │  │        │ CredentialSignIn               ▼
//!    │  │        │                       ┌──────────────────┐
//!    │  │        └─────────────────────► │  LinkedSession   │
//!    │  └─────────────────────────────── └──────────────────┘
//!    │       SignedOut / AccountDeleted
//!    │ Restart
//!    ▼
//!  Uninitialized
//! ```

use crate::Session;
use rust_fsm::*;
use serde::{Deserialize, Serialize};

state_machine! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub link_machine(Uninitialized)

    Uninitialized => {
        // First session-change notification after initialize()
        NoSessionFound => NoSession,
        AnonymousSessionFound => AnonymousSession,
        LinkedSessionFound => LinkedSession,
        AnonymousSignIn => AnonymousSession,
        SignedOut => NoSession
    },
    NoSession => {
        AnonymousSignIn => AnonymousSession,
        // Reset signs in with the test credential before deleting it
        CredentialSignIn => LinkedSession,
        SignedOut => NoSession,
        Restart => Uninitialized
    },
    AnonymousSession => {
        AnonymousSignIn => AnonymousSession,
        LinkSucceeded => LinkedSession,
        SignedOut => NoSession
    },
    LinkedSession => {
        AnonymousSignIn => AnonymousSession,
        SignedOut => NoSession,
        AccountDeleted => NoSession
    }
}

pub use link_machine::Input as LinkMachineInput;
pub use link_machine::State as LinkMachineState;
pub use link_machine::StateMachine as LinkMachine;

impl LinkMachineInput {
    /// Input for the session reported by the first provider notification.
    pub fn observed(session: Option<&Session>) -> Self {
        match session {
            None => LinkMachineInput::NoSessionFound,
            Some(s) if s.is_anonymous => LinkMachineInput::AnonymousSessionFound,
            Some(_) => LinkMachineInput::LinkedSessionFound,
        }
    }
}

/// Link state for display and serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkState {
    /// initialize() has not seen the provider yet.
    Uninitialized,
    /// No session.
    NoSession,
    /// Anonymous session, no durable credential.
    AnonymousSession,
    /// Session with a durable credential attached.
    LinkedSession,
}

impl From<&LinkMachineState> for LinkState {
    fn from(state: &LinkMachineState) -> Self {
        match state {
            LinkMachineState::Uninitialized => LinkState::Uninitialized,
            LinkMachineState::NoSession => LinkState::NoSession,
            LinkMachineState::AnonymousSession => LinkState::AnonymousSession,
            LinkMachineState::LinkedSession => LinkState::LinkedSession,
        }
    }
}

impl std::fmt::Display for LinkState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            LinkState::Uninitialized => "uninitialized",
            LinkState::NoSession => "no session",
            LinkState::AnonymousSession => "anonymous session",
            LinkState::LinkedSession => "linked session",
        };
        f.write_str(label)
    }
}
