//! Anonymous-to-permanent account linking engine.
//!
//! This crate provides:
//! - The `AuthProvider` seam and the session/credential model
//! - An in-memory backend and an Identity Toolkit REST adapter
//! - Explicit FSM-based tracking of the link lifecycle
//! - The account session controller driving the demo
//! - Status rendering with redacted identifiers

mod activity_log;
mod controller;
mod error;
mod identity_toolkit;
mod link_fsm;
mod listeners;
mod memory_provider;
mod provider;
mod status;

pub use activity_log::{ActivityLog, LogEntry, LOG_HEADER};
pub use controller::{AccountSessionController, ControllerView, COLLISION_HINT};
pub use error::{AuthError, AuthResult};
pub use identity_toolkit::IdentityToolkitProvider;
pub use link_fsm::link_machine;
pub use link_fsm::{LinkMachine, LinkMachineInput, LinkMachineState, LinkState};
pub use listeners::{SessionChange, SessionListeners, SessionSubscription};
pub use memory_provider::MemoryAuthProvider;
pub use provider::{
    AuthProvider, Credential, CredentialKind, Session, GENERIC_PROVIDER_ID, PASSWORD_PROVIDER_ID,
};
pub use status::{is_zombie, redact_id, render_status, StatusReport, NO_SESSION_STATUS};

#[cfg(test)]
mod tests;
