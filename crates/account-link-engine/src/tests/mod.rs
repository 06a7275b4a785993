//! Integration tests for the account session controller.
//!
//! - `harness.rs`    - Scripted provider that records calls and injects failures
//! - `startup.rs`    - initialize() and the one-shot session listener
//! - `linking.rs`    - Anonymous sign-in, linking, preconditions, collisions
//! - `reset.rs`      - Sign-out and the reset-and-restart cycle
//! - `identity_toolkit.rs` - REST adapter against a mock HTTP server

pub(crate) mod harness;
mod startup;
