//! Human-readable status of the current session.
//!
//! Everything here is a pure function of the session passed in. Nothing is
//! cached, so callers re-render from the provider's current session.

use crate::provider::GENERIC_PROVIDER_ID;
use crate::Session;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Characters kept at each end of a redacted identifier.
const REDACT_KEEP: usize = 5;

/// Rendered text when the provider holds no session.
pub const NO_SESSION_STATUS: &str = "Session: none";

/// Derived view of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    /// Identifier reduced to its first and last five characters.
    pub id: String,
    pub is_anonymous: bool,
    pub provider_ids: Vec<String>,
    /// Linked account that still reports only the generic provider.
    pub is_zombie: bool,
}

impl StatusReport {
    pub fn from_session(session: &Session) -> Self {
        Self {
            id: redact_id(&session.id),
            is_anonymous: session.is_anonymous,
            provider_ids: session.provider_ids.clone(),
            is_zombie: is_zombie(session),
        }
    }
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Session:")?;
        writeln!(f)?;
        writeln!(f, "id: {}", self.id)?;
        writeln!(f, "isAnonymous: {}", self.is_anonymous)?;
        writeln!(f, "Auth providers {{")?;
        for provider_id in &self.provider_ids {
            writeln!(f, "  ProviderId: {}", provider_id)?;
        }
        writeln!(f, "}}")?;
        write!(f, "Has zombie state: {}", self.is_zombie)?;
        if self.is_zombie {
            write!(f, "\n(The value of 'isAnonymous' should be true)")?;
        }
        Ok(())
    }
}

/// A non-anonymous session whose only provider is the generic one.
pub fn is_zombie(session: &Session) -> bool {
    !session.is_anonymous
        && session.provider_ids.len() == 1
        && session.provider_ids[0] == GENERIC_PROVIDER_ID
}

/// Keep the first and last five characters of `id`.
///
/// Identifiers shorter than ten characters are returned unchanged since
/// there is nothing left to hide between the two ends.
pub fn redact_id(id: &str) -> String {
    let count = id.chars().count();
    if count < REDACT_KEEP * 2 {
        return id.to_string();
    }

    let head: String = id.chars().take(REDACT_KEEP).collect();
    let tail: String = id.chars().skip(count - REDACT_KEEP).collect();
    format!("{}...{}", head, tail)
}

/// Render the status text for an optional session.
pub fn render_status(session: Option<&Session>) -> String {
    match session {
        Some(session) => StatusReport::from_session(session).to_string(),
        None => NO_SESSION_STATUS.to_string(),
    }
}
