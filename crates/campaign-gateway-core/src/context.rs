//! Per-request user context.

use serde::{Deserialize, Serialize};

/// The live account record for the caller of a protected request.
///
/// Built from the identity backend's answer for a validated token. It lives
/// for the duration of one request and is never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserContext {
    /// Canonical account identifier.
    pub id: String,
    /// Account email address.
    pub email: String,
    /// Role name. May contain non-ASCII characters.
    pub role: String,
    /// Whether the account is currently active.
    pub is_active: bool,
}

impl UserContext {
    /// Whether `subject` (a token `sub` claim) names this account.
    ///
    /// Tokens may carry either the account id or the email as subject.
    #[must_use]
    pub fn matches_subject(&self, subject: &str) -> bool {
        self.id == subject || self.email.eq_ignore_ascii_case(subject)
    }
}
