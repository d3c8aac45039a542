use std::fmt;

use super::Identity;

/// Why a session was terminated without the user asking for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminationReason {
    /// A request outside the renewal endpoint was rejected with 401
    Unauthorized { path: String },
    /// Scheduled renewal failed
    RenewalFailed(String),
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminationReason::Unauthorized { path } => write!(f, "request to {} was rejected", path),
            TerminationReason::RenewalFailed(reason) => write!(f, "token renewal failed: {}", reason),
        }
    }
}

/// Session lifecycle notifications.
///
/// The UI layer subscribes to these and navigates to its login surface on
/// `Terminated`. The core never navigates by itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    LoggedIn(Identity),
    Renewed,
    LoggedOut,
    Terminated(TerminationReason),
}
