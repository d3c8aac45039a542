use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};

use crate::models::{Role, User};

/// The logged-in user, replaced wholesale on login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: String,
    pub display_name: String,
    pub role: Role,
}

impl From<User> for Identity {
    fn from(user: User) -> Self {
        Self {
            id: user.uuid,
            display_name: user.username,
            role: user.role,
        }
    }
}

#[derive(Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub credential: Option<String>,
    pub identity: Option<Identity>,
    pub renewed_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn is_empty(&self) -> bool {
        self.credential.is_none() && self.identity.is_none()
    }

    /// Time since the credential was last issued or renewed
    pub fn credential_age(&self) -> Option<Duration> {
        self.renewed_at.map(|at| Utc::now() - at)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("credential", &self.credential.as_ref().map(|_| "<redacted>"))
            .field("identity", &self.identity)
            .field("renewed_at", &self.renewed_at)
            .finish()
    }
}

/// Shared handle to the current session.
///
/// Clones share the same underlying state. Every component that needs the
/// credential or identity is handed a clone at construction time.
#[derive(Clone, Default)]
pub struct SessionState {
    inner: Arc<RwLock<Session>>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Session> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Session> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Get the bearer credential, if any
    pub fn credential(&self) -> Option<String> {
        self.read().credential.clone()
    }

    /// Set the bearer credential. An empty string clears the session.
    pub fn set_credential(&self, token: impl Into<String>) {
        let token = token.into();
        if token.is_empty() {
            self.clear();
            return;
        }

        let mut session = self.write();
        if session.credential.as_deref() == Some(token.as_str()) {
            return;
        }
        session.credential = Some(token);
        session.renewed_at = Some(Utc::now());
    }

    /// Replace `expected` with `token`, if `expected` is still the credential held.
    /// Returns false when the session was cleared or replaced in the meantime.
    pub fn replace_credential(&self, expected: &str, token: impl Into<String>) -> bool {
        let token = token.into();
        if token.is_empty() {
            return false;
        }

        let mut session = self.write();
        match session.credential.as_deref() {
            None => {
                debug!("Session cleared before renewal completed, discarding new credential");
                return false;
            }
            Some(current) if current != expected => {
                debug!("Session changed before renewal completed, discarding new credential");
                return false;
            }
            Some(current) if current == token => return true,
            Some(_) => {}
        }
        session.credential = Some(token);
        session.renewed_at = Some(Utc::now());
        true
    }

    pub fn identity(&self) -> Option<Identity> {
        self.read().identity.clone()
    }

    /// Set the logged-in identity. Requires a credential to be present.
    pub fn set_identity(&self, identity: Identity) -> bool {
        let mut session = self.write();
        if session.credential.is_none() {
            warn!(user = %identity.display_name, "Refusing to set identity without a credential");
            return false;
        }
        session.identity = Some(identity);
        true
    }

    /// A credential is held
    pub fn is_authenticated(&self) -> bool {
        self.read().credential.is_some()
    }

    /// An identity is held; this is what "logged in" means for scheduling
    pub fn is_logged_in(&self) -> bool {
        self.read().identity.is_some()
    }

    /// Clear credential and identity. Returns true if anything was cleared.
    pub fn clear(&self) -> bool {
        let mut session = self.write();
        let was_empty = session.is_empty();
        *session = Session::default();
        !was_empty
    }

    pub fn snapshot(&self) -> Session {
        self.read().clone()
    }
}

impl fmt::Debug for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SessionState").field(&*self.read()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> Identity {
        Identity {
            id: "0e65066c-ab20-4da0-b3bf-79dfd0668049".to_string(),
            display_name: "admin".to_string(),
            role: Role::Superadmin,
        }
    }

    #[test]
    fn test_new_session_is_empty() {
        let state = SessionState::new();
        assert!(state.snapshot().is_empty());
        assert!(!state.is_authenticated());
        assert!(!state.is_logged_in());
    }

    #[test]
    fn test_clones_share_state() {
        let state = SessionState::new();
        let other = state.clone();
        state.set_credential("abc");
        assert_eq!(other.credential().as_deref(), Some("abc"));
    }

    #[test]
    fn test_set_same_credential_is_noop() {
        let state = SessionState::new();
        state.set_credential("abc");
        let first = state.snapshot();
        state.set_credential("abc");
        assert_eq!(state.snapshot(), first);
    }

    #[test]
    fn test_empty_credential_clears() {
        let state = SessionState::new();
        state.set_credential("abc");
        assert!(state.set_identity(identity()));
        state.set_credential("");
        assert!(state.snapshot().is_empty());
    }

    #[test]
    fn test_identity_requires_credential() {
        let state = SessionState::new();
        assert!(!state.set_identity(identity()));
        assert!(!state.is_logged_in());

        state.set_credential("abc");
        assert!(state.set_identity(identity()));
        assert_eq!(state.identity(), Some(identity()));
    }

    #[test]
    fn test_replace_credential_keeps_identity() {
        let state = SessionState::new();
        state.set_credential("abc");
        state.set_identity(identity());

        assert!(state.replace_credential("abc", "xyz"));
        assert_eq!(state.credential().as_deref(), Some("xyz"));
        assert_eq!(state.identity(), Some(identity()));
    }

    #[test]
    fn test_replace_credential_after_clear_is_discarded() {
        let state = SessionState::new();
        assert!(!state.replace_credential("abc", "xyz"));
        assert_eq!(state.credential(), None);
    }

    #[test]
    fn test_replace_credential_from_older_session_is_discarded() {
        let state = SessionState::new();
        state.set_credential("old");
        state.clear();
        state.set_credential("new");
        state.set_identity(identity());

        assert!(!state.replace_credential("old", "renewed-from-old"));
        assert_eq!(state.credential().as_deref(), Some("new"));
        assert_eq!(state.identity(), Some(identity()));
    }

    #[test]
    fn test_clear_reports_change() {
        let state = SessionState::new();
        assert!(!state.clear());

        state.set_credential("abc");
        assert!(state.clear());
        assert!(!state.clear());
    }

    #[test]
    fn test_debug_hides_credential() {
        let state = SessionState::new();
        state.set_credential("super-secret-token");
        let debug = format!("{:?}", state);
        assert!(!debug.contains("super-secret-token"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_credential_age() {
        let state = SessionState::new();
        assert!(state.snapshot().credential_age().is_none());
        state.set_credential("abc");
        let age = state.snapshot().credential_age().expect("renewed_at should be set");
        assert!(age.num_minutes() <= 1);
    }
}
