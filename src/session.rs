//! The auth-session contract consumed by the dispatcher: read the current
//! access token, and reset to a logged-out state on authorization failures.

use std::sync::RwLock;

/// External contract of the authentication token store. Only the parts the
/// dispatcher consumes are modelled; the store's own state machine lives
/// elsewhere.
pub trait SessionStore: Send + Sync {
    /// The current access token, when a session is active.
    fn access_token(&self) -> Option<String>;

    /// Clear locally persisted session markers. Idempotent.
    fn destroy(&self);

    /// Flip the process-wide session flag.
    fn set_session(&self, active: bool);

    /// Whether a session is currently marked active.
    fn has_session(&self) -> bool;
}

#[derive(Debug, Default)]
struct SessionState {
    token: Option<String>,
    active: bool,
}

/// In-memory [`SessionStore`]. Writes are last-writer-wins, which is safe
/// because the logged-out transition is idempotent.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    state: RwLock<SessionState>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with an active session holding the given token.
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            state: RwLock::new(SessionState {
                token: Some(token.into()),
                active: true,
            }),
        }
    }

    pub fn set_token(&self, token: Option<String>) {
        let mut state = self.state.write().unwrap();
        state.active = token.is_some();
        state.token = token;
    }
}

impl SessionStore for MemorySessionStore {
    fn access_token(&self) -> Option<String> {
        self.state.read().unwrap().token.clone()
    }

    fn destroy(&self) {
        self.state.write().unwrap().token = None;
    }

    fn set_session(&self, active: bool) {
        self.state.write().unwrap().active = active;
    }

    fn has_session(&self) -> bool {
        self.state.read().unwrap().active
    }
}
