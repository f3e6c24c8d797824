//! Session management for the Select protocol
//!
//! A session represents a TCP connection to a unit and tracks:
//! - Whether the socket is open
//! - Whether the last login on it was accepted
//! - How many logins have been performed
//!
//! The protocol has no session id. Re-authenticating is a single round-trip,
//! so a session is simply re-established whenever a ping fails.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::error::{Error, Result};

/// Session state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Not connected
    Disconnected,

    /// Socket open, not logged in
    Connected,

    /// Logged in and ready for commands
    Authenticated,
}

/// Session manager
///
/// Thread-safe and can be cloned cheaply (Arc internally), so the state can
/// be observed without holding the device lock.
#[derive(Debug, Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

#[derive(Debug)]
struct SessionInner {
    /// Accepted logins since creation
    logins: AtomicU32,

    /// Current session state
    state: parking_lot::RwLock<SessionState>,
}

impl Session {
    /// Create a new disconnected session
    pub fn new() -> Self {
        Self {
            inner: Arc::new(SessionInner {
                logins: AtomicU32::new(0),
                state: parking_lot::RwLock::new(SessionState::Disconnected),
            }),
        }
    }

    /// Get current state
    pub fn state(&self) -> SessionState {
        *self.inner.state.read()
    }

    /// Check if connected
    pub fn is_connected(&self) -> bool {
        !matches!(self.state(), SessionState::Disconnected)
    }

    /// Check if authenticated
    pub fn is_authenticated(&self) -> bool {
        matches!(self.state(), SessionState::Authenticated)
    }

    /// Number of accepted logins
    pub fn login_count(&self) -> u32 {
        self.inner.logins.load(Ordering::Acquire)
    }

    /// Mark the socket as open
    pub fn open(&self) -> Result<()> {
        let mut state = self.inner.state.write();

        if *state != SessionState::Disconnected {
            return Err(Error::InvalidSessionState(format!(
                "Cannot open from state: {:?}",
                *state
            )));
        }

        *state = SessionState::Connected;
        Ok(())
    }

    /// Mark session as authenticated after an accepted login
    pub fn authenticate(&self) -> Result<()> {
        let mut state = self.inner.state.write();

        if *state != SessionState::Connected {
            return Err(Error::InvalidSessionState(format!(
                "Cannot authenticate from state: {:?}",
                *state
            )));
        }

        *state = SessionState::Authenticated;
        self.inner.logins.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }

    /// Close session
    pub fn close(&self) {
        *self.inner.state.write() = SessionState::Disconnected;
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
