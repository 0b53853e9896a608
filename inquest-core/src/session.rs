//! Ephemeral per-investigation sessions and their event log.
//!
//! A session is an append-only event record keyed by an unguessable token.
//! The engine is the only producer; the delivery subsystem is the only
//! consumer. The store is an explicit object passed by `Arc` to whoever
//! needs it — there is no process-wide global.

use crate::error::SessionError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

/// One event in a session's log.
///
/// Serializes to the wire shape the stream endpoint sends:
/// `{"log": "..."}`, `{"report": "..."}`, or `"end"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionEvent {
    Log(String),
    Report(String),
    End,
}

/// The event record for one investigation.
#[derive(Debug)]
struct Session {
    events: Vec<SessionEvent>,
    closed: bool,
    closed_at: Option<DateTime<Utc>>,
    #[allow(dead_code)]
    created_at: DateTime<Utc>,
}

impl Session {
    fn new() -> Self {
        Self {
            events: Vec::new(),
            closed: false,
            closed_at: None,
            created_at: Utc::now(),
        }
    }
}

/// Store of live sessions, keyed by token.
///
/// Single producer / single consumer per session; the mutex provides the
/// publish-before-read ordering the polling reader relies on.
pub struct SessionStore {
    inner: Mutex<HashMap<String, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
        }
    }

    /// Allocate a new session and return its opaque token.
    pub fn create(&self) -> String {
        let token = Uuid::new_v4().to_string();
        self.inner
            .lock()
            .unwrap()
            .insert(token.clone(), Session::new());
        debug!(token = %token, "Created session");
        token
    }

    /// Append one event to a session's log.
    ///
    /// Appending [`SessionEvent::End`] closes the session; appending anything
    /// to a closed session is an error.
    pub fn append(&self, token: &str, event: SessionEvent) -> Result<(), SessionError> {
        let mut sessions = self.inner.lock().unwrap();
        let session = sessions.get_mut(token).ok_or_else(|| SessionError::NotFound {
            token: token.to_string(),
        })?;
        if session.closed {
            return Err(SessionError::Closed {
                token: token.to_string(),
            });
        }
        if event == SessionEvent::End {
            session.closed = true;
            session.closed_at = Some(Utc::now());
        }
        session.events.push(event);
        Ok(())
    }

    /// Read all events at or after `offset`, in order.
    pub fn read_from(&self, token: &str, offset: usize) -> Result<Vec<SessionEvent>, SessionError> {
        let sessions = self.inner.lock().unwrap();
        let session = sessions.get(token).ok_or_else(|| SessionError::NotFound {
            token: token.to_string(),
        })?;
        Ok(session.events.get(offset..).unwrap_or_default().to_vec())
    }

    /// Whether a session with this token currently exists.
    pub fn contains(&self, token: &str) -> bool {
        self.inner.lock().unwrap().contains_key(token)
    }

    /// Delete a session, invalidating its token.
    pub fn remove(&self, token: &str) -> Result<(), SessionError> {
        match self.inner.lock().unwrap().remove(token) {
            Some(_) => {
                debug!(token = %token, "Removed session");
                Ok(())
            }
            None => Err(SessionError::NotFound {
                token: token.to_string(),
            }),
        }
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().unwrap().is_empty()
    }

    /// Remove closed sessions whose client never drained them within `ttl`.
    ///
    /// Open sessions are never swept: their investigation still owns them.
    /// Returns the number of sessions removed.
    pub fn sweep_expired(&self, ttl: Duration) -> usize {
        self.sweep_expired_at(ttl, Utc::now())
    }

    fn sweep_expired_at(&self, ttl: Duration, now: DateTime<Utc>) -> usize {
        let ttl = chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX);
        let mut sessions = self.inner.lock().unwrap();
        let before = sessions.len();
        sessions.retain(|token, session| {
            let expired = session
                .closed_at
                .is_some_and(|closed_at| now - closed_at > ttl);
            if expired {
                debug!(token = %token, "Sweeping abandoned session");
            }
            !expired
        });
        before - sessions.len()
    }

    #[cfg(test)]
    fn backdate_close(&self, token: &str, closed_at: DateTime<Utc>) {
        let mut sessions = self.inner.lock().unwrap();
        let session = sessions.get_mut(token).unwrap();
        session.closed_at = Some(closed_at);
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
