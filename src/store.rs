//! Transactional session storage.
//!
//! The engine only needs snapshot reads and an all-or-nothing read-modify-write.
//! [`MemoryStore`] keeps sessions in process memory behind a lock.

use crate::models::{SessionError, SessionId, SessionRecord};
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

/// Storage the session operations run against.
pub trait SessionStore {
    /// Store a new session record.
    fn insert(&self, record: SessionRecord) -> Result<(), SessionError>;

    /// Consistent copy of one session. May be stale by the time it is used.
    fn snapshot(&self, id: SessionId) -> Result<SessionRecord, SessionError>;

    /// Run `f` against the current record in isolation.
    ///
    /// Changes are committed only if `f` returns `Ok`; on `Err` the stored record is untouched.
    fn transact<T, F>(&self, id: SessionId, f: F) -> Result<T, SessionError>
    where
        F: FnOnce(&mut SessionRecord) -> Result<T, SessionError>;
}

/// Per-session entry: record plus last activity time (for auto-cleanup).
struct SessionEntry {
    record: SessionRecord,
    last_activity: Instant,
}

/// In-memory store: many sessions by id.
#[derive(Default)]
pub struct MemoryStore {
    sessions: RwLock<HashMap<SessionId, SessionEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> Result<usize, SessionError> {
        let g = self.sessions.read().map_err(|_| SessionError::LockPoisoned)?;
        Ok(g.len())
    }

    pub fn is_empty(&self) -> Result<bool, SessionError> {
        Ok(self.len()? == 0)
    }

    /// Remove sessions not touched for `max_idle`. Returns how many were removed.
    pub fn purge_inactive(&self, max_idle: Duration) -> Result<usize, SessionError> {
        let mut g = self.sessions.write().map_err(|_| SessionError::LockPoisoned)?;
        let before = g.len();
        g.retain(|_, entry| entry.last_activity.elapsed() < max_idle);
        Ok(before - g.len())
    }
}

impl SessionStore for MemoryStore {
    fn insert(&self, record: SessionRecord) -> Result<(), SessionError> {
        let mut g = self.sessions.write().map_err(|_| SessionError::LockPoisoned)?;
        g.insert(
            record.id(),
            SessionEntry {
                record,
                last_activity: Instant::now(),
            },
        );
        Ok(())
    }

    fn snapshot(&self, id: SessionId) -> Result<SessionRecord, SessionError> {
        let mut g = self.sessions.write().map_err(|_| SessionError::LockPoisoned)?;
        let entry = g.get_mut(&id).ok_or(SessionError::SessionNotFound(id))?;
        entry.last_activity = Instant::now();
        Ok(entry.record.clone())
    }

    fn transact<T, F>(&self, id: SessionId, f: F) -> Result<T, SessionError>
    where
        F: FnOnce(&mut SessionRecord) -> Result<T, SessionError>,
    {
        let mut g = self.sessions.write().map_err(|_| SessionError::LockPoisoned)?;
        let entry = g.get_mut(&id).ok_or(SessionError::SessionNotFound(id))?;
        entry.last_activity = Instant::now();
        let mut working = entry.record.clone();
        let out = f(&mut working)?;
        entry.record = working;
        Ok(out)
    }
}
