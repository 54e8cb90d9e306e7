//! In-memory session registry
//!
//! Sessions idle for longer than the configured TTL are dropped: a lookup
//! of an expired session fails as if it never existed, and every new
//! session sweeps out the expired ones.

use sonoreport_core::Session;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::error::AppError;

/// Shared handle to one session. The mutex is held for a whole action,
/// gateway calls included, so a session never runs two actions at once.
pub type SessionHandle = Arc<Mutex<Session>>;

struct Entry {
    session: SessionHandle,
    last_used: Instant,
}

impl Entry {
    fn expired(&self, ttl: Option<Duration>, now: Instant) -> bool {
        ttl.is_some_and(|ttl| now.duration_since(self.last_used) > ttl)
    }
}

/// All live sessions, keyed by id
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, Entry>>>,
    /// `None` keeps sessions until they are deleted
    ttl: Option<Duration>,
}

impl SessionStore {
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            sessions: Arc::default(),
            ttl,
        }
    }

    /// Open a fresh session and return its id
    pub async fn create(&self) -> Uuid {
        let session = Session::new();
        let id = session.id();
        let now = Instant::now();

        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, entry| !entry.expired(self.ttl, now));
        let evicted = before - sessions.len();
        sessions.insert(
            id,
            Entry {
                session: Arc::new(Mutex::new(session)),
                last_used: now,
            },
        );
        drop(sessions);

        if evicted > 0 {
            tracing::info!(evicted = evicted, "Expired sessions dropped");
        }
        tracing::info!(session_id = %id, "Session created");
        id
    }

    /// Look up a session and mark it as used
    pub async fn get(&self, id: Uuid) -> Result<SessionHandle, AppError> {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;

        match sessions.get_mut(&id) {
            Some(entry) if !entry.expired(self.ttl, now) => {
                entry.last_used = now;
                Ok(entry.session.clone())
            }
            Some(_) => {
                sessions.remove(&id);
                tracing::info!(session_id = %id, "Session expired");
                Err(not_found(id))
            }
            None => Err(not_found(id)),
        }
    }

    pub async fn remove(&self, id: Uuid) -> Result<(), AppError> {
        match self.sessions.write().await.remove(&id) {
            Some(_) => {
                tracing::info!(session_id = %id, "Session closed");
                Ok(())
            }
            None => Err(not_found(id)),
        }
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Session {} not found", id))
}
