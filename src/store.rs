// src/store.rs

use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};

use parking_lot::{Mutex, RwLock};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::models::session::Session;

pub type SharedSession = Arc<Mutex<Session>>;

struct StoredSession {
    session: SharedSession,
    last_access: Mutex<Instant>,
}

/// In-memory sessions keyed by id. Nothing survives a restart; sessions left
/// idle are evicted by [`SessionStore::spawn_sweeper`].
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, StoredSession>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, session: Session) -> SharedSession {
        let id = session.id();
        let shared = Arc::new(Mutex::new(session));
        self.sessions.write().insert(
            id,
            StoredSession {
                session: shared.clone(),
                last_access: Mutex::new(Instant::now()),
            },
        );
        tracing::debug!(session = %id, "Session created");
        shared
    }

    /// Looks up a session and refreshes its last-access time.
    pub fn get(&self, id: Uuid) -> Option<SharedSession> {
        let sessions = self.sessions.read();
        let stored = sessions.get(&id)?;
        *stored.last_access.lock() = Instant::now();
        Some(stored.session.clone())
    }

    /// Removes the session. Dropping it releases any open camera.
    pub fn remove(&self, id: Uuid) -> Option<SharedSession> {
        let removed = self.sessions.write().remove(&id).map(|stored| stored.session);
        if removed.is_some() {
            tracing::debug!(session = %id, "Session removed");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }

    /// Evicts sessions idle for longer than `max_idle`. Returns how many went.
    pub fn sweep_idle(&self, max_idle: Duration) -> usize {
        self.sweep_at(Instant::now(), max_idle)
    }

    fn sweep_at(&self, now: Instant, max_idle: Duration) -> usize {
        let expired: Vec<(Uuid, SharedSession)> = {
            let mut sessions = self.sessions.write();
            let ids: Vec<Uuid> = sessions
                .iter()
                .filter(|(_, stored)| now.saturating_duration_since(*stored.last_access.lock()) > max_idle)
                .map(|(id, _)| *id)
                .collect();
            ids.into_iter()
                .filter_map(|id| sessions.remove(&id).map(|stored| (id, stored.session)))
                .collect()
        };

        // A step still running elsewhere holds its own handle; the camera goes now.
        for (id, session) in &expired {
            if session.lock().draft_mut().release_camera() {
                tracing::info!(session = %id, "Camera released for idle session");
            }
        }
        if !expired.is_empty() {
            tracing::info!(evicted = expired.len(), "Swept idle sessions");
        }
        expired.len()
    }

    /// Periodically evicts idle sessions for the lifetime of the process.
    pub fn spawn_sweeper(&self, every: Duration, max_idle: Duration) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                store.sweep_idle(max_idle);
            }
        })
    }
}
