use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::recording::timer::spawn_ticker;
use crate::session::machine::{InterviewSession, SessionSnapshot};

/// How often the eviction task scans for idle sessions.
pub const EVICTION_PERIOD: Duration = Duration::from_secs(60);

struct Entry {
    session: InterviewSession,
    last_active: Instant,
}

/// In-memory session registry. Sessions live until deleted, evicted as idle,
/// or the process exits.
///
/// Closures passed to `read`/`update` run under the lock and are synchronous,
/// so the lock is never held across an outbound call. Only `update` counts as
/// activity.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, Entry>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, session: InterviewSession) -> Uuid {
        let id = session.id();
        let entry = Entry {
            session,
            last_active: Instant::now(),
        };
        self.sessions.write().await.insert(id, entry);
        id
    }

    pub async fn read<R>(
        &self,
        id: Uuid,
        f: impl FnOnce(&InterviewSession) -> R,
    ) -> Result<R, AppError> {
        let sessions = self.sessions.read().await;
        let entry = sessions.get(&id).ok_or_else(|| not_found(id))?;
        Ok(f(&entry.session))
    }

    pub async fn update<R>(
        &self,
        id: Uuid,
        f: impl FnOnce(&mut InterviewSession) -> Result<R, AppError>,
    ) -> Result<R, AppError> {
        let mut sessions = self.sessions.write().await;
        let entry = sessions.get_mut(&id).ok_or_else(|| not_found(id))?;
        entry.last_active = Instant::now();
        f(&mut entry.session)
    }

    pub async fn snapshot(&self, id: Uuid) -> Result<SessionSnapshot, AppError> {
        self.read(id, InterviewSession::snapshot).await
    }

    pub async fn remove(&self, id: Uuid) -> Result<(), AppError> {
        self.sessions
            .write()
            .await
            .remove(&id)
            .map(|_| info!("Session {id} ended"))
            .ok_or_else(|| not_found(id))
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Drops sessions with no activity for at least `ttl`. Returns how many went.
    pub async fn evict_idle(&self, ttl: Duration) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|id, entry| {
            let keep = entry.last_active.elapsed() < ttl;
            if !keep {
                info!("Session {id} evicted after {}s idle", ttl.as_secs());
            }
            keep
        });
        before - sessions.len()
    }

    /// Runs `evict_idle` every `EVICTION_PERIOD` for the life of the process.
    pub fn spawn_eviction(&self, ttl: Duration) -> JoinHandle<()> {
        let store = self.clone();
        spawn_ticker(EVICTION_PERIOD, move || {
            let store = store.clone();
            async move {
                store.evict_idle(ttl).await;
                true
            }
        })
    }
}

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Session {id} not found"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::interview::SessionContext;
    use crate::session::machine::SessionPhase;

    #[tokio::test]
    async fn test_insert_update_remove() {
        let store = SessionStore::new();
        let id = store
            .insert(InterviewSession::new(SessionContext::from_params(None, None)))
            .await;
        assert_eq!(store.len().await, 1);

        store
            .update(id, |s| s.finish_loading(Ok(vec!["Q1".into()])))
            .await
            .unwrap();
        let snapshot = store.snapshot(id).await.unwrap();
        assert_eq!(snapshot.phase, SessionPhase::Ready);

        store.remove(id).await.unwrap();
        assert!(matches!(
            store.snapshot(id).await,
            Err(AppError::NotFound(_))
        ));
    }

    fn new_session() -> InterviewSession {
        InterviewSession::new(SessionContext::from_params(None, None))
    }

    #[tokio::test(start_paused = true)]
    async fn test_only_idle_sessions_are_evicted() {
        let store = SessionStore::new();
        let idle = store.insert(new_session()).await;
        let active = store.insert(new_session()).await;

        tokio::time::advance(Duration::from_secs(20 * 60)).await;
        store.update(active, |s| Ok(s.next())).await.unwrap();
        tokio::time::advance(Duration::from_secs(15 * 60)).await;

        assert_eq!(store.evict_idle(Duration::from_secs(30 * 60)).await, 1);
        assert!(matches!(
            store.snapshot(idle).await,
            Err(AppError::NotFound(_))
        ));
        assert!(store.snapshot(active).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_eviction_task_clears_abandoned_sessions() {
        let store = SessionStore::new();
        store.insert(new_session()).await;
        let handle = store.spawn_eviction(Duration::from_secs(90));

        tokio::time::sleep(Duration::from_secs(61)).await;
        assert_eq!(store.len().await, 1);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(store.len().await, 0);
        handle.abort();
    }

    #[tokio::test]
    async fn test_unknown_session_is_not_found() {
        let store = SessionStore::new();
        let result = store.update(Uuid::new_v4(), |s| Ok(s.next())).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
        assert!(matches!(
            store.remove(Uuid::new_v4()).await,
            Err(AppError::NotFound(_))
        ));
    }
}
