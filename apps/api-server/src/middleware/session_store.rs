//! Server-side session storage.
//!
//! The cookie only carries an opaque key; the state lives here, so purging a
//! session on logout makes every copy of its cookie worthless.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration as StdDuration, Instant};

use actix_session::storage::{LoadError, SaveError, SessionKey, SessionStore, UpdateError};
use actix_web::cookie::time::Duration;
use tokio::sync::RwLock;
use usof_core::ports::TokenGenerator;
use usof_infra::HexTokenGenerator;

type SessionState = HashMap<String, String>;

struct Entry {
    state: SessionState,
    expires_at: Instant,
}

impl Entry {
    fn new(state: SessionState, ttl: &Duration) -> Self {
        Self {
            state,
            expires_at: deadline(ttl),
        }
    }

    fn is_live(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

fn deadline(ttl: &Duration) -> Instant {
    let secs = u64::try_from(ttl.whole_seconds()).unwrap_or(0);
    Instant::now() + StdDuration::from_secs(secs)
}

/// Process-wide session map shared by every worker. Clones share the map.
#[derive(Clone, Default)]
pub struct MemorySessionStore {
    sessions: Arc<RwLock<HashMap<String, Entry>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    async fn load(&self, session_key: &SessionKey) -> Result<Option<SessionState>, LoadError> {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        match sessions.get(session_key.as_ref()) {
            Some(entry) if entry.is_live(now) => Ok(Some(entry.state.clone())),
            Some(_) => {
                sessions.remove(session_key.as_ref());
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn save(
        &self,
        session_state: SessionState,
        ttl: &Duration,
    ) -> Result<SessionKey, SaveError> {
        let key = HexTokenGenerator.generate();
        let session_key = SessionKey::try_from(key.clone())
            .map_err(|err| SaveError::Other(anyhow::Error::new(err)))?;

        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, entry| entry.is_live(now));
        sessions.insert(key, Entry::new(session_state, ttl));
        Ok(session_key)
    }

    async fn update(
        &self,
        session_key: SessionKey,
        session_state: SessionState,
        ttl: &Duration,
    ) -> Result<SessionKey, UpdateError> {
        if let Some(entry) = self.sessions.write().await.get_mut(session_key.as_ref()) {
            *entry = Entry::new(session_state, ttl);
            return Ok(session_key);
        }
        // Deleted or expired in the meantime: start over under a new key.
        self.save(session_state, ttl).await.map_err(|err| match err {
            SaveError::Serialization(e) => UpdateError::Serialization(e),
            SaveError::Other(e) => UpdateError::Other(e),
        })
    }

    async fn update_ttl(&self, session_key: &SessionKey, ttl: &Duration) -> anyhow::Result<()> {
        if let Some(entry) = self.sessions.write().await.get_mut(session_key.as_ref()) {
            entry.expires_at = deadline(ttl);
        }
        Ok(())
    }

    async fn delete(&self, session_key: &SessionKey) -> anyhow::Result<()> {
        self.sessions.write().await.remove(session_key.as_ref());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(user_id: &str) -> SessionState {
        HashMap::from([("user_id".to_string(), user_id.to_string())])
    }

    #[actix_web::test]
    async fn test_deleted_session_cannot_be_loaded() {
        let store = MemorySessionStore::new();
        let key = store.save(state("1"), &Duration::hours(1)).await.unwrap();
        assert_eq!(key.as_ref().len(), 64);

        let loaded = store.load(&key).await.unwrap().unwrap();
        assert_eq!(loaded["user_id"], "1");

        store.delete(&key).await.unwrap();
        assert!(store.load(&key).await.unwrap().is_none());
    }

    #[actix_web::test]
    async fn test_expired_session_is_dropped() {
        let store = MemorySessionStore::new();
        let key = store.save(state("1"), &Duration::ZERO).await.unwrap();
        assert!(store.load(&key).await.unwrap().is_none());
    }

    #[actix_web::test]
    async fn test_update_of_missing_session_issues_new_key() {
        let store = MemorySessionStore::new();
        let key = store.save(state("1"), &Duration::hours(1)).await.unwrap();
        let stale = SessionKey::try_from(key.as_ref().to_string()).unwrap();
        store.delete(&key).await.unwrap();

        let fresh = store
            .update(stale, state("2"), &Duration::hours(1))
            .await
            .unwrap();
        assert_ne!(fresh.as_ref(), key.as_ref());
        assert_eq!(store.load(&fresh).await.unwrap().unwrap()["user_id"], "2");
    }
}
