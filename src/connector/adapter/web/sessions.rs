use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::application::SharedSession;
use crate::domain::ChatSession;

pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);
pub const DEFAULT_MAX_SESSIONS: usize = 1024;

struct Entry {
    session: SharedSession,
    last_seen: Instant,
}

/// Live chat sessions of the web surface, keyed by session id.
///
/// A session lives from the page load that created it until the next reload
/// of that tab, an explicit `DELETE /api/session`, or `idle_timeout` without
/// any request naming it. At most `max_sessions` are kept; creating one more
/// evicts the least recently used.
pub struct SessionRegistry {
    sessions: Mutex<HashMap<String, Entry>>,
    idle_timeout: Duration,
    max_sessions: usize,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::with_limits(DEFAULT_IDLE_TIMEOUT, DEFAULT_MAX_SESSIONS)
    }

    pub fn with_limits(idle_timeout: Duration, max_sessions: usize) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            idle_timeout,
            max_sessions: max_sessions.max(1),
        }
    }

    pub fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }

    pub async fn create(&self) -> (String, SharedSession) {
        let session = ChatSession::new();
        let id = session.id().to_string();
        let shared = Arc::new(Mutex::new(session));

        let mut sessions = self.sessions.lock().await;
        Self::expire(&mut sessions, self.idle_timeout);
        while sessions.len() >= self.max_sessions {
            let Some(oldest) = sessions
                .iter()
                .min_by_key(|(_, entry)| entry.last_seen)
                .map(|(id, _)| id.clone())
            else {
                break;
            };
            sessions.remove(&oldest);
            info!("Evicted chat session {} (registry full)", oldest);
        }
        sessions.insert(
            id.clone(),
            Entry {
                session: shared.clone(),
                last_seen: Instant::now(),
            },
        );

        info!("Started chat session {}", id);
        (id, shared)
    }

    /// Looks up a session and marks it as used. Expired sessions are not returned.
    pub async fn get(&self, id: &str) -> Option<SharedSession> {
        let mut sessions = self.sessions.lock().await;
        let expired = sessions
            .get(id)
            .is_some_and(|entry| entry.last_seen.elapsed() >= self.idle_timeout);
        if expired {
            sessions.remove(id);
            info!("Chat session {} expired", id);
            return None;
        }

        sessions.get_mut(id).map(|entry| {
            entry.last_seen = Instant::now();
            entry.session.clone()
        })
    }

    pub async fn remove(&self, id: &str) -> bool {
        let removed = self.sessions.lock().await.remove(id).is_some();
        if removed {
            info!("Ended chat session {}", id);
        }
        removed
    }

    /// Drops every session idle for longer than the timeout. Returns how many went.
    pub async fn prune(&self) -> usize {
        let mut sessions = self.sessions.lock().await;
        Self::expire(&mut sessions, self.idle_timeout)
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    fn expire(sessions: &mut HashMap<String, Entry>, idle_timeout: Duration) -> usize {
        let before = sessions.len();
        sessions.retain(|_, entry| entry.last_seen.elapsed() < idle_timeout);
        let expired = before - sessions.len();
        if expired > 0 {
            debug!("Expired {} idle chat sessions", expired);
        }
        expired
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_session_lifecycle() {
        let registry = SessionRegistry::new();
        let (id, session) = registry.create().await;

        assert_eq!(session.lock().await.id(), id);
        assert!(registry.get(&id).await.is_some());
        assert_eq!(registry.len().await, 1);

        assert!(registry.remove(&id).await);
        assert!(!registry.remove(&id).await);
        assert!(registry.get(&id).await.is_none());
    }

    #[tokio::test]
    async fn test_full_registry_evicts_least_recently_used() {
        let registry = SessionRegistry::with_limits(DEFAULT_IDLE_TIMEOUT, 2);
        let (first, _) = registry.create().await;
        tokio::time::sleep(Duration::from_millis(2)).await;
        let (second, _) = registry.create().await;
        tokio::time::sleep(Duration::from_millis(2)).await;

        // Touching the first makes the second the oldest.
        assert!(registry.get(&first).await.is_some());
        tokio::time::sleep(Duration::from_millis(2)).await;
        let (third, _) = registry.create().await;

        assert_eq!(registry.len().await, 2);
        assert!(registry.get(&second).await.is_none());
        assert!(registry.get(&first).await.is_some());
        assert!(registry.get(&third).await.is_some());
    }

    #[tokio::test]
    async fn test_idle_sessions_expire() {
        let registry = SessionRegistry::with_limits(Duration::from_millis(30), 16);
        let (idle, _) = registry.create().await;
        let (other, _) = registry.create().await;

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(registry.get(&idle).await.is_none());

        assert_eq!(registry.prune().await, 1);
        assert_eq!(registry.len().await, 0);
        assert!(registry.get(&other).await.is_none());
    }
}
