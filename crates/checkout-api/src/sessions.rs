//! Login sessions, one OTP coordinator each.

use crate::config::SessionConfig;
use crate::error::ApiError;
use otp_coordinator::{OtpBackends, OtpConfig, OtpCoordinator};
use rand::distributions::Alphanumeric;
use rand::Rng;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::time::{Duration, Instant};
use tracing::{debug, warn};

const SESSION_ID_LEN: usize = 32;

struct SessionEntry {
    coordinator: Arc<OtpCoordinator>,
    last_used: Instant,
}

/// Login sessions indexed by an opaque id handed to the client when the
/// session starts.
///
/// All sessions share one set of backends. A session unused for longer than
/// the idle timeout is dropped.
pub struct OtpSessions {
    config: OtpConfig,
    backends: OtpBackends,
    idle_timeout: Duration,
    max_sessions: usize,
    sessions: RwLock<HashMap<String, SessionEntry>>,
}

impl OtpSessions {
    pub fn new(config: OtpConfig, backends: OtpBackends, limits: &SessionConfig) -> Self {
        Self {
            config,
            backends,
            idle_timeout: limits.idle_timeout,
            max_sessions: limits.max_sessions,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Start a new login session.
    pub async fn create(&self) -> Result<(String, Arc<OtpCoordinator>), ApiError> {
        let mut sessions = self.sessions.write().await;

        let now = Instant::now();
        let before = sessions.len();
        sessions.retain(|_, entry| now.duration_since(entry.last_used) < self.idle_timeout);
        if sessions.len() < before {
            debug!(dropped = before - sessions.len(), "Expired idle login sessions");
        }

        if sessions.len() >= self.max_sessions {
            warn!(max = self.max_sessions, "Login session limit reached");
            return Err(ApiError::TooManySessions);
        }

        let id = loop {
            let candidate = new_session_id();
            if !sessions.contains_key(&candidate) {
                break candidate;
            }
        };
        let coordinator = Arc::new(self.backends.coordinator(self.config.clone()));
        sessions.insert(
            id.clone(),
            SessionEntry {
                coordinator: coordinator.clone(),
                last_used: now,
            },
        );

        debug!(total = sessions.len(), "Login session started");
        Ok((id, coordinator))
    }

    /// Look up a live session and mark it used.
    pub async fn get(&self, id: &str) -> Result<Arc<OtpCoordinator>, ApiError> {
        let mut sessions = self.sessions.write().await;
        let now = Instant::now();

        match sessions.get_mut(id) {
            Some(entry) if now.duration_since(entry.last_used) < self.idle_timeout => {
                entry.last_used = now;
                Ok(entry.coordinator.clone())
            }
            Some(_) => {
                sessions.remove(id);
                Err(ApiError::SessionNotFound)
            }
            None => Err(ApiError::SessionNotFound),
        }
    }

    /// End a session. Returns whether it existed.
    pub async fn remove(&self, id: &str) -> bool {
        self.sessions.write().await.remove(id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

fn new_session_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SESSION_ID_LEN)
        .map(char::from)
        .collect()
}
