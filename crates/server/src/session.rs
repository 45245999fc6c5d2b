//! In-memory bearer token sessions.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use uuid::Uuid;

use pharmatrack_core::AccountId;

#[derive(Debug, Clone, Copy)]
struct Session {
    account_id: AccountId,
    expires_at: Instant,
}

/// Maps opaque tokens to accounts. Tokens expire after a fixed TTL and do
/// not survive a restart.
#[derive(Debug)]
pub struct SessionStore {
    ttl: Duration,
    sessions: RwLock<HashMap<Uuid, Session>>,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Issue a new token for `account_id`.
    pub async fn create(&self, account_id: AccountId) -> Uuid {
        let token = Uuid::new_v4();
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, s| s.expires_at > now);
        sessions.insert(
            token,
            Session {
                account_id,
                expires_at: now + self.ttl,
            },
        );
        token
    }

    /// Account for a live token. Expired tokens are dropped.
    pub async fn resolve(&self, token: &Uuid) -> Option<AccountId> {
        let session = self.sessions.read().await.get(token).copied()?;
        if session.expires_at > Instant::now() {
            return Some(session.account_id);
        }
        self.sessions.write().await.remove(token);
        None
    }

    /// Returns whether the token existed.
    pub async fn revoke(&self, token: &Uuid) -> bool {
        self.sessions.write().await.remove(token).is_some()
    }
}
