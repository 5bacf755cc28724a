use crate::application_port::{AuthError, TokenPair};
use crate::domain_port::{SessionClaims, SessionStore};
use chrono::Utc;
use dashmap::DashMap;

struct StoredEntry {
    claims: SessionClaims,
    expires_at: i64,
}

/// In-process stand-in for the cache backend. Entries expire lazily: a
/// fetch past the recorded expiry behaves exactly like a cache miss.
#[derive(Default)]
pub struct MemorySessionStore {
    entries: DashMap<String, StoredEntry>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl SessionStore for MemorySessionStore {
    async fn put(&self, pair: &TokenPair, claims: &SessionClaims) -> Result<(), AuthError> {
        self.entries.insert(
            pair.access_id.clone(),
            StoredEntry {
                claims: claims.clone(),
                expires_at: pair.access_expires_at,
            },
        );
        self.entries.insert(
            pair.refresh_id.clone(),
            StoredEntry {
                claims: claims.clone(),
                expires_at: pair.refresh_expires_at,
            },
        );
        Ok(())
    }

    async fn fetch(&self, access_id: &str) -> Result<SessionClaims, AuthError> {
        let expired = match self.entries.get(access_id) {
            Some(entry) => {
                if entry.expires_at > Utc::now().timestamp() {
                    return Ok(entry.claims.clone());
                }
                true
            }
            None => false,
        };

        if expired {
            self.entries.remove(access_id);
        }
        Err(AuthError::SessionExpiredOrRevoked)
    }

    async fn revoke(&self, access_id: &str, refresh_id: &str) -> Result<(), AuthError> {
        self.entries.remove(access_id);
        self.entries.remove(refresh_id);
        Ok(())
    }
}
