use crate::application_port::{AuthError, TokenPair};
use crate::domain_port::{SessionClaims, SessionStore};
use chrono::Utc;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;

/// Cache-backed session persistence: one entry per token id, TTL mirroring
/// the token expiry. The TTL is recomputed from the absolute expiry at the
/// moment of the write, so a slow path between issuance and persistence
/// shortens the effective TTL slightly; that drift is accepted.
pub struct RedisSessionStore {
    conn: ConnectionManager,
    prefix: String,
}

impl RedisSessionStore {
    pub fn new(conn: ConnectionManager, prefix: impl Into<String>) -> Self {
        RedisSessionStore {
            conn,
            prefix: prefix.into(),
        }
    }

    fn key(&self, token_id: &str) -> String {
        format!("{}:{}", self.prefix, token_id)
    }
}

fn ttl_secs(expires_at: i64) -> u64 {
    let secs = expires_at - Utc::now().timestamp();
    if secs <= 0 { 1 } else { secs as u64 }
}

#[async_trait::async_trait]
impl SessionStore for RedisSessionStore {
    async fn put(&self, pair: &TokenPair, claims: &SessionClaims) -> Result<(), AuthError> {
        let payload =
            serde_json::to_string(claims).map_err(|e| AuthError::Store(e.to_string()))?;
        let mut conn = self.conn.clone();

        // Sequential writes; the first failure aborts so a half-written
        // session never gets reported as a success.
        let _: () = conn
            .set_ex(
                self.key(&pair.access_id),
                &payload,
                ttl_secs(pair.access_expires_at),
            )
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;
        let _: () = conn
            .set_ex(
                self.key(&pair.refresh_id),
                &payload,
                ttl_secs(pair.refresh_expires_at),
            )
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;

        Ok(())
    }

    async fn fetch(&self, access_id: &str) -> Result<SessionClaims, AuthError> {
        let mut conn = self.conn.clone();
        let payload: Option<String> = conn
            .get(self.key(access_id))
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;

        match payload {
            Some(payload) => {
                serde_json::from_str(&payload).map_err(|e| AuthError::Store(e.to_string()))
            }
            None => Err(AuthError::SessionExpiredOrRevoked),
        }
    }

    async fn revoke(&self, access_id: &str, refresh_id: &str) -> Result<(), AuthError> {
        let mut conn = self.conn.clone();
        // DEL of a missing key is a no-op; revocation stays idempotent.
        let _: () = conn
            .del(vec![self.key(access_id), self.key(refresh_id)])
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;
        Ok(())
    }
}
