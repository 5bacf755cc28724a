use crate::application_port::{AuthError, TokenPair};
use crate::domain_model::UserId;
use serde::{Deserialize, Serialize};

/// Claim set captured at issuance and held in the cache for the lifetime of
/// the pair. Session entries are written once and never updated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub user_id: UserId,
    pub username: String,
    pub role: String,
}

#[async_trait::async_trait]
pub trait SessionStore: Send + Sync {
    /// Write two entries keyed by the pair's access id and refresh id, same
    /// claims payload, each with its own TTL computed from the token expiry
    /// at the moment of the write. Partial failure is a hard error: the
    /// caller must not mark the user logged in over half a session.
    async fn put(&self, pair: &TokenPair, claims: &SessionClaims) -> Result<(), AuthError>;

    /// `SessionExpiredOrRevoked` on a miss: the backing session lapsed or
    /// was revoked even if the token signature still validates.
    async fn fetch(&self, access_id: &str) -> Result<SessionClaims, AuthError>;

    /// Delete both entries. Deleting a key that is already gone is not an
    /// error; revocation is idempotent.
    async fn revoke(&self, access_id: &str, refresh_id: &str) -> Result<(), AuthError>;
}
