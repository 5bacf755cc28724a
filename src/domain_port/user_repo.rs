use crate::application_port::AuthError;
use crate::domain_model::UserId;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: UserId,
    pub username: String,
    pub password_hash: String,
    pub role: String,
    /// Session bookkeeping: at most one `current_token_id` is authoritative
    /// per user. Both fields are overwritten on login/refresh and cleared on
    /// logout, always through [`UserRepo::swap_session_token`].
    pub is_logged_in: bool,
    pub current_token_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub role: String,
}

#[async_trait::async_trait]
pub trait UserRepo: Send + Sync {
    async fn create(&self, user: NewUser) -> Result<UserRecord, AuthError>;

    /// `UserNotFound` on a missing row.
    async fn get(&self, id: UserId) -> Result<UserRecord, AuthError>;

    async fn get_by_username(&self, username: &str) -> Result<UserRecord, AuthError>;

    /// Persists username, password hash, role and the session fields as a
    /// whole. Login/refresh/logout transitions must not go through here;
    /// they use the guarded swap below.
    async fn update(&self, user: &UserRecord) -> Result<(), AuthError>;

    async fn delete(&self, id: UserId) -> Result<(), AuthError>;

    /// Compare-and-swap of the session columns. The write applies only when
    /// the row still carries `expected` as its current token id; returns
    /// whether it applied. Concurrent login/refresh/logout transitions race
    /// on this swap and the loser compensates instead of overwriting.
    async fn swap_session_token(
        &self,
        id: UserId,
        expected: &str,
        next: &str,
        logged_in: bool,
    ) -> Result<bool, AuthError>;
}
