use crate::application_port::AuthError;
use crate::domain_model::UserId;
use crate::domain_port::{NewUser, UserRecord, UserRepo};
use chrono::Utc;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// In-process stand-in for the relational backend.
#[derive(Default)]
pub struct MemoryUserRepo {
    users: DashMap<UserId, UserRecord>,
    next_id: AtomicU64,
}

impl MemoryUserRepo {
    pub fn new() -> Self {
        Self::default()
    }

    fn find_by_username(&self, username: &str) -> Option<UserRecord> {
        self.users
            .iter()
            .find(|entry| entry.username == username)
            .map(|entry| entry.value().clone())
    }
}

#[async_trait::async_trait]
impl UserRepo for MemoryUserRepo {
    async fn create(&self, user: NewUser) -> Result<UserRecord, AuthError> {
        if self.find_by_username(&user.username).is_some() {
            return Err(AuthError::UserExists);
        }

        let id = UserId(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        let now = Utc::now();
        let record = UserRecord {
            id,
            username: user.username,
            password_hash: user.password_hash,
            role: user.role,
            is_logged_in: false,
            current_token_id: String::new(),
            created_at: now,
            updated_at: now,
        };
        self.users.insert(id, record.clone());
        Ok(record)
    }

    async fn get(&self, id: UserId) -> Result<UserRecord, AuthError> {
        self.users
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or(AuthError::UserNotFound)
    }

    async fn get_by_username(&self, username: &str) -> Result<UserRecord, AuthError> {
        self.find_by_username(username).ok_or(AuthError::UserNotFound)
    }

    async fn update(&self, user: &UserRecord) -> Result<(), AuthError> {
        match self.users.get_mut(&user.id) {
            Some(mut entry) => {
                let mut updated = user.clone();
                updated.updated_at = Utc::now();
                *entry = updated;
                Ok(())
            }
            None => Err(AuthError::UserNotFound),
        }
    }

    async fn delete(&self, id: UserId) -> Result<(), AuthError> {
        self.users
            .remove(&id)
            .map(|_| ())
            .ok_or(AuthError::UserNotFound)
    }

    async fn swap_session_token(
        &self,
        id: UserId,
        expected: &str,
        next: &str,
        logged_in: bool,
    ) -> Result<bool, AuthError> {
        match self.users.get_mut(&id) {
            Some(mut entry) => {
                if entry.current_token_id != expected {
                    return Ok(false);
                }
                entry.current_token_id = next.to_string();
                entry.is_logged_in = logged_in;
                entry.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
