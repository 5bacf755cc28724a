use super::util::is_dup_key;
use crate::application_port::AuthError;
use crate::domain_model::UserId;
use crate::domain_port::{NewUser, UserRecord, UserRepo};
use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};

pub struct MySqlUserRepo {
    pool: MySqlPool,
}

impl MySqlUserRepo {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlUserRepo { pool }
    }

    fn row_to_record(row: MySqlRow) -> Result<UserRecord, AuthError> {
        let id: u64 = row
            .try_get("user_id")
            .map_err(|e| AuthError::Store(e.to_string()))?;
        let username: String = row
            .try_get("username")
            .map_err(|e| AuthError::Store(e.to_string()))?;
        let password_hash: String = row
            .try_get("password_hash")
            .map_err(|e| AuthError::Store(e.to_string()))?;
        let role: String = row
            .try_get("role")
            .map_err(|e| AuthError::Store(e.to_string()))?;
        let is_logged_in: bool = row
            .try_get("is_logged_in")
            .map_err(|e| AuthError::Store(e.to_string()))?;
        let current_token_id: String = row
            .try_get("current_token_id")
            .map_err(|e| AuthError::Store(e.to_string()))?;
        let created_at: DateTime<Utc> = row
            .try_get("created_at")
            .map_err(|e| AuthError::Store(e.to_string()))?;
        let updated_at: DateTime<Utc> = row
            .try_get("updated_at")
            .map_err(|e| AuthError::Store(e.to_string()))?;

        Ok(UserRecord {
            id: UserId(id),
            username,
            password_hash,
            role,
            is_logged_in,
            current_token_id,
            created_at,
            updated_at,
        })
    }
}

#[async_trait::async_trait]
impl UserRepo for MySqlUserRepo {
    async fn create(&self, user: NewUser) -> Result<UserRecord, AuthError> {
        let result = sqlx::query(
            r#"
INSERT INTO user (username, password_hash, role, is_logged_in, current_token_id)
VALUES (?, ?, ?, FALSE, '')
"#,
        )
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.role)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_dup_key(&e) {
                AuthError::UserExists
            } else {
                AuthError::Store(e.to_string())
            }
        })?;

        self.get(UserId(result.last_insert_id())).await
    }

    async fn get(&self, id: UserId) -> Result<UserRecord, AuthError> {
        let row = sqlx::query(
            r#"
SELECT user_id, username, password_hash, role, is_logged_in, current_token_id,
       created_at, updated_at
FROM user
WHERE user_id = ?
"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AuthError::Store(e.to_string()))?;

        row.map(Self::row_to_record)
            .transpose()?
            .ok_or(AuthError::UserNotFound)
    }

    async fn get_by_username(&self, username: &str) -> Result<UserRecord, AuthError> {
        let row = sqlx::query(
            r#"
SELECT user_id, username, password_hash, role, is_logged_in, current_token_id,
       created_at, updated_at
FROM user
WHERE username = ?
"#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AuthError::Store(e.to_string()))?;

        row.map(Self::row_to_record)
            .transpose()?
            .ok_or(AuthError::UserNotFound)
    }

    async fn update(&self, user: &UserRecord) -> Result<(), AuthError> {
        let result = sqlx::query(
            r#"
UPDATE user
SET username = ?, password_hash = ?, role = ?, is_logged_in = ?, current_token_id = ?
WHERE user_id = ?
"#,
        )
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.role)
        .bind(user.is_logged_in)
        .bind(&user.current_token_id)
        .bind(user.id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_dup_key(&e) {
                AuthError::UserExists
            } else {
                AuthError::Store(e.to_string())
            }
        })?;

        if result.rows_affected() == 0 {
            return Err(AuthError::UserNotFound);
        }
        Ok(())
    }

    async fn delete(&self, id: UserId) -> Result<(), AuthError> {
        let result = sqlx::query("DELETE FROM user WHERE user_id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(AuthError::UserNotFound);
        }
        Ok(())
    }

    async fn swap_session_token(
        &self,
        id: UserId,
        expected: &str,
        next: &str,
        logged_in: bool,
    ) -> Result<bool, AuthError> {
        // The WHERE guard is the compare half of the swap; 0 affected rows
        // means another transition won the race.
        let result = sqlx::query(
            r#"
UPDATE user
SET is_logged_in = ?, current_token_id = ?
WHERE user_id = ? AND current_token_id = ?
"#,
        )
        .bind(logged_in)
        .bind(next)
        .bind(id)
        .bind(expected)
        .execute(&self.pool)
        .await
        .map_err(|e| AuthError::Store(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }
}
