use crate::application_port::AuthError;
use crate::domain_model::UserId;
use serde::Serialize;

#[derive(Debug, Clone)]
pub struct CreateUserInput {
    pub username: String,
    pub password: String,
    pub role: String,
}

#[derive(Debug, Clone)]
pub struct UpdateUserInput {
    pub id: UserId,
    pub username: String,
}

#[derive(Debug, Clone)]
pub struct UpdatePasswordInput {
    pub id: UserId,
    pub old_password: String,
    pub new_password: String,
}

/// Public projection of a user row. Password hash and session bookkeeping
/// never leave the service layer.
#[derive(Debug, Clone, Serialize)]
pub struct UserView {
    pub id: UserId,
    pub username: String,
    pub role: String,
}

#[async_trait::async_trait]
pub trait UserService: Send + Sync {
    async fn create(&self, input: CreateUserInput) -> Result<UserView, AuthError>;
    async fn get(&self, id: UserId) -> Result<UserView, AuthError>;
    async fn update(&self, input: UpdateUserInput) -> Result<UserView, AuthError>;
    async fn update_password(&self, input: UpdatePasswordInput) -> Result<UserView, AuthError>;
    async fn delete(&self, id: UserId) -> Result<(), AuthError>;
}
