use crate::application_port::{
    AuthError, CreateUserInput, CredentialHasher, UpdatePasswordInput, UpdateUserInput,
    UserService, UserView,
};
use crate::domain_model::{UserId, is_known_role};
use crate::domain_port::{NewUser, UserRecord, UserRepo};
use std::sync::Arc;
use tracing::warn;

const MIN_USERNAME_LEN: usize = 4;
const MAX_USERNAME_LEN: usize = 10;
const MIN_PASSWORD_LEN: usize = 8;

fn validate_username(username: &str) -> Result<(), AuthError> {
    if username.len() < MIN_USERNAME_LEN || username.len() > MAX_USERNAME_LEN {
        return Err(AuthError::Validation(format!(
            "username must be {MIN_USERNAME_LEN}-{MAX_USERNAME_LEN} characters"
        )));
    }
    if !username.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(AuthError::Validation(
            "username must be alphabetic".to_string(),
        ));
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LEN {
        return Err(AuthError::Validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

fn view(user: &UserRecord) -> UserView {
    UserView {
        id: user.id,
        username: user.username.clone(),
        role: user.role.clone(),
    }
}

pub struct RealUserService {
    user_repo: Arc<dyn UserRepo>,
    credential_hasher: Arc<dyn CredentialHasher>,
}

impl RealUserService {
    pub fn new(user_repo: Arc<dyn UserRepo>, credential_hasher: Arc<dyn CredentialHasher>) -> Self {
        Self {
            user_repo,
            credential_hasher,
        }
    }

    /// `UserExists` when the name belongs to a row other than `owner`.
    async fn check_username_free(
        &self,
        username: &str,
        owner: Option<UserId>,
    ) -> Result<(), AuthError> {
        match self.user_repo.get_by_username(username).await {
            Ok(existing) if owner != Some(existing.id) => Err(AuthError::UserExists),
            Ok(_) | Err(AuthError::UserNotFound) => Ok(()),
            Err(e) => {
                warn!(%username, error = %e, "username availability check failed");
                Err(e)
            }
        }
    }
}

#[async_trait::async_trait]
impl UserService for RealUserService {
    async fn create(&self, input: CreateUserInput) -> Result<UserView, AuthError> {
        validate_username(&input.username)?;
        validate_password(&input.password)?;
        if !is_known_role(&input.role) {
            return Err(AuthError::Validation(format!(
                "unknown role: {}",
                input.role
            )));
        }

        self.check_username_free(&input.username, None).await?;

        let password_hash = self.credential_hasher.hash_password(&input.password).await?;
        let user = self
            .user_repo
            .create(NewUser {
                username: input.username,
                password_hash,
                role: input.role,
            })
            .await?;

        Ok(view(&user))
    }

    async fn get(&self, id: UserId) -> Result<UserView, AuthError> {
        let user = self.user_repo.get(id).await?;
        Ok(view(&user))
    }

    async fn update(&self, input: UpdateUserInput) -> Result<UserView, AuthError> {
        validate_username(&input.username)?;
        self.check_username_free(&input.username, Some(input.id))
            .await?;

        let mut user = self.user_repo.get(input.id).await?;
        user.username = input.username;
        self.user_repo.update(&user).await?;

        Ok(view(&user))
    }

    async fn update_password(&self, input: UpdatePasswordInput) -> Result<UserView, AuthError> {
        validate_password(&input.new_password)?;

        let mut user = self.user_repo.get(input.id).await?;
        let ok = self
            .credential_hasher
            .verify_password(&input.old_password, &user.password_hash)
            .await?;
        if !ok {
            return Err(AuthError::WrongCredential);
        }

        user.password_hash = self
            .credential_hasher
            .hash_password(&input.new_password)
            .await?;
        self.user_repo.update(&user).await?;

        Ok(view(&user))
    }

    async fn delete(&self, id: UserId) -> Result<(), AuthError> {
        self.user_repo.delete(id).await
    }
}
