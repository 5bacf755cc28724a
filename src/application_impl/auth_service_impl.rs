use crate::application_impl::{derive_refresh_id, extract_bearer};
use crate::application_port::{
    AccessDetails, AuthError, AuthService, CredentialHasher, LoginInput, TokenClaims, TokenCodec,
    TokenPair,
};
use crate::domain_port::{SessionClaims, SessionStore, UserRepo};
use argon2::password_hash::rand_core::OsRng;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use std::sync::Arc;
use tracing::{error, warn};

pub struct Argon2PasswordHasher;

#[async_trait::async_trait]
impl CredentialHasher for Argon2PasswordHasher {
    async fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let salt = argon2::password_hash::SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AuthError::InternalError(e.to_string()))?
            .to_string();
        Ok(hash)
    }

    async fn verify_password(
        &self,
        password: &str,
        password_hash: &str,
    ) -> Result<bool, AuthError> {
        let parsed = PasswordHash::new(password_hash)
            .map_err(|e| AuthError::InternalError(format!("invalid PHC hash: {e}")))?;

        match Argon2::default().verify_password(password.as_bytes(), &parsed) {
            Ok(_) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(AuthError::InternalError(format!("verify error: {e}"))),
        }
    }
}

/// Owner of the per-user session state machine: `LoggedOut` and
/// `LoggedIn(token id)`. Sole writer of session state; the access-token
/// fast path in [`AuthService::authenticate`] never touches the stores.
///
/// Cache writes and user-row writes are separate steps, not a distributed
/// transaction. Login and refresh compensate by revoking the pair they just
/// issued when the user-row swap is lost or fails; logout accepts the
/// bounded inconsistency of a revoked cache entry next to a still-logged-in
/// user row, which the next successful login or logout repairs.
pub struct RealAuthService {
    user_repo: Arc<dyn UserRepo>,
    session_store: Arc<dyn SessionStore>,
    credential_hasher: Arc<dyn CredentialHasher>,
    token_codec: Arc<dyn TokenCodec>,
}

impl RealAuthService {
    pub fn new(
        user_repo: Arc<dyn UserRepo>,
        session_store: Arc<dyn SessionStore>,
        credential_hasher: Arc<dyn CredentialHasher>,
        token_codec: Arc<dyn TokenCodec>,
    ) -> Self {
        Self {
            user_repo,
            session_store,
            credential_hasher,
            token_codec,
        }
    }

    /// Compensating action after a lost or failed user-row swap: take the
    /// just-issued pair back out of the cache. A failure here leaves the
    /// entries to age out by TTL; log and move on.
    async fn rollback_session(&self, pair: &TokenPair) {
        if let Err(e) = self
            .session_store
            .revoke(&pair.access_id, &pair.refresh_id)
            .await
        {
            error!(
                access_id = %pair.access_id,
                error = %e,
                "session rollback failed; entries left for TTL expiry"
            );
        }
    }
}

#[async_trait::async_trait]
impl AuthService for RealAuthService {
    async fn login(&self, input: LoginInput) -> Result<TokenPair, AuthError> {
        let LoginInput {
            username,
            password,
            force_login,
        } = input;

        let user = match self.user_repo.get_by_username(&username).await {
            Ok(user) => user,
            Err(AuthError::UserNotFound) => return Err(AuthError::NotRegistered),
            Err(e) => {
                warn!(%username, error = %e, "user lookup failed during login");
                return Err(e);
            }
        };

        let ok = self
            .credential_hasher
            .verify_password(&password, &user.password_hash)
            .await?;
        if !ok {
            return Err(AuthError::WrongCredential);
        }

        if user.is_logged_in && !force_login {
            return Err(AuthError::AlreadyLoggedInElsewhere);
        }
        if force_login {
            // Displace the current pair before issuing. A failed revoke
            // aborts the transition: never stack a new pair on top of an
            // unrevoked one.
            let refresh_id = derive_refresh_id(&user.current_token_id, user.id, &user.username);
            if let Err(e) = self
                .session_store
                .revoke(&user.current_token_id, &refresh_id)
                .await
            {
                warn!(user_id = %user.id, error = %e, "failed to displace prior session");
                return Err(e);
            }
        }

        let pair = self
            .token_codec
            .issue(user.id, &user.username, &user.role)
            .await?;
        let claims = SessionClaims {
            user_id: user.id,
            username: user.username.clone(),
            role: user.role.clone(),
        };
        self.session_store.put(&pair, &claims).await?;

        let swapped = match self
            .user_repo
            .swap_session_token(user.id, &user.current_token_id, &pair.access_id, true)
            .await
        {
            Ok(swapped) => swapped,
            Err(e) => {
                warn!(user_id = %user.id, error = %e, "failed to persist login state");
                self.rollback_session(&pair).await;
                return Err(e);
            }
        };
        if !swapped {
            // A concurrent transition moved the row first; its pair wins.
            self.rollback_session(&pair).await;
            return Err(AuthError::AlreadyLoggedInElsewhere);
        }

        Ok(pair)
    }

    async fn refresh(&self, details: AccessDetails) -> Result<TokenPair, AuthError> {
        // The access id is the lookup key for the whole session pair.
        let prior = self.session_store.fetch(&details.token_id).await?;

        let refresh_id = derive_refresh_id(&details.token_id, prior.user_id, &prior.username);
        if let Err(e) = self
            .session_store
            .revoke(&details.token_id, &refresh_id)
            .await
        {
            warn!(token_id = %details.token_id, error = %e, "failed to revoke prior pair on refresh");
            return Err(AuthError::SessionExpiredOrRevoked);
        }

        // Subject identity comes from the stored claims; the role comes
        // from the caller's verified context.
        let pair = self
            .token_codec
            .issue(prior.user_id, &prior.username, &details.role)
            .await?;
        let claims = SessionClaims {
            user_id: prior.user_id,
            username: prior.username.clone(),
            role: details.role.clone(),
        };
        self.session_store.put(&pair, &claims).await?;

        let swapped = match self
            .user_repo
            .swap_session_token(prior.user_id, &details.token_id, &pair.access_id, true)
            .await
        {
            Ok(swapped) => swapped,
            Err(e) => {
                warn!(user_id = %prior.user_id, error = %e, "failed to persist refreshed token id");
                self.rollback_session(&pair).await;
                return Err(e);
            }
        };
        if !swapped {
            self.rollback_session(&pair).await;
            return Err(AuthError::SessionExpiredOrRevoked);
        }

        Ok(pair)
    }

    async fn logout(&self, details: AccessDetails) -> Result<(), AuthError> {
        let refresh_id = derive_refresh_id(&details.token_id, details.user_id, &details.username);
        self.session_store
            .revoke(&details.token_id, &refresh_id)
            .await?;

        // Cache-side revocation is done at this point. If the user row
        // cannot be updated the row keeps claiming a logged-in session that
        // no longer exists; the next successful login or logout clears it.
        let user = match self.user_repo.get_by_username(&details.username).await {
            Ok(user) => user,
            Err(e) => {
                warn!(username = %details.username, error = %e, "user lookup failed during logout");
                return Err(e);
            }
        };

        // A lost guard means another login already displaced this session;
        // that makes logout a no-op, not a failure.
        self.user_repo
            .swap_session_token(user.id, &details.token_id, "", false)
            .await?;

        Ok(())
    }

    async fn authenticate(&self, header_value: &str) -> Result<TokenClaims, AuthError> {
        let token = extract_bearer(header_value)?;
        self.token_codec.verify_access(token).await
    }

    fn authorize(&self, claims: &TokenClaims, required_role: &str) -> Result<(), AuthError> {
        if claims.role == required_role {
            Ok(())
        } else {
            Err(AuthError::Forbidden)
        }
    }
}
