use crate::domain_model::UserId;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("username not registered")]
    NotRegistered,
    #[error("password incorrect")]
    WrongCredential,
    #[error("user is already logged in on another device")]
    AlreadyLoggedInElsewhere,
    #[error("session expired or revoked")]
    SessionExpiredOrRevoked,
    #[error("permission denied")]
    Forbidden,
    #[error("user not found")]
    UserNotFound,
    #[error("username already taken")]
    UserExists,
    #[error("missing bearer token")]
    MissingToken,
    #[error("token malformed")]
    TokenMalformed,
    #[error("token expired")]
    TokenExpired,
    #[error("token signature invalid")]
    TokenBadSignature,
    #[error("unexpected signing algorithm")]
    TokenAlgorithm,
    #[error("{0}")]
    Validation(String),
    #[error("store error: {0}")]
    Store(String),
    #[error("internal error: {0}")]
    InternalError(String),
}

/// A freshly issued access/refresh pair. The two ids double as the cache
/// keys of the backing session entries; expiries are absolute epoch seconds.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub access_id: String,
    pub refresh_id: String,
    pub access_expires_at: i64,
    pub refresh_expires_at: i64,
}

/// Claim set recovered from a verified token. This is the only data trusted
/// for authorization decisions; it is never re-fetched from storage while
/// validating an access token.
#[derive(Debug, Clone)]
pub struct TokenClaims {
    pub token_id: String,
    pub user_id: UserId,
    pub username: String,
    pub role: String,
    pub expires_at: i64,
}

/// Identity of the session a refresh or logout operates on, as presented by
/// the caller's verified access token.
#[derive(Debug, Clone)]
pub struct AccessDetails {
    pub token_id: String,
    pub user_id: UserId,
    pub username: String,
    pub role: String,
}

impl From<&TokenClaims> for AccessDetails {
    fn from(claims: &TokenClaims) -> Self {
        AccessDetails {
            token_id: claims.token_id.clone(),
            user_id: claims.user_id,
            username: claims.username.clone(),
            role: claims.role.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoginInput {
    pub username: String,
    pub password: String,
    pub force_login: bool,
}

#[async_trait::async_trait]
pub trait TokenCodec: Send + Sync {
    /// Issue a fresh pair for the given subject. Pure apart from the clock
    /// and the random access id; persisting the session is the caller's job.
    async fn issue(
        &self,
        user_id: UserId,
        username: &str,
        role: &str,
    ) -> Result<TokenPair, AuthError>;

    /// Verify a token against the access signing key.
    async fn verify_access(&self, token: &str) -> Result<TokenClaims, AuthError>;

    /// Verify a token against the refresh signing key.
    async fn verify_refresh(&self, token: &str) -> Result<TokenClaims, AuthError>;
}

#[async_trait::async_trait]
pub trait CredentialHasher: Send + Sync {
    async fn hash_password(&self, password: &str) -> Result<String, AuthError>;
    async fn verify_password(
        &self,
        password: &str,
        password_hash: &str,
    ) -> Result<bool, AuthError>;
}

/// Login/refresh/logout state machine plus the request-time verification
/// entry points used by the router filters.
///
/// `authenticate` is deliberately stateless: a structurally valid, unexpired
/// access token is accepted even if its session entry was already revoked.
/// Logout and force-login therefore do not cut short the validity window of
/// an already-issued access token; they only prevent future refreshes.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    async fn login(&self, input: LoginInput) -> Result<TokenPair, AuthError>;
    async fn refresh(&self, details: AccessDetails) -> Result<TokenPair, AuthError>;
    async fn logout(&self, details: AccessDetails) -> Result<(), AuthError>;
    async fn authenticate(&self, header_value: &str) -> Result<TokenClaims, AuthError>;
    fn authorize(&self, claims: &TokenClaims, required_role: &str) -> Result<(), AuthError>;
}
