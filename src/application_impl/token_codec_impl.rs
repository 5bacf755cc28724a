use crate::application_port::{AuthError, TokenClaims, TokenCodec, TokenPair};
use crate::domain_model::UserId;
use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub access_key: Vec<u8>,
    pub refresh_key: Vec<u8>,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

/// Wire claim set, identical for both tokens of a pair: the access token
/// carries the access id as `token_id`, the refresh token the refresh id.
#[derive(Debug, Serialize, Deserialize)]
struct SignedClaims {
    token_id: String,
    user_id: u64,
    username: String,
    role: String,
    exp: i64,
    iat: i64,
}

/// Derive the refresh id from the access id and the subject identity.
///
/// The concatenation collides for an identical (access id, user id,
/// username) triple, so uniqueness is inherited entirely from the access
/// id's randomness. Keeping refresh ids reconstructible from access-token
/// claims is what lets revocation delete both cache entries without a
/// second lookup. Do not reuse this shape for any other derived key.
pub fn derive_refresh_id(access_id: &str, user_id: UserId, username: &str) -> String {
    format!("{access_id}++{user_id}{username}")
}

/// Pull the token out of an Authorization header value: exactly two
/// space-separated parts, the second being the token.
pub fn extract_bearer(header_value: &str) -> Result<&str, AuthError> {
    let mut parts = header_value.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(_), Some(token), None) if !token.is_empty() => Ok(token),
        _ => Err(AuthError::MissingToken),
    }
}

fn encode_signed(claims: &SignedClaims, key: &[u8]) -> Result<String, AuthError> {
    encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(key),
    )
    .map_err(|e| AuthError::InternalError(e.to_string()))
}

fn decode_signed(token: &str, key: &[u8]) -> Result<TokenClaims, AuthError> {
    // Validation::new pins the accepted algorithm set to HS256; a token
    // header announcing anything else is a hard rejection, not a fallback.
    let validation = Validation::new(Algorithm::HS256);
    let data = decode::<SignedClaims>(token, &DecodingKey::from_secret(key), &validation)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            ErrorKind::InvalidSignature => AuthError::TokenBadSignature,
            ErrorKind::InvalidAlgorithm => AuthError::TokenAlgorithm,
            _ => AuthError::TokenMalformed,
        })?;

    let claims = data.claims;
    Ok(TokenClaims {
        token_id: claims.token_id,
        user_id: UserId(claims.user_id),
        username: claims.username,
        role: claims.role,
        expires_at: claims.exp,
    })
}

/// Stateless issuer/verifier of signed pairs. Two independent HS256 keys:
/// one for access tokens, one for refresh tokens.
pub struct JwtTokenCodec {
    cfg: JwtConfig,
}

impl JwtTokenCodec {
    pub fn new(cfg: JwtConfig) -> Self {
        JwtTokenCodec { cfg }
    }
}

#[async_trait::async_trait]
impl TokenCodec for JwtTokenCodec {
    async fn issue(
        &self,
        user_id: UserId,
        username: &str,
        role: &str,
    ) -> Result<TokenPair, AuthError> {
        let access_id = Uuid::new_v4().to_string();
        let refresh_id = derive_refresh_id(&access_id, user_id, username);

        let now = Utc::now();
        let iat = now.timestamp();
        let access_expires_at = (now + self.cfg.access_ttl).timestamp();
        let refresh_expires_at = (now + self.cfg.refresh_ttl).timestamp();

        let access_token = encode_signed(
            &SignedClaims {
                token_id: access_id.clone(),
                user_id: user_id.0,
                username: username.to_string(),
                role: role.to_string(),
                exp: access_expires_at,
                iat,
            },
            &self.cfg.access_key,
        )?;

        let refresh_token = encode_signed(
            &SignedClaims {
                token_id: refresh_id.clone(),
                user_id: user_id.0,
                username: username.to_string(),
                role: role.to_string(),
                exp: refresh_expires_at,
                iat,
            },
            &self.cfg.refresh_key,
        )?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            access_id,
            refresh_id,
            access_expires_at,
            refresh_expires_at,
        })
    }

    async fn verify_access(&self, token: &str) -> Result<TokenClaims, AuthError> {
        decode_signed(token, &self.cfg.access_key)
    }

    async fn verify_refresh(&self, token: &str) -> Result<TokenClaims, AuthError> {
        decode_signed(token, &self.cfg.refresh_key)
    }
}
