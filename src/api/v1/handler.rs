use super::error::*;
use crate::application_port::{
    AccessDetails, AuthService, CreateUserInput, LoginInput, TokenClaims, TokenPair,
    UpdatePasswordInput, UpdateUserInput, UserService,
};
use crate::domain_model::UserId;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use warp::{self, reject};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(code: ApiErrorCode, message: impl Into<String>) -> Self {
        ApiResponse {
            success: false,
            data: None,
            error: Some(ApiError {
                code,
                message: message.into(),
            }),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TokenPairResponse {
    pub access_token: String,
    pub refresh_token: String,
}

impl From<TokenPair> for TokenPairResponse {
    fn from(pair: TokenPair) -> Self {
        TokenPairResponse {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub force_login: bool,
}

pub async fn login(
    body: LoginRequest,
    auth_service: Arc<dyn AuthService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let pair = auth_service
        .login(LoginInput {
            username: body.username,
            password: body.password,
            force_login: body.force_login,
        })
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(TokenPairResponse::from(
        pair,
    ))))
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub repassword: String,
}

pub async fn register(
    role: String,
    body: RegisterRequest,
    user_service: Arc<dyn UserService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    if body.password != body.repassword {
        return Err(reject::custom(ApiErrorCode::InvalidRequest(
            "passwords do not match".to_string(),
        )));
    }

    let user = user_service
        .create(CreateUserInput {
            username: body.username,
            password: body.password,
            role,
        })
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(user)))
}

pub async fn refresh(
    claims: TokenClaims,
    auth_service: Arc<dyn AuthService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let pair = auth_service
        .refresh(AccessDetails::from(&claims))
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(TokenPairResponse::from(
        pair,
    ))))
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse;

pub async fn logout(
    claims: TokenClaims,
    auth_service: Arc<dyn AuthService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    auth_service
        .logout(AccessDetails::from(&claims))
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(LogoutResponse)))
}

pub async fn get_user(
    id: u64,
    _claims: TokenClaims,
    user_service: Arc<dyn UserService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let user = user_service
        .get(UserId(id))
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(user)))
}

/// GET /user without an id resolves the caller from their own claims.
pub async fn get_self(
    claims: TokenClaims,
    user_service: Arc<dyn UserService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let user = user_service
        .get(claims.user_id)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(user)))
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub username: String,
}

pub async fn update_user(
    id: u64,
    body: UpdateUserRequest,
    _claims: TokenClaims,
    user_service: Arc<dyn UserService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let user = user_service
        .update(UpdateUserInput {
            id: UserId(id),
            username: body.username,
        })
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(user)))
}

#[derive(Debug, Deserialize)]
pub struct UpdatePasswordRequest {
    pub old_password: String,
    pub new_password: String,
    pub renew_password: String,
}

pub async fn update_password(
    id: u64,
    body: UpdatePasswordRequest,
    _claims: TokenClaims,
    user_service: Arc<dyn UserService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    if body.new_password != body.renew_password {
        return Err(reject::custom(ApiErrorCode::InvalidRequest(
            "passwords do not match".to_string(),
        )));
    }

    let user = user_service
        .update_password(UpdatePasswordInput {
            id: UserId(id),
            old_password: body.old_password,
            new_password: body.new_password,
        })
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(user)))
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse;

pub async fn delete_user(
    id: u64,
    _claims: TokenClaims,
    user_service: Arc<dyn UserService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    user_service
        .delete(UserId(id))
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(DeleteResponse)))
}
