use super::error::*;
use super::handler;
use crate::application_port::{AuthService, TokenClaims};
use crate::domain_model::ROLE_ADMIN;
use crate::server::Server;
use std::convert::Infallible;
use std::sync::Arc;
use warp::{Filter, reject};

pub fn routes(
    server: Arc<Server>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let login = warp::post()
        .and(warp::path("login"))
        .and(warp::path::end())
        .and(warp::body::json())
        .and(with(server.auth_service.clone()))
        .and_then(handler::login);

    let register = warp::post()
        .and(warp::path("register"))
        .and(warp::path::param::<String>())
        .and(warp::path::end())
        .and(warp::body::json())
        .and(with(server.user_service.clone()))
        .and_then(handler::register);

    // Refresh and logout operate on the claims of the presented access
    // token; the access id in those claims keys the whole session pair.
    let refresh = warp::get()
        .and(warp::path("refresh"))
        .and(warp::path::end())
        .and(with_authentication(server.auth_service.clone()))
        .and(with(server.auth_service.clone()))
        .and_then(handler::refresh);

    let logout = warp::get()
        .and(warp::path("logout"))
        .and(warp::path::end())
        .and(with_authentication(server.auth_service.clone()))
        .and(with(server.auth_service.clone()))
        .and_then(handler::logout);

    let get_self = warp::get()
        .and(warp::path("user"))
        .and(warp::path::end())
        .and(with_authentication(server.auth_service.clone()))
        .and(with(server.user_service.clone()))
        .and_then(handler::get_self);

    let get_user = warp::get()
        .and(warp::path("user"))
        .and(warp::path::param::<u64>())
        .and(warp::path::end())
        .and(with_authentication(server.auth_service.clone()))
        .and(with(server.user_service.clone()))
        .and_then(handler::get_user);

    let update_password = warp::put()
        .and(warp::path("user"))
        .and(warp::path("password"))
        .and(warp::path::param::<u64>())
        .and(warp::path::end())
        .and(warp::body::json())
        .and(with_role(server.auth_service.clone(), ROLE_ADMIN))
        .and(with(server.user_service.clone()))
        .and_then(handler::update_password);

    let update_user = warp::put()
        .and(warp::path("user"))
        .and(warp::path::param::<u64>())
        .and(warp::path::end())
        .and(warp::body::json())
        .and(with_role(server.auth_service.clone(), ROLE_ADMIN))
        .and(with(server.user_service.clone()))
        .and_then(handler::update_user);

    let delete_user = warp::delete()
        .and(warp::path("user"))
        .and(warp::path::param::<u64>())
        .and(warp::path::end())
        .and(with_role(server.auth_service.clone(), ROLE_ADMIN))
        .and(with(server.user_service.clone()))
        .and_then(handler::delete_user);

    login
        .or(register)
        .or(refresh)
        .or(logout)
        .or(get_self)
        .or(get_user)
        .or(update_password)
        .or(update_user)
        .or(delete_user)
}

fn with<ServiceType>(
    service: Arc<ServiceType>,
) -> impl Filter<Extract = (Arc<ServiceType>,), Error = Infallible> + Clone
where
    ServiceType: Send + Sync + ?Sized,
{
    warp::any().map(move || service.clone())
}

/// Stateless token gate: bearer extraction plus signature/expiry checks,
/// no session-store lookup on the hot path.
fn with_authentication(
    auth_service: Arc<dyn AuthService>,
) -> impl Filter<Extract = (TokenClaims,), Error = warp::Rejection> + Clone {
    warp::header::<String>("authorization").and_then(
        move |header_value: String| {
            let auth_service = auth_service.clone();
            async move {
                auth_service
                    .authenticate(&header_value)
                    .await
                    .map_err(ApiErrorCode::from)
                    .map_err(reject::custom)
            }
        },
    )
}

fn with_role(
    auth_service: Arc<dyn AuthService>,
    required_role: &'static str,
) -> impl Filter<Extract = (TokenClaims,), Error = warp::Rejection> + Clone {
    warp::header::<String>("authorization").and_then(
        move |header_value: String| {
            let auth_service = auth_service.clone();
            async move {
                let claims = auth_service
                    .authenticate(&header_value)
                    .await
                    .map_err(ApiErrorCode::from)
                    .map_err(reject::custom)?;
                auth_service
                    .authorize(&claims, required_role)
                    .map_err(ApiErrorCode::from)
                    .map_err(reject::custom)?;
                Ok::<TokenClaims, warp::Rejection>(claims)
            }
        },
    )
}
