use crate::application_impl::{
    Argon2PasswordHasher, JwtConfig, JwtTokenCodec, RealAuthService, RealUserService,
};
use crate::application_port::{AuthService, CredentialHasher, TokenCodec, UserService};
use crate::domain_port::{SessionStore, UserRepo};
use crate::infra_memory::{MemorySessionStore, MemoryUserRepo};
use crate::infra_mysql::MySqlUserRepo;
use crate::infra_redis::RedisSessionStore;
use crate::logger::info;
use crate::settings::Settings;
use sqlx::{MySql, Pool};
use std::sync::Arc;
use std::time::Duration;

fn signing_key(var: &str, dev_fallback: &str) -> Vec<u8> {
    std::env::var(var)
        .unwrap_or_else(|_| dev_fallback.to_string())
        .into_bytes()
}

/// Wires the stores, codec and services together. All dependencies travel
/// through constructors; there is no process-wide client or config state.
pub struct Server {
    pub auth_service: Arc<dyn AuthService>,
    pub user_service: Arc<dyn UserService>,
    pool: Option<Pool<MySql>>,
}

impl Server {
    pub async fn try_new(settings: &Settings) -> anyhow::Result<Self> {
        let credential_hasher: Arc<dyn CredentialHasher> = Arc::new(Argon2PasswordHasher);

        // Two distinct symmetric keys: compromising the access key must not
        // let an attacker mint refresh tokens.
        let token_codec: Arc<dyn TokenCodec> = Arc::new(JwtTokenCodec::new(JwtConfig {
            access_key: signing_key("JWT_ACCESS_KEY", "dev-access-key"),
            refresh_key: signing_key("JWT_REFRESH_KEY", "dev-refresh-key"),
            access_ttl: Duration::from_secs(settings.auth.access_ttl_secs),
            refresh_ttl: Duration::from_secs(settings.auth.refresh_ttl_secs),
        }));

        let (user_repo, session_store, pool): (
            Arc<dyn UserRepo>,
            Arc<dyn SessionStore>,
            Option<Pool<MySql>>,
        ) = match settings.store.backend.as_str() {
            "memory" => (
                Arc::new(MemoryUserRepo::new()),
                Arc::new(MemorySessionStore::new()),
                None,
            ),
            "real" => {
                let redis_client = redis::Client::open(settings.store.redis_dsn.as_str())?;
                let redis_manager = redis_client.get_connection_manager().await?;
                let pool = Pool::<MySql>::connect(&settings.store.mysql_dsn).await?;

                (
                    Arc::new(MySqlUserRepo::new(pool.clone())),
                    Arc::new(RedisSessionStore::new(
                        redis_manager,
                        settings.store.session_prefix.clone(),
                    )),
                    Some(pool),
                )
            }
            other => return Err(anyhow::anyhow!("Unknown store backend: {}", other)),
        };

        let auth_service: Arc<dyn AuthService> = Arc::new(RealAuthService::new(
            user_repo.clone(),
            session_store,
            credential_hasher.clone(),
            token_codec,
        ));
        let user_service: Arc<dyn UserService> =
            Arc::new(RealUserService::new(user_repo, credential_hasher));

        info!("server started");

        Ok(Self {
            auth_service,
            user_service,
            pool,
        })
    }

    pub async fn shutdown(&self) {
        info!("server shutting down...");

        if let Some(pool) = &self.pool {
            pool.close().await;
        }
    }
}
