use std::sync::Arc;
use std::time::Duration;

use gatehouse::application_impl::{
    Argon2PasswordHasher, JwtConfig, JwtTokenCodec, RealAuthService,
};
use gatehouse::application_port::{
    AccessDetails, AuthError, AuthService, CredentialHasher, LoginInput, TokenPair,
};
use gatehouse::domain_model::UserId;
use gatehouse::domain_port::{NewUser, SessionStore, UserRecord, UserRepo};
use gatehouse::infra_memory::{MemorySessionStore, MemoryUserRepo};

struct Harness {
    auth: RealAuthService,
    users: Arc<MemoryUserRepo>,
    sessions: Arc<MemorySessionStore>,
}

fn build_harness() -> Harness {
    let users = Arc::new(MemoryUserRepo::new());
    let sessions = Arc::new(MemorySessionStore::new());
    let codec = JwtTokenCodec::new(JwtConfig {
        access_key: b"test-access-key".to_vec(),
        refresh_key: b"test-refresh-key".to_vec(),
        access_ttl: Duration::from_secs(60),
        refresh_ttl: Duration::from_secs(300),
    });

    let auth = RealAuthService::new(
        users.clone(),
        sessions.clone(),
        Arc::new(Argon2PasswordHasher),
        Arc::new(codec),
    );

    Harness {
        auth,
        users,
        sessions,
    }
}

async fn seed_user(h: &Harness, username: &str, password: &str, role: &str) -> UserRecord {
    let password_hash = Argon2PasswordHasher
        .hash_password(password)
        .await
        .expect("hash");
    h.users
        .create(NewUser {
            username: username.to_string(),
            password_hash,
            role: role.to_string(),
        })
        .await
        .expect("seed user")
}

async fn login(h: &Harness, username: &str, password: &str, force: bool) -> Result<TokenPair, AuthError> {
    h.auth
        .login(LoginInput {
            username: username.to_string(),
            password: password.to_string(),
            force_login: force,
        })
        .await
}

/// Re-derive the caller context the transport layer would hand to
/// refresh/logout: authenticate the pair's access token and project it.
async fn details_for(h: &Harness, pair: &TokenPair) -> AccessDetails {
    let claims = h
        .auth
        .authenticate(&format!("Bearer {}", pair.access_token))
        .await
        .expect("access token should authenticate");
    AccessDetails::from(&claims)
}

#[tokio::test]
async fn login_then_authenticate_returns_matching_claims() {
    let h = build_harness();
    let seeded = seed_user(&h, "alice", "password1234", "admin").await;

    let pair = login(&h, "alice", "password1234", false).await.expect("login");
    let claims = h
        .auth
        .authenticate(&format!("Bearer {}", pair.access_token))
        .await
        .expect("authenticate");

    assert_eq!(claims.user_id, seeded.id);
    assert_eq!(claims.username, "alice");
    assert_eq!(claims.role, "admin");
    assert_eq!(claims.token_id, pair.access_id);

    let user = h.users.get(seeded.id).await.expect("user record");
    assert!(user.is_logged_in);
    assert_eq!(user.current_token_id, pair.access_id);
}

#[tokio::test]
async fn login_failures_keep_distinct_kinds() {
    let h = build_harness();
    seed_user(&h, "alice", "password1234", "user").await;

    let unknown = login(&h, "nobody", "password1234", false).await;
    assert!(matches!(unknown, Err(AuthError::NotRegistered)));

    let wrong = login(&h, "alice", "not-the-password", false).await;
    assert!(matches!(wrong, Err(AuthError::WrongCredential)));
}

#[tokio::test]
async fn second_login_without_force_is_rejected_and_keeps_prior_session() {
    let h = build_harness();
    seed_user(&h, "alice", "password1234", "user").await;

    let first = login(&h, "alice", "password1234", false).await.expect("login");
    let second = login(&h, "alice", "password1234", false).await;
    assert!(matches!(second, Err(AuthError::AlreadyLoggedInElsewhere)));

    // The rejection must not have touched the prior session.
    assert!(h.sessions.fetch(&first.access_id).await.is_ok());
}

#[tokio::test]
async fn force_login_displaces_the_prior_session() {
    let h = build_harness();
    let seeded = seed_user(&h, "alice", "password1234", "user").await;

    let first = login(&h, "alice", "password1234", false).await.expect("login");
    let first_details = details_for(&h, &first).await;

    let second = login(&h, "alice", "password1234", true).await.expect("force login");
    assert_ne!(first.access_id, second.access_id);

    let user = h.users.get(seeded.id).await.expect("user record");
    assert_eq!(user.current_token_id, second.access_id);

    // The displaced pair can no longer be refreshed...
    let stale = h.auth.refresh(first_details).await;
    assert!(matches!(stale, Err(AuthError::SessionExpiredOrRevoked)));

    // ...while the new pair can.
    let fresh_details = details_for(&h, &second).await;
    assert!(h.auth.refresh(fresh_details).await.is_ok());
}

#[tokio::test]
async fn refresh_rotates_the_pair_with_no_overlap() {
    let h = build_harness();
    let seeded = seed_user(&h, "alice", "password1234", "user").await;

    let first = login(&h, "alice", "password1234", false).await.expect("login");
    let first_details = details_for(&h, &first).await;

    let second = h.auth.refresh(first_details.clone()).await.expect("refresh");
    assert_ne!(first.access_id, second.access_id);
    assert_ne!(first.access_token, second.access_token);

    // The old access id is gone from the store and cannot refresh again.
    assert!(matches!(
        h.sessions.fetch(&first.access_id).await,
        Err(AuthError::SessionExpiredOrRevoked)
    ));
    let reuse = h.auth.refresh(first_details).await;
    assert!(matches!(reuse, Err(AuthError::SessionExpiredOrRevoked)));

    // The new one can, and the user row follows the rotation.
    let second_details = details_for(&h, &second).await;
    let third = h.auth.refresh(second_details).await.expect("second refresh");

    let user = h.users.get(seeded.id).await.expect("user record");
    assert!(user.is_logged_in);
    assert_eq!(user.current_token_id, third.access_id);
}

#[tokio::test]
async fn refresh_preserves_subject_but_takes_role_from_caller() {
    let h = build_harness();
    let seeded = seed_user(&h, "alice", "password1234", "user").await;

    let pair = login(&h, "alice", "password1234", false).await.expect("login");
    let mut details = details_for(&h, &pair).await;
    details.role = "admin".to_string();

    let rotated = h.auth.refresh(details).await.expect("refresh");
    let claims = h
        .auth
        .authenticate(&format!("Bearer {}", rotated.access_token))
        .await
        .expect("authenticate rotated token");

    assert_eq!(claims.user_id, seeded.id);
    assert_eq!(claims.username, "alice");
    assert_eq!(claims.role, "admin");
}

#[tokio::test]
async fn refresh_loses_the_race_when_the_row_moved_on() {
    let h = build_harness();
    let seeded = seed_user(&h, "alice", "password1234", "user").await;

    let pair = login(&h, "alice", "password1234", false).await.expect("login");
    let details = details_for(&h, &pair).await;

    // Another transition slips in and moves the row first.
    let moved = h
        .users
        .swap_session_token(seeded.id, &pair.access_id, "someone-elses-token", true)
        .await
        .expect("swap");
    assert!(moved);

    let lost = h.auth.refresh(details).await;
    assert!(matches!(lost, Err(AuthError::SessionExpiredOrRevoked)));

    // The loser must not have overwritten the winner's token id.
    let user = h.users.get(seeded.id).await.expect("user record");
    assert_eq!(user.current_token_id, "someone-elses-token");
}

#[tokio::test]
async fn logout_clears_the_row_and_blocks_refresh() {
    let h = build_harness();
    let seeded = seed_user(&h, "alice", "password1234", "user").await;

    let pair = login(&h, "alice", "password1234", false).await.expect("login");
    let details = details_for(&h, &pair).await;

    h.auth.logout(details.clone()).await.expect("logout");

    let user = h.users.get(seeded.id).await.expect("user record");
    assert!(!user.is_logged_in);
    assert_eq!(user.current_token_id, "");

    let stale = h.auth.refresh(details.clone()).await;
    assert!(matches!(stale, Err(AuthError::SessionExpiredOrRevoked)));

    // Logging out twice is a no-op, not an error.
    h.auth.logout(details).await.expect("repeated logout");

    // And a fresh login works again.
    assert!(login(&h, "alice", "password1234", false).await.is_ok());
}

#[tokio::test]
async fn authenticate_rejects_bad_headers_and_tampered_tokens() {
    let h = build_harness();
    seed_user(&h, "alice", "password1234", "user").await;
    let pair = login(&h, "alice", "password1234", false).await.expect("login");

    let missing = h.auth.authenticate("no-token-here").await;
    assert!(matches!(missing, Err(AuthError::MissingToken)));

    let mut bytes = pair.access_token.into_bytes();
    let mid = bytes.len() / 2;
    bytes[mid] = if bytes[mid] == b'x' { b'y' } else { b'x' };
    let tampered = String::from_utf8(bytes).expect("utf8");
    let res = h.auth.authenticate(&format!("Bearer {tampered}")).await;
    assert!(
        matches!(
            res,
            Err(AuthError::TokenBadSignature) | Err(AuthError::TokenMalformed)
        ),
        "expected rejection, got {:?}",
        res
    );
}

#[tokio::test]
async fn authorize_requires_exact_role_match() {
    let h = build_harness();
    seed_user(&h, "alice", "password1234", "admin").await;
    seed_user(&h, "bobby", "password1234", "user").await;

    let admin_pair = login(&h, "alice", "password1234", false).await.expect("login");
    let admin_claims = h
        .auth
        .authenticate(&format!("Bearer {}", admin_pair.access_token))
        .await
        .expect("authenticate");
    assert!(h.auth.authorize(&admin_claims, "admin").is_ok());

    let user_pair = login(&h, "bobby", "password1234", false).await.expect("login");
    let user_claims = h
        .auth
        .authenticate(&format!("Bearer {}", user_pair.access_token))
        .await
        .expect("authenticate");
    assert!(matches!(
        h.auth.authorize(&user_claims, "admin"),
        Err(AuthError::Forbidden)
    ));
}

#[tokio::test]
async fn full_session_lifecycle_for_one_user() {
    let h = build_harness();
    let seeded = seed_user(&h, "alice", "password1234", "user").await;

    // Login -> P1.
    let p1 = login(&h, "alice", "password1234", false).await.expect("login");

    // Refresh with A1 -> P2; A1's session entry is gone.
    let p1_details = details_for(&h, &p1).await;
    let p2 = h.auth.refresh(p1_details).await.expect("refresh");
    assert!(matches!(
        h.sessions.fetch(&p1.access_id).await,
        Err(AuthError::SessionExpiredOrRevoked)
    ));

    // Logout with A2 -> the row shows logged out.
    let p2_details = details_for(&h, &p2).await;
    h.auth.logout(p2_details).await.expect("logout");

    let user = h.users.get(seeded.id).await.expect("user record");
    assert!(!user.is_logged_in);
    assert_eq!(user.current_token_id, "");
}
