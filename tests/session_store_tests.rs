use chrono::Utc;

use gatehouse::application_port::{AuthError, TokenPair};
use gatehouse::domain_model::UserId;
use gatehouse::domain_port::{SessionClaims, SessionStore};
use gatehouse::infra_memory::MemorySessionStore;

fn make_pair(access_id: &str, refresh_id: &str, access_secs: i64, refresh_secs: i64) -> TokenPair {
    let now = Utc::now().timestamp();
    TokenPair {
        access_token: "unused".to_string(),
        refresh_token: "unused".to_string(),
        access_id: access_id.to_string(),
        refresh_id: refresh_id.to_string(),
        access_expires_at: now + access_secs,
        refresh_expires_at: now + refresh_secs,
    }
}

fn claims_for(user_id: u64, username: &str) -> SessionClaims {
    SessionClaims {
        user_id: UserId(user_id),
        username: username.to_string(),
        role: "user".to_string(),
    }
}

#[tokio::test]
async fn put_then_fetch_roundtrip() {
    let store = MemorySessionStore::new();
    let pair = make_pair("a1", "a1++1alice", 60, 300);
    let claims = claims_for(1, "alice");

    store.put(&pair, &claims).await.expect("put");

    let by_access = store.fetch("a1").await.expect("fetch by access id");
    assert_eq!(by_access, claims);

    // Both entries carry the same payload; the refresh key resolves too.
    let by_refresh = store.fetch("a1++1alice").await.expect("fetch by refresh id");
    assert_eq!(by_refresh, claims);
}

#[tokio::test]
async fn fetch_unknown_id_is_a_miss() {
    let store = MemorySessionStore::new();
    let res = store.fetch("never-written").await;
    assert!(matches!(res, Err(AuthError::SessionExpiredOrRevoked)));
}

#[tokio::test]
async fn revoke_removes_both_entries_and_is_idempotent() {
    let store = MemorySessionStore::new();
    let pair = make_pair("a2", "a2++2bob", 60, 300);
    store.put(&pair, &claims_for(2, "bob")).await.expect("put");

    store.revoke("a2", "a2++2bob").await.expect("revoke");
    assert!(matches!(
        store.fetch("a2").await,
        Err(AuthError::SessionExpiredOrRevoked)
    ));
    assert!(matches!(
        store.fetch("a2++2bob").await,
        Err(AuthError::SessionExpiredOrRevoked)
    ));

    // Nothing left to delete; still not an error.
    store.revoke("a2", "a2++2bob").await.expect("second revoke");
}

#[tokio::test]
async fn lapsed_entry_behaves_like_a_miss() {
    let store = MemorySessionStore::new();
    let pair = make_pair("a3", "a3++3eve", -10, 300);
    store.put(&pair, &claims_for(3, "eve")).await.expect("put");

    assert!(matches!(
        store.fetch("a3").await,
        Err(AuthError::SessionExpiredOrRevoked)
    ));
    // The refresh-keyed entry has its own, longer TTL and is still there.
    assert!(store.fetch("a3++3eve").await.is_ok());
}
