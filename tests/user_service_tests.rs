use std::sync::Arc;

use gatehouse::application_impl::{Argon2PasswordHasher, RealUserService};
use gatehouse::application_port::{
    AuthError, CreateUserInput, CredentialHasher, UpdatePasswordInput, UpdateUserInput,
    UserService,
};
use gatehouse::domain_port::UserRepo;
use gatehouse::infra_memory::MemoryUserRepo;

struct Harness {
    service: RealUserService,
    users: Arc<MemoryUserRepo>,
}

fn build_harness() -> Harness {
    let users = Arc::new(MemoryUserRepo::new());
    let service = RealUserService::new(users.clone(), Arc::new(Argon2PasswordHasher));
    Harness { service, users }
}

fn create_input(username: &str, password: &str, role: &str) -> CreateUserInput {
    CreateUserInput {
        username: username.to_string(),
        password: password.to_string(),
        role: role.to_string(),
    }
}

#[tokio::test]
async fn create_and_get_roundtrip() {
    let h = build_harness();

    let created = h
        .service
        .create(create_input("alice", "password1234", "user"))
        .await
        .expect("create");
    assert_eq!(created.username, "alice");
    assert_eq!(created.role, "user");

    let fetched = h.service.get(created.id).await.expect("get");
    assert_eq!(fetched.username, "alice");

    // Stored credential is a real argon2 hash of the password.
    let record = h.users.get(created.id).await.expect("record");
    assert_ne!(record.password_hash, "password1234");
    assert!(
        Argon2PasswordHasher
            .verify_password("password1234", &record.password_hash)
            .await
            .expect("verify")
    );
}

#[tokio::test]
async fn create_rejects_bad_input() {
    let h = build_harness();

    let taken = h
        .service
        .create(create_input("alice", "password1234", "user"))
        .await;
    assert!(taken.is_ok());
    let dup = h
        .service
        .create(create_input("alice", "password1234", "user"))
        .await;
    assert!(matches!(dup, Err(AuthError::UserExists)));

    let short_name = h.service.create(create_input("al", "password1234", "user")).await;
    assert!(matches!(short_name, Err(AuthError::Validation(_))));

    let digits = h
        .service
        .create(create_input("alice99", "password1234", "user"))
        .await;
    assert!(matches!(digits, Err(AuthError::Validation(_))));

    let short_password = h.service.create(create_input("carol", "short", "user")).await;
    assert!(matches!(short_password, Err(AuthError::Validation(_))));

    let bad_role = h
        .service
        .create(create_input("carol", "password1234", "root"))
        .await;
    assert!(matches!(bad_role, Err(AuthError::Validation(_))));
}

#[tokio::test]
async fn update_enforces_username_uniqueness() {
    let h = build_harness();
    let alice = h
        .service
        .create(create_input("alice", "password1234", "user"))
        .await
        .expect("create alice");
    let bob = h
        .service
        .create(create_input("bobby", "password1234", "user"))
        .await
        .expect("create bobby");

    let clash = h
        .service
        .update(UpdateUserInput {
            id: bob.id,
            username: "alice".to_string(),
        })
        .await;
    assert!(matches!(clash, Err(AuthError::UserExists)));

    // Renaming to your own current name is not a clash.
    let same = h
        .service
        .update(UpdateUserInput {
            id: alice.id,
            username: "alice".to_string(),
        })
        .await;
    assert!(same.is_ok());

    let renamed = h
        .service
        .update(UpdateUserInput {
            id: bob.id,
            username: "robert".to_string(),
        })
        .await
        .expect("rename");
    assert_eq!(renamed.username, "robert");
}

#[tokio::test]
async fn update_password_verifies_the_old_one_first() {
    let h = build_harness();
    let alice = h
        .service
        .create(create_input("alice", "password1234", "user"))
        .await
        .expect("create");

    let wrong = h
        .service
        .update_password(UpdatePasswordInput {
            id: alice.id,
            old_password: "not-the-password".to_string(),
            new_password: "newpassword1".to_string(),
        })
        .await;
    assert!(matches!(wrong, Err(AuthError::WrongCredential)));

    h.service
        .update_password(UpdatePasswordInput {
            id: alice.id,
            old_password: "password1234".to_string(),
            new_password: "newpassword1".to_string(),
        })
        .await
        .expect("update password");

    let record = h.users.get(alice.id).await.expect("record");
    assert!(
        Argon2PasswordHasher
            .verify_password("newpassword1", &record.password_hash)
            .await
            .expect("verify")
    );
}

#[tokio::test]
async fn delete_then_get_is_not_found() {
    let h = build_harness();
    let alice = h
        .service
        .create(create_input("alice", "password1234", "user"))
        .await
        .expect("create");

    h.service.delete(alice.id).await.expect("delete");

    let gone = h.service.get(alice.id).await;
    assert!(matches!(gone, Err(AuthError::UserNotFound)));

    let again = h.service.delete(alice.id).await;
    assert!(matches!(again, Err(AuthError::UserNotFound)));
}
