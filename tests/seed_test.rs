use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;
use seed_user::config::SeedUserConfig;
use seed_user::models::{NewUser, User, UserChanges};
use seed_user::password::verify_password;
use seed_user::seed::{exit_status, SeedAction, SeedRunner, EXIT_FAILURE, EXIT_SUCCESS};
use seed_user::storage::{MemoryUserStore, UserStore};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Settings with bcrypt's minimum cost so tests stay fast
fn fast_settings(email: &str, name: &str, password: &str) -> SeedUserConfig {
    SeedUserConfig {
        email: email.to_string(),
        name: name.to_string(),
        password: password.to_string(),
        password_cost: 4,
    }
}

/// Store whose lookups always fail, as if the database were unreachable
#[derive(Clone, Default)]
struct UnreachableStore {
    close_calls: Arc<AtomicUsize>,
    writes: Arc<AtomicUsize>,
}

#[async_trait]
impl UserStore for UnreachableStore {
    async fn find_first_by_email(&self, _email: &str) -> Result<Option<User>> {
        Err(anyhow!("connection refused"))
    }

    async fn create(&self, _user: NewUser) -> Result<User> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        Err(anyhow!("connection refused"))
    }

    async fn update(&self, _id: &str, _changes: UserChanges) -> Result<User> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        Err(anyhow!("connection refused"))
    }

    async fn close(&self) {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn test_seed_is_idempotent() {
    let store = MemoryUserStore::new();
    let settings = fast_settings("usuario@teste.com", "Usuario Teste", "usuario123");

    SeedRunner::new(store.clone(), settings.clone())
        .run()
        .await
        .expect("first run failed");
    SeedRunner::new(store.clone(), settings)
        .run()
        .await
        .expect("second run failed");

    assert_eq!(store.users().len(), 1);
    assert_eq!(store.count_by_email("usuario@teste.com"), 1);
}

#[tokio::test]
async fn test_upsert_creates_then_updates_preserving_identity() {
    let store = MemoryUserStore::new();

    let created = SeedRunner::new(store.clone(), fast_settings("a@x.com", "First Name", "pw"))
        .run()
        .await
        .unwrap();

    assert_eq!(created.action, SeedAction::Created);
    assert_eq!(created.id, "u1");
    let stored = store.users();
    assert_eq!(stored[0].name, "First Name");
    assert!(stored[0].status);

    let updated = SeedRunner::new(store.clone(), fast_settings("a@x.com", "Second Name", "pw"))
        .run()
        .await
        .unwrap();

    assert_eq!(updated.action, SeedAction::Updated);
    assert_eq!(updated.id, created.id);
    assert_eq!(updated.email, "a@x.com");

    let stored = store.users();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].id, "u1");
    assert_eq!(stored[0].email, "a@x.com");
    assert_eq!(stored[0].name, "Second Name");
    assert!(stored[0].status);
}

#[tokio::test]
async fn test_inactive_user_is_reactivated() {
    let now = Utc::now();
    let store = MemoryUserStore::with_users(vec![User {
        id: "legacy-7".to_string(),
        name: "Old".to_string(),
        email: "a@x.com".to_string(),
        password_hash: "old-hash".to_string(),
        status: false,
        created_at: now,
        updated_at: now,
    }]);

    let seeded = SeedRunner::new(store.clone(), fast_settings("a@x.com", "New", "pw"))
        .run()
        .await
        .unwrap();

    assert_eq!(seeded.id, "legacy-7");
    let user = &store.users()[0];
    assert!(user.status);
    assert_eq!(user.name, "New");
    assert_ne!(user.password_hash, "old-hash");
}

#[tokio::test]
async fn test_stored_password_is_hashed() {
    let store = MemoryUserStore::new();

    SeedRunner::new(store.clone(), fast_settings("a@x.com", "A", "usuario123"))
        .run()
        .await
        .unwrap();

    let user = &store.users()[0];
    assert_ne!(user.password_hash, "usuario123");
    assert!(verify_password("usuario123", &user.password_hash));
}

#[tokio::test]
async fn test_defaults_seed_default_user() {
    let mut settings = SeedUserConfig::from_lookup(|_| None).unwrap();
    settings.password_cost = 4;
    let store = MemoryUserStore::new();

    let seeded = SeedRunner::new(store.clone(), settings)
        .run_to_completion()
        .await
        .unwrap();

    assert_eq!(
        seeded.ready_line(),
        "Seed user ready (id: u1, email: usuario@teste.com)"
    );
    let user = &store.users()[0];
    assert_eq!(user.name, "Usuario Teste");
    assert!(verify_password("usuario123", &user.password_hash));
}

#[tokio::test]
async fn test_store_closed_after_success() {
    let store = MemoryUserStore::new();

    let result = SeedRunner::new(store.clone(), fast_settings("a@x.com", "A", "pw"))
        .run_to_completion()
        .await;

    assert_eq!(exit_status(&result), EXIT_SUCCESS);
    assert_eq!(store.close_calls(), 1);
    assert!(store.is_closed());
}

#[tokio::test]
async fn test_store_closed_when_lookup_fails() {
    let store = UnreachableStore::default();

    let result = SeedRunner::new(store.clone(), fast_settings("a@x.com", "A", "pw"))
        .run_to_completion()
        .await;

    assert_eq!(exit_status(&result), EXIT_FAILURE);
    assert_eq!(store.close_calls.load(Ordering::SeqCst), 1);
    assert_eq!(store.writes.load(Ordering::SeqCst), 0);

    let message = format!("{:#}", result.unwrap_err());
    assert!(message.contains("Failed to look up user a@x.com"));
    assert!(message.contains("connection refused"));
}
