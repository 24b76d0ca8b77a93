use super::UserStore;
use crate::models::{NewUser, User, UserChanges};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// In-process user store, used by tests.
///
/// Ids are assigned as `u1`, `u2`, ... in insertion order.
#[derive(Clone, Default)]
pub struct MemoryUserStore {
    users: Arc<Mutex<Vec<User>>>, // insertion order
    next_id: Arc<AtomicU64>,
    closed: Arc<AtomicBool>,
    close_calls: Arc<AtomicUsize>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with existing rows (kept in the given order).
    /// New ids continue after the highest `uN` already present.
    pub fn with_users(users: Vec<User>) -> Self {
        let store = Self::new();
        let highest = users
            .iter()
            .filter_map(|u| u.id.strip_prefix('u')?.parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        store.next_id.store(highest, Ordering::SeqCst);
        if let Ok(mut guard) = store.users.lock() {
            *guard = users;
        }
        store
    }

    /// Snapshot of every stored user
    pub fn users(&self) -> Vec<User> {
        self.users.lock().map(|u| u.clone()).unwrap_or_default()
    }

    /// Number of users with the given email
    pub fn count_by_email(&self, email: &str) -> usize {
        self.users().iter().filter(|u| u.email == email).count()
    }

    /// How many times `close` has been called
    pub fn close_calls(&self) -> usize {
        self.close_calls.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn lock_open(&self) -> Result<MutexGuard<'_, Vec<User>>> {
        if self.is_closed() {
            return Err(anyhow!("user store is closed"));
        }
        self.users
            .lock()
            .map_err(|_| anyhow!("user store lock poisoned"))
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_first_by_email(&self, email: &str) -> Result<Option<User>> {
        let users = self.lock_open()?;
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn create(&self, user: NewUser) -> Result<User> {
        let mut users = self.lock_open()?;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let now = Utc::now();

        let created = User {
            id: format!("u{}", id),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            status: user.status,
            created_at: now,
            updated_at: now,
        };
        users.push(created.clone());

        Ok(created)
    }

    async fn update(&self, id: &str, changes: UserChanges) -> Result<User> {
        let mut users = self.lock_open()?;
        let user = users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| anyhow!("User {} not found", id))?;

        user.name = changes.name;
        user.password_hash = changes.password_hash;
        user.status = changes.status;
        user.updated_at = Utc::now();

        Ok(user.clone())
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.close_calls.fetch_add(1, Ordering::SeqCst);
    }
}
