use crate::config::SeedUserConfig;
use crate::models::NewUser;
use crate::password;
use crate::storage::UserStore;
use anyhow::{Context, Result};
use std::fmt;
use tracing::{debug, info};

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;

/// Whether the seed run inserted a new row or refreshed an existing one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedAction {
    Created,
    Updated,
}

/// Result of a successful seed run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeededUser {
    pub id: String,
    pub email: String,
    pub action: SeedAction,
}

impl SeededUser {
    /// The confirmation line printed on stdout
    pub fn ready_line(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for SeededUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Seed user ready (id: {}, email: {})", self.id, self.email)
    }
}

/// Ensures the configured user exists, creating or refreshing it by email
pub struct SeedRunner<S: UserStore> {
    store: S,
    settings: SeedUserConfig,
}

impl<S: UserStore> SeedRunner<S> {
    pub fn new(store: S, settings: SeedUserConfig) -> Self {
        Self { store, settings }
    }

    /// Hash the password, then upsert the user keyed by email
    pub async fn run(&self) -> Result<SeededUser> {
        let settings = &self.settings;

        debug!("Hashing seed user password (cost {})", settings.password_cost);
        let password_hash = password::hash_password(&settings.password, settings.password_cost)
            .context("Failed to hash seed user password")?;

        let desired = NewUser {
            name: settings.name.clone(),
            email: settings.email.clone(),
            password_hash,
            status: true,
        };

        let existing = self
            .store
            .find_first_by_email(&settings.email)
            .await
            .context(format!("Failed to look up user {}", settings.email))?;

        let (user, action) = match existing {
            Some(existing) => {
                info!("🔄 User {} exists (id: {}), updating", existing.email, existing.id);
                let user = self
                    .store
                    .update(&existing.id, desired.as_changes())
                    .await
                    .context(format!("Failed to update user {}", existing.id))?;
                (user, SeedAction::Updated)
            }
            None => {
                info!("🌱 No user with email {}, creating", settings.email);
                let user = self
                    .store
                    .create(desired)
                    .await
                    .context(format!("Failed to create user {}", settings.email))?;
                (user, SeedAction::Created)
            }
        };

        info!("✅ Seed user {:?} (id: {})", action, user.id);

        Ok(SeededUser {
            id: user.id,
            email: user.email,
            action,
        })
    }

    /// Run once and release the store whatever the outcome
    pub async fn run_to_completion(self) -> Result<SeededUser> {
        let result = self.run().await;

        self.store.close().await;
        info!("🔌 User store closed");

        result
    }
}

/// The single diagnostic line written to stderr on failure
pub fn failure_line(err: &anyhow::Error) -> String {
    format!("Seed failed: {:#}", err)
}

/// Process exit status for a seed result
pub fn exit_status<T>(result: &Result<T>) -> u8 {
    match result {
        Ok(_) => EXIT_SUCCESS,
        Err(_) => EXIT_FAILURE,
    }
}
