use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::fmt;
use std::fs;
use std::path::Path;
use tokio::time::Duration;
use tracing::warn;

pub const DEFAULT_SEED_EMAIL: &str = "usuario@teste.com";
pub const DEFAULT_SEED_NAME: &str = "Usuario Teste";
pub const DEFAULT_SEED_PASSWORD: &str = "usuario123";

/// Path of the optional YAML file when SEED_CONFIG is not set
pub const DEFAULT_CONFIG_PATH: &str = "seed.yaml";

fn default_email() -> String {
    DEFAULT_SEED_EMAIL.to_string()
}

fn default_name() -> String {
    DEFAULT_SEED_NAME.to_string()
}

fn default_password() -> String {
    DEFAULT_SEED_PASSWORD.to_string()
}

fn default_password_cost() -> u32 {
    crate::password::DEFAULT_COST
}

/// The user record the seeder guarantees exists
#[derive(Clone, Deserialize, PartialEq)]
pub struct SeedUserConfig {
    #[serde(default = "default_email")]
    pub email: String,
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_password")]
    pub password: String,
    #[serde(default = "default_password_cost")]
    pub password_cost: u32,
}

impl Default for SeedUserConfig {
    fn default() -> Self {
        Self {
            email: default_email(),
            name: default_name(),
            password: default_password(),
            password_cost: default_password_cost(),
        }
    }
}

// Keep the plaintext password out of logs
impl fmt::Debug for SeedUserConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeedUserConfig")
            .field("email", &self.email)
            .field("name", &self.name)
            .field("password", &"<redacted>")
            .field("password_cost", &self.password_cost)
            .finish()
    }
}

impl SeedUserConfig {
    /// Build from defaults plus whatever `lookup` provides.
    ///
    /// `lookup` maps a variable name to its value; pass `env_var` for the
    /// process environment or a closure over a map in tests.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::default().with_overrides(lookup)
    }

    /// Apply SEED_USER_* overrides on top of the current values.
    /// Empty strings are kept verbatim; only absent variables fall back.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(email) = lookup("SEED_USER_EMAIL") {
            self.email = email;
        }
        if let Some(name) = lookup("SEED_USER_NAME") {
            self.name = name;
        }
        if let Some(password) = lookup("SEED_USER_PASSWORD") {
            self.password = password;
        }
        if let Some(cost) = lookup("SEED_USER_PASSWORD_COST") {
            self.password_cost = cost
                .trim()
                .parse()
                .context("Invalid SEED_USER_PASSWORD_COST")?;
        }

        if self.password == DEFAULT_SEED_PASSWORD {
            warn!("⚠️  Seed user is using the default password. Set SEED_USER_PASSWORD outside development!");
        }

        Ok(self)
    }
}

/// Layout of the optional seed.yaml file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeedYaml {
    #[serde(default)]
    pub user: SeedUserConfig,
}

/// Database connection settings
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    pub run_migrations: bool,
}

impl DatabaseConfig {
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = lookup("DATABASE_URL").context("DATABASE_URL not set")?;

        let max_connections = lookup("DB_MAX_CONNECTIONS")
            .unwrap_or_else(|| "1".to_string())
            .parse()
            .context("Invalid DB_MAX_CONNECTIONS")?;

        let acquire_timeout_secs: u64 = lookup("DB_ACQUIRE_TIMEOUT_SECS")
            .unwrap_or_else(|| "30".to_string())
            .parse()
            .context("Invalid DB_ACQUIRE_TIMEOUT_SECS")?;

        let run_migrations = lookup("RUN_MIGRATIONS")
            .unwrap_or_else(|| "true".to_string())
            .parse()
            .context("Invalid RUN_MIGRATIONS (expected true or false)")?;

        Ok(Self {
            url,
            max_connections,
            acquire_timeout: Duration::from_secs(acquire_timeout_secs),
            run_migrations,
        })
    }
}

/// Seeder configuration combining seed.yaml and environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub seed_user: SeedUserConfig,
}

/// Read a process environment variable, treating unset (or non-UTF-8) as absent
pub fn env_var(key: &str) -> Option<String> {
    env::var(key).ok()
}

/// Load `.env` from the working directory (or a parent) into the process
/// environment. Must run before anything reads env settings.
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

/// Load a specific env file; existing variables are not overwritten
pub fn load_dotenv_from(path: &Path) -> Result<()> {
    dotenvy::from_path(path).context(format!("Failed to load {}", path.display()))?;
    Ok(())
}

impl Config {
    /// Path of the YAML file, honouring SEED_CONFIG
    pub fn config_path() -> String {
        env_var("SEED_CONFIG").unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string())
    }

    /// Load seed user defaults from a YAML file, then apply environment overrides
    pub fn from_yaml_and_env(yaml_path: &str) -> Result<Self> {
        let yaml_content =
            fs::read_to_string(yaml_path).context(format!("Failed to read {}", yaml_path))?;
        let seed_yaml: SeedYaml = serde_yaml::from_str(&yaml_content)
            .context(format!("Failed to parse {}", yaml_path))?;

        Self::from_parts(seed_yaml, env_var)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Result<Self> {
        Self::from_parts(SeedYaml::default(), env_var)
    }

    fn from_parts<F>(seed_yaml: SeedYaml, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let seed_user = seed_yaml.user.with_overrides(&lookup)?;
        let database = DatabaseConfig::from_lookup(&lookup)?;

        Ok(Self {
            database,
            seed_user,
        })
    }
}
