use anyhow::{Context, Result};
use seed_user::config::{load_dotenv, Config};
use seed_user::seed::{exit_status, failure_line, SeedRunner, SeededUser};
use seed_user::storage::PgUserStore;
use sqlx::postgres::PgPoolOptions;
use std::path::Path;
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_logging() {
    // Logs go to stderr; stdout only carries the result line
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "seed_user=info,sqlx=warn".into());

    if log_format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn load_config() -> Result<Config> {
    let config_path = Config::config_path();

    if Path::new(&config_path).exists() {
        info!("📋 Loading configuration from {}", config_path);
        Config::from_yaml_and_env(&config_path)
    } else {
        Config::from_env()
    }
}

async fn seed() -> Result<SeededUser> {
    let config = load_config()?;
    info!("✅ Configuration loaded (seed user: {})", config.seed_user.email);

    info!("🔌 Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.database.acquire_timeout)
        .connect(&config.database.url)
        .await
        .context("Failed to connect to database")?;

    if config.database.run_migrations {
        info!("🔄 Running database migrations...");
        if let Err(e) = sqlx::migrate!("./migrations").run(&pool).await {
            pool.close().await;
            return Err(e).context("Failed to run migrations");
        }
        info!("✅ Migrations completed");
    }

    SeedRunner::new(PgUserStore::new(pool), config.seed_user)
        .run_to_completion()
        .await
}

#[tokio::main]
async fn main() -> ExitCode {
    load_dotenv();
    init_logging();

    let result = seed().await;

    match &result {
        Ok(user) => println!("{}", user.ready_line()),
        Err(e) => {
            debug!("Seed failed: {:?}", e);
            eprintln!("{}", failure_line(e));
        }
    }

    ExitCode::from(exit_status(&result))
}
