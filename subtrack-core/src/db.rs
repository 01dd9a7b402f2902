use sqlx::migrate::Migrator;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{debug, info};

use crate::config::{DatabaseSettings, SubtrackConfig};

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Pool settings for the Postgres backing store.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: 10,
            min_connections: 1,
            acquire_timeout_secs: 30,
            idle_timeout_secs: 600,
        }
    }
}

impl DatabaseConfig {
    pub fn from_env() -> Result<Self, DatabaseError> {
        let url = std::env::var("DATABASE_URL")
            .or_else(|_| std::env::var("SUBTRACK_DATABASE_URL"))
            .map_err(|_| DatabaseError::MissingEnvVar("DATABASE_URL".to_string()))?;

        let defaults = Self::default();

        Ok(Self {
            url,
            max_connections: env_or("SUBTRACK_DB_MAX_CONNECTIONS", defaults.max_connections),
            min_connections: env_or("SUBTRACK_DB_MIN_CONNECTIONS", defaults.min_connections),
            acquire_timeout_secs: env_or(
                "SUBTRACK_DB_ACQUIRE_TIMEOUT_SECS",
                defaults.acquire_timeout_secs,
            ),
            idle_timeout_secs: env_or("SUBTRACK_DB_IDLE_TIMEOUT_SECS", defaults.idle_timeout_secs),
        })
    }

    pub fn validate(&self) -> Result<(), DatabaseError> {
        if self.url.is_empty() {
            return Err(DatabaseError::InvalidConfig("database url is empty".to_string()));
        }
        if self.min_connections > self.max_connections {
            return Err(DatabaseError::InvalidConfig(format!(
                "min_connections ({}) exceeds max_connections ({})",
                self.min_connections, self.max_connections
            )));
        }
        Ok(())
    }
}

impl From<&DatabaseSettings> for DatabaseConfig {
    fn from(settings: &DatabaseSettings) -> Self {
        Self {
            url: settings.url.clone(),
            max_connections: settings.pool_max_connections,
            min_connections: settings.pool_min_connections,
            acquire_timeout_secs: settings.pool_acquire_timeout_secs,
            idle_timeout_secs: settings.pool_idle_timeout_secs,
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(#[from] sqlx::Error),

    #[error("Migration failed: {0}")]
    MigrationFailed(#[source] sqlx::migrate::MigrateError),

    #[error("Invalid database configuration: {0}")]
    InvalidConfig(String),
}

/// Shared handle to the connection pool. Cloning is cheap; every clone
/// refers to the same pool.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        config.validate()?;
        info!(
            max_connections = config.max_connections,
            "Connecting to database..."
        );

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
            .connect(&config.url)
            .await?;

        info!("Database connection pool established");

        Ok(Self { pool })
    }

    pub async fn connect_with_url(url: &str) -> Result<Self, DatabaseError> {
        let config = DatabaseConfig {
            url: url.to_string(),
            ..Default::default()
        };
        Self::connect(&config).await
    }

    pub async fn run_migrations(&self) -> Result<(), DatabaseError> {
        info!("Running database migrations...");

        MIGRATOR
            .run(&self.pool)
            .await
            .map_err(DatabaseError::MigrationFailed)?;

        info!("Database migrations completed successfully");
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<(), DatabaseError> {
        debug!("Running database health check");
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    pub async fn close(&self) {
        info!("Closing database connection pool...");
        self.pool.close().await;
        info!("Database connection pool closed");
    }
}

/// Loads configuration, connects and migrates.
pub async fn init_database() -> crate::error::SubtrackResult<Database> {
    let config = SubtrackConfig::load()?;
    let db = Database::connect(&DatabaseConfig::from(&config.database)).await?;
    db.run_migrations().await?;
    Ok(db)
}

pub async fn init_database_with_url(url: &str) -> Result<Database, DatabaseError> {
    let db = Database::connect_with_url(url).await?;
    db.run_migrations().await?;
    Ok(db)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_config_default() {
        let config = DatabaseConfig::default();
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.min_connections, 1);
        assert_eq!(config.acquire_timeout_secs, 30);
        assert_eq!(config.idle_timeout_secs, 600);
    }

    #[test]
    fn test_validate_rejects_empty_url() {
        let config = DatabaseConfig::default();
        assert!(matches!(
            config.validate(),
            Err(DatabaseError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_validate_rejects_inverted_pool_bounds() {
        let config = DatabaseConfig {
            url: "postgres://localhost/subtrack".to_string(),
            min_connections: 5,
            max_connections: 2,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_settings() {
        let settings = DatabaseSettings {
            url: "postgres://localhost/subtrack_test".to_string(),
            pool_min_connections: 2,
            pool_max_connections: 4,
            pool_acquire_timeout_secs: 5,
            pool_idle_timeout_secs: 60,
        };
        let config = DatabaseConfig::from(&settings);
        assert_eq!(config.url, "postgres://localhost/subtrack_test");
        assert_eq!(config.min_connections, 2);
        assert_eq!(config.max_connections, 4);
        assert_eq!(config.acquire_timeout_secs, 5);
        assert_eq!(config.idle_timeout_secs, 60);
    }
}
