//! Test utilities for database operations.
//!
//! Provides helpers for setting up and tearing down test databases.

use std::sync::Arc;

use sea_orm::{ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, DbErr, Statement};
use sea_orm_migration::MigratorTrait;
use tracing::info;

use crate::migrations::Migrator;

/// Test database configuration.
#[derive(Debug, Clone)]
pub struct TestDbConfig {
    /// Database host.
    pub host: String,
    /// Database port.
    pub port: u16,
    /// Database username.
    pub username: String,
    /// Database password.
    pub password: String,
    /// Database name.
    pub database: String,
}

impl Default for TestDbConfig {
    fn default() -> Self {
        Self {
            host: std::env::var("TEST_DB_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: std::env::var("TEST_DB_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5433),
            username: std::env::var("TEST_DB_USER")
                .unwrap_or_else(|_| "lostsons_test".to_string()),
            password: std::env::var("TEST_DB_PASSWORD")
                .unwrap_or_else(|_| "lostsons_test".to_string()),
            database: std::env::var("TEST_DB_NAME")
                .unwrap_or_else(|_| "lostsons_test".to_string()),
        }
    }
}

impl TestDbConfig {
    /// Get the database URL.
    #[must_use]
    pub fn database_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database
        )
    }
}

/// A migrated test database.
pub struct TestDatabase {
    /// Database connection, shared with the repositories under test.
    pub conn: Arc<DatabaseConnection>,
    /// Database configuration.
    pub config: TestDbConfig,
}

impl TestDatabase {
    /// Connect to the test database from `TEST_DB_*` and run migrations.
    pub async fn new() -> Result<Self, DbErr> {
        Self::with_config(TestDbConfig::default()).await
    }

    /// Connect with custom configuration and run migrations.
    pub async fn with_config(config: TestDbConfig) -> Result<Self, DbErr> {
        let conn = Database::connect(&config.database_url()).await?;
        Migrator::up(&conn, None).await?;

        info!(database = %config.database, "Connected to test database");

        Ok(Self {
            conn: Arc::new(conn),
            config,
        })
    }

    /// Shared handle to the connection, as repositories take it.
    #[must_use]
    pub fn connection(&self) -> Arc<DatabaseConnection> {
        Arc::clone(&self.conn)
    }

    /// Remove all catalog rows, links first.
    pub async fn cleanup(&self) -> Result<(), DbErr> {
        for table in ["clips_tags", "clips_users", "clips", "tags", "games", "users"] {
            self.conn
                .execute(Statement::from_string(
                    DatabaseBackend::Postgres,
                    format!("DELETE FROM \"{table}\""),
                ))
                .await?;
        }

        info!("Cleaned up test database");
        Ok(())
    }

    /// Count rows of a table matching an optional SQL condition.
    pub async fn count(&self, table: &str, condition: Option<&str>) -> Result<i64, DbErr> {
        let sql = match condition {
            Some(condition) => format!("SELECT COUNT(*) AS n FROM \"{table}\" WHERE {condition}"),
            None => format!("SELECT COUNT(*) AS n FROM \"{table}\""),
        };

        let row = self
            .conn
            .query_one(Statement::from_string(DatabaseBackend::Postgres, sql))
            .await?;

        match row {
            Some(row) => row.try_get::<i64>("", "n"),
            None => Ok(0),
        }
    }
}
