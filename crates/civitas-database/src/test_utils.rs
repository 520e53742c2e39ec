//! Test utilities for database integration tests
//!
//! Every `TestDatabase` is a private in-memory SQLite database, so tests in
//! different crates (and in the same crate) never observe each other's rows.

use crate::DbConnection;
use civitas_migrations::Migrator;
use sea_orm::*;
use sea_orm_migration::MigratorTrait;
use std::sync::Arc;

const MEMORY_URL: &str = "sqlite::memory:";

/// Test database backed by in-memory SQLite
pub struct TestDatabase {
    pub db: Arc<DbConnection>,
    pub database_url: String,
}

impl TestDatabase {
    /// Create an empty test database (no schema)
    pub async fn new() -> anyhow::Result<Self> {
        let mut opt = ConnectOptions::new(MEMORY_URL.to_owned());
        // A second pooled connection would open a different, empty database
        opt.max_connections(1)
            .min_connections(1)
            .sqlx_logging(false);

        let db = Database::connect(opt).await?;

        let test_db = TestDatabase {
            db: Arc::new(db),
            database_url: MEMORY_URL.to_string(),
        };

        test_db
            .test_connection()
            .await
            .map_err(|e| anyhow::anyhow!("Initial connection test failed: {}", e))?;

        Ok(test_db)
    }

    /// Create a test database and run migrations
    pub async fn with_migrations() -> anyhow::Result<Self> {
        let test_db = Self::new().await?;

        Migrator::up(&*test_db.db, None)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to run migrations: {}", e))?;

        Ok(test_db)
    }

    /// Execute raw SQL for testing
    pub async fn execute_sql(&self, sql: &str) -> anyhow::Result<ExecResult> {
        let statement = Statement::from_string(DatabaseBackend::Sqlite, sql.to_owned());
        let result = self.db.execute(statement).await?;
        Ok(result)
    }

    /// Query raw SQL and return results
    pub async fn query_sql(&self, sql: &str) -> anyhow::Result<Vec<QueryResult>> {
        let statement = Statement::from_string(DatabaseBackend::Sqlite, sql.to_owned());
        let result = self.db.query_all(statement).await?;
        Ok(result)
    }

    /// Number of rows currently in `table`
    pub async fn count_rows(&self, table: &str) -> anyhow::Result<i64> {
        let rows = self
            .query_sql(&format!("SELECT COUNT(*) AS count FROM {}", table))
            .await?;
        let row = rows
            .first()
            .ok_or_else(|| anyhow::anyhow!("COUNT(*) on {} returned no row", table))?;
        Ok(row.try_get::<i64>("", "count")?)
    }

    /// Test database connectivity
    pub async fn test_connection(&self) -> anyhow::Result<()> {
        let statement = Statement::from_string(DatabaseBackend::Sqlite, "SELECT 1".to_owned());
        let result = self.db.query_one(statement).await?;

        if result.is_none() {
            return Err(anyhow::anyhow!("Connection test failed"));
        }

        Ok(())
    }

    /// Get the database connection
    pub fn connection(&self) -> &DbConnection {
        &self.db
    }

    /// Get the database connection as Arc
    pub fn connection_arc(&self) -> Arc<DbConnection> {
        Arc::clone(&self.db)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_database_setup() -> anyhow::Result<()> {
        let test_db = TestDatabase::new().await?;

        test_db.test_connection().await?;

        let result = test_db.query_sql("SELECT 1 AS test_value").await?;
        assert_eq!(result.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_with_migrations() -> anyhow::Result<()> {
        let test_db = TestDatabase::with_migrations().await?;

        assert_eq!(test_db.count_rows("mailer_emails").await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_databases_are_isolated() -> anyhow::Result<()> {
        let first = TestDatabase::with_migrations().await?;
        let second = TestDatabase::with_migrations().await?;

        first
            .execute_sql(
                "INSERT INTO mailer_emails (uuid, request_payload, status) VALUES ('uuid-1', x'00', 'sent')",
            )
            .await?;

        assert_eq!(first.count_rows("mailer_emails").await?, 1);
        assert_eq!(second.count_rows("mailer_emails").await?, 0);
        Ok(())
    }
}
