use std::path::Path;

use sqlx::migrate::Migrator;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Error, SqlitePool};

use crate::configs::schema::SchemaManager;
use crate::configs::settings::Database;

/// Sqlite pool holding the portal tables and the local registry.
#[derive(Clone)]
pub struct Storage {
    pool: SqlitePool,
}

impl Storage {
    pub async fn new(database: Database, schema_manager: SchemaManager) -> Result<Self, Error> {
        // Every connection to `:memory:` opens its own database.
        let in_memory = database.url.contains(":memory:");

        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(if in_memory { 1 } else { 10 })
            .connect(&database.url)
            .await?;

        let storage = Self { pool };
        storage.prepare_schema(&schema_manager, database.clean_start).await?;

        if let Some(migration_path) = &database.migration_path {
            storage.migrate(Path::new(migration_path)).await?;
        }

        Ok(storage)
    }

    pub fn get_pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn prepare_schema(&self, schema: &SchemaManager, clean_start: bool) -> Result<(), Error> {
        let mut statements = Vec::new();

        if clean_start {
            statements.push(String::from("DROP TABLE IF EXISTS _sqlx_migrations;"));
            statements.extend(schema.dispose_schema());
        }
        statements.extend(schema.create_schema());

        sqlx::raw_sql(&statements.join("\n")).execute(&self.pool).await?;

        if clean_start {
            tracing::warn!("clean start: portal schema dropped and recreated");
        }

        Ok(())
    }

    async fn migrate(&self, migration_path: &Path) -> Result<(), Error> {
        let migrator = Migrator::new(migration_path).await?;
        migrator.run(&self.pool).await?;

        tracing::info!(path = %migration_path.display(), "database migrations applied");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configs::Settings;

    async fn table_count(storage: &Storage) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'")
            .fetch_one(storage.get_pool())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_schema_preparation_is_repeatable() {
        let storage = Storage::new(Settings::default().database, SchemaManager::default())
            .await
            .unwrap();
        let tables = table_count(&storage).await;
        assert!(tables >= 9);

        storage
            .prepare_schema(&SchemaManager::default(), false)
            .await
            .unwrap();
        storage
            .prepare_schema(&SchemaManager::default(), true)
            .await
            .unwrap();

        assert_eq!(table_count(&storage).await, tables);
    }
}
