use std::sync::Arc;

use sqlx::{Error, Pool, Sqlite, Transaction};

use crate::configs::Storage;
use crate::models::DeviceTagEntity;

#[derive(Clone)]
pub struct DeviceTagRepository {
    storage: Arc<Storage>,
}

impl DeviceTagRepository {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    pub fn get_pool(&self) -> &Pool<Sqlite> {
        self.storage.get_pool()
    }
}

impl DeviceTagRepository {
    pub async fn find_all(&self) -> Result<Vec<DeviceTagEntity>, Error> {
        let tags: Vec<DeviceTagEntity> = sqlx::query_as("SELECT * FROM device_tags ORDER BY row_key")
            .fetch_all(self.storage.get_pool())
            .await?;

        Ok(tags)
    }

    /// Replaces the whole tag list.
    pub async fn save_all(
        &self,
        items: &[DeviceTagEntity],
        transaction: &mut Transaction<'_, Sqlite>,
    ) -> Result<(), Error> {
        sqlx::query("DELETE FROM device_tags")
            .execute(&mut **transaction)
            .await?;

        for item in items {
            sqlx::query(
                r#"
                INSERT INTO device_tags (partition_key, row_key, label, required, searchable)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(&item.partition_key)
            .bind(&item.row_key)
            .bind(&item.label)
            .bind(item.required)
            .bind(item.searchable)
            .execute(&mut **transaction)
            .await?;
        }

        Ok(())
    }

    /// Returns whether a row was removed.
    pub async fn delete(
        &self,
        name: &str,
        transaction: &mut Transaction<'_, Sqlite>,
    ) -> Result<bool, Error> {
        let deleted = sqlx::query("DELETE FROM device_tags WHERE row_key = $1")
            .bind(name)
            .execute(&mut **transaction)
            .await?
            .rows_affected();

        Ok(deleted > 0)
    }
}
