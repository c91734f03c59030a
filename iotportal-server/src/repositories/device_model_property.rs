use std::sync::Arc;

use sqlx::{Error, Pool, Sqlite, Transaction};

use crate::configs::Storage;
use crate::models::DeviceModelPropertyEntity;

#[derive(Clone)]
pub struct DeviceModelPropertyRepository {
    storage: Arc<Storage>,
}

impl DeviceModelPropertyRepository {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    pub fn get_pool(&self) -> &Pool<Sqlite> {
        self.storage.get_pool()
    }
}

impl DeviceModelPropertyRepository {
    pub async fn find_by_model_id(
        &self,
        model_id: &str,
    ) -> Result<Vec<DeviceModelPropertyEntity>, Error> {
        let properties: Vec<DeviceModelPropertyEntity> = sqlx::query_as(
            "SELECT * FROM device_model_properties WHERE partition_key = $1 ORDER BY position, name",
        )
        .bind(model_id)
        .fetch_all(self.storage.get_pool())
        .await?;

        Ok(properties)
    }

    /// Replaces every property of the model.
    pub async fn save_all(
        &self,
        model_id: &str,
        items: &[DeviceModelPropertyEntity],
        transaction: &mut Transaction<'_, Sqlite>,
    ) -> Result<(), Error> {
        self.delete_by_model_id(model_id, transaction).await?;

        for item in items {
            sqlx::query(
                r#"
                INSERT INTO device_model_properties (
                    partition_key, row_key, name, display_name, is_writable, position, property_type
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(model_id)
            .bind(&item.row_key)
            .bind(&item.name)
            .bind(&item.display_name)
            .bind(item.is_writable)
            .bind(item.position)
            .bind(&item.property_type)
            .execute(&mut **transaction)
            .await?;
        }

        Ok(())
    }

    pub async fn delete_by_model_id(
        &self,
        model_id: &str,
        transaction: &mut Transaction<'_, Sqlite>,
    ) -> Result<(), Error> {
        sqlx::query("DELETE FROM device_model_properties WHERE partition_key = $1")
            .bind(model_id)
            .execute(&mut **transaction)
            .await?;

        Ok(())
    }
}
