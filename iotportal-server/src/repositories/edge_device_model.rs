use std::sync::Arc;

use sqlx::{Error, Pool, Sqlite, Transaction};

use crate::configs::Storage;
use crate::models::{EdgeDeviceModelEntity, EdgeDeviceModelModuleEntity};

#[derive(Clone)]
pub struct EdgeDeviceModelRepository {
    storage: Arc<Storage>,
}

impl EdgeDeviceModelRepository {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    pub fn get_pool(&self) -> &Pool<Sqlite> {
        self.storage.get_pool()
    }
}

impl EdgeDeviceModelRepository {
    pub async fn find_all(&self) -> Result<Vec<EdgeDeviceModelEntity>, Error> {
        let models: Vec<EdgeDeviceModelEntity> =
            sqlx::query_as("SELECT * FROM edge_device_models ORDER BY name, row_key")
                .fetch_all(self.storage.get_pool())
                .await?;

        Ok(models)
    }

    pub async fn find_by_id(&self, model_id: &str) -> Result<Option<EdgeDeviceModelEntity>, Error> {
        let model: Option<EdgeDeviceModelEntity> =
            sqlx::query_as("SELECT * FROM edge_device_models WHERE row_key = $1")
                .bind(model_id)
                .fetch_optional(self.storage.get_pool())
                .await?;

        Ok(model)
    }

    pub async fn find_modules(
        &self,
        model_id: &str,
    ) -> Result<Vec<EdgeDeviceModelModuleEntity>, Error> {
        let modules: Vec<EdgeDeviceModelModuleEntity> = sqlx::query_as(
            "SELECT * FROM edge_device_model_modules WHERE partition_key = $1 ORDER BY row_key",
        )
        .bind(model_id)
        .fetch_all(self.storage.get_pool())
        .await?;

        Ok(modules)
    }

    /// Inserts or replaces the model row together with its modules.
    pub async fn save(
        &self,
        item: &EdgeDeviceModelEntity,
        modules: &[EdgeDeviceModelModuleEntity],
        transaction: &mut Transaction<'_, Sqlite>,
    ) -> Result<(), Error> {
        sqlx::query(
            r#"
            INSERT INTO edge_device_models (partition_key, row_key, name, description, image_url)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (row_key) DO UPDATE
            SET name = excluded.name, description = excluded.description, image_url = excluded.image_url
            "#,
        )
        .bind(&item.partition_key)
        .bind(&item.row_key)
        .bind(&item.name)
        .bind(&item.description)
        .bind(&item.image_url)
        .execute(&mut **transaction)
        .await?;

        sqlx::query("DELETE FROM edge_device_model_modules WHERE partition_key = $1")
            .bind(&item.row_key)
            .execute(&mut **transaction)
            .await?;

        for module in modules {
            sqlx::query(
                r#"
                INSERT INTO edge_device_model_modules (
                    partition_key, row_key, image_uri, environment_variables, container_create_options
                )
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(&item.row_key)
            .bind(&module.row_key)
            .bind(&module.image_uri)
            .bind(&module.environment_variables)
            .bind(&module.container_create_options)
            .execute(&mut **transaction)
            .await?;
        }

        Ok(())
    }

    pub async fn delete(
        &self,
        model_id: &str,
        transaction: &mut Transaction<'_, Sqlite>,
    ) -> Result<(), Error> {
        sqlx::query("DELETE FROM edge_device_model_modules WHERE partition_key = $1")
            .bind(model_id)
            .execute(&mut **transaction)
            .await?;

        sqlx::query("DELETE FROM edge_device_models WHERE row_key = $1")
            .bind(model_id)
            .execute(&mut **transaction)
            .await?;

        Ok(())
    }
}
