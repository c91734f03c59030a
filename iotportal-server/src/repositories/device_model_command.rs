use std::sync::Arc;

use sqlx::{Error, Pool, Sqlite, Transaction};

use crate::configs::Storage;
use crate::models::DeviceModelCommandEntity;

#[derive(Clone)]
pub struct DeviceModelCommandRepository {
    storage: Arc<Storage>,
}

impl DeviceModelCommandRepository {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    pub fn get_pool(&self) -> &Pool<Sqlite> {
        self.storage.get_pool()
    }
}

impl DeviceModelCommandRepository {
    pub async fn find_by_model_id(
        &self,
        model_id: &str,
    ) -> Result<Vec<DeviceModelCommandEntity>, Error> {
        let commands: Vec<DeviceModelCommandEntity> = sqlx::query_as(
            "SELECT * FROM device_model_commands WHERE partition_key = $1 ORDER BY name",
        )
        .bind(model_id)
        .fetch_all(self.storage.get_pool())
        .await?;

        Ok(commands)
    }

    pub async fn find_by_id(
        &self,
        model_id: &str,
        command_id: &str,
    ) -> Result<Option<DeviceModelCommandEntity>, Error> {
        let command: Option<DeviceModelCommandEntity> = sqlx::query_as(
            "SELECT * FROM device_model_commands WHERE partition_key = $1 AND row_key = $2",
        )
        .bind(model_id)
        .bind(command_id)
        .fetch_optional(self.storage.get_pool())
        .await?;

        Ok(command)
    }

    /// Replaces every command of the model.
    pub async fn save_all(
        &self,
        model_id: &str,
        items: &[DeviceModelCommandEntity],
        transaction: &mut Transaction<'_, Sqlite>,
    ) -> Result<(), Error> {
        sqlx::query("DELETE FROM device_model_commands WHERE partition_key = $1")
            .bind(model_id)
            .execute(&mut **transaction)
            .await?;

        for item in items {
            sqlx::query(
                r#"
                INSERT INTO device_model_commands (
                    partition_key, row_key, name, frame, port, confirmed, is_builtin
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(model_id)
            .bind(&item.row_key)
            .bind(&item.name)
            .bind(&item.frame)
            .bind(item.port)
            .bind(item.confirmed)
            .bind(item.is_builtin)
            .execute(&mut **transaction)
            .await?;
        }

        Ok(())
    }
}
