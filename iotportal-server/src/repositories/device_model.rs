use std::sync::Arc;

use sqlx::{Error, Pool, Sqlite, Transaction};

use crate::configs::Storage;
use crate::models::DeviceModelEntity;

#[derive(Clone)]
pub struct DeviceModelRepository {
    storage: Arc<Storage>,
}

impl DeviceModelRepository {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    pub fn get_pool(&self) -> &Pool<Sqlite> {
        self.storage.get_pool()
    }
}

impl DeviceModelRepository {
    pub async fn create(
        &self,
        item: &DeviceModelEntity,
        transaction: &mut Transaction<'_, Sqlite>,
    ) -> Result<(), Error> {
        sqlx::query(
            r#"
            INSERT INTO device_models (
                partition_key, row_key, name, description, image_url, is_builtin,
                support_lorawan_features, use_otaa, class_type, deduplication, preferred_window,
                downlink, abp_relax_mode, rx1_dr_offset, rx2_data_rate, rx_delay, f_cnt_up_start,
                f_cnt_down_start, f_cnt_reset_counter, supports_32bit_fcnt, keep_alive_timeout,
                sensor_decoder, app_eui
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17,
                    $18, $19, $20, $21, $22, $23)
            "#,
        )
        .bind(&item.partition_key)
        .bind(&item.row_key)
        .bind(&item.name)
        .bind(&item.description)
        .bind(&item.image_url)
        .bind(item.is_builtin)
        .bind(item.support_lorawan_features)
        .bind(item.use_otaa)
        .bind(&item.class_type)
        .bind(&item.deduplication)
        .bind(item.preferred_window)
        .bind(item.downlink)
        .bind(item.abp_relax_mode)
        .bind(item.rx1_dr_offset)
        .bind(item.rx2_data_rate)
        .bind(item.rx_delay)
        .bind(item.f_cnt_up_start)
        .bind(item.f_cnt_down_start)
        .bind(item.f_cnt_reset_counter)
        .bind(item.supports_32bit_fcnt)
        .bind(item.keep_alive_timeout)
        .bind(&item.sensor_decoder)
        .bind(&item.app_eui)
        .execute(&mut **transaction)
        .await?;

        Ok(())
    }

    pub async fn find_by_id(&self, model_id: &str) -> Result<Option<DeviceModelEntity>, Error> {
        let model: Option<DeviceModelEntity> =
            sqlx::query_as("SELECT * FROM device_models WHERE row_key = $1")
                .bind(model_id)
                .fetch_optional(self.storage.get_pool())
                .await?;

        Ok(model)
    }

    pub async fn find_all(&self) -> Result<Vec<DeviceModelEntity>, Error> {
        let models: Vec<DeviceModelEntity> =
            sqlx::query_as("SELECT * FROM device_models ORDER BY name, row_key")
                .fetch_all(self.storage.get_pool())
                .await?;

        Ok(models)
    }

    pub async fn find_by_lorawan_support(
        &self,
        support_lorawan_features: bool,
    ) -> Result<Vec<DeviceModelEntity>, Error> {
        let models: Vec<DeviceModelEntity> = sqlx::query_as(
            "SELECT * FROM device_models WHERE support_lorawan_features = $1 ORDER BY name, row_key",
        )
        .bind(support_lorawan_features)
        .fetch_all(self.storage.get_pool())
        .await?;

        Ok(models)
    }

    pub async fn update(
        &self,
        item: &DeviceModelEntity,
        transaction: &mut Transaction<'_, Sqlite>,
    ) -> Result<(), Error> {
        sqlx::query(
            r#"
            UPDATE device_models
            SET name = $1, description = $2, image_url = $3, is_builtin = $4,
                support_lorawan_features = $5, use_otaa = $6, class_type = $7,
                deduplication = $8, preferred_window = $9, downlink = $10, abp_relax_mode = $11,
                rx1_dr_offset = $12, rx2_data_rate = $13, rx_delay = $14, f_cnt_up_start = $15,
                f_cnt_down_start = $16, f_cnt_reset_counter = $17, supports_32bit_fcnt = $18,
                keep_alive_timeout = $19, sensor_decoder = $20, app_eui = $21
            WHERE row_key = $22
            "#,
        )
        .bind(&item.name)
        .bind(&item.description)
        .bind(&item.image_url)
        .bind(item.is_builtin)
        .bind(item.support_lorawan_features)
        .bind(item.use_otaa)
        .bind(&item.class_type)
        .bind(&item.deduplication)
        .bind(item.preferred_window)
        .bind(item.downlink)
        .bind(item.abp_relax_mode)
        .bind(item.rx1_dr_offset)
        .bind(item.rx2_data_rate)
        .bind(item.rx_delay)
        .bind(item.f_cnt_up_start)
        .bind(item.f_cnt_down_start)
        .bind(item.f_cnt_reset_counter)
        .bind(item.supports_32bit_fcnt)
        .bind(item.keep_alive_timeout)
        .bind(&item.sensor_decoder)
        .bind(&item.app_eui)
        .bind(&item.row_key)
        .execute(&mut **transaction)
        .await?;

        Ok(())
    }

    pub async fn delete(
        &self,
        model_id: &str,
        transaction: &mut Transaction<'_, Sqlite>,
    ) -> Result<(), Error> {
        sqlx::query("DELETE FROM device_models WHERE row_key = $1")
            .bind(model_id)
            .execute(&mut **transaction)
            .await?;

        Ok(())
    }
}
