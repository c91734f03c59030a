use serde::{Deserialize, Serialize};

use super::Table;

/// Device model row; LoRaWAN columns are null for standard models.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct DeviceModelEntity {
    pub partition_key: String,
    pub row_key: String,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub is_builtin: bool,
    pub support_lorawan_features: bool,
    pub use_otaa: Option<bool>,
    pub class_type: Option<String>,
    pub deduplication: Option<String>,
    pub preferred_window: Option<i32>,
    pub downlink: Option<bool>,
    pub abp_relax_mode: Option<bool>,
    pub rx1_dr_offset: Option<i32>,
    pub rx2_data_rate: Option<i32>,
    pub rx_delay: Option<i32>,
    pub f_cnt_up_start: Option<i32>,
    pub f_cnt_down_start: Option<i32>,
    pub f_cnt_reset_counter: Option<i32>,
    pub supports_32bit_fcnt: Option<bool>,
    pub keep_alive_timeout: Option<i32>,
    pub sensor_decoder: Option<String>,
    pub app_eui: Option<String>,
}

#[derive(Clone)]
pub struct DeviceModelTable;

impl Table for DeviceModelTable {
    fn name(&self) -> &'static str {
        "device_models"
    }

    fn create(&self) -> String {
        String::from(
            r#"
            CREATE TABLE IF NOT EXISTS device_models (
                partition_key VARCHAR(255) NOT NULL,
                row_key VARCHAR(255) NOT NULL UNIQUE,
                name VARCHAR(255) NOT NULL,
                description TEXT,
                image_url TEXT,
                is_builtin BOOLEAN NOT NULL DEFAULT 0,
                support_lorawan_features BOOLEAN NOT NULL DEFAULT 0,
                use_otaa BOOLEAN,
                class_type VARCHAR(8),
                deduplication VARCHAR(16),
                preferred_window INTEGER,
                downlink BOOLEAN,
                abp_relax_mode BOOLEAN,
                rx1_dr_offset INTEGER,
                rx2_data_rate INTEGER,
                rx_delay INTEGER,
                f_cnt_up_start INTEGER,
                f_cnt_down_start INTEGER,
                f_cnt_reset_counter INTEGER,
                supports_32bit_fcnt BOOLEAN,
                keep_alive_timeout INTEGER,
                sensor_decoder TEXT,
                app_eui VARCHAR(16),
                PRIMARY KEY (partition_key, row_key)
            );
            "#,
        )
    }

    fn dispose(&self) -> String {
        String::from("DROP TABLE IF EXISTS device_models;")
    }

    fn dependencies(&self) -> Vec<&'static str> {
        vec![]
    }
}
