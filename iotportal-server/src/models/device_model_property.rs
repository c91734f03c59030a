use serde::{Deserialize, Serialize};

use super::Table;

/// Property definition, partitioned by model id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct DeviceModelPropertyEntity {
    pub partition_key: String,
    pub row_key: String,
    pub name: String,
    pub display_name: String,
    pub is_writable: bool,
    pub position: i32,
    pub property_type: String,
}

#[derive(Clone)]
pub struct DeviceModelPropertyTable;

impl Table for DeviceModelPropertyTable {
    fn name(&self) -> &'static str {
        "device_model_properties"
    }

    fn create(&self) -> String {
        String::from(
            r#"
            CREATE TABLE IF NOT EXISTS device_model_properties (
                partition_key VARCHAR(255) NOT NULL,
                row_key VARCHAR(255) NOT NULL,
                name VARCHAR(255) NOT NULL,
                display_name VARCHAR(255) NOT NULL,
                is_writable BOOLEAN NOT NULL DEFAULT 0,
                position INTEGER NOT NULL DEFAULT 0,
                property_type VARCHAR(16) NOT NULL,
                PRIMARY KEY (partition_key, row_key),
                FOREIGN KEY (partition_key) REFERENCES device_models (row_key) ON DELETE CASCADE
            );
            "#,
        )
    }

    fn dispose(&self) -> String {
        String::from("DROP TABLE IF EXISTS device_model_properties;")
    }

    fn dependencies(&self) -> Vec<&'static str> {
        vec!["device_models"]
    }
}
