use serde::{Deserialize, Serialize};

use super::Table;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct DeviceModelCommandEntity {
    pub partition_key: String,
    pub row_key: String,
    pub name: String,
    pub frame: String,
    pub port: i32,
    pub confirmed: bool,
    pub is_builtin: bool,
}

#[derive(Clone)]
pub struct DeviceModelCommandTable;

impl Table for DeviceModelCommandTable {
    fn name(&self) -> &'static str {
        "device_model_commands"
    }

    fn create(&self) -> String {
        String::from(
            r#"
            CREATE TABLE IF NOT EXISTS device_model_commands (
                partition_key VARCHAR(255) NOT NULL,
                row_key VARCHAR(255) NOT NULL,
                name VARCHAR(255) NOT NULL,
                frame VARCHAR(512) NOT NULL,
                port INTEGER NOT NULL,
                confirmed BOOLEAN NOT NULL DEFAULT 0,
                is_builtin BOOLEAN NOT NULL DEFAULT 0,
                PRIMARY KEY (partition_key, row_key),
                FOREIGN KEY (partition_key) REFERENCES device_models (row_key) ON DELETE CASCADE
            );
            "#,
        )
    }

    fn dispose(&self) -> String {
        String::from("DROP TABLE IF EXISTS device_model_commands;")
    }

    fn dependencies(&self) -> Vec<&'static str> {
        vec!["device_models"]
    }
}
