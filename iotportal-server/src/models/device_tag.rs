use serde::{Deserialize, Serialize};

use super::Table;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct DeviceTagEntity {
    pub partition_key: String,
    pub row_key: String,
    pub label: String,
    pub required: bool,
    pub searchable: bool,
}

#[derive(Clone)]
pub struct DeviceTagTable;

impl Table for DeviceTagTable {
    fn name(&self) -> &'static str {
        "device_tags"
    }

    fn create(&self) -> String {
        String::from(
            r#"
            CREATE TABLE IF NOT EXISTS device_tags (
                partition_key VARCHAR(255) NOT NULL,
                row_key VARCHAR(255) NOT NULL,
                label VARCHAR(255) NOT NULL,
                required BOOLEAN NOT NULL DEFAULT 0,
                searchable BOOLEAN NOT NULL DEFAULT 0,
                PRIMARY KEY (partition_key, row_key)
            );
            "#,
        )
    }

    fn dispose(&self) -> String {
        String::from("DROP TABLE IF EXISTS device_tags;")
    }

    fn dependencies(&self) -> Vec<&'static str> {
        vec![]
    }
}
