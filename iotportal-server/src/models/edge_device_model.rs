use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sqlx::types::Json;

use super::Table;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct EdgeDeviceModelEntity {
    pub partition_key: String,
    pub row_key: String,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

/// Module of an edge model, partitioned by model id and keyed by module name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct EdgeDeviceModelModuleEntity {
    pub partition_key: String,
    pub row_key: String,
    pub image_uri: String,
    pub environment_variables: Json<BTreeMap<String, String>>,
    pub container_create_options: Option<String>,
}

#[derive(Clone)]
pub struct EdgeDeviceModelTable;

impl Table for EdgeDeviceModelTable {
    fn name(&self) -> &'static str {
        "edge_device_models"
    }

    fn create(&self) -> String {
        String::from(
            r#"
            CREATE TABLE IF NOT EXISTS edge_device_models (
                partition_key VARCHAR(255) NOT NULL,
                row_key VARCHAR(255) NOT NULL UNIQUE,
                name VARCHAR(255) NOT NULL,
                description TEXT,
                image_url TEXT,
                PRIMARY KEY (partition_key, row_key)
            );
            "#,
        )
    }

    fn dispose(&self) -> String {
        String::from("DROP TABLE IF EXISTS edge_device_models;")
    }

    fn dependencies(&self) -> Vec<&'static str> {
        vec![]
    }
}

#[derive(Clone)]
pub struct EdgeDeviceModelModuleTable;

impl Table for EdgeDeviceModelModuleTable {
    fn name(&self) -> &'static str {
        "edge_device_model_modules"
    }

    fn create(&self) -> String {
        String::from(
            r#"
            CREATE TABLE IF NOT EXISTS edge_device_model_modules (
                partition_key VARCHAR(255) NOT NULL,
                row_key VARCHAR(255) NOT NULL,
                image_uri TEXT NOT NULL,
                environment_variables JSON NOT NULL,
                container_create_options TEXT,
                PRIMARY KEY (partition_key, row_key),
                FOREIGN KEY (partition_key) REFERENCES edge_device_models (row_key) ON DELETE CASCADE
            );
            "#,
        )
    }

    fn dispose(&self) -> String {
        String::from("DROP TABLE IF EXISTS edge_device_model_modules;")
    }

    fn dependencies(&self) -> Vec<&'static str> {
        vec!["edge_device_models"]
    }
}
