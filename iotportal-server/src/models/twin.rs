use sqlx::types::Json;

use super::Table;
use crate::registry::{Configuration, Twin};

/// Twin document persisted by the local registry.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TwinRow {
    pub device_id: String,
    pub twin: Json<Twin>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ConfigurationRow {
    pub id: String,
    pub configuration: Json<Configuration>,
}

#[derive(Clone)]
pub struct TwinTable;

impl Table for TwinTable {
    fn name(&self) -> &'static str {
        "twins"
    }

    fn create(&self) -> String {
        String::from(
            r#"
            CREATE TABLE IF NOT EXISTS twins (
                device_id VARCHAR(128) PRIMARY KEY,
                twin JSON NOT NULL
            );
            "#,
        )
    }

    fn dispose(&self) -> String {
        String::from("DROP TABLE IF EXISTS twins;")
    }

    fn dependencies(&self) -> Vec<&'static str> {
        vec![]
    }
}

#[derive(Clone)]
pub struct ModuleTwinTable;

impl Table for ModuleTwinTable {
    fn name(&self) -> &'static str {
        "module_twins"
    }

    fn create(&self) -> String {
        String::from(
            r#"
            CREATE TABLE IF NOT EXISTS module_twins (
                device_id VARCHAR(128) NOT NULL,
                module_id VARCHAR(128) NOT NULL,
                twin JSON NOT NULL,
                PRIMARY KEY (device_id, module_id),
                FOREIGN KEY (device_id) REFERENCES twins (device_id) ON DELETE CASCADE
            );
            "#,
        )
    }

    fn dispose(&self) -> String {
        String::from("DROP TABLE IF EXISTS module_twins;")
    }

    fn dependencies(&self) -> Vec<&'static str> {
        vec!["twins"]
    }
}

#[derive(Clone)]
pub struct ConfigurationTable;

impl Table for ConfigurationTable {
    fn name(&self) -> &'static str {
        "configurations"
    }

    fn create(&self) -> String {
        String::from(
            r#"
            CREATE TABLE IF NOT EXISTS configurations (
                id VARCHAR(128) PRIMARY KEY,
                configuration JSON NOT NULL
            );
            "#,
        )
    }

    fn dispose(&self) -> String {
        String::from("DROP TABLE IF EXISTS configurations;")
    }

    fn dependencies(&self) -> Vec<&'static str> {
        vec![]
    }
}
