//! Device registries holding twins, module twins and edge configurations.
//!
//! The portal never owns device state: every read and write goes through a
//! [`TwinRegistry`]. `local` keeps twins in the portal database, `azure`
//! talks to IoT Hub. AWS IoT exposes things and shadows instead of twins and
//! is reached through [`aws::AwsIotClient`].

pub mod aws;
pub mod azure;
pub mod local;
mod sas;
mod sigv4;
mod twin;

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use aws::AwsIotClient;
pub use azure::IotHubRegistry;
pub use local::LocalRegistry;
pub use sas::IotHubConnectionString;
pub use twin::*;

use crate::errors::RegistryError;

/// Restriction of a twin listing; every set field must match.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TwinFilter {
    pub is_edge: Option<bool>,
    /// Value of the `deviceType` tag
    pub device_type: Option<String>,
    /// Excluded value of the `deviceType` tag
    pub exclude_device_type: Option<String>,
    /// Prefix of the device id or of the `deviceName` tag, case insensitive
    pub search_text: Option<String>,
    pub is_enabled: Option<bool>,
    pub is_connected: Option<bool>,
    pub model_id: Option<String>,
    /// Exact tag values, keys in twin casing
    pub tags: BTreeMap<String, String>,
}

impl TwinFilter {
    pub fn matches(&self, twin: &Twin) -> bool {
        if let Some(is_edge) = self.is_edge {
            if twin.is_edge() != is_edge {
                return false;
            }
        }

        let device_type = twin.tag("deviceType");

        if let Some(expected) = &self.device_type {
            if device_type.as_ref() != Some(expected) {
                return false;
            }
        }

        if let Some(excluded) = &self.exclude_device_type {
            if device_type.as_ref() == Some(excluded) {
                return false;
            }
        }

        if let Some(search) = self.search_text.as_deref().filter(|s| !s.is_empty()) {
            let search = search.to_lowercase();
            let name = twin.tag_or_default("deviceName").to_lowercase();

            if !twin.device_id.to_lowercase().starts_with(&search) && !name.starts_with(&search) {
                return false;
            }
        }

        if let Some(is_enabled) = self.is_enabled {
            if twin.is_enabled() != is_enabled {
                return false;
            }
        }

        if let Some(is_connected) = self.is_connected {
            if twin.is_connected() != is_connected {
                return false;
            }
        }

        if let Some(model_id) = &self.model_id {
            if twin.tag("modelId").as_ref() != Some(model_id) {
                return false;
            }
        }

        self.tags
            .iter()
            .all(|(name, value)| twin.tag(name).as_deref() == Some(value.as_str()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TwinQuery {
    pub filter: TwinFilter,
    pub page_size: u32,
    /// Zero based
    pub page_number: u32,
}

impl TwinQuery {
    pub fn all(filter: TwinFilter) -> Self {
        Self {
            filter,
            page_size: u32::MAX,
            page_number: 0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TwinPage {
    pub twins: Vec<Twin>,
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectMethod {
    pub method_name: String,
    #[serde(default)]
    pub payload: Value,
    pub response_timeout_in_seconds: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodResult {
    pub status: i32,
    #[serde(default)]
    pub payload: Value,
}

#[async_trait]
pub trait TwinRegistry: Send + Sync {
    async fn get_twin(&self, device_id: &str) -> Result<Option<Twin>, RegistryError>;

    async fn get_module_twin(
        &self,
        device_id: &str,
        module_id: &str,
    ) -> Result<Option<Twin>, RegistryError>;

    async fn query_twins(&self, query: &TwinQuery) -> Result<TwinPage, RegistryError>;

    /// Registers the device identity and writes its tags and desired properties.
    async fn create_device(&self, twin: &Twin) -> Result<Twin, RegistryError>;

    /// Replaces tags and desired properties, and applies the status.
    async fn update_twin(&self, twin: &Twin) -> Result<Twin, RegistryError>;

    async fn delete_device(&self, device_id: &str) -> Result<(), RegistryError>;

    async fn invoke_module_method(
        &self,
        device_id: &str,
        module_id: &str,
        method: &DirectMethod,
    ) -> Result<MethodResult, RegistryError>;

    async fn upsert_configuration(
        &self,
        configuration: &Configuration,
    ) -> Result<Configuration, RegistryError>;

    async fn get_configuration(&self, id: &str) -> Result<Option<Configuration>, RegistryError>;

    async fn list_configurations(&self) -> Result<Vec<Configuration>, RegistryError>;

    async fn delete_configuration(&self, id: &str) -> Result<(), RegistryError>;
}
