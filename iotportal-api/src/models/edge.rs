use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeDeviceListItem {
    pub device_id: String,
    pub device_name: String,
    pub model_id: String,
    /// `Enabled` or `Disabled`
    pub status: String,
    pub is_connected: bool,
    /// Downstream devices connected through the gateway
    pub nb_devices: u32,
}

/// Module running on an edge device, as reported by the edge agent.
#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeModule {
    pub module_name: String,
    /// Runtime status, e.g. `running`
    pub status: String,
    pub version: Option<String>,
    pub image_uri: Option<String>,
}

/// Deployment applied to an edge device.
#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeDeployment {
    pub name: String,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub date: Option<OffsetDateTime>,
    pub status: String,
}

#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeDevice {
    pub device_id: String,
    pub device_name: String,
    pub model_id: String,
    /// `Enabled` or `Disabled`
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub is_connected: bool,
    #[serde(default)]
    pub runtime_response: Option<String>,
    #[serde(default)]
    pub nb_devices: u32,
    #[serde(default)]
    pub nb_modules: u32,
    #[serde(default)]
    pub modules: Vec<EdgeModule>,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    #[serde(default)]
    pub last_deployment: Option<EdgeDeployment>,
}

#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeModelModule {
    pub module_name: String,
    /// Container image
    pub image_uri: String,
    #[serde(default)]
    pub environment_variables: BTreeMap<String, String>,
    /// Docker create options as raw JSON text
    #[serde(default)]
    pub container_create_options: Option<String>,
}

#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeModelListItem {
    pub model_id: String,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeModel {
    /// Generated on creation when empty
    #[serde(default)]
    pub model_id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub edge_modules: Vec<EdgeModelModule>,
}
