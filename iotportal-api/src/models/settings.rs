use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Custom tag recognised on device twins.
#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceTag {
    /// Tag name as stored on the twin
    pub name: String,
    /// Label shown to operators
    pub label: String,
    /// Must be set on every device
    #[serde(default)]
    pub required: bool,
    /// Usable as a device list filter
    #[serde(default)]
    pub searchable: bool,
}

#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortalSettings {
    pub portal_name: String,
    pub version: String,
    /// `local`, `azure` or `aws`
    pub cloud_provider: String,
    #[serde(rename = "isLoRaSupported")]
    pub is_lora_supported: bool,
}

/// Device counters refreshed in the background.
#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortalMetric {
    pub device_count: u64,
    pub connected_device_count: u64,
    pub edge_device_count: u64,
    pub connected_edge_device_count: u64,
    pub concentrator_count: u64,
    pub connected_concentrator_count: u64,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub last_update: Option<OffsetDateTime>,
}
