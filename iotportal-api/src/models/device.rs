use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceListItem {
    /// Device identifier
    pub device_id: String,
    /// Display name
    pub device_name: String,
    /// Device model identifier
    pub model_id: String,
    /// Model image
    pub image_url: Option<String>,
    /// Connection state reported by the registry
    pub is_connected: bool,
    /// Whether the device may connect
    pub is_enabled: bool,
    /// Last status change
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub status_updated_time: Option<OffsetDateTime>,
    /// Last activity seen by the registry
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub last_activity_time: Option<OffsetDateTime>,
    /// LoRaWAN device
    #[serde(rename = "supportLoRaFeatures")]
    pub support_lora_features: bool,
}

#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceDetails {
    /// Device identifier
    pub device_id: String,
    /// Display name
    pub device_name: String,
    /// Device model identifier
    pub model_id: String,
    /// Model image
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub is_connected: bool,
    #[serde(default = "default_enabled")]
    pub is_enabled: bool,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub status_updated_time: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub last_activity_time: Option<OffsetDateTime>,
    /// Custom tag values keyed by tag name
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

fn default_enabled() -> bool {
    true
}

/// Writable or read-only value of a model property on a device.
#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DevicePropertyValue {
    pub name: String,
    pub display_name: String,
    pub is_writable: bool,
    pub order: i32,
    pub property_type: super::DevicePropertyType,
    /// Current value, desired for writable and reported for read-only properties
    pub value: Option<String>,
}
