use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceModel {
    /// Model identifier, generated on creation when empty
    #[serde(default)]
    pub model_id: String,
    /// Model name
    pub name: String,
    /// Free text description
    #[serde(default)]
    pub description: Option<String>,
    /// Model image
    #[serde(default)]
    pub image_url: Option<String>,
    /// Shipped with the portal, cannot be changed
    #[serde(default)]
    pub is_builtin: bool,
    /// Template of LoRaWAN devices
    #[serde(default, rename = "supportLoRaFeatures")]
    pub support_lora_features: bool,
}

#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DevicePropertyType {
    Boolean,
    Double,
    Float,
    Integer,
    Long,
    #[default]
    String,
}

impl DevicePropertyType {
    /// Checks that a raw value can be parsed as this type.
    pub fn accepts(&self, value: &str) -> bool {
        match self {
            DevicePropertyType::Boolean => value.parse::<bool>().is_ok(),
            DevicePropertyType::Double => value.parse::<f64>().is_ok(),
            DevicePropertyType::Float => value.parse::<f32>().is_ok(),
            DevicePropertyType::Integer => value.parse::<i32>().is_ok(),
            DevicePropertyType::Long => value.parse::<i64>().is_ok(),
            DevicePropertyType::String => true,
        }
    }
}

impl fmt::Display for DevicePropertyType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DevicePropertyType::Boolean => write!(f, "Boolean"),
            DevicePropertyType::Double => write!(f, "Double"),
            DevicePropertyType::Float => write!(f, "Float"),
            DevicePropertyType::Integer => write!(f, "Integer"),
            DevicePropertyType::Long => write!(f, "Long"),
            DevicePropertyType::String => write!(f, "String"),
        }
    }
}

impl FromStr for DevicePropertyType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Boolean" => Ok(DevicePropertyType::Boolean),
            "Double" => Ok(DevicePropertyType::Double),
            "Float" => Ok(DevicePropertyType::Float),
            "Integer" => Ok(DevicePropertyType::Integer),
            "Long" => Ok(DevicePropertyType::Long),
            "String" => Ok(DevicePropertyType::String),
            other => Err(format!("unknown property type {other}")),
        }
    }
}

/// Property definition of a device model.
#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceProperty {
    /// Twin property name
    pub name: String,
    /// Label shown to operators
    pub display_name: String,
    /// Desired (writable) or reported (read-only)
    #[serde(default)]
    pub is_writable: bool,
    /// Display position
    #[serde(default)]
    pub order: i32,
    #[serde(default)]
    pub property_type: DevicePropertyType,
}
