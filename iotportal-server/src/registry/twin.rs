use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
    #[default]
    Enabled,
    Disabled,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionState {
    Connected,
    #[default]
    Disconnected,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Capabilities {
    #[serde(default)]
    pub iot_edge: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TwinProperties {
    #[serde(default)]
    pub desired: Map<String, Value>,
    #[serde(default)]
    pub reported: Map<String, Value>,
}

/// Status of a configuration on a device, as exposed on the twin.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppliedConfiguration {
    #[serde(default)]
    pub status: String,
}

/// Device or module twin document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Twin {
    pub device_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<i64>,
    #[serde(default)]
    pub status: DeviceStatus,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub status_update_time: Option<OffsetDateTime>,
    #[serde(default)]
    pub connection_state: ConnectionState,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub last_activity_time: Option<OffsetDateTime>,
    #[serde(default)]
    pub capabilities: Capabilities,
    #[serde(default)]
    pub tags: Map<String, Value>,
    #[serde(default)]
    pub properties: TwinProperties,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub configurations: BTreeMap<String, AppliedConfiguration>,
}

/// Lower-cases the first character, the casing used for twin tag names.
pub fn to_camel_case(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Reads a scalar JSON value as text.
pub fn value_as_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

impl Twin {
    pub fn new(device_id: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            ..Default::default()
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.status == DeviceStatus::Enabled
    }

    pub fn is_connected(&self) -> bool {
        self.connection_state == ConnectionState::Connected
    }

    pub fn is_edge(&self) -> bool {
        self.capabilities.iot_edge
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.status = if enabled {
            DeviceStatus::Enabled
        } else {
            DeviceStatus::Disabled
        };
    }

    pub fn tag(&self, name: &str) -> Option<String> {
        self.tags
            .get(name)
            .or_else(|| self.tags.get(&to_camel_case(name)))
            .and_then(value_as_string)
    }

    pub fn tag_or_default(&self, name: &str) -> String {
        self.tag(name).unwrap_or_default()
    }

    pub fn set_tag(&mut self, name: &str, value: impl Into<Value>) {
        self.tags.insert(to_camel_case(name), value.into());
    }

    pub fn remove_tag(&mut self, name: &str) {
        self.tags.remove(&to_camel_case(name));
    }

    pub fn desired(&self, key: &str) -> Option<&Value> {
        self.properties.desired.get(key)
    }

    pub fn desired_string(&self, key: &str) -> Option<String> {
        self.desired(key).and_then(value_as_string)
    }

    pub fn reported(&self, key: &str) -> Option<&Value> {
        self.properties.reported.get(key)
    }

    pub fn reported_string(&self, key: &str) -> Option<String> {
        self.reported(key).and_then(value_as_string)
    }

    /// Writes a desired property, removing it when no value is given.
    pub fn set_desired(&mut self, key: &str, value: Option<Value>) {
        match value {
            Some(value) if !value.is_null() => {
                self.properties.desired.insert(key.to_string(), value);
            }
            _ => {
                self.properties.desired.remove(key);
            }
        }
    }

    /// Desired properties without the registry bookkeeping entries.
    pub fn desired_values(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.properties
            .desired
            .iter()
            .filter(|(key, _)| !key.starts_with('$'))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationContent {
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub modules_content: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub device_content: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigurationMetrics {
    #[serde(default)]
    pub results: BTreeMap<String, i64>,
    #[serde(default)]
    pub queries: BTreeMap<String, String>,
}

/// Automatic device configuration (edge deployment).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Configuration {
    pub id: String,
    #[serde(default = "default_schema_version")]
    pub schema_version: String,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub content: ConfigurationContent,
    #[serde(default)]
    pub target_condition: String,
    #[serde(default)]
    pub priority: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        rename = "createdTimeUtc"
    )]
    pub created_time_utc: Option<OffsetDateTime>,
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        rename = "lastUpdatedTimeUtc"
    )]
    pub last_updated_time_utc: Option<OffsetDateTime>,
    #[serde(default)]
    pub system_metrics: ConfigurationMetrics,
}

fn default_schema_version() -> String {
    String::from("1.0")
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_camel_case() {
        assert_eq!(to_camel_case("DeviceName"), "deviceName");
        assert_eq!(to_camel_case("site"), "site");
        assert_eq!(to_camel_case(""), "");
    }

    #[test]
    fn test_parse_iot_hub_twin() {
        let twin: Twin = serde_json::from_value(json!({
            "deviceId": "dev-1",
            "etag": "AAAAAAAAAAE=",
            "version": 4,
            "status": "enabled",
            "statusUpdateTime": "0001-01-01T00:00:00Z",
            "connectionState": "Connected",
            "lastActivityTime": "2024-03-01T10:00:00.1234567Z",
            "cloudToDeviceMessageCount": 0,
            "authenticationType": "sas",
            "capabilities": { "iotEdge": false },
            "tags": { "deviceName": "Sensor", "modelId": "m1", "supportLoRaFeatures": true },
            "properties": {
                "desired": { "interval": 10, "$version": 2, "$metadata": {} },
                "reported": { "DevAddr": "0011AABB", "$version": 7 }
            }
        }))
        .unwrap();

        assert!(twin.is_connected());
        assert!(twin.is_enabled());
        assert_eq!(twin.tag("DeviceName").as_deref(), Some("Sensor"));
        assert_eq!(twin.tag("supportLoRaFeatures").as_deref(), Some("true"));
        assert_eq!(twin.desired_string("interval").as_deref(), Some("10"));
        assert_eq!(twin.desired_values().count(), 1);
        assert!(twin.last_activity_time.is_some());
    }

    #[test]
    fn test_set_desired_removes_absent_values() {
        let mut twin = Twin::new("dev-1");
        twin.set_desired("AppKey", Some(json!("00")));
        assert!(twin.desired("AppKey").is_some());

        twin.set_desired("AppKey", None);
        assert!(twin.desired("AppKey").is_none());

        twin.set_desired("AppKey", Some(Value::Null));
        assert!(twin.desired("AppKey").is_none());
    }
}
