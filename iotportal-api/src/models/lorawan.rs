use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{DeviceDetails, DeviceModel};

pub const CONCENTRATOR_DEVICE_TYPE: &str = "LoRa Concentrator";
pub const LORA_DEVICE_TYPE: &str = "LoRa Device";

#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassType {
    #[default]
    A,
    C,
}

impl fmt::Display for ClassType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ClassType::A => write!(f, "A"),
            ClassType::C => write!(f, "C"),
        }
    }
}

impl FromStr for ClassType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A" | "a" => Ok(ClassType::A),
            "C" | "c" => Ok(ClassType::C),
            other => Err(format!("unknown class type {other}")),
        }
    }
}

/// Handling of messages received by several gateways.
#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeduplicationMode {
    #[default]
    None,
    Drop,
    Mark,
}

impl fmt::Display for DeduplicationMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DeduplicationMode::None => write!(f, "None"),
            DeduplicationMode::Drop => write!(f, "Drop"),
            DeduplicationMode::Mark => write!(f, "Mark"),
        }
    }
}

impl FromStr for DeduplicationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "None" => Ok(DeduplicationMode::None),
            "Drop" => Ok(DeduplicationMode::Drop),
            "Mark" => Ok(DeduplicationMode::Mark),
            other => Err(format!("unknown deduplication mode {other}")),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_preferred_window() -> i32 {
    1
}

/// LoRaWAN end device.
#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoRaDeviceDetails {
    #[serde(flatten)]
    pub device: DeviceDetails,
    /// Over-the-air activation, ABP otherwise
    #[serde(default = "default_true")]
    pub use_otaa: bool,
    #[serde(default)]
    pub app_eui: Option<String>,
    #[serde(default)]
    pub app_key: Option<String>,
    #[serde(default)]
    pub app_s_key: Option<String>,
    #[serde(default)]
    pub nwk_s_key: Option<String>,
    #[serde(default)]
    pub dev_addr: Option<String>,
    /// Gateway the device is pinned to
    #[serde(default)]
    pub gateway_id: Option<String>,
    #[serde(default)]
    pub downlink: Option<bool>,
    #[serde(default)]
    pub class_type: ClassType,
    /// Receive window used for downlinks, 1 or 2
    #[serde(default = "default_preferred_window")]
    pub preferred_window: i32,
    #[serde(default)]
    pub deduplication: DeduplicationMode,
    #[serde(default)]
    pub rx1_dr_offset: Option<i32>,
    #[serde(default)]
    pub rx2_data_rate: Option<i32>,
    #[serde(default)]
    pub rx_delay: Option<i32>,
    #[serde(default)]
    pub abp_relax_mode: Option<bool>,
    /// Decoder endpoint for uplink payloads
    #[serde(default)]
    pub sensor_decoder: Option<String>,
    #[serde(default)]
    pub f_cnt_up_start: Option<i32>,
    #[serde(default)]
    pub f_cnt_down_start: Option<i32>,
    #[serde(default)]
    pub f_cnt_reset_counter: Option<i32>,
    #[serde(default, rename = "supports32BitFCnt")]
    pub supports_32bit_fcnt: Option<bool>,
    #[serde(default)]
    pub keep_alive_timeout: Option<i32>,
    /// Reported by the network server
    #[serde(default)]
    pub data_rate: Option<String>,
    #[serde(default)]
    pub tx_power: Option<String>,
    #[serde(default)]
    pub nb_rep: Option<String>,
    #[serde(default)]
    pub reported_rx2_data_rate: Option<String>,
    #[serde(default)]
    pub reported_rx1_dr_offset: Option<String>,
    #[serde(default)]
    pub reported_rx_delay: Option<String>,
    #[serde(default)]
    pub already_logged_in_once: bool,
}

impl LoRaDeviceDetails {
    pub fn new(device: DeviceDetails) -> Self {
        Self {
            device,
            use_otaa: true,
            app_eui: None,
            app_key: None,
            app_s_key: None,
            nwk_s_key: None,
            dev_addr: None,
            gateway_id: None,
            downlink: None,
            class_type: ClassType::A,
            preferred_window: 1,
            deduplication: DeduplicationMode::None,
            rx1_dr_offset: None,
            rx2_data_rate: None,
            rx_delay: None,
            abp_relax_mode: None,
            sensor_decoder: None,
            f_cnt_up_start: None,
            f_cnt_down_start: None,
            f_cnt_reset_counter: None,
            supports_32bit_fcnt: None,
            keep_alive_timeout: None,
            data_rate: None,
            tx_power: None,
            nb_rep: None,
            reported_rx2_data_rate: None,
            reported_rx1_dr_offset: None,
            reported_rx_delay: None,
            already_logged_in_once: false,
        }
    }
}

/// Template of LoRaWAN devices, carrying the defaults applied to new devices.
#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoRaDeviceModel {
    #[serde(flatten)]
    pub model: DeviceModel,
    #[serde(default = "default_true")]
    pub use_otaa: bool,
    #[serde(default)]
    pub class_type: ClassType,
    #[serde(default)]
    pub deduplication: DeduplicationMode,
    #[serde(default = "default_preferred_window")]
    pub preferred_window: i32,
    #[serde(default = "default_true")]
    pub downlink: bool,
    #[serde(default)]
    pub abp_relax_mode: Option<bool>,
    #[serde(default)]
    pub rx1_dr_offset: Option<i32>,
    #[serde(default)]
    pub rx2_data_rate: Option<i32>,
    #[serde(default)]
    pub rx_delay: Option<i32>,
    #[serde(default)]
    pub f_cnt_up_start: Option<i32>,
    #[serde(default)]
    pub f_cnt_down_start: Option<i32>,
    #[serde(default)]
    pub f_cnt_reset_counter: Option<i32>,
    #[serde(default, rename = "supports32BitFCnt")]
    pub supports_32bit_fcnt: Option<bool>,
    #[serde(default)]
    pub keep_alive_timeout: Option<i32>,
    #[serde(default)]
    pub sensor_decoder: Option<String>,
    #[serde(default)]
    pub app_eui: Option<String>,
}

impl LoRaDeviceModel {
    pub fn new(model: DeviceModel) -> Self {
        Self {
            model,
            use_otaa: true,
            class_type: ClassType::A,
            deduplication: DeduplicationMode::None,
            preferred_window: 1,
            downlink: true,
            abp_relax_mode: None,
            rx1_dr_offset: None,
            rx2_data_rate: None,
            rx_delay: None,
            f_cnt_up_start: None,
            f_cnt_down_start: None,
            f_cnt_reset_counter: None,
            supports_32bit_fcnt: None,
            keep_alive_timeout: None,
            sensor_decoder: None,
            app_eui: None,
        }
    }
}

/// Downlink command defined on a LoRaWAN model.
#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceModelCommand {
    /// Generated on save when empty
    #[serde(default)]
    pub id: String,
    pub name: String,
    /// Payload as hexadecimal string
    pub frame: String,
    /// LoRaWAN FPort, 1 to 223
    pub port: i32,
    #[serde(default)]
    pub confirmed: bool,
    #[serde(default)]
    pub is_builtin: bool,
}

/// LoRa Basics Station gateway.
#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Concentrator {
    /// Station EUI
    pub device_id: String,
    pub device_name: String,
    /// Frequency plan, e.g. `EU863`
    pub lora_region: String,
    #[serde(default = "concentrator_device_type")]
    pub device_type: String,
    #[serde(default)]
    pub client_thumbprint: Option<String>,
    #[serde(default)]
    pub is_connected: bool,
    #[serde(default = "default_true")]
    pub is_enabled: bool,
    #[serde(default)]
    pub already_logged_in_once: bool,
    /// Router configuration pushed to the station
    #[cfg_attr(feature = "docs", schema(value_type = Option<Object>))]
    #[serde(default)]
    pub router_config: Option<serde_json::Value>,
}

fn concentrator_device_type() -> String {
    CONCENTRATOR_DEVICE_TYPE.to_string()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_lora_device_wire_names() {
        let mut device = LoRaDeviceDetails::new(DeviceDetails {
            device_id: "0123456789ABCDEF".to_string(),
            device_name: "sensor".to_string(),
            model_id: "model".to_string(),
            ..Default::default()
        });
        device.app_s_key = Some("key".to_string());
        device.supports_32bit_fcnt = Some(true);

        let value = serde_json::to_value(&device).unwrap();

        assert_eq!(value["deviceId"], json!("0123456789ABCDEF"));
        assert_eq!(value["appSKey"], json!("key"));
        assert_eq!(value["supports32BitFCnt"], json!(true));
        assert_eq!(value["classType"], json!("A"));
        assert_eq!(value["useOtaa"], json!(true));
    }

    #[test]
    fn test_lora_device_defaults_from_minimal_body() {
        let device: LoRaDeviceDetails = serde_json::from_value(json!({
            "deviceId": "0123456789ABCDEF",
            "deviceName": "sensor",
            "modelId": "model"
        }))
        .unwrap();

        assert!(device.use_otaa);
        assert!(device.device.is_enabled);
        assert_eq!(device.preferred_window, 1);
        assert_eq!(device.deduplication, DeduplicationMode::None);
    }

    #[test]
    fn test_concentrator_default_type() {
        let concentrator: Concentrator = serde_json::from_value(json!({
            "deviceId": "0011223344556677",
            "deviceName": "roof",
            "loraRegion": "EU863"
        }))
        .unwrap();

        assert_eq!(concentrator.device_type, CONCENTRATOR_DEVICE_TYPE);
        assert!(concentrator.router_config.is_none());
    }
}
