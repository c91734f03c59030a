use iotportal_api::models::{
    DeviceListItem, DeviceTag, LORA_DEVICE_TYPE, LoRaDeviceDetails,
};
use serde_json::Value;

use super::device_twin::{DEVICE_TYPE_TAG, DeviceTwinMapper, SUPPORT_LORA_TAG};
use super::{TwinMapper, as_bool, as_i32, non_empty};
use crate::registry::Twin;

/// Desired properties the network server reads from a LoRaWAN device twin.
pub const LORA_DESIRED_PROPERTIES: [&str; 20] = [
    "AppEUI",
    "AppKey",
    "AppSKey",
    "NwkSKey",
    "DevAddr",
    "GatewayID",
    "Downlink",
    "ClassType",
    "PreferredWindow",
    "Deduplication",
    "RX1DROffset",
    "RX2DataRate",
    "RXDelay",
    "ABPRelaxMode",
    "SensorDecoder",
    "FCntUpStart",
    "FCntDownStart",
    "FCntResetCounter",
    "Supports32BitFCnt",
    "KeepAliveTimeout",
];

/// LoRaWAN end devices.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoRaDeviceTwinMapper;

impl TwinMapper for LoRaDeviceTwinMapper {
    type Details = LoRaDeviceDetails;

    fn create_device_details(&self, twin: &Twin, tags: &[DeviceTag]) -> LoRaDeviceDetails {
        let mut details = LoRaDeviceDetails::new(DeviceTwinMapper::read_details(twin, tags));

        let app_s_key = twin.desired_string("AppSKey");
        details.use_otaa = app_s_key.is_none();

        details.app_eui = twin.desired_string("AppEUI");
        details.app_key = twin.desired_string("AppKey");
        details.app_s_key = app_s_key;
        details.nwk_s_key = twin.desired_string("NwkSKey");
        details.dev_addr = twin.desired_string("DevAddr");
        details.gateway_id = twin.desired_string("GatewayID");
        details.downlink = as_bool(twin.desired("Downlink"));
        details.class_type = twin
            .desired_string("ClassType")
            .and_then(|v| v.parse().ok())
            .unwrap_or_default();
        details.preferred_window = as_i32(twin.desired("PreferredWindow")).unwrap_or(1);
        details.deduplication = twin
            .desired_string("Deduplication")
            .and_then(|v| v.parse().ok())
            .unwrap_or_default();
        details.rx1_dr_offset = as_i32(twin.desired("RX1DROffset"));
        details.rx2_data_rate = as_i32(twin.desired("RX2DataRate"));
        details.rx_delay = as_i32(twin.desired("RXDelay"));
        details.abp_relax_mode = as_bool(twin.desired("ABPRelaxMode"));
        details.sensor_decoder = twin.desired_string("SensorDecoder");
        details.f_cnt_up_start = as_i32(twin.desired("FCntUpStart"));
        details.f_cnt_down_start = as_i32(twin.desired("FCntDownStart"));
        details.f_cnt_reset_counter = as_i32(twin.desired("FCntResetCounter"));
        details.supports_32bit_fcnt = as_bool(twin.desired("Supports32BitFCnt"));
        details.keep_alive_timeout = as_i32(twin.desired("KeepAliveTimeout"));

        details.data_rate = twin.reported_string("DataRate");
        details.tx_power = twin.reported_string("TxPower");
        details.nb_rep = twin.reported_string("NbRep");
        details.reported_rx2_data_rate = twin.reported_string("RX2DataRate");
        details.reported_rx1_dr_offset = twin.reported_string("RX1DROffset");
        details.reported_rx_delay = twin.reported_string("RXDelay");
        details.already_logged_in_once = twin.reported("DevAddr").is_some();

        details
    }

    fn create_device_list_item(&self, twin: &Twin) -> DeviceListItem {
        let mut item = DeviceTwinMapper.create_device_list_item(twin);
        item.support_lora_features = true;
        item
    }

    fn update_twin(&self, twin: &mut Twin, details: &LoRaDeviceDetails, tags: &[DeviceTag]) {
        DeviceTwinMapper::write_details(twin, &details.device, tags);
        twin.set_tag(DEVICE_TYPE_TAG, LORA_DEVICE_TYPE);
        twin.set_tag(SUPPORT_LORA_TAG, true);

        let otaa = details.use_otaa;
        let abp = !otaa;

        twin.set_desired("AppEUI", non_empty(&details.app_eui).filter(|_| otaa));
        twin.set_desired("AppKey", non_empty(&details.app_key).filter(|_| otaa));
        twin.set_desired("AppSKey", non_empty(&details.app_s_key).filter(|_| abp));
        twin.set_desired("NwkSKey", non_empty(&details.nwk_s_key).filter(|_| abp));
        twin.set_desired("DevAddr", non_empty(&details.dev_addr).filter(|_| abp));
        twin.set_desired("ABPRelaxMode", details.abp_relax_mode.filter(|_| abp).map(Value::from));

        twin.set_desired("GatewayID", non_empty(&details.gateway_id));
        twin.set_desired("Downlink", details.downlink.map(Value::from));
        twin.set_desired("ClassType", Some(details.class_type.to_string().into()));
        twin.set_desired("PreferredWindow", Some(details.preferred_window.into()));
        twin.set_desired("Deduplication", Some(details.deduplication.to_string().into()));
        twin.set_desired("RX1DROffset", details.rx1_dr_offset.map(Value::from));
        twin.set_desired("RX2DataRate", details.rx2_data_rate.map(Value::from));
        twin.set_desired("RXDelay", details.rx_delay.map(Value::from));
        twin.set_desired("SensorDecoder", non_empty(&details.sensor_decoder));
        twin.set_desired("FCntUpStart", details.f_cnt_up_start.map(Value::from));
        twin.set_desired("FCntDownStart", details.f_cnt_down_start.map(Value::from));
        twin.set_desired("FCntResetCounter", details.f_cnt_reset_counter.map(Value::from));
        twin.set_desired("Supports32BitFCnt", details.supports_32bit_fcnt.map(Value::from));
        twin.set_desired("KeepAliveTimeout", details.keep_alive_timeout.map(Value::from));
    }
}
