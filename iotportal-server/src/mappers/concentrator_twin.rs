use iotportal_api::models::{CONCENTRATOR_DEVICE_TYPE, Concentrator};
use serde_json::{Value, json};

use super::device_twin::{DEVICE_NAME_TAG, DEVICE_TYPE_TAG};
use crate::registry::{Twin, value_as_string};

const LORA_REGION_TAG: &str = "loraRegion";
const ROUTER_CONFIG: &str = "routerConfig";
const CLIENT_THUMBPRINT: &str = "clientThumbprint";

#[derive(Debug, Clone, Copy, Default)]
pub struct ConcentratorTwinMapper;

impl ConcentratorTwinMapper {
    pub fn create_concentrator(&self, twin: &Twin) -> Concentrator {
        let client_thumbprint = match twin.desired(CLIENT_THUMBPRINT) {
            Some(Value::Array(values)) => values.first().and_then(value_as_string),
            Some(value) => value_as_string(value),
            None => None,
        };

        Concentrator {
            device_id: twin.device_id.clone(),
            device_name: twin.tag_or_default(DEVICE_NAME_TAG),
            lora_region: twin.tag_or_default(LORA_REGION_TAG),
            device_type: twin
                .tag(DEVICE_TYPE_TAG)
                .unwrap_or_else(|| CONCENTRATOR_DEVICE_TYPE.to_string()),
            client_thumbprint,
            is_connected: twin.is_connected(),
            is_enabled: twin.is_enabled(),
            already_logged_in_once: twin.reported("DevAddr").is_some(),
            router_config: twin.desired(ROUTER_CONFIG).cloned(),
        }
    }

    pub fn update_twin(&self, twin: &mut Twin, concentrator: &Concentrator) {
        twin.set_tag(DEVICE_NAME_TAG, concentrator.device_name.as_str());
        twin.set_tag(LORA_REGION_TAG, concentrator.lora_region.as_str());
        twin.set_tag(DEVICE_TYPE_TAG, CONCENTRATOR_DEVICE_TYPE);

        twin.set_desired(ROUTER_CONFIG, concentrator.router_config.clone());
        twin.set_desired(
            CLIENT_THUMBPRINT,
            concentrator
                .client_thumbprint
                .as_deref()
                .filter(|t| !t.is_empty())
                .map(|t| json!([t])),
        );

        twin.set_enabled(concentrator.is_enabled);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn concentrator() -> Concentrator {
        Concentrator {
            device_id: "0011223344556677".into(),
            device_name: "Roof gateway".into(),
            lora_region: "EU863".into(),
            device_type: CONCENTRATOR_DEVICE_TYPE.into(),
            client_thumbprint: Some("ABCDEF".into()),
            is_connected: false,
            is_enabled: true,
            already_logged_in_once: false,
            router_config: Some(json!({ "NetID": [1], "region": "EU863" })),
        }
    }

    #[test]
    fn test_update_then_read_round_trip() {
        let mut twin = Twin::new("0011223344556677");
        ConcentratorTwinMapper.update_twin(&mut twin, &concentrator());

        assert_eq!(twin.desired(CLIENT_THUMBPRINT), Some(&json!(["ABCDEF"])));
        assert_eq!(twin.tags["deviceType"], json!("LoRa Concentrator"));

        let read = ConcentratorTwinMapper.create_concentrator(&twin);
        assert_eq!(read, concentrator());
    }

    #[test]
    fn test_missing_thumbprint_is_removed() {
        let mut twin = Twin::new("0011223344556677");
        ConcentratorTwinMapper.update_twin(&mut twin, &concentrator());

        let mut updated = concentrator();
        updated.client_thumbprint = None;
        updated.is_enabled = false;
        ConcentratorTwinMapper.update_twin(&mut twin, &updated);

        assert!(twin.desired(CLIENT_THUMBPRINT).is_none());
        assert!(!twin.is_enabled());
    }
}
