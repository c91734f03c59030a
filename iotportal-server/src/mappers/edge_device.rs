use iotportal_api::models::{
    DeviceTag, EdgeDeployment, EdgeDevice, EdgeDeviceListItem, EdgeModule,
};
use serde_json::Value;

use super::device_twin::{DEVICE_NAME_TAG, MODEL_ID_TAG};
use crate::registry::{Twin, value_as_string};

#[derive(Debug, Clone, Copy, Default)]
pub struct EdgeDeviceMapper;

fn status(twin: &Twin) -> String {
    if twin.is_enabled() {
        String::from("Enabled")
    } else {
        String::from("Disabled")
    }
}

impl EdgeDeviceMapper {
    pub fn create_list_item(&self, twin: &Twin, nb_devices: u32) -> EdgeDeviceListItem {
        EdgeDeviceListItem {
            device_id: twin.device_id.clone(),
            device_name: twin.tag_or_default(DEVICE_NAME_TAG),
            model_id: twin.tag_or_default(MODEL_ID_TAG),
            status: status(twin),
            is_connected: twin.is_connected(),
            nb_devices,
        }
    }

    /// Modules reported by the `$edgeAgent` module twin.
    pub fn create_modules(&self, agent: &Twin) -> Vec<EdgeModule> {
        let Some(Value::Object(modules)) = agent.reported("modules") else {
            return Vec::new();
        };

        modules
            .iter()
            .map(|(name, module)| EdgeModule {
                module_name: name.clone(),
                status: module
                    .get("runtimeStatus")
                    .and_then(value_as_string)
                    .unwrap_or_default(),
                version: module.get("version").and_then(value_as_string),
                image_uri: module
                    .pointer("/settings/image")
                    .and_then(value_as_string),
            })
            .collect()
    }

    pub fn create_edge_device(
        &self,
        twin: &Twin,
        agent: Option<&Twin>,
        nb_devices: u32,
        tags: &[DeviceTag],
    ) -> EdgeDevice {
        let modules = agent.map(|a| self.create_modules(a)).unwrap_or_default();

        let runtime_response = agent.and_then(|a| {
            a.reported("lastDesiredStatus")
                .and_then(|s| s.get("description"))
                .and_then(value_as_string)
        });

        let last_deployment = twin
            .configurations
            .iter()
            .next()
            .map(|(name, applied)| EdgeDeployment {
                name: name.clone(),
                date: None,
                status: applied.status.clone(),
            });

        EdgeDevice {
            device_id: twin.device_id.clone(),
            device_name: twin.tag_or_default(DEVICE_NAME_TAG),
            model_id: twin.tag_or_default(MODEL_ID_TAG),
            status: status(twin),
            is_connected: twin.is_connected(),
            runtime_response,
            nb_devices,
            nb_modules: modules.len() as u32,
            modules,
            tags: tags
                .iter()
                .map(|tag| (tag.name.clone(), twin.tag_or_default(&tag.name)))
                .collect(),
            last_deployment,
        }
    }

    pub fn update_twin(&self, twin: &mut Twin, device: &EdgeDevice, tags: &[DeviceTag]) {
        twin.capabilities.iot_edge = true;
        twin.set_tag(DEVICE_NAME_TAG, device.device_name.as_str());
        twin.set_tag(MODEL_ID_TAG, device.model_id.as_str());

        for tag in tags {
            match device.tags.get(&tag.name).filter(|v| !v.is_empty()) {
                Some(value) => twin.set_tag(&tag.name, value.as_str()),
                None => twin.remove_tag(&tag.name),
            }
        }

        twin.set_enabled(!device.status.eq_ignore_ascii_case("disabled"));
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::registry::AppliedConfiguration;

    fn agent() -> Twin {
        let mut agent = Twin::new("edge-1");
        agent.module_id = Some("$edgeAgent".into());
        agent.properties.reported.insert(
            "modules".into(),
            json!({
                "sim": { "runtimeStatus": "running", "version": "1.0", "settings": { "image": "sim:1" } },
                "filter": { "runtimeStatus": "backoff", "settings": { "image": "filter:2" } }
            }),
        );
        agent.properties.reported.insert(
            "lastDesiredStatus".into(),
            json!({ "code": 200, "description": "successfully configured" }),
        );
        agent
    }

    #[test]
    fn test_edge_device_reads_agent_modules() {
        let mut twin = Twin::new("edge-1");
        twin.capabilities.iot_edge = true;
        twin.set_tag("deviceName", "Gateway");
        twin.set_tag("modelId", "em1");
        twin.configurations.insert(
            "edge-em1".into(),
            AppliedConfiguration {
                status: "Applied".into(),
            },
        );

        let device = EdgeDeviceMapper.create_edge_device(&twin, Some(&agent()), 3, &[]);

        assert_eq!(device.nb_modules, 2);
        assert_eq!(device.nb_devices, 3);
        assert_eq!(device.status, "Enabled");
        assert_eq!(device.runtime_response.as_deref(), Some("successfully configured"));
        let sim = device.modules.iter().find(|m| m.module_name == "sim").unwrap();
        assert_eq!(sim.image_uri.as_deref(), Some("sim:1"));
        assert_eq!(sim.status, "running");
        assert_eq!(device.last_deployment.unwrap().name, "edge-em1");
    }

    #[test]
    fn test_edge_device_without_agent() {
        let twin = Twin::new("edge-1");
        let device = EdgeDeviceMapper.create_edge_device(&twin, None, 0, &[]);

        assert!(device.modules.is_empty());
        assert!(device.runtime_response.is_none());
    }

    #[test]
    fn test_update_marks_edge_capability() {
        let mut twin = Twin::new("edge-1");
        let device = EdgeDevice {
            device_id: "edge-1".into(),
            device_name: "Gateway".into(),
            model_id: "em1".into(),
            status: "Disabled".into(),
            ..Default::default()
        };

        EdgeDeviceMapper.update_twin(&mut twin, &device, &[]);

        assert!(twin.is_edge());
        assert!(!twin.is_enabled());
        assert_eq!(twin.tag("modelId").as_deref(), Some("em1"));
    }
}
