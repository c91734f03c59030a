use std::collections::BTreeMap;

use iotportal_api::models::{EdgeModel, EdgeModelListItem, EdgeModelModule};
use serde_json::{Map, Value, json};
use sqlx::types::Json;

use crate::models::{DEFAULT_PARTITION_KEY, EdgeDeviceModelEntity, EdgeDeviceModelModuleEntity};
use crate::registry::{Configuration, ConfigurationContent};

const EDGE_AGENT_IMAGE: &str = "mcr.microsoft.com/azureiotedge-agent:1.4";
const EDGE_HUB_IMAGE: &str = "mcr.microsoft.com/azureiotedge-hub:1.4";
const EDGE_HUB_CREATE_OPTIONS: &str = r#"{"HostConfig":{"PortBindings":{"443/tcp":[{"HostPort":"443"}],"5671/tcp":[{"HostPort":"5671"}],"8883/tcp":[{"HostPort":"8883"}]}}}"#;
const DEPLOYMENT_PRIORITY: i32 = 10;

#[derive(Debug, Clone, Copy, Default)]
pub struct EdgeModelMapper;

impl EdgeModelMapper {
    pub fn create_list_item(&self, entity: &EdgeDeviceModelEntity) -> EdgeModelListItem {
        EdgeModelListItem {
            model_id: entity.row_key.clone(),
            name: entity.name.clone(),
            description: entity.description.clone(),
            image_url: entity.image_url.clone(),
        }
    }

    pub fn create_edge_model(
        &self,
        entity: &EdgeDeviceModelEntity,
        modules: &[EdgeDeviceModelModuleEntity],
    ) -> EdgeModel {
        EdgeModel {
            model_id: entity.row_key.clone(),
            name: entity.name.clone(),
            description: entity.description.clone(),
            image_url: entity.image_url.clone(),
            edge_modules: modules
                .iter()
                .map(|module| EdgeModelModule {
                    module_name: module.row_key.clone(),
                    image_uri: module.image_uri.clone(),
                    environment_variables: module.environment_variables.0.clone(),
                    container_create_options: module.container_create_options.clone(),
                })
                .collect(),
        }
    }

    pub fn create_table_entity(&self, model: &EdgeModel) -> EdgeDeviceModelEntity {
        EdgeDeviceModelEntity {
            partition_key: DEFAULT_PARTITION_KEY.to_string(),
            row_key: model.model_id.clone(),
            name: model.name.clone(),
            description: model.description.clone(),
            image_url: model.image_url.clone(),
        }
    }

    pub fn create_module_entities(&self, model: &EdgeModel) -> Vec<EdgeDeviceModelModuleEntity> {
        model
            .edge_modules
            .iter()
            .map(|module| EdgeDeviceModelModuleEntity {
                partition_key: model.model_id.clone(),
                row_key: module.module_name.clone(),
                image_uri: module.image_uri.clone(),
                environment_variables: Json(module.environment_variables.clone()),
                container_create_options: module
                    .container_create_options
                    .clone()
                    .filter(|options| !options.trim().is_empty()),
            })
            .collect()
    }

    pub fn configuration_id(&self, model_id: &str) -> String {
        format!("edge-{}", model_id.to_lowercase())
    }

    /// Deployment rolling the model's modules out to every device of the model.
    pub fn create_configuration(&self, model: &EdgeModel) -> Configuration {
        let mut modules = Map::new();
        for module in &model.edge_modules {
            modules.insert(module.module_name.clone(), module_content(module));
        }

        let mut content = ConfigurationContent::default();
        content.modules_content.insert(
            "$edgeAgent".to_string(),
            json!({
                "properties.desired": {
                    "schemaVersion": "1.1",
                    "runtime": {
                        "type": "docker",
                        "settings": { "minDockerVersion": "v1.25" }
                    },
                    "systemModules": {
                        "edgeAgent": {
                            "type": "docker",
                            "settings": { "image": EDGE_AGENT_IMAGE }
                        },
                        "edgeHub": {
                            "type": "docker",
                            "status": "running",
                            "restartPolicy": "always",
                            "settings": {
                                "image": EDGE_HUB_IMAGE,
                                "createOptions": EDGE_HUB_CREATE_OPTIONS
                            }
                        }
                    },
                    "modules": modules
                }
            }),
        );
        content.modules_content.insert(
            "$edgeHub".to_string(),
            json!({
                "properties.desired": {
                    "schemaVersion": "1.1",
                    "routes": { "upstream": "FROM /messages/* INTO $upstream" },
                    "storeAndForwardConfiguration": { "timeToLiveSecs": 7200 }
                }
            }),
        );

        Configuration {
            id: self.configuration_id(&model.model_id),
            labels: BTreeMap::from([("modelId".to_string(), model.model_id.clone())]),
            content,
            target_condition: format!("tags.modelId='{}'", model.model_id),
            priority: DEPLOYMENT_PRIORITY,
            ..Default::default()
        }
    }
}

fn module_content(module: &EdgeModelModule) -> Value {
    let mut settings = json!({ "image": module.image_uri });
    if let Some(options) = module
        .container_create_options
        .as_deref()
        .filter(|options| !options.trim().is_empty())
    {
        settings["createOptions"] = Value::from(options);
    }

    let env: Map<String, Value> = module
        .environment_variables
        .iter()
        .map(|(name, value)| (name.clone(), json!({ "value": value })))
        .collect();

    json!({
        "type": "docker",
        "status": "running",
        "restartPolicy": "always",
        "version": "1.0",
        "settings": settings,
        "env": env
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> EdgeModel {
        EdgeModel {
            model_id: "Gateway-Model".into(),
            name: "Gateway".into(),
            description: None,
            image_url: None,
            edge_modules: vec![EdgeModelModule {
                module_name: "sim".into(),
                image_uri: "sim:1".into(),
                environment_variables: BTreeMap::from([("LEVEL".to_string(), "debug".to_string())]),
                container_create_options: Some(" ".into()),
            }],
        }
    }

    #[test]
    fn test_entities_round_trip() {
        let model = model();
        let entity = EdgeModelMapper.create_table_entity(&model);
        let modules = EdgeModelMapper.create_module_entities(&model);

        assert_eq!(modules[0].partition_key, "Gateway-Model");
        assert!(modules[0].container_create_options.is_none());

        let read = EdgeModelMapper.create_edge_model(&entity, &modules);
        assert_eq!(read.edge_modules[0].environment_variables["LEVEL"], "debug");
        assert_eq!(read.name, "Gateway");
        assert_eq!(EdgeModelMapper.create_list_item(&entity).model_id, "Gateway-Model");
    }

    #[test]
    fn test_configuration_targets_model_devices() {
        let configuration = EdgeModelMapper.create_configuration(&model());

        assert_eq!(configuration.id, "edge-gateway-model");
        assert_eq!(configuration.target_condition, "tags.modelId='Gateway-Model'");

        let desired = &configuration.content.modules_content["$edgeAgent"]["properties.desired"];
        assert_eq!(desired["modules"]["sim"]["settings"]["image"], json!("sim:1"));
        assert_eq!(desired["modules"]["sim"]["env"]["LEVEL"]["value"], json!("debug"));
        assert!(desired["modules"]["sim"]["settings"].get("createOptions").is_none());
        assert!(configuration.content.modules_content.contains_key("$edgeHub"));
    }
}
