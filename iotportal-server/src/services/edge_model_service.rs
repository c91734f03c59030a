use std::collections::HashSet;
use std::sync::Arc;

use iotportal_api::models::{EdgeModel, EdgeModelListItem};
use uuid::Uuid;

use crate::errors::{ApiError, EdgeError, RegistryError};
use crate::mappers::EdgeModelMapper;
use crate::registry::{TwinFilter, TwinQuery, TwinRegistry};
use crate::repositories::EdgeDeviceModelRepository;

fn validate(model: &EdgeModel) -> Result<(), EdgeError> {
    if model.name.trim().is_empty() {
        return Err(EdgeError::InvalidRequest("model name is required".into()));
    }

    let mut names = HashSet::new();
    for module in &model.edge_modules {
        let name = module.module_name.trim();
        if name.is_empty() || name.starts_with('$') {
            return Err(EdgeError::InvalidRequest(format!(
                "invalid module name {}",
                module.module_name
            )));
        }
        if !names.insert(name.to_string()) {
            return Err(EdgeError::InvalidRequest(format!(
                "module {name} is declared twice"
            )));
        }
        if module.image_uri.trim().is_empty() {
            return Err(EdgeError::InvalidRequest(format!(
                "module {name} has no image"
            )));
        }
        if let Some(options) = module
            .container_create_options
            .as_deref()
            .filter(|options| !options.trim().is_empty())
        {
            serde_json::from_str::<serde_json::Value>(options).map_err(|e| {
                EdgeError::InvalidRequest(format!("module {name} has invalid create options: {e}"))
            })?;
        }
    }

    Ok(())
}

/// Edge models and their deployment configurations.
pub struct EdgeModelService {
    registry: Arc<dyn TwinRegistry>,
    edge_model_repository: Arc<EdgeDeviceModelRepository>,
    mapper: EdgeModelMapper,
}

impl EdgeModelService {
    pub fn new(
        registry: Arc<dyn TwinRegistry>,
        edge_model_repository: Arc<EdgeDeviceModelRepository>,
    ) -> Self {
        Self {
            registry,
            edge_model_repository,
            mapper: EdgeModelMapper,
        }
    }

    pub async fn get_models(&self) -> Result<Vec<EdgeModelListItem>, ApiError> {
        Ok(self
            .edge_model_repository
            .find_all()
            .await?
            .iter()
            .map(|entity| self.mapper.create_list_item(entity))
            .collect())
    }

    pub async fn get_model(&self, model_id: &str) -> Result<EdgeModel, ApiError> {
        let entity = self
            .edge_model_repository
            .find_by_id(model_id)
            .await?
            .ok_or_else(|| EdgeError::EdgeModelNotFound(model_id.to_string()))?;

        let modules = self.edge_model_repository.find_modules(model_id).await?;

        Ok(self.mapper.create_edge_model(&entity, &modules))
    }

    async fn save(&self, model: &EdgeModel) -> Result<(), ApiError> {
        let entity = self.mapper.create_table_entity(model);
        let modules = self.mapper.create_module_entities(model);

        let mut tx = self.edge_model_repository.get_pool().begin().await?;
        self.edge_model_repository
            .save(&entity, &modules, &mut tx)
            .await?;
        tx.commit().await?;

        self.registry
            .upsert_configuration(&self.mapper.create_configuration(model))
            .await?;

        Ok(())
    }

    pub async fn create_model(&self, mut model: EdgeModel) -> Result<EdgeModel, ApiError> {
        validate(&model)?;

        if model.model_id.trim().is_empty() {
            model.model_id = Uuid::new_v4().to_string();
        } else if self
            .edge_model_repository
            .find_by_id(&model.model_id)
            .await?
            .is_some()
        {
            return Err(EdgeError::EdgeModelAlreadyExists(model.model_id.clone()).into());
        }

        self.save(&model).await?;

        tracing::info!(model_id = %model.model_id, modules = model.edge_modules.len(), "edge model created");

        self.get_model(&model.model_id).await
    }

    pub async fn update_model(&self, model: EdgeModel) -> Result<EdgeModel, ApiError> {
        validate(&model)?;

        if self
            .edge_model_repository
            .find_by_id(&model.model_id)
            .await?
            .is_none()
        {
            return Err(EdgeError::EdgeModelNotFound(model.model_id.clone()).into());
        }

        self.save(&model).await?;

        tracing::info!(model_id = %model.model_id, "edge model updated");

        self.get_model(&model.model_id).await
    }

    pub async fn delete_model(&self, model_id: &str) -> Result<(), ApiError> {
        if self
            .edge_model_repository
            .find_by_id(model_id)
            .await?
            .is_none()
        {
            return Err(EdgeError::EdgeModelNotFound(model_id.to_string()).into());
        }

        let in_use = self
            .registry
            .query_twins(&TwinQuery {
                filter: TwinFilter {
                    is_edge: Some(true),
                    model_id: Some(model_id.to_string()),
                    ..Default::default()
                },
                page_size: 1,
                page_number: 0,
            })
            .await?;
        if in_use.total > 0 {
            return Err(EdgeError::EdgeModelInUse(model_id.to_string()).into());
        }

        let mut tx = self.edge_model_repository.get_pool().begin().await?;
        self.edge_model_repository.delete(model_id, &mut tx).await?;
        tx.commit().await?;

        match self
            .registry
            .delete_configuration(&self.mapper.configuration_id(model_id))
            .await
        {
            Ok(()) | Err(RegistryError::NotFound(_)) => {}
            Err(e) => return Err(e.into()),
        }

        tracing::info!(model_id = %model_id, "edge model deleted");

        Ok(())
    }
}
