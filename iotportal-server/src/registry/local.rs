use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};
use sqlx::types::Json;
use time::OffsetDateTime;
use uuid::Uuid;

use super::{
    AppliedConfiguration, Configuration, DirectMethod, MethodResult, Twin, TwinPage, TwinQuery,
    TwinRegistry,
};
use crate::configs::Storage;
use crate::errors::RegistryError;
use crate::models::{ConfigurationRow, TwinRow};

const EDGE_SYSTEM_MODULES: [&str; 2] = ["$edgeAgent", "$edgeHub"];

/// Registry persisted in the portal database, used in development and tests.
pub struct LocalRegistry {
    storage: Arc<Storage>,
}

impl LocalRegistry {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    fn new_etag() -> String {
        Uuid::new_v4().simple().to_string()
    }

    async fn save_twin(&self, twin: &Twin) -> Result<(), RegistryError> {
        sqlx::query(
            r#"
            INSERT INTO twins (device_id, twin) VALUES ($1, $2)
            ON CONFLICT (device_id) DO UPDATE SET twin = excluded.twin
            "#,
        )
        .bind(&twin.device_id)
        .bind(Json(twin))
        .execute(self.storage.get_pool())
        .await?;

        Ok(())
    }

    async fn save_module_twin(&self, twin: &Twin) -> Result<(), RegistryError> {
        let module_id = twin.module_id.as_deref().unwrap_or_default();

        sqlx::query(
            r#"
            INSERT INTO module_twins (device_id, module_id, twin) VALUES ($1, $2, $3)
            ON CONFLICT (device_id, module_id) DO UPDATE SET twin = excluded.twin
            "#,
        )
        .bind(&twin.device_id)
        .bind(module_id)
        .bind(Json(twin))
        .execute(self.storage.get_pool())
        .await?;

        Ok(())
    }

    /// Mirrors the deployments targeting the device the way IoT Hub would.
    async fn apply_configurations(&self, twin: &mut Twin) -> Result<(), RegistryError> {
        if !twin.is_edge() {
            return Ok(());
        }

        let model_id = twin.tag("modelId");
        twin.configurations.clear();

        for configuration in self.list_configurations().await? {
            if target_model_id(&configuration.target_condition) != model_id.as_deref() {
                continue;
            }

            twin.configurations.insert(
                configuration.id.clone(),
                AppliedConfiguration {
                    status: String::from("Targeted"),
                },
            );

            if let Some(desired) = configuration
                .content
                .modules_content
                .get("$edgeAgent")
                .and_then(|agent| agent.get("properties.desired"))
                .and_then(Value::as_object)
            {
                if let Some(mut agent) = self.get_module_twin(&twin.device_id, "$edgeAgent").await? {
                    agent.properties.desired = desired.clone();
                    self.save_module_twin(&agent).await?;
                }
            }
        }

        Ok(())
    }
}

/// Extracts the model id of a `tags.modelId='<id>'` target condition.
pub(crate) fn target_model_id(condition: &str) -> Option<&str> {
    condition
        .trim()
        .strip_prefix("tags.modelId='")
        .and_then(|rest| rest.strip_suffix('\''))
}

#[async_trait]
impl TwinRegistry for LocalRegistry {
    async fn get_twin(&self, device_id: &str) -> Result<Option<Twin>, RegistryError> {
        let row: Option<TwinRow> = sqlx::query_as("SELECT * FROM twins WHERE device_id = $1")
            .bind(device_id)
            .fetch_optional(self.storage.get_pool())
            .await?;

        Ok(row.map(|row| row.twin.0))
    }

    async fn get_module_twin(
        &self,
        device_id: &str,
        module_id: &str,
    ) -> Result<Option<Twin>, RegistryError> {
        let twin: Option<Json<Twin>> = sqlx::query_scalar(
            "SELECT twin FROM module_twins WHERE device_id = $1 AND module_id = $2",
        )
        .bind(device_id)
        .bind(module_id)
        .fetch_optional(self.storage.get_pool())
        .await?;

        Ok(twin.map(|twin| twin.0))
    }

    async fn query_twins(&self, query: &TwinQuery) -> Result<TwinPage, RegistryError> {
        let rows: Vec<TwinRow> = sqlx::query_as("SELECT * FROM twins ORDER BY device_id")
            .fetch_all(self.storage.get_pool())
            .await?;

        let matching: Vec<Twin> = rows
            .into_iter()
            .map(|row| row.twin.0)
            .filter(|twin| query.filter.matches(twin))
            .collect();

        let total = matching.len() as u64;
        let skip = (query.page_number as usize).saturating_mul(query.page_size as usize);

        let twins = matching
            .into_iter()
            .skip(skip)
            .take(query.page_size as usize)
            .collect();

        Ok(TwinPage { twins, total })
    }

    async fn create_device(&self, twin: &Twin) -> Result<Twin, RegistryError> {
        if self.get_twin(&twin.device_id).await?.is_some() {
            return Err(RegistryError::AlreadyExists(twin.device_id.clone()));
        }

        let now = OffsetDateTime::now_utc();
        let mut created = twin.clone();
        created.etag = Some(Self::new_etag());
        created.version = Some(1);
        created.status_update_time = Some(now);
        created.connection_state = Default::default();
        created.properties.reported = Default::default();

        self.save_twin(&created).await?;

        if created.is_edge() {
            for module_id in EDGE_SYSTEM_MODULES {
                let mut module = Twin::new(&created.device_id);
                module.module_id = Some(module_id.to_string());
                module.etag = Some(Self::new_etag());
                self.save_module_twin(&module).await?;
            }

            self.apply_configurations(&mut created).await?;
            self.save_twin(&created).await?;
        }

        tracing::debug!(device_id = %created.device_id, "local twin created");

        Ok(created)
    }

    async fn update_twin(&self, twin: &Twin) -> Result<Twin, RegistryError> {
        let mut stored = self
            .get_twin(&twin.device_id)
            .await?
            .ok_or_else(|| RegistryError::NotFound(twin.device_id.clone()))?;

        if let Some(etag) = twin.etag.as_deref().filter(|etag| *etag != "*") {
            if stored.etag.as_deref() != Some(etag) {
                return Err(RegistryError::PreconditionFailed(twin.device_id.clone()));
            }
        }

        if stored.status != twin.status {
            stored.status = twin.status;
            stored.status_update_time = Some(OffsetDateTime::now_utc());
        }

        stored.tags = twin.tags.clone();
        stored.properties.desired = twin.properties.desired.clone();
        stored.etag = Some(Self::new_etag());
        stored.version = Some(stored.version.unwrap_or_default() + 1);

        self.apply_configurations(&mut stored).await?;
        self.save_twin(&stored).await?;

        Ok(stored)
    }

    async fn delete_device(&self, device_id: &str) -> Result<(), RegistryError> {
        let pool = self.storage.get_pool();
        let mut tx = pool.begin().await?;

        sqlx::query("DELETE FROM module_twins WHERE device_id = $1")
            .bind(device_id)
            .execute(&mut *tx)
            .await?;

        let deleted = sqlx::query("DELETE FROM twins WHERE device_id = $1")
            .bind(device_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;

        if deleted == 0 {
            return Err(RegistryError::NotFound(device_id.to_string()));
        }

        Ok(())
    }

    async fn invoke_module_method(
        &self,
        device_id: &str,
        module_id: &str,
        method: &DirectMethod,
    ) -> Result<MethodResult, RegistryError> {
        self.get_module_twin(device_id, module_id)
            .await?
            .ok_or_else(|| RegistryError::NotFound(format!("{device_id}/{module_id}")))?;

        tracing::info!(device_id, module_id, method = %method.method_name, "local direct method");

        Ok(MethodResult {
            status: 200,
            payload: json!({ "status": 200 }),
        })
    }

    async fn upsert_configuration(
        &self,
        configuration: &Configuration,
    ) -> Result<Configuration, RegistryError> {
        let now = OffsetDateTime::now_utc();
        let mut saved = configuration.clone();

        let existing = self.get_configuration(&configuration.id).await?;
        saved.created_time_utc = existing
            .and_then(|existing| existing.created_time_utc)
            .or(Some(now));
        saved.last_updated_time_utc = Some(now);
        saved.etag = Some(Self::new_etag());

        sqlx::query(
            r#"
            INSERT INTO configurations (id, configuration) VALUES ($1, $2)
            ON CONFLICT (id) DO UPDATE SET configuration = excluded.configuration
            "#,
        )
        .bind(&saved.id)
        .bind(Json(&saved))
        .execute(self.storage.get_pool())
        .await?;

        Ok(saved)
    }

    async fn get_configuration(&self, id: &str) -> Result<Option<Configuration>, RegistryError> {
        let row: Option<ConfigurationRow> =
            sqlx::query_as("SELECT * FROM configurations WHERE id = $1")
                .bind(id)
                .fetch_optional(self.storage.get_pool())
                .await?;

        Ok(row.map(|row| row.configuration.0))
    }

    async fn list_configurations(&self) -> Result<Vec<Configuration>, RegistryError> {
        let rows: Vec<ConfigurationRow> = sqlx::query_as("SELECT * FROM configurations ORDER BY id")
            .fetch_all(self.storage.get_pool())
            .await?;

        Ok(rows.into_iter().map(|row| row.configuration.0).collect())
    }

    async fn delete_configuration(&self, id: &str) -> Result<(), RegistryError> {
        let deleted = sqlx::query("DELETE FROM configurations WHERE id = $1")
            .bind(id)
            .execute(self.storage.get_pool())
            .await?
            .rows_affected();

        if deleted == 0 {
            return Err(RegistryError::NotFound(id.to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configs::{SchemaManager, Settings};
    use crate::registry::TwinFilter;

    async fn registry() -> LocalRegistry {
        let storage = Storage::new(Settings::default().database, SchemaManager::default())
            .await
            .unwrap();

        LocalRegistry::new(Arc::new(storage))
    }

    fn device(id: &str) -> Twin {
        let mut twin = Twin::new(id);
        twin.set_tag("deviceName", id);
        twin.set_tag("modelId", "model-1");
        twin
    }

    #[test]
    fn test_target_model_id() {
        assert_eq!(target_model_id("tags.modelId='abc'"), Some("abc"));
        assert_eq!(target_model_id("tags.site='abc'"), None);
    }

    #[tokio::test]
    async fn test_create_get_and_duplicate() {
        let registry = registry().await;

        let created = registry.create_device(&device("dev-1")).await.unwrap();
        assert_eq!(created.version, Some(1));
        assert!(created.etag.is_some());

        let fetched = registry.get_twin("dev-1").await.unwrap().unwrap();
        assert_eq!(fetched.tag("deviceName").as_deref(), Some("dev-1"));

        let duplicate = registry.create_device(&device("dev-1")).await;
        assert!(matches!(duplicate, Err(RegistryError::AlreadyExists(_))));
    }

    #[tokio::test]
    async fn test_update_checks_etag() {
        let registry = registry().await;
        let created = registry.create_device(&device("dev-1")).await.unwrap();

        let mut stale = created.clone();
        stale.etag = Some("stale".into());
        assert!(matches!(
            registry.update_twin(&stale).await,
            Err(RegistryError::PreconditionFailed(_))
        ));

        let mut update = created.clone();
        update.set_tag("deviceName", "renamed");
        update.set_enabled(false);
        let updated = registry.update_twin(&update).await.unwrap();

        assert_eq!(updated.tag("deviceName").as_deref(), Some("renamed"));
        assert!(!updated.is_enabled());
        assert_eq!(updated.version, Some(2));
    }

    #[tokio::test]
    async fn test_query_paginates_filtered_twins() {
        let registry = registry().await;
        for id in ["a", "b", "c", "d", "e"] {
            registry.create_device(&device(id)).await.unwrap();
        }

        let page = registry
            .query_twins(&TwinQuery {
                filter: TwinFilter::default(),
                page_size: 2,
                page_number: 1,
            })
            .await
            .unwrap();

        assert_eq!(page.total, 5);
        let ids: Vec<_> = page.twins.iter().map(|t| t.device_id.as_str()).collect();
        assert_eq!(ids, vec!["c", "d"]);
    }

    #[tokio::test]
    async fn test_edge_device_gets_system_modules_and_deployment() {
        let registry = registry().await;

        let mut configuration = Configuration {
            id: "edge-model-1".into(),
            target_condition: "tags.modelId='model-1'".into(),
            ..Default::default()
        };
        configuration.content.modules_content.insert(
            "$edgeAgent".into(),
            json!({ "properties.desired": { "modules": { "sim": { "settings": { "image": "sim:1" } } } } }),
        );
        registry.upsert_configuration(&configuration).await.unwrap();

        let mut twin = device("edge-1");
        twin.capabilities.iot_edge = true;
        let created = registry.create_device(&twin).await.unwrap();

        assert!(created.configurations.contains_key("edge-model-1"));
        let agent = registry.get_module_twin("edge-1", "$edgeAgent").await.unwrap().unwrap();
        assert!(agent.desired("modules").is_some());
        assert!(registry.get_module_twin("edge-1", "$edgeHub").await.unwrap().is_some());

        registry.delete_device("edge-1").await.unwrap();
        assert!(registry.get_module_twin("edge-1", "$edgeAgent").await.unwrap().is_none());
        assert!(matches!(
            registry.delete_device("edge-1").await,
            Err(RegistryError::NotFound(_))
        ));
    }
}
