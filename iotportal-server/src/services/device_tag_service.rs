use std::collections::HashSet;
use std::sync::Arc;

use iotportal_api::models::DeviceTag;

use super::device_service::load_device_tags;
use crate::errors::{ApiError, DeviceTagError};
use crate::mappers::DeviceTagMapper;
use crate::registry::to_camel_case;
use crate::repositories::DeviceTagRepository;

/// Tag names the portal writes itself.
const RESERVED_TAGS: [&str; 5] = [
    "deviceName",
    "modelId",
    "deviceType",
    "supportLoRaFeatures",
    "loraRegion",
];

fn is_valid_tag_name(name: &str) -> bool {
    !name.is_empty()
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        && name.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
}

pub struct DeviceTagService {
    device_tag_repository: Arc<DeviceTagRepository>,
}

impl DeviceTagService {
    pub fn new(device_tag_repository: Arc<DeviceTagRepository>) -> Self {
        Self {
            device_tag_repository,
        }
    }

    pub async fn get_tags(&self) -> Result<Vec<DeviceTag>, ApiError> {
        load_device_tags(&self.device_tag_repository).await
    }

    /// Replaces the tag list.
    pub async fn set_tags(&self, tags: Vec<DeviceTag>) -> Result<Vec<DeviceTag>, ApiError> {
        let mut twin_names = HashSet::new();

        for tag in &tags {
            let twin_name = to_camel_case(&tag.name);

            if !is_valid_tag_name(&tag.name)
                || RESERVED_TAGS.iter().any(|reserved| reserved.eq_ignore_ascii_case(&twin_name))
            {
                return Err(DeviceTagError::InvalidTagName(tag.name.clone()).into());
            }
            if !twin_names.insert(twin_name) {
                return Err(DeviceTagError::DuplicateTag(tag.name.clone()).into());
            }
            if tag.label.trim().is_empty() {
                return Err(DeviceTagError::MissingLabel(tag.name.clone()).into());
            }
        }

        let entities: Vec<_> = tags
            .iter()
            .map(|tag| DeviceTagMapper.create_table_entity(tag))
            .collect();

        let mut tx = self.device_tag_repository.get_pool().begin().await?;
        self.device_tag_repository.save_all(&entities, &mut tx).await?;
        tx.commit().await?;

        tracing::info!(count = entities.len(), "device tags replaced");

        self.get_tags().await
    }

    pub async fn delete_tag(&self, name: &str) -> Result<(), ApiError> {
        let mut tx = self.device_tag_repository.get_pool().begin().await?;
        let deleted = self.device_tag_repository.delete(name, &mut tx).await?;
        tx.commit().await?;

        if !deleted {
            return Err(DeviceTagError::TagNotFound(name.to_string()).into());
        }

        tracing::info!(tag = %name, "device tag deleted");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configs::{SchemaManager, Settings, Storage};

    async fn service() -> DeviceTagService {
        let storage = Arc::new(
            Storage::new(Settings::default().database, SchemaManager::default())
                .await
                .unwrap(),
        );

        DeviceTagService::new(Arc::new(DeviceTagRepository::new(storage)))
    }

    fn tag(name: &str, label: &str) -> DeviceTag {
        DeviceTag {
            name: name.into(),
            label: label.into(),
            required: false,
            searchable: true,
        }
    }

    #[test]
    fn test_tag_names() {
        assert!(is_valid_tag_name("site"));
        assert!(is_valid_tag_name("Floor_2"));
        assert!(!is_valid_tag_name("2floor"));
        assert!(!is_valid_tag_name("with.dot"));
        assert!(!is_valid_tag_name(""));
    }

    #[tokio::test]
    async fn test_replace_and_delete() {
        let service = service().await;

        service
            .set_tags(vec![tag("site", "Site"), tag("floor", "Floor")])
            .await
            .unwrap();
        let tags = service.set_tags(vec![tag("site", "Location")]).await.unwrap();
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].label, "Location");

        service.delete_tag("site").await.unwrap();
        assert!(service.get_tags().await.unwrap().is_empty());
        assert!(matches!(
            service.delete_tag("site").await,
            Err(ApiError::DeviceTagError(DeviceTagError::TagNotFound(_)))
        ));
    }

    #[tokio::test]
    async fn test_rejects_invalid_lists() {
        let service = service().await;

        assert!(matches!(
            service.set_tags(vec![tag("Site", "a"), tag("site", "b")]).await,
            Err(ApiError::DeviceTagError(DeviceTagError::DuplicateTag(_)))
        ));
        assert!(matches!(
            service.set_tags(vec![tag("ModelId", "Model")]).await,
            Err(ApiError::DeviceTagError(DeviceTagError::InvalidTagName(_)))
        ));
        assert!(matches!(
            service.set_tags(vec![tag("site", " ")]).await,
            Err(ApiError::DeviceTagError(DeviceTagError::MissingLabel(_)))
        ));
    }
}
