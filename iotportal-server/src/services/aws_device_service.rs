use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use iotportal_api::models::{DeviceDetails, DeviceListItem, PaginatedResult};

use super::device_service::{DeviceQuery, DeviceService, load_device_tags};
use super::validation::{Validate, check_required_tags};
use crate::errors::{ApiError, DeviceError};
use crate::mappers::AwsThingMapper;
use crate::registry::aws::Thing;
use crate::registry::{AwsIotClient, to_camel_case};
use crate::repositories::{DeviceModelRepository, DeviceTagRepository};

const ROUTE: &str = "/api/devices";

/// Standard devices stored as AWS IoT things.
pub struct AwsDeviceService {
    client: Arc<AwsIotClient>,
    mapper: AwsThingMapper,
    device_model_repository: Arc<DeviceModelRepository>,
    device_tag_repository: Arc<DeviceTagRepository>,
}

impl AwsDeviceService {
    pub fn new(
        client: Arc<AwsIotClient>,
        device_model_repository: Arc<DeviceModelRepository>,
        device_tag_repository: Arc<DeviceTagRepository>,
    ) -> Self {
        Self {
            client,
            mapper: AwsThingMapper,
            device_model_repository,
            device_tag_repository,
        }
    }

    async fn check_model(&self, model_id: &str) -> Result<Option<String>, ApiError> {
        let model = self
            .device_model_repository
            .find_by_id(model_id)
            .await?
            .ok_or_else(|| DeviceError::UnknownModel(model_id.to_string()))?;

        Ok(model.image_url)
    }
}

/// Things have no status or connection state: they are always enabled and never connected.
fn matches(thing: &Thing, query: &DeviceQuery, tag_filters: &[(String, String)]) -> bool {
    if query.is_enabled == Some(false) || query.is_connected == Some(true) {
        return false;
    }

    let attribute = |name: &str| thing.attributes.get(name).map(String::as_str);

    if let Some(search) = query.search_text.as_deref().filter(|s| !s.trim().is_empty()) {
        let search = search.to_lowercase();
        let name = attribute("deviceName").unwrap_or_default().to_lowercase();
        if !thing.thing_name.to_lowercase().starts_with(&search) && !name.starts_with(&search) {
            return false;
        }
    }

    if let Some(model_id) = &query.model_id {
        if attribute("modelId") != Some(model_id.as_str()) {
            return false;
        }
    }

    tag_filters
        .iter()
        .all(|(name, value)| attribute(name) == Some(value.as_str()))
}

#[async_trait]
impl DeviceService<DeviceDetails> for AwsDeviceService {
    async fn get_devices(
        &self,
        query: &DeviceQuery,
    ) -> Result<PaginatedResult<DeviceListItem>, ApiError> {
        let tags = load_device_tags(&self.device_tag_repository).await?;

        let mut tag_filters = Vec::new();
        for (name, value) in &query.tags {
            if !tags.iter().any(|tag| tag.searchable && &tag.name == name) {
                return Err(DeviceError::UnknownTagFilter(name.clone()).into());
            }
            tag_filters.push((to_camel_case(name), value.clone()));
        }

        let things: Vec<Thing> = self
            .client
            .list_things()
            .await?
            .into_iter()
            .filter(|thing| matches(thing, query, &tag_filters))
            .collect();

        let images: HashMap<String, Option<String>> = self
            .device_model_repository
            .find_all()
            .await?
            .into_iter()
            .map(|model| (model.row_key, model.image_url))
            .collect();

        let total = things.len() as u64;
        let skip = (query.page_number as usize).saturating_mul(query.page_size as usize);

        let items = things
            .iter()
            .skip(skip)
            .take(query.page_size as usize)
            .map(|thing| {
                let mut item = self.mapper.create_device_list_item(thing);
                item.image_url = images.get(&item.model_id).cloned().flatten();
                item
            })
            .collect();

        Ok(PaginatedResult {
            items,
            total_items: total,
            page_size: query.page_size,
            current_page: query.page_number,
            next_page: query.next_page(ROUTE, total),
        })
    }

    async fn get_device(&self, device_id: &str) -> Result<DeviceDetails, ApiError> {
        let thing = self
            .client
            .describe_thing(device_id)
            .await?
            .ok_or_else(|| DeviceError::DeviceNotFound(device_id.to_string()))?;

        let tags = load_device_tags(&self.device_tag_repository).await?;
        let mut details = self.mapper.create_device_details(&thing, &tags);
        details.image_url = self
            .device_model_repository
            .find_by_id(&details.model_id)
            .await?
            .and_then(|model| model.image_url);

        Ok(details)
    }

    async fn create_device(&self, device: DeviceDetails) -> Result<DeviceDetails, ApiError> {
        device.validate()?;

        let tags = load_device_tags(&self.device_tag_repository).await?;
        check_required_tags(&tags, &device.tags)?;
        let image_url = self.check_model(&device.model_id).await?;

        if self.client.describe_thing(&device.device_id).await?.is_some() {
            return Err(DeviceError::DeviceAlreadyExists(device.device_id.clone()).into());
        }

        let attributes = self.mapper.create_attributes(&device, &tags)?;
        let thing = self.client.create_thing(&device.device_id, &attributes).await?;

        tracing::info!(device_id = %device.device_id, "thing created");

        let mut details = self.mapper.create_device_details(&thing, &tags);
        details.image_url = image_url;

        Ok(details)
    }

    async fn update_device(&self, device: DeviceDetails) -> Result<DeviceDetails, ApiError> {
        device.validate()?;

        let tags = load_device_tags(&self.device_tag_repository).await?;
        check_required_tags(&tags, &device.tags)?;
        let image_url = self.check_model(&device.model_id).await?;

        let mut thing = self
            .client
            .describe_thing(&device.device_id)
            .await?
            .ok_or_else(|| DeviceError::DeviceNotFound(device.device_id.clone()))?;

        let attributes = self.mapper.create_attributes(&device, &tags)?;
        self.client.update_thing(&device.device_id, &attributes).await?;
        thing.attributes = attributes;

        tracing::info!(device_id = %device.device_id, "thing updated");

        let mut details = self.mapper.create_device_details(&thing, &tags);
        details.image_url = image_url;

        Ok(details)
    }

    async fn delete_device(&self, device_id: &str) -> Result<(), ApiError> {
        if self.client.describe_thing(device_id).await?.is_none() {
            return Err(DeviceError::DeviceNotFound(device_id.to_string()).into());
        }

        self.client.delete_shadow(device_id).await?;
        self.client.delete_thing(device_id).await?;

        tracing::info!(device_id = %device_id, "thing deleted");

        Ok(())
    }

    async fn device_exists(&self, device_id: &str) -> Result<bool, ApiError> {
        Ok(self.client.describe_thing(device_id).await?.is_some())
    }
}
