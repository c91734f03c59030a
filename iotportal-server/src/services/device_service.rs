use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use iotportal_api::models::{
    CONCENTRATOR_DEVICE_TYPE, DeviceListItem, DeviceTag, LORA_DEVICE_TYPE, PaginatedResult,
};

use super::validation::{Validate, check_required_tags};
use crate::errors::{ApiError, DeviceError, RegistryError};
use crate::mappers::{AsDevice, DeviceTagMapper, DeviceTwinMapper, LoRaDeviceTwinMapper, TwinMapper};
use crate::registry::{Twin, TwinFilter, TwinQuery, TwinRegistry, to_camel_case};
use crate::repositories::{DeviceModelRepository, DeviceTagRepository};

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;
const TAG_FILTER_PREFIX: &str = "tag.";

/// Device listing parameters, as read from the query string.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceQuery {
    pub search_text: Option<String>,
    pub is_enabled: Option<bool>,
    pub is_connected: Option<bool>,
    pub model_id: Option<String>,
    /// Searchable tag values keyed by tag name
    pub tags: BTreeMap<String, String>,
    pub page_size: u32,
    pub page_number: u32,
}

impl Default for DeviceQuery {
    fn default() -> Self {
        Self {
            search_text: None,
            is_enabled: None,
            is_connected: None,
            model_id: None,
            tags: BTreeMap::new(),
            page_size: DEFAULT_PAGE_SIZE,
            page_number: 0,
        }
    }
}

fn parse_param<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, DeviceError> {
    value
        .trim()
        .parse()
        .map_err(|_| DeviceError::InvalidRequest(format!("invalid value for {name}")))
}

impl DeviceQuery {
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, DeviceError> {
        let mut query = DeviceQuery::default();

        for (name, value) in params {
            if value.is_empty() {
                continue;
            }

            match name.as_str() {
                "pageSize" => query.page_size = parse_param(name, value)?,
                "pageNumber" => query.page_number = parse_param(name, value)?,
                "searchText" => query.search_text = Some(value.clone()),
                "searchStatus" => query.is_enabled = Some(parse_param(name, value)?),
                "searchState" => query.is_connected = Some(parse_param(name, value)?),
                "modelId" => query.model_id = Some(value.clone()),
                other => match other.strip_prefix(TAG_FILTER_PREFIX) {
                    Some(tag) if !tag.is_empty() => {
                        query.tags.insert(tag.to_string(), value.clone());
                    }
                    _ => {}
                },
            }
        }

        if !(1..=MAX_PAGE_SIZE).contains(&query.page_size) {
            return Err(DeviceError::InvalidRequest(format!(
                "pageSize must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }

        Ok(query)
    }

    /// Link to the following page, absent when the current page is the last one.
    pub fn next_page(&self, route: &str, total_items: u64) -> Option<String> {
        let seen = (u64::from(self.page_number) + 1) * u64::from(self.page_size);
        if seen >= total_items {
            return None;
        }

        let mut params = vec![
            format!("pageSize={}", self.page_size),
            format!("pageNumber={}", self.page_number + 1),
        ];
        if let Some(search_text) = &self.search_text {
            params.push(format!("searchText={}", urlencoding::encode(search_text)));
        }
        if let Some(is_enabled) = self.is_enabled {
            params.push(format!("searchStatus={is_enabled}"));
        }
        if let Some(is_connected) = self.is_connected {
            params.push(format!("searchState={is_connected}"));
        }
        if let Some(model_id) = &self.model_id {
            params.push(format!("modelId={}", urlencoding::encode(model_id)));
        }
        for (name, value) in &self.tags {
            params.push(format!(
                "{TAG_FILTER_PREFIX}{}={}",
                urlencoding::encode(name),
                urlencoding::encode(value)
            ));
        }

        Some(format!("{route}?{}", params.join("&")))
    }

    /// Registry filter, tags checked against the searchable device tags.
    pub fn to_filter(&self, base: TwinFilter, tags: &[DeviceTag]) -> Result<TwinFilter, DeviceError> {
        let mut filter = base;
        filter.search_text = self.search_text.clone().filter(|s| !s.trim().is_empty());
        filter.is_enabled = self.is_enabled;
        filter.is_connected = self.is_connected;
        filter.model_id = self.model_id.clone();

        for (name, value) in &self.tags {
            if !tags.iter().any(|tag| tag.searchable && &tag.name == name) {
                return Err(DeviceError::UnknownTagFilter(name.clone()));
            }
            filter.tags.insert(to_camel_case(name), value.clone());
        }

        Ok(filter)
    }
}

#[async_trait]
pub trait DeviceService<D>: Send + Sync {
    async fn get_devices(&self, query: &DeviceQuery)
    -> Result<PaginatedResult<DeviceListItem>, ApiError>;

    async fn get_device(&self, device_id: &str) -> Result<D, ApiError>;

    async fn create_device(&self, device: D) -> Result<D, ApiError>;

    async fn update_device(&self, device: D) -> Result<D, ApiError>;

    async fn delete_device(&self, device_id: &str) -> Result<(), ApiError>;

    async fn device_exists(&self, device_id: &str) -> Result<bool, ApiError>;
}

pub async fn load_device_tags(repository: &DeviceTagRepository) -> Result<Vec<DeviceTag>, ApiError> {
    Ok(repository
        .find_all()
        .await?
        .iter()
        .map(|entity| DeviceTagMapper.create_device_tag(entity))
        .collect())
}

/// Device service over a twin registry (IoT Hub or local store).
pub struct TwinDeviceService<M: TwinMapper> {
    registry: Arc<dyn TwinRegistry>,
    mapper: M,
    base_filter: TwinFilter,
    route: &'static str,
    device_model_repository: Arc<DeviceModelRepository>,
    device_tag_repository: Arc<DeviceTagRepository>,
}

impl TwinDeviceService<DeviceTwinMapper> {
    /// Standard and LoRaWAN devices, without concentrators and edge devices.
    pub fn standard(
        registry: Arc<dyn TwinRegistry>,
        device_model_repository: Arc<DeviceModelRepository>,
        device_tag_repository: Arc<DeviceTagRepository>,
    ) -> Self {
        Self {
            registry,
            mapper: DeviceTwinMapper,
            base_filter: TwinFilter {
                is_edge: Some(false),
                exclude_device_type: Some(CONCENTRATOR_DEVICE_TYPE.to_string()),
                ..Default::default()
            },
            route: "/api/devices",
            device_model_repository,
            device_tag_repository,
        }
    }
}

impl TwinDeviceService<LoRaDeviceTwinMapper> {
    pub fn lorawan(
        registry: Arc<dyn TwinRegistry>,
        device_model_repository: Arc<DeviceModelRepository>,
        device_tag_repository: Arc<DeviceTagRepository>,
    ) -> Self {
        Self {
            registry,
            mapper: LoRaDeviceTwinMapper,
            base_filter: TwinFilter {
                is_edge: Some(false),
                device_type: Some(LORA_DEVICE_TYPE.to_string()),
                ..Default::default()
            },
            route: "/api/lorawan/devices",
            device_model_repository,
            device_tag_repository,
        }
    }
}

impl<M: TwinMapper> TwinDeviceService<M> {
    async fn find_twin(&self, device_id: &str) -> Result<Option<Twin>, ApiError> {
        Ok(self
            .registry
            .get_twin(device_id)
            .await?
            .filter(|twin| self.base_filter.matches(twin)))
    }

    async fn check_model(&self, model_id: &str) -> Result<Option<String>, ApiError> {
        let model = self
            .device_model_repository
            .find_by_id(model_id)
            .await?
            .ok_or_else(|| DeviceError::UnknownModel(model_id.to_string()))?;

        Ok(model.image_url)
    }

    fn to_details(&self, twin: &Twin, tags: &[DeviceTag], image_url: Option<String>) -> M::Details {
        let mut details = self.mapper.create_device_details(twin, tags);
        details.device_mut().image_url = image_url;
        details
    }
}

#[async_trait]
impl<M> DeviceService<M::Details> for TwinDeviceService<M>
where
    M: TwinMapper,
    M::Details: Validate,
{
    async fn get_devices(
        &self,
        query: &DeviceQuery,
    ) -> Result<PaginatedResult<DeviceListItem>, ApiError> {
        let tags = load_device_tags(&self.device_tag_repository).await?;
        let filter = query.to_filter(self.base_filter.clone(), &tags)?;

        let page = self
            .registry
            .query_twins(&TwinQuery {
                filter,
                page_size: query.page_size,
                page_number: query.page_number,
            })
            .await?;

        let images: HashMap<String, Option<String>> = self
            .device_model_repository
            .find_all()
            .await?
            .into_iter()
            .map(|model| (model.row_key, model.image_url))
            .collect();

        let items = page
            .twins
            .iter()
            .map(|twin| {
                let mut item = self.mapper.create_device_list_item(twin);
                item.image_url = images.get(&item.model_id).cloned().flatten();
                item
            })
            .collect();

        Ok(PaginatedResult {
            items,
            total_items: page.total,
            page_size: query.page_size,
            current_page: query.page_number,
            next_page: query.next_page(self.route, page.total),
        })
    }

    async fn get_device(&self, device_id: &str) -> Result<M::Details, ApiError> {
        let twin = self
            .find_twin(device_id)
            .await?
            .ok_or_else(|| DeviceError::DeviceNotFound(device_id.to_string()))?;

        let tags = load_device_tags(&self.device_tag_repository).await?;
        let image_url = self
            .device_model_repository
            .find_by_id(&twin.tag_or_default("modelId"))
            .await?
            .and_then(|model| model.image_url);

        Ok(self.to_details(&twin, &tags, image_url))
    }

    async fn create_device(&self, device: M::Details) -> Result<M::Details, ApiError> {
        device.validate()?;

        let tags = load_device_tags(&self.device_tag_repository).await?;
        check_required_tags(&tags, &device.device().tags)?;
        let image_url = self.check_model(&device.device().model_id).await?;

        let device_id = device.device().device_id.clone();
        if self.registry.get_twin(&device_id).await?.is_some() {
            return Err(DeviceError::DeviceAlreadyExists(device_id).into());
        }

        let mut twin = Twin::new(&device_id);
        self.mapper.update_twin(&mut twin, &device, &tags);

        let created = match self.registry.create_device(&twin).await {
            Ok(created) => created,
            Err(RegistryError::AlreadyExists(_)) => {
                return Err(DeviceError::DeviceAlreadyExists(device_id).into());
            }
            Err(e) => return Err(e.into()),
        };

        tracing::info!(device_id = %device_id, "device created");

        Ok(self.to_details(&created, &tags, image_url))
    }

    async fn update_device(&self, device: M::Details) -> Result<M::Details, ApiError> {
        device.validate()?;

        let tags = load_device_tags(&self.device_tag_repository).await?;
        check_required_tags(&tags, &device.device().tags)?;
        let image_url = self.check_model(&device.device().model_id).await?;

        let device_id = device.device().device_id.clone();
        let mut twin = self
            .find_twin(&device_id)
            .await?
            .ok_or_else(|| DeviceError::DeviceNotFound(device_id.clone()))?;

        self.mapper.update_twin(&mut twin, &device, &tags);
        let updated = self.registry.update_twin(&twin).await?;

        tracing::info!(device_id = %device_id, "device updated");

        Ok(self.to_details(&updated, &tags, image_url))
    }

    async fn delete_device(&self, device_id: &str) -> Result<(), ApiError> {
        if self.find_twin(device_id).await?.is_none() {
            return Err(DeviceError::DeviceNotFound(device_id.to_string()).into());
        }

        match self.registry.delete_device(device_id).await {
            Ok(()) => {
                tracing::info!(device_id = %device_id, "device deleted");
                Ok(())
            }
            Err(RegistryError::NotFound(_)) => {
                Err(DeviceError::DeviceNotFound(device_id.to_string()).into())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn device_exists(&self, device_id: &str) -> Result<bool, ApiError> {
        Ok(self.find_twin(device_id).await?.is_some())
    }
}

#[cfg(test)]
mod tests {
    use iotportal_api::models::{DeviceDetails, LoRaDeviceDetails};

    use super::*;
    use crate::configs::{SchemaManager, Settings, Storage};
    use crate::models::{DEFAULT_PARTITION_KEY, DeviceModelEntity, DeviceTagEntity};
    use crate::registry::LocalRegistry;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    struct Fixture {
        standard: TwinDeviceService<DeviceTwinMapper>,
        lorawan: TwinDeviceService<LoRaDeviceTwinMapper>,
    }

    async fn fixture() -> Fixture {
        let storage = Arc::new(
            Storage::new(Settings::default().database, SchemaManager::default())
                .await
                .unwrap(),
        );
        let registry: Arc<dyn TwinRegistry> = Arc::new(LocalRegistry::new(storage.clone()));
        let models = Arc::new(DeviceModelRepository::new(storage.clone()));
        let tags = Arc::new(DeviceTagRepository::new(storage.clone()));

        let mut tx = storage.get_pool().begin().await.unwrap();
        models
            .create(
                &DeviceModelEntity {
                    partition_key: DEFAULT_PARTITION_KEY.into(),
                    row_key: "m1".into(),
                    name: "Sensor".into(),
                    image_url: Some("https://img/m1.png".into()),
                    ..Default::default()
                },
                &mut tx,
            )
            .await
            .unwrap();
        tags.save_all(
            &[DeviceTagEntity {
                partition_key: DEFAULT_PARTITION_KEY.into(),
                row_key: "site".into(),
                label: "Site".into(),
                required: true,
                searchable: true,
            }],
            &mut tx,
        )
        .await
        .unwrap();
        tx.commit().await.unwrap();

        Fixture {
            standard: TwinDeviceService::standard(registry.clone(), models.clone(), tags.clone()),
            lorawan: TwinDeviceService::lorawan(registry, models, tags),
        }
    }

    fn device(id: &str, site: &str) -> DeviceDetails {
        DeviceDetails {
            device_id: id.into(),
            device_name: format!("{id} name"),
            model_id: "m1".into(),
            is_enabled: true,
            tags: BTreeMap::from([("site".to_string(), site.to_string())]),
            ..Default::default()
        }
    }

    #[test]
    fn test_query_defaults_and_bounds() {
        let query = DeviceQuery::from_params(&HashMap::new()).unwrap();
        assert_eq!(query.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(query.page_number, 0);

        assert!(DeviceQuery::from_params(&params(&[("pageSize", "0")])).is_err());
        assert!(DeviceQuery::from_params(&params(&[("pageSize", "101")])).is_err());
        assert!(DeviceQuery::from_params(&params(&[("searchStatus", "maybe")])).is_err());
    }

    #[test]
    fn test_query_reads_filters_and_tags() {
        let query = DeviceQuery::from_params(&params(&[
            ("searchText", "roof"),
            ("searchStatus", "true"),
            ("searchState", "false"),
            ("modelId", "m1"),
            ("tag.site", "paris"),
            ("pageSize", "5"),
        ]))
        .unwrap();

        assert_eq!(query.search_text.as_deref(), Some("roof"));
        assert_eq!(query.is_enabled, Some(true));
        assert_eq!(query.is_connected, Some(false));
        assert_eq!(query.tags["site"], "paris");
        assert_eq!(query.page_size, 5);
    }

    #[test]
    fn test_next_page_link() {
        let query = DeviceQuery {
            page_size: 2,
            search_text: Some("a b".into()),
            ..Default::default()
        };

        assert_eq!(
            query.next_page("/api/devices", 5).as_deref(),
            Some("/api/devices?pageSize=2&pageNumber=1&searchText=a%20b")
        );
        assert_eq!(query.next_page("/api/devices", 2), None);
    }

    #[test]
    fn test_tag_filter_must_be_searchable() {
        let tags = vec![DeviceTag {
            name: "Site".into(),
            label: "Site".into(),
            required: false,
            searchable: false,
        }];
        let mut query = DeviceQuery::default();
        query.tags.insert("Site".into(), "paris".into());

        assert!(matches!(
            query.to_filter(TwinFilter::default(), &tags),
            Err(DeviceError::UnknownTagFilter(_))
        ));

        let tags = vec![DeviceTag {
            searchable: true,
            ..tags[0].clone()
        }];
        let filter = query.to_filter(TwinFilter::default(), &tags).unwrap();
        assert_eq!(filter.tags["site"], "paris");
    }

    #[tokio::test]
    async fn test_create_get_update_delete() {
        let fixture = fixture().await;
        let service = &fixture.standard;

        let created = service.create_device(device("dev-1", "paris")).await.unwrap();
        assert_eq!(created.image_url.as_deref(), Some("https://img/m1.png"));
        assert_eq!(created.tags["site"], "paris");

        let duplicate = service.create_device(device("dev-1", "paris")).await;
        assert!(matches!(
            duplicate,
            Err(ApiError::DeviceError(DeviceError::DeviceAlreadyExists(_)))
        ));

        let mut changed = device("dev-1", "lyon");
        changed.is_enabled = false;
        let updated = service.update_device(changed).await.unwrap();
        assert!(!updated.is_enabled);
        assert_eq!(updated.tags["site"], "lyon");

        service.delete_device("dev-1").await.unwrap();
        assert!(!service.device_exists("dev-1").await.unwrap());
        assert!(matches!(
            service.delete_device("dev-1").await,
            Err(ApiError::DeviceError(DeviceError::DeviceNotFound(_)))
        ));
    }

    #[tokio::test]
    async fn test_create_rejects_unknown_model_and_missing_tag() {
        let fixture = fixture().await;

        let mut unknown = device("dev-1", "paris");
        unknown.model_id = "missing".into();
        assert!(matches!(
            fixture.standard.create_device(unknown).await,
            Err(ApiError::DeviceError(DeviceError::UnknownModel(_)))
        ));

        assert!(matches!(
            fixture.standard.create_device(device("dev-1", "")).await,
            Err(ApiError::DeviceError(DeviceError::MissingRequiredTag(_)))
        ));
    }

    #[tokio::test]
    async fn test_listing_pages_and_filters() {
        let fixture = fixture().await;
        for (id, site) in [("a", "paris"), ("b", "lyon"), ("c", "paris")] {
            fixture.standard.create_device(device(id, site)).await.unwrap();
        }

        let page = fixture
            .standard
            .get_devices(&DeviceQuery {
                page_size: 2,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.total_items, 3);
        assert_eq!(page.items.len(), 2);
        assert!(page.next_page.is_some());
        assert_eq!(page.items[0].image_url.as_deref(), Some("https://img/m1.png"));

        let mut query = DeviceQuery::default();
        query.tags.insert("site".into(), "paris".into());
        let page = fixture.standard.get_devices(&query).await.unwrap();
        assert_eq!(page.total_items, 2);
    }

    #[tokio::test]
    async fn test_lorawan_devices_are_separate_but_listed_as_devices() {
        let fixture = fixture().await;

        let mut lora = LoRaDeviceDetails::new(device("0011223344556677", "paris"));
        lora.app_eui = Some("70B3D57ED0000000".into());
        lora.app_key = Some("00112233445566778899AABBCCDDEEFF".into());
        fixture.lorawan.create_device(lora).await.unwrap();
        fixture.standard.create_device(device("plain", "paris")).await.unwrap();

        let all = fixture.standard.get_devices(&DeviceQuery::default()).await.unwrap();
        assert_eq!(all.total_items, 2);
        assert!(all.items.iter().any(|item| item.support_lora_features));

        let lora_only = fixture.lorawan.get_devices(&DeviceQuery::default()).await.unwrap();
        assert_eq!(lora_only.total_items, 1);
        assert!(!fixture.lorawan.device_exists("plain").await.unwrap());

        let details = fixture.lorawan.get_device("0011223344556677").await.unwrap();
        assert!(details.use_otaa);
        assert_eq!(details.app_eui.as_deref(), Some("70B3D57ED0000000"));
    }
}
