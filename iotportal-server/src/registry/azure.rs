use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, IF_MATCH};
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::{Value, json};
use time::OffsetDateTime;

use super::{
    Configuration, DirectMethod, IotHubConnectionString, MethodResult, Twin, TwinFilter, TwinPage,
    TwinQuery, TwinRegistry, to_camel_case,
};
use crate::configs::Azure;
use crate::errors::RegistryError;

const TOKEN_LIFETIME_SECS: u64 = 3600;
const MAX_ITEM_COUNT: u32 = 1000;
const CONTINUATION_HEADER: &str = "x-ms-continuation";
const MAX_ITEM_COUNT_HEADER: &str = "x-ms-max-item-count";

/// IoT Hub service REST client.
pub struct IotHubRegistry {
    client: Client,
    base_url: String,
    api_version: String,
    connection: IotHubConnectionString,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CountResult {
    total_number: u64,
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

/// Builds the IoT Hub query language statement selecting the filtered twins.
pub fn build_query(filter: &TwinFilter, projection: &str) -> String {
    let mut conditions = Vec::new();

    if let Some(is_edge) = filter.is_edge {
        conditions.push(format!("capabilities.iotEdge = {is_edge}"));
    }

    if let Some(device_type) = &filter.device_type {
        conditions.push(format!("tags.deviceType = '{}'", escape(device_type)));
    }

    if let Some(excluded) = &filter.exclude_device_type {
        conditions.push(format!(
            "(NOT is_defined(tags.deviceType) OR tags.deviceType != '{}')",
            escape(excluded)
        ));
    }

    if let Some(search) = filter.search_text.as_deref().filter(|s| !s.is_empty()) {
        let search = escape(search);
        conditions.push(format!(
            "(STARTSWITH(deviceId, '{search}') OR (is_defined(tags.deviceName) AND STARTSWITH(tags.deviceName, '{search}')))"
        ));
    }

    if let Some(is_enabled) = filter.is_enabled {
        let status = if is_enabled { "enabled" } else { "disabled" };
        conditions.push(format!("status = '{status}'"));
    }

    if let Some(is_connected) = filter.is_connected {
        let state = if is_connected { "Connected" } else { "Disconnected" };
        conditions.push(format!("connectionState = '{state}'"));
    }

    if let Some(model_id) = &filter.model_id {
        conditions.push(format!("tags.modelId = '{}'", escape(model_id)));
    }

    for (name, value) in &filter.tags {
        conditions.push(format!("tags.{} = '{}'", to_camel_case(name), escape(value)));
    }

    if conditions.is_empty() {
        format!("SELECT {projection} FROM devices")
    } else {
        format!("SELECT {projection} FROM devices WHERE {}", conditions.join(" AND "))
    }
}

impl IotHubRegistry {
    pub fn new(settings: &Azure) -> Result<Self, RegistryError> {
        let connection: IotHubConnectionString = settings.iot_hub_connection_string.parse()?;

        Ok(Self {
            client: Client::new(),
            base_url: connection.base_url(),
            api_version: settings.api_version.clone(),
            connection,
        })
    }

    /// Points the client at another host, used against test servers.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    fn authorization(&self) -> Result<String, RegistryError> {
        let expiry = OffsetDateTime::now_utc().unix_timestamp().max(0) as u64 + TOKEN_LIFETIME_SECS;
        self.connection.sas_token(expiry)
    }

    async fn send(&self, request: RequestBuilder, resource: &str) -> Result<Response, RegistryError> {
        let response = request
            .header(AUTHORIZATION, self.authorization()?)
            .query(&[("api-version", self.api_version.as_str())])
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        tracing::debug!(status = status.as_u16(), resource, %body, "iot hub request failed");

        Err(RegistryError::from_status(status.as_u16(), resource, body))
    }

    async fn get_optional<T>(&self, path: &str, resource: &str) -> Result<Option<T>, RegistryError>
    where
        T: for<'de> Deserialize<'de>,
    {
        match self.send(self.client.get(self.url(path)), resource).await {
            Ok(response) => Ok(Some(response.json().await?)),
            Err(RegistryError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn query_page(
        &self,
        query: &str,
        max_items: u32,
        continuation: Option<&str>,
    ) -> Result<(Vec<Twin>, Option<String>), RegistryError> {
        let mut request = self
            .client
            .post(self.url("/devices/query"))
            .header(MAX_ITEM_COUNT_HEADER, max_items.to_string())
            .json(&json!({ "query": query }));

        if let Some(token) = continuation {
            request = request.header(CONTINUATION_HEADER, token);
        }

        let response = self.send(request, "devices").await?;
        let next = response
            .headers()
            .get(CONTINUATION_HEADER)
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.is_empty())
            .map(str::to_string);

        Ok((response.json().await?, next))
    }

    async fn count(&self, filter: &TwinFilter) -> Result<u64, RegistryError> {
        let query = build_query(filter, "COUNT() as totalNumber");
        let response = self
            .send(
                self.client
                    .post(self.url("/devices/query"))
                    .json(&json!({ "query": query })),
                "devices",
            )
            .await?;

        let counts: Vec<CountResult> = response.json().await?;

        Ok(counts.first().map(|c| c.total_number).unwrap_or_default())
    }

    async fn put_twin(&self, twin: &Twin, etag: &str) -> Result<Twin, RegistryError> {
        let body = json!({
            "deviceId": twin.device_id,
            "tags": twin.tags,
            "properties": { "desired": twin.properties.desired },
        });

        let response = self
            .send(
                self.client
                    .put(self.url(&format!("/twins/{}", urlencoding::encode(&twin.device_id))))
                    .header(IF_MATCH, etag)
                    .json(&body),
                &twin.device_id,
            )
            .await?;

        Ok(response.json().await?)
    }
}

#[async_trait]
impl TwinRegistry for IotHubRegistry {
    async fn get_twin(&self, device_id: &str) -> Result<Option<Twin>, RegistryError> {
        let path = format!("/twins/{}", urlencoding::encode(device_id));
        self.get_optional(&path, device_id).await
    }

    async fn get_module_twin(
        &self,
        device_id: &str,
        module_id: &str,
    ) -> Result<Option<Twin>, RegistryError> {
        let path = format!(
            "/twins/{}/modules/{}",
            urlencoding::encode(device_id),
            urlencoding::encode(module_id)
        );
        self.get_optional(&path, device_id).await
    }

    async fn query_twins(&self, query: &TwinQuery) -> Result<TwinPage, RegistryError> {
        let statement = build_query(&query.filter, "*");
        let total = self.count(&query.filter).await?;

        // Continuation tokens only move forward: walk to the requested page.
        let max_items = query.page_size.clamp(1, MAX_ITEM_COUNT);
        let fetch_all = query.page_size > MAX_ITEM_COUNT;
        let mut continuation: Option<String> = None;
        let mut page = 0;
        let mut twins = Vec::new();

        loop {
            let (items, next) = self
                .query_page(&statement, max_items, continuation.as_deref())
                .await?;

            if fetch_all {
                twins.extend(items);
            } else if page == query.page_number {
                twins = items;
                break;
            }

            match next {
                Some(next) => continuation = Some(next),
                None => break,
            }
            page += 1;
        }

        Ok(TwinPage { twins, total })
    }

    async fn create_device(&self, twin: &Twin) -> Result<Twin, RegistryError> {
        let device = json!({
            "deviceId": twin.device_id,
            "status": twin.status,
            "capabilities": twin.capabilities,
        });

        self.send(
            self.client
                .put(self.url(&format!("/devices/{}", urlencoding::encode(&twin.device_id))))
                .json(&device),
            &twin.device_id,
        )
        .await?;

        tracing::info!(device_id = %twin.device_id, "device identity created in iot hub");

        self.put_twin(twin, "*").await
    }

    async fn update_twin(&self, twin: &Twin) -> Result<Twin, RegistryError> {
        let device_path = format!("/devices/{}", urlencoding::encode(&twin.device_id));

        let mut device: Value = self
            .get_optional(&device_path, &twin.device_id)
            .await?
            .ok_or_else(|| RegistryError::NotFound(twin.device_id.clone()))?;

        let status = serde_json::to_value(twin.status)?;
        if device.get("status") != Some(&status) {
            device["status"] = status;

            self.send(
                self.client
                    .put(self.url(&device_path))
                    .header(IF_MATCH, "*")
                    .json(&device),
                &twin.device_id,
            )
            .await?;
        }

        self.put_twin(twin, twin.etag.as_deref().unwrap_or("*")).await
    }

    async fn delete_device(&self, device_id: &str) -> Result<(), RegistryError> {
        self.send(
            self.client
                .delete(self.url(&format!("/devices/{}", urlencoding::encode(device_id))))
                .header(IF_MATCH, "*"),
            device_id,
        )
        .await?;

        Ok(())
    }

    async fn invoke_module_method(
        &self,
        device_id: &str,
        module_id: &str,
        method: &DirectMethod,
    ) -> Result<MethodResult, RegistryError> {
        let path = format!(
            "/twins/{}/modules/{}/methods",
            urlencoding::encode(device_id),
            urlencoding::encode(module_id)
        );

        let response = self
            .send(self.client.post(self.url(&path)).json(method), device_id)
            .await?;

        Ok(response.json().await?)
    }

    async fn upsert_configuration(
        &self,
        configuration: &Configuration,
    ) -> Result<Configuration, RegistryError> {
        // Configuration content cannot change once created.
        if self.get_configuration(&configuration.id).await?.is_some() {
            self.delete_configuration(&configuration.id).await?;
        }

        let mut body = configuration.clone();
        body.etag = None;

        let response = self
            .send(
                self.client
                    .put(self.url(&format!("/configurations/{}", urlencoding::encode(&body.id))))
                    .json(&body),
                &body.id,
            )
            .await?;

        Ok(response.json().await?)
    }

    async fn get_configuration(&self, id: &str) -> Result<Option<Configuration>, RegistryError> {
        let path = format!("/configurations/{}", urlencoding::encode(id));
        self.get_optional(&path, id).await
    }

    async fn list_configurations(&self) -> Result<Vec<Configuration>, RegistryError> {
        let response = self
            .send(
                self.client
                    .get(self.url("/configurations"))
                    .query(&[("top", "100")]),
                "configurations",
            )
            .await?;

        Ok(response.json().await?)
    }

    async fn delete_configuration(&self, id: &str) -> Result<(), RegistryError> {
        self.send(
            self.client
                .delete(self.url(&format!("/configurations/{}", urlencoding::encode(id))))
                .header(IF_MATCH, "*"),
            id,
        )
        .await?;

        Ok(())
    }
}
