use std::collections::BTreeMap;

use reqwest::{Client, Method, Response, Url};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use time::OffsetDateTime;

use super::sigv4::SigV4Signer;
use crate::configs::Aws;
use crate::errors::RegistryError;

const CONTROL_SERVICE: &str = "iot";
const DATA_SERVICE: &str = "iotdata";
const LIST_PAGE_SIZE: u32 = 250;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thing {
    pub thing_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thing_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thing_arn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<i64>,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThingList {
    #[serde(default)]
    things: Vec<Thing>,
    next_token: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShadowState {
    #[serde(default)]
    pub desired: Map<String, Value>,
    #[serde(default)]
    pub reported: Map<String, Value>,
}

/// Classic (unnamed) device shadow document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Shadow {
    #[serde(default)]
    pub state: ShadowState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<i64>,
}

/// AWS IoT Core things (control plane) and shadows (data plane).
pub struct AwsIotClient {
    client: Client,
    control_endpoint: String,
    data_endpoint: String,
    control_signer: SigV4Signer,
    data_signer: SigV4Signer,
}

impl AwsIotClient {
    pub fn new(settings: &Aws) -> Self {
        let signer = |service: &str| {
            SigV4Signer::new(
                &settings.access_key,
                &settings.secret_access_key,
                &settings.region,
                service,
            )
        };

        Self {
            client: Client::new(),
            control_endpoint: settings.control_endpoint(),
            data_endpoint: settings.data_endpoint.clone(),
            control_signer: signer(CONTROL_SERVICE),
            data_signer: signer(DATA_SERVICE),
        }
    }

    fn thing_path(name: &str) -> String {
        format!("/things/{}", urlencoding::encode(name))
    }

    async fn send(
        &self,
        signer: &SigV4Signer,
        method: Method,
        endpoint: &str,
        path: &str,
        body: Option<&Value>,
        resource: &str,
    ) -> Result<Response, RegistryError> {
        let url = Url::parse(&format!("{}{}", endpoint.trim_end_matches('/'), path))
            .map_err(|e| RegistryError::Configuration(format!("invalid aws endpoint: {e}")))?;
        let payload = match body {
            Some(body) => serde_json::to_vec(body)?,
            None => Vec::new(),
        };

        let signature = signer.sign(method.as_str(), &url, &payload, OffsetDateTime::now_utc())?;

        let mut request = self
            .client
            .request(method, url)
            .header("x-amz-date", signature.amz_date)
            .header("authorization", signature.authorization);

        if body.is_some() {
            request = request
                .header("content-type", "application/json")
                .body(payload);
        }

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        tracing::debug!(status = status.as_u16(), resource, %body, "aws iot request failed");

        Err(RegistryError::from_status(status.as_u16(), resource, body))
    }

    async fn control(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        resource: &str,
    ) -> Result<Response, RegistryError> {
        self.send(&self.control_signer, method, &self.control_endpoint, path, body, resource)
            .await
    }

    async fn data(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        resource: &str,
    ) -> Result<Response, RegistryError> {
        self.send(&self.data_signer, method, &self.data_endpoint, path, body, resource)
            .await
    }

    pub async fn create_thing(
        &self,
        name: &str,
        attributes: &BTreeMap<String, String>,
    ) -> Result<Thing, RegistryError> {
        let body = json!({ "attributePayload": { "attributes": attributes } });
        let response = self
            .control(Method::POST, &Self::thing_path(name), Some(&body), name)
            .await?;

        let mut thing: Thing = response.json().await?;
        thing.attributes = attributes.clone();

        tracing::info!(thing = name, "aws thing created");

        Ok(thing)
    }

    pub async fn describe_thing(&self, name: &str) -> Result<Option<Thing>, RegistryError> {
        match self.control(Method::GET, &Self::thing_path(name), None, name).await {
            Ok(response) => Ok(Some(response.json().await?)),
            Err(RegistryError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Replaces every attribute of the thing.
    pub async fn update_thing(
        &self,
        name: &str,
        attributes: &BTreeMap<String, String>,
    ) -> Result<(), RegistryError> {
        let body = json!({ "attributePayload": { "attributes": attributes, "merge": false } });
        self.control(Method::PATCH, &Self::thing_path(name), Some(&body), name)
            .await?;

        Ok(())
    }

    pub async fn delete_thing(&self, name: &str) -> Result<(), RegistryError> {
        self.control(Method::DELETE, &Self::thing_path(name), None, name)
            .await?;

        Ok(())
    }

    /// Lists every registered thing, following the `nextToken` pagination.
    pub async fn list_things(&self) -> Result<Vec<Thing>, RegistryError> {
        let mut things = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let mut path = format!("/things?maxResults={LIST_PAGE_SIZE}");
            if let Some(token) = &next_token {
                path.push_str(&format!("&nextToken={}", urlencoding::encode(token)));
            }

            let page: ThingList = self
                .control(Method::GET, &path, None, "things")
                .await?
                .json()
                .await?;

            things.extend(page.things);

            match page.next_token.filter(|token| !token.is_empty()) {
                Some(token) => next_token = Some(token),
                None => break,
            }
        }

        Ok(things)
    }

    pub async fn get_shadow(&self, name: &str) -> Result<Option<Shadow>, RegistryError> {
        let path = format!("{}/shadow", Self::thing_path(name));

        match self.data(Method::GET, &path, None, name).await {
            Ok(response) => Ok(Some(response.json().await?)),
            Err(RegistryError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn update_shadow(
        &self,
        name: &str,
        desired: &Map<String, Value>,
    ) -> Result<Shadow, RegistryError> {
        let path = format!("{}/shadow", Self::thing_path(name));
        let body = json!({ "state": { "desired": desired } });

        let response = self.data(Method::POST, &path, Some(&body), name).await?;

        Ok(response.json().await?)
    }

    pub async fn delete_shadow(&self, name: &str) -> Result<(), RegistryError> {
        let path = format!("{}/shadow", Self::thing_path(name));

        match self.data(Method::DELETE, &path, None, name).await {
            Ok(_) | Err(RegistryError::NotFound(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use mockito::{Matcher, Server, ServerGuard};

    use super::*;

    fn client(server: &ServerGuard) -> AwsIotClient {
        AwsIotClient::new(&Aws {
            access_key: String::from("AKIDEXAMPLE"),
            secret_access_key: String::from("secret"),
            region: String::from("eu-west-1"),
            iot_endpoint: Some(server.url()),
            data_endpoint: server.url(),
        })
    }

    #[tokio::test]
    async fn test_create_thing_is_signed_for_iot() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/things/dev-1")
            .match_header(
                "authorization",
                Matcher::Regex(r"^AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/\d{8}/eu-west-1/iot/aws4_request, SignedHeaders=host;x-amz-date, Signature=[0-9a-f]{64}$".into()),
            )
            .match_header("x-amz-date", Matcher::Regex(r"^\d{8}T\d{6}Z$".into()))
            .match_body(Matcher::PartialJson(json!({
                "attributePayload": { "attributes": { "deviceName": "Sensor" } }
            })))
            .with_status(200)
            .with_body(r#"{"thingName":"dev-1","thingArn":"arn:aws:iot:eu-west-1:1:thing/dev-1","thingId":"abc"}"#)
            .create_async()
            .await;

        let mut attributes = BTreeMap::new();
        attributes.insert("deviceName".to_string(), "Sensor".to_string());

        let thing = client(&server).create_thing("dev-1", &attributes).await.unwrap();

        assert_eq!(thing.thing_id.as_deref(), Some("abc"));
        assert_eq!(thing.attributes["deviceName"], "Sensor");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_create_existing_thing_conflicts() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/things/dev-1")
            .with_status(409)
            .with_body(r#"{"message":"ResourceAlreadyExistsException"}"#)
            .create_async()
            .await;

        let result = client(&server).create_thing("dev-1", &BTreeMap::new()).await;

        assert!(matches!(result, Err(RegistryError::AlreadyExists(_))));
    }

    #[tokio::test]
    async fn test_list_things_follows_next_token() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/things")
            .match_query(Matcher::UrlEncoded("maxResults".into(), "250".into()))
            .with_status(200)
            .with_body(r#"{"things":[{"thingName":"a","attributes":{}}],"nextToken":"t2"}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/things")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("maxResults".into(), "250".into()),
                Matcher::UrlEncoded("nextToken".into(), "t2".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"things":[{"thingName":"b","attributes":{"modelId":"m1"}}]}"#)
            .create_async()
            .await;

        let things = client(&server).list_things().await.unwrap();

        let names: Vec<_> = things.iter().map(|t| t.thing_name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_shadow_uses_data_plane_signature() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/things/dev-1/shadow")
            .match_header(
                "authorization",
                Matcher::Regex(r"/iotdata/aws4_request".into()),
            )
            .match_body(Matcher::PartialJson(json!({ "state": { "desired": { "interval": 10 } } })))
            .with_status(200)
            .with_body(r#"{"state":{"desired":{"interval":10}},"version":2}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/things/ghost/shadow")
            .with_status(404)
            .create_async()
            .await;

        let client = client(&server);
        let mut desired = Map::new();
        desired.insert("interval".into(), json!(10));

        let shadow = client.update_shadow("dev-1", &desired).await.unwrap();
        assert_eq!(shadow.version, Some(2));
        assert!(client.get_shadow("ghost").await.unwrap().is_none());
    }
}
