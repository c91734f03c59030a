use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use iotportal_server::app::create_app;
use iotportal_server::configs::{LoRaWan, Settings};
use iotportal_server::services::{ADMIN_ROLE, TokenService};

pub struct MockApp {
    pub router: Router,
    pub settings: Arc<Settings>,
    pub token: String,
}

impl MockApp {
    pub async fn new() -> Self {
        Self::with_settings(Settings::default()).await
    }

    /// LoRaWAN enabled, router configurations served from `router_config_url`.
    pub async fn with_router_config(router_config_url: &str) -> Self {
        let mut settings = Settings::default();
        settings.lorawan = Some(LoRaWan {
            router_config_url: router_config_url.to_string(),
            ..Default::default()
        });

        Self::with_settings(settings).await
    }

    pub async fn with_settings(mut settings: Settings) -> Self {
        settings.auth.secret = String::from("test");
        settings.auth.expiration = 1000;
        let settings = Arc::new(settings);

        let router = create_app(&settings).await.unwrap();
        let token = TokenService::new(settings.auth.clone())
            .generate_token("1", "operator", ADMIN_ROLE)
            .unwrap()
            .token;

        Self {
            router,
            settings,
            token,
        }
    }

    pub async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder()
            .uri(uri)
            .method(method)
            .header("Authorization", format!("Bearer {}", self.token));

        let request = match body {
            Some(body) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(serde_json::to_string(&body).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).to_string())
            })
        };

        (status, body)
    }

    pub async fn create_model(&self, name: &str) -> String {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/models",
                Some(serde_json::json!({ "name": name })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);

        body["modelId"].as_str().unwrap().to_string()
    }

    pub async fn create_lora_model(&self, name: &str) -> String {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/lorawan/models",
                Some(serde_json::json!({ "name": name })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);

        body["modelId"].as_str().unwrap().to_string()
    }

    pub async fn create_device(&self, device_id: &str, model_id: &str) -> Value {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/devices",
                Some(serde_json::json!({
                    "deviceId": device_id,
                    "deviceName": format!("{device_id} name"),
                    "modelId": model_id,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);

        body
    }
}
