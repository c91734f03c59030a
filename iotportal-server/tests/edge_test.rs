use axum::http::{Method, StatusCode};
use serde_json::json;

use iotportal_server::configs::{Aws, CloudProvider, Settings};

mod common;
use common::mock_app::MockApp;

async fn create_edge_model(app: &MockApp) -> String {
    let (status, body) = app
        .send(
            Method::POST,
            "/api/edge/models",
            Some(json!({
                "name": "Gateway",
                "edgeModules": [{
                    "moduleName": "sensor",
                    "imageUri": "registry.example.com/sensor:1.0",
                    "environmentVariables": { "LEVEL": "debug" },
                    "containerCreateOptions": "{\"HostConfig\":{\"Privileged\":true}}"
                }]
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");

    body["modelId"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_edge_model_lifecycle() {
    let app = MockApp::new().await;
    let model_id = create_edge_model(&app).await;

    let (status, body) = app
        .send(Method::GET, &format!("/api/edge/models/{model_id}"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["edgeModules"][0]["moduleName"], json!("sensor"));
    assert_eq!(body["edgeModules"][0]["environmentVariables"]["LEVEL"], json!("debug"));

    let (status, _) = app
        .send(
            Method::PUT,
            &format!("/api/edge/models/{model_id}"),
            Some(json!({ "modelId": model_id, "name": "Gateway", "edgeModules": [{ "moduleName": "$bad", "imageUri": "x" }] })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .send(
            Method::PUT,
            &format!("/api/edge/models/{model_id}"),
            Some(json!({ "modelId": model_id, "name": "Gateway v2", "edgeModules": [] })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], json!("Gateway v2"));

    let (_, body) = app.send(Method::GET, "/api/edge/models", None).await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, _) = app
        .send(Method::DELETE, &format!("/api/edge/models/{model_id}"), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app
        .send(Method::GET, &format!("/api/edge/models/{model_id}"), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_edge_device_lifecycle_and_restart() {
    let app = MockApp::new().await;
    let model_id = create_edge_model(&app).await;

    let (status, _) = app
        .send(
            Method::POST,
            "/api/edge/devices",
            Some(json!({ "deviceId": "gw-01", "deviceName": "Gateway", "modelId": "missing" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .send(
            Method::POST,
            "/api/edge/devices",
            Some(json!({ "deviceId": "gw-01", "deviceName": "Gateway", "modelId": model_id })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let (status, _) = app
        .send(
            Method::POST,
            "/api/edge/devices",
            Some(json!({ "deviceId": "gw-01", "deviceName": "Gateway", "modelId": model_id })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = app
        .send(
            Method::PUT,
            "/api/edge/devices/gw-01",
            Some(json!({ "deviceId": "gw-01", "deviceName": "Main gateway", "modelId": model_id })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deviceName"], json!("Main gateway"));

    // Edge devices are listed apart from standard devices
    let (_, body) = app.send(Method::GET, "/api/devices", None).await;
    assert_eq!(body["totalItems"], json!(0));
    let (_, body) = app.send(Method::GET, "/api/edge/devices", None).await;
    assert_eq!(body["totalItems"], json!(1));
    assert_eq!(body["items"][0]["nbDevices"], json!(0));

    let (status, _) = app
        .send(Method::POST, "/api/edge/devices/gw-01/sensor/_restart", None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .send(Method::POST, "/api/edge/devices/gw-01/ghost/_restart", None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Model still referenced by the device
    let (status, _) = app
        .send(Method::DELETE, &format!("/api/edge/models/{model_id}"), None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app.send(Method::DELETE, "/api/edge/devices/gw-01", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.send(Method::GET, "/api/edge/devices/gw-01", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_edge_routes_absent_on_aws() {
    let mut settings = Settings::default();
    settings.portal.cloud_provider = CloudProvider::Aws;
    settings.portal.lorawan_enabled = false;
    settings.aws = Some(Aws {
        access_key: String::from("AKID"),
        secret_access_key: String::from("secret"),
        region: String::from("eu-west-1"),
        iot_endpoint: Some(String::from("http://127.0.0.1:9")),
        data_endpoint: String::from("http://127.0.0.1:9"),
    });
    let app = MockApp::with_settings(settings).await;

    let (status, _) = app.send(Method::GET, "/api/edge/devices", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app.send(Method::GET, "/api/settings/portal", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cloudProvider"], json!("aws"));
    assert_eq!(body["isLoRaSupported"], json!(false));
}
