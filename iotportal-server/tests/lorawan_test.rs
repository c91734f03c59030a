use axum::http::{Method, StatusCode};
use mockito::{Matcher, Server};
use serde_json::json;

use iotportal_server::configs::{LoRaWan, Settings};

mod common;
use common::mock_app::MockApp;

const DEV_EUI: &str = "0011223344556677";

fn otaa_device(model_id: &str) -> serde_json::Value {
    json!({
        "deviceId": DEV_EUI,
        "deviceName": "Water meter",
        "modelId": model_id,
        "useOtaa": true,
        "appEui": "70B3D57ED0000001",
        "appKey": "000102030405060708090A0B0C0D0E0F",
    })
}

#[tokio::test]
async fn test_lora_model_defaults_and_listing() {
    let app = MockApp::new().await;
    app.create_model("Plain").await;
    let model_id = app.create_lora_model("Meter").await;

    let (status, body) = app
        .send(Method::GET, &format!("/api/lorawan/models/{model_id}"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["supportLoRaFeatures"], json!(true));
    assert_eq!(body["useOtaa"], json!(true));
    assert_eq!(body["preferredWindow"], json!(1));
    assert_eq!(body["downlink"], json!(true));

    let (_, body) = app.send(Method::GET, "/api/lorawan/models", None).await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (_, body) = app.send(Method::GET, "/api/models", None).await;
    assert_eq!(body.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_lora_model_commands() {
    let app = MockApp::new().await;
    let model_id = app.create_lora_model("Valve").await;

    let (status, body) = app
        .send(
            Method::POST,
            &format!("/api/lorawan/models/{model_id}/commands"),
            Some(json!([{ "name": "open", "frame": "01FF", "port": 2, "confirmed": true }])),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["name"], json!("open"));
    assert!(!body[0]["id"].as_str().unwrap().is_empty());

    let (status, _) = app
        .send(
            Method::POST,
            &format!("/api/lorawan/models/{model_id}/commands"),
            Some(json!([{ "name": "bad", "frame": "ABC", "port": 2 }])),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send(
            Method::POST,
            &format!("/api/lorawan/models/{model_id}/commands"),
            Some(json!([{ "name": "bad", "frame": "01", "port": 224 }])),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = app
        .send(Method::GET, &format!("/api/lorawan/models/{model_id}/commands"), None)
        .await;
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_lora_device_lifecycle() {
    let app = MockApp::new().await;
    let model_id = app.create_lora_model("Meter").await;

    let (status, body) = app
        .send(Method::POST, "/api/lorawan/devices", Some(otaa_device(&model_id)))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["appEui"], json!("70B3D57ED0000001"));

    let (_, body) = app.send(Method::GET, "/api/devices", None).await;
    assert_eq!(body["totalItems"], json!(1));
    assert_eq!(body["items"][0]["supportLoRaFeatures"], json!(true));

    let (status, body) = app
        .send(Method::GET, &format!("/api/lorawan/devices/{DEV_EUI}"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deviceName"], json!("Water meter"));
    assert_eq!(body["useOtaa"], json!(true));

    let mut update = otaa_device(&model_id);
    update["deviceName"] = json!("Hot water meter");
    update["classType"] = json!("C");
    let (status, body) = app
        .send(Method::PUT, &format!("/api/lorawan/devices/{DEV_EUI}"), Some(update))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["classType"], json!("C"));

    let (status, _) = app
        .send(Method::DELETE, &format!("/api/lorawan/devices/{DEV_EUI}"), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_lora_device_validation() {
    let app = MockApp::new().await;
    let model_id = app.create_lora_model("Meter").await;

    let mut short_eui = otaa_device(&model_id);
    short_eui["deviceId"] = json!("0011");
    let (status, _) = app
        .send(Method::POST, "/api/lorawan/devices", Some(short_eui))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut missing_key = otaa_device(&model_id);
    missing_key["appKey"] = json!(null);
    let (status, _) = app
        .send(Method::POST, "/api/lorawan/devices", Some(missing_key))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let abp = json!({
        "deviceId": DEV_EUI,
        "deviceName": "Meter",
        "modelId": model_id,
        "useOtaa": false,
        "devAddr": "26011B2C",
    });
    let (status, _) = app.send(Method::POST, "/api/lorawan/devices", Some(abp)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_execute_command() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", format!("/api/cloudtodevicemessage/{DEV_EUI}").as_str())
        .match_header("x-functions-key", "secret")
        .match_body(Matcher::PartialJson(json!({
            "rawPayload": "Af8=",
            "fport": 2,
            "confirmed": true,
        })))
        .with_status(200)
        .create_async()
        .await;

    let mut settings = Settings::default();
    settings.lorawan = Some(LoRaWan {
        function_url: server.url(),
        function_key: Some(String::from("secret")),
        ..Default::default()
    });
    let app = MockApp::with_settings(settings).await;

    let model_id = app.create_lora_model("Valve").await;
    let (_, commands) = app
        .send(
            Method::POST,
            &format!("/api/lorawan/models/{model_id}/commands"),
            Some(json!([{ "name": "open", "frame": "01FF", "port": 2, "confirmed": true }])),
        )
        .await;
    let command_id = commands[0]["id"].as_str().unwrap().to_string();

    app.send(Method::POST, "/api/lorawan/devices", Some(otaa_device(&model_id)))
        .await;

    let (status, _) = app
        .send(
            Method::POST,
            &format!("/api/lorawan/devices/{DEV_EUI}/_command/{command_id}"),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    mock.assert_async().await;

    let (status, _) = app
        .send(
            Method::POST,
            &format!("/api/lorawan/devices/{DEV_EUI}/_command/unknown"),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Standard devices never receive LoRaWAN commands.
    let standard_model_id = app.create_model("Thermometer").await;
    app.create_device("thermo-01", &standard_model_id).await;

    let (status, _) = app
        .send(
            Method::POST,
            &format!("/api/lorawan/devices/thermo-01/_command/{command_id}"),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_lorawan_routes_absent_when_disabled() {
    let mut settings = Settings::default();
    settings.portal.lorawan_enabled = false;
    let app = MockApp::with_settings(settings).await;

    let (status, _) = app.send(Method::GET, "/api/lorawan/devices", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = app.send(Method::GET, "/api/admin/devices/_template", None).await;
    assert!(!body.as_str().unwrap().contains("PROPERTY:"));
}
