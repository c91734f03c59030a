use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use iotportal_api::models::{DeviceDetails, DeviceListItem, PaginatedResult};

mod common;
use common::mock_app::MockApp;

#[tokio::test]
async fn test_create_device() {
    let app = MockApp::new().await;
    let model_id = app.create_model("Thermometer").await;

    let request = Request::builder()
        .uri("/api/devices")
        .method(Method::POST)
        .header("Content-Type", "application/json")
        .header("Authorization", format!("Bearer {}", app.token))
        .body(Body::from(
            serde_json::to_string(&DeviceDetails {
                device_id: "thermo-01".to_string(),
                device_name: "Kitchen".to_string(),
                model_id: model_id.clone(),
                is_enabled: true,
                ..Default::default()
            })
            .unwrap(),
        ))
        .unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let device: DeviceDetails = serde_json::from_slice(&body).unwrap();

    assert_eq!(device.device_id, "thermo-01");
    assert_eq!(device.device_name, "Kitchen");
    assert_eq!(device.model_id, model_id);
    assert!(device.is_enabled);
    assert!(!device.is_connected);

    // Same id again
    let (status, _) = app
        .send(
            Method::POST,
            "/api/devices",
            Some(json!({ "deviceId": "thermo-01", "deviceName": "Other", "modelId": model_id })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_create_device_validation() {
    let app = MockApp::new().await;
    let model_id = app.create_model("Thermometer").await;

    let (status, _) = app
        .send(
            Method::POST,
            "/api/devices",
            Some(json!({ "deviceId": "bad id", "deviceName": "x", "modelId": model_id })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send(
            Method::POST,
            "/api/devices",
            Some(json!({ "deviceId": "dev-1", "deviceName": " ", "modelId": model_id })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, problem) = app
        .send(
            Method::POST,
            "/api/devices",
            Some(json!({ "deviceId": "dev-1", "deviceName": "x", "modelId": "missing" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(problem["status"], json!(400));
}

#[tokio::test]
async fn test_get_update_delete_device() {
    let app = MockApp::new().await;
    let model_id = app.create_model("Thermometer").await;
    app.create_device("thermo-01", &model_id).await;

    let (status, body) = app.send(Method::GET, "/api/devices/thermo-01", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deviceName"], json!("thermo-01 name"));

    let (status, body) = app
        .send(
            Method::PUT,
            "/api/devices/thermo-01",
            Some(json!({
                "deviceId": "thermo-01",
                "deviceName": "Renamed",
                "modelId": model_id,
                "isEnabled": false,
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deviceName"], json!("Renamed"));
    assert_eq!(body["isEnabled"], json!(false));

    let (status, _) = app
        .send(
            Method::PUT,
            "/api/devices/thermo-01",
            Some(json!({ "deviceId": "thermo-02", "deviceName": "x", "modelId": model_id })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.send(Method::DELETE, "/api/devices/thermo-01", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.send(Method::GET, "/api/devices/thermo-01", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.send(Method::DELETE, "/api/devices/thermo-01", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_get_devices_paginated() {
    let app = MockApp::new().await;
    let model_id = app.create_model("Thermometer").await;
    for i in 0..3 {
        app.create_device(&format!("thermo-{i}"), &model_id).await;
    }

    let (status, body) = app
        .send(Method::GET, "/api/devices?pageSize=2&pageNumber=0", None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let page: PaginatedResult<DeviceListItem> = serde_json::from_value(body).unwrap();
    assert_eq!(page.total_items, 3);
    assert_eq!(page.items.len(), 2);
    assert!(page.next_page.is_some());

    let (_, body) = app
        .send(Method::GET, "/api/devices?pageSize=2&pageNumber=1", None)
        .await;
    let page: PaginatedResult<DeviceListItem> = serde_json::from_value(body).unwrap();
    assert_eq!(page.items.len(), 1);
    assert!(page.next_page.is_none());

    let (_, body) = app
        .send(Method::GET, "/api/devices?searchText=THERMO-2", None)
        .await;
    let page: PaginatedResult<DeviceListItem> = serde_json::from_value(body).unwrap();
    assert_eq!(page.total_items, 1);
    assert_eq!(page.items[0].device_id, "thermo-2");

    let (status, _) = app.send(Method::GET, "/api/devices?pageSize=0", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send(Method::GET, "/api/devices?tag.site=paris", None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_device_properties() {
    let app = MockApp::new().await;
    let model_id = app.create_model("Thermostat").await;

    let (status, _) = app
        .send(
            Method::POST,
            &format!("/api/models/{model_id}/properties"),
            Some(json!([
                { "name": "setpoint", "displayName": "Setpoint", "isWritable": true, "order": 0, "propertyType": "Double" },
                { "name": "temperature", "displayName": "Temperature", "isWritable": false, "order": 1, "propertyType": "Double" }
            ])),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    app.create_device("thermostat-01", &model_id).await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/devices/thermostat-01/properties",
            Some(json!([
                { "name": "setpoint", "displayName": "Setpoint", "isWritable": true, "order": 0, "propertyType": "Double", "value": "21.5" }
            ])),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let (status, body) = app
        .send(Method::GET, "/api/devices/thermostat-01/properties", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let setpoint = body
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["name"] == json!("setpoint"))
        .unwrap();
    assert_eq!(setpoint["value"], json!("21.5"));

    let (status, _) = app
        .send(
            Method::POST,
            "/api/devices/thermostat-01/properties",
            Some(json!([
                { "name": "setpoint", "displayName": "Setpoint", "isWritable": true, "order": 0, "propertyType": "Double", "value": "warm" }
            ])),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send(Method::GET, "/api/devices/unknown/properties", None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
