use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use serde_json::json;
use tower::ServiceExt;

use iotportal_api::models::ImportResultLine;

mod common;
use common::mock_app::MockApp;

async fn import(app: &MockApp, csv: &str) -> (StatusCode, Vec<ImportResultLine>) {
    let request = Request::builder()
        .uri("/api/admin/devices/_import")
        .method(Method::POST)
        .header("Content-Type", "text/csv")
        .header("Authorization", format!("Bearer {}", app.token))
        .body(Body::from(csv.to_string()))
        .unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    (status, serde_json::from_slice(&body).unwrap_or_default())
}

#[tokio::test]
async fn test_template_lists_tags_and_lora_properties() {
    let app = MockApp::new().await;
    app.send(
        Method::POST,
        "/api/settings/device-tags",
        Some(json!([{ "name": "site", "label": "Site", "required": false, "searchable": false }])),
    )
    .await;

    let request = Request::builder()
        .uri("/api/admin/devices/_template")
        .method(Method::GET)
        .header("Authorization", format!("Bearer {}", app.token))
        .body(Body::empty())
        .unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/csv")
    );

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let content = String::from_utf8(body.to_vec()).unwrap();
    let header_line = content.lines().next().unwrap();

    assert!(header_line.starts_with("Id,Name,ModelId,TAG:site,TAG:supportLoRaFeatures,PROPERTY:AppEUI"));
    assert_eq!(content.lines().count(), 1);
}

#[tokio::test]
async fn test_import_then_export() {
    let app = MockApp::new().await;
    let model_id = app.create_model("Thermometer").await;
    let lora_model_id = app.create_lora_model("Meter").await;

    let csv = format!(
        "Id,Name,ModelId,TAG:supportLoRaFeatures,PROPERTY:AppEUI,PROPERTY:AppKey\n\
         thermo-01,Kitchen,{model_id},false,,\n\
         0011223344556677,Meter,{lora_model_id},true,70B3D57ED0000001,000102030405060708090A0B0C0D0E0F\n\
         bad id,Broken,{model_id},false,,\n"
    );

    let (status, lines) = import(&app, &csv).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].line_number, 4);
    assert_eq!(lines[0].device_id, "bad id");
    assert!(lines[0].is_error_message);

    let (status, body) = app.send(Method::GET, "/api/devices/thermo-01", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deviceName"], json!("Kitchen"));

    let (status, body) = app
        .send(Method::GET, "/api/lorawan/devices/0011223344556677", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["appEui"], json!("70B3D57ED0000001"));

    // Existing rows are updated
    let csv = format!("Id,Name,ModelId\nthermo-01,Living room,{model_id}\n");
    let (_, lines) = import(&app, &csv).await;
    assert!(lines.is_empty());
    let (_, body) = app.send(Method::GET, "/api/devices/thermo-01", None).await;
    assert_eq!(body["deviceName"], json!("Living room"));

    let (status, body) = app.send(Method::GET, "/api/admin/devices/_export", None).await;
    assert_eq!(status, StatusCode::OK);
    let content = body.as_str().unwrap();
    assert_eq!(content.lines().count(), 3);
    assert!(content.contains("thermo-01,Living room"));
    assert!(content.contains("0011223344556677,Meter"));
}

#[tokio::test]
async fn test_import_requires_mandatory_columns() {
    let app = MockApp::new().await;

    let (status, _) = import(&app, "Id,Name\nthermo-01,Kitchen\n").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_import_with_byte_order_mark() {
    let app = MockApp::new().await;
    let model_id = app.create_model("Thermometer").await;

    let csv = format!("\u{feff}Id,Name,ModelId\nthermo-02,Hallway,{model_id}\n");

    let (status, lines) = import(&app, &csv).await;
    assert_eq!(status, StatusCode::OK);
    assert!(lines.is_empty(), "{lines:?}");

    let (status, body) = app.send(Method::GET, "/api/devices/thermo-02", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deviceName"], json!("Hallway"));
}
