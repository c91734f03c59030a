use axum::http::{Method, StatusCode};
use mockito::Server;
use serde_json::json;

mod common;
use common::mock_app::MockApp;

#[tokio::test]
async fn test_concentrator_lifecycle() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/EU863.json")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"msgtype":"router_config","region":"EU863"}"#)
        .expect_at_least(1)
        .create_async()
        .await;
    server
        .mock("GET", "/XX000.json")
        .with_status(404)
        .create_async()
        .await;

    let app = MockApp::with_router_config(&server.url()).await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/lorawan/concentrators",
            Some(json!({
                "deviceId": "B827EBFFFE123456",
                "deviceName": "Rooftop",
                "loraRegion": "EU863",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["deviceId"], json!("B827EBFFFE123456"));
    assert_eq!(body["deviceType"], json!("LoRa Concentrator"));
    assert_eq!(body["routerConfig"]["region"], json!("EU863"));

    // Concentrators never show up as devices
    let (_, devices) = app.send(Method::GET, "/api/devices", None).await;
    assert_eq!(devices["totalItems"], json!(0));

    let (_, page) = app.send(Method::GET, "/api/lorawan/concentrators", None).await;
    assert_eq!(page["totalItems"], json!(1));

    let (status, _) = app
        .send(
            Method::POST,
            "/api/lorawan/concentrators",
            Some(json!({
                "deviceId": "B827EBFFFE123456",
                "deviceName": "Duplicate",
                "loraRegion": "EU863",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = app
        .send(
            Method::PUT,
            "/api/lorawan/concentrators/B827EBFFFE123456",
            Some(json!({
                "deviceId": "B827EBFFFE123456",
                "deviceName": "Rooftop north",
                "loraRegion": "EU863",
                "isEnabled": false,
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deviceName"], json!("Rooftop north"));
    assert_eq!(body["isEnabled"], json!(false));

    let (status, _) = app
        .send(Method::DELETE, "/api/lorawan/concentrators/B827EBFFFE123456", None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app
        .send(Method::GET, "/api/lorawan/concentrators/B827EBFFFE123456", None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_concentrator_validation() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/XX000.json")
        .with_status(404)
        .create_async()
        .await;

    let app = MockApp::with_router_config(&server.url()).await;

    let (status, _) = app
        .send(
            Method::POST,
            "/api/lorawan/concentrators",
            Some(json!({ "deviceId": "B827EB", "deviceName": "Short", "loraRegion": "EU863" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send(
            Method::POST,
            "/api/lorawan/concentrators",
            Some(json!({
                "deviceId": "B827EBFFFE123456",
                "deviceName": "Unknown region",
                "loraRegion": "XX000",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send(
            Method::PUT,
            "/api/lorawan/concentrators/B827EBFFFE123456",
            Some(json!({
                "deviceId": "0000000000000000",
                "deviceName": "Mismatch",
                "loraRegion": "EU863",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_concentrator_id_kept_as_sent() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/EU863.json")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"msgtype":"router_config","region":"EU863"}"#)
        .expect_at_least(1)
        .create_async()
        .await;

    let app = MockApp::with_router_config(&server.url()).await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/lorawan/concentrators",
            Some(json!({
                "deviceId": "b827ebfffe123456",
                "deviceName": "Basement",
                "loraRegion": "EU863",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["deviceId"], json!("b827ebfffe123456"));

    let (status, body) = app
        .send(Method::GET, "/api/lorawan/concentrators/b827ebfffe123456", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deviceName"], json!("Basement"));

    let (status, body) = app
        .send(
            Method::PUT,
            "/api/lorawan/concentrators/b827ebfffe123456",
            Some(json!({
                "deviceId": "b827ebfffe123456",
                "deviceName": "Basement east",
                "loraRegion": "EU863",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deviceName"], json!("Basement east"));

    let (status, _) = app
        .send(Method::DELETE, "/api/lorawan/concentrators/b827ebfffe123456", None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app
        .send(Method::GET, "/api/lorawan/concentrators/b827ebfffe123456", None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
