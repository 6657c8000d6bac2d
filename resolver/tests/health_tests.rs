mod common;

use axum::{body::Body, http::Request, http::StatusCode};
use common::TestSetup;

#[tokio::test]
async fn test_health() {
    let setup = TestSetup::new();
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let (status, body) = setup.send(request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["semver"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_openapi_served_in_development() {
    let setup = TestSetup::new();
    let request = Request::builder()
        .uri("/openapi.json")
        .body(Body::empty())
        .unwrap();

    let (status, body) = setup.send(request).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/resolve"].is_object());
}
