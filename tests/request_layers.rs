use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::{Router, routing::get};
use axum_test::TestServer;
use serde_json::Value;
use shurl::error::TRY_AGAIN_LATER;
use shurl::routes::with_request_layers;
use uuid::Uuid;

async fn ok() -> &'static str {
    "ok"
}

async fn boom() -> &'static str {
    panic!("handler blew up")
}

fn server() -> TestServer {
    let app = Router::new()
        .route("/ok", get(ok))
        .route("/boom", get(boom));

    TestServer::new(with_request_layers(app)).unwrap()
}

fn request_id(response: &axum_test::TestResponse) -> String {
    response
        .headers()
        .get("x-request-id")
        .expect("x-request-id on response")
        .to_str()
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn test_request_id_is_minted_and_echoed() {
    let server = server();

    let first = server.get("/ok").await;
    let second = server.get("/ok").await;

    first.assert_status_ok();
    let first_id: Uuid = request_id(&first).parse().unwrap();
    let second_id: Uuid = request_id(&second).parse().unwrap();
    assert_eq!(first_id.get_version_num(), 7);
    assert_ne!(first_id, second_id);
}

#[tokio::test]
async fn test_client_request_id_is_kept() {
    let server = server();

    let response = server
        .get("/ok")
        .add_header(
            HeaderName::from_static("x-request-id"),
            HeaderValue::from_static("client-abc-123"),
        )
        .await;

    assert_eq!(request_id(&response), "client-abc-123");
}

#[tokio::test]
async fn test_panicking_handler_returns_internal_error() {
    let server = server();

    let response = server.get("/boom").await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body = response.json::<Value>();
    assert_eq!(body["error"]["code"], "internal_error");
    assert_eq!(body["error"]["message"], TRY_AGAIN_LATER);
    assert!(!request_id(&response).is_empty());

    // the server keeps serving after a panic
    server.get("/ok").await.assert_status_ok();
}
