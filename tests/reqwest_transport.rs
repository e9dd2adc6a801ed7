use admitgate::domain_model::*;
use admitgate::domain_port::{Transport, TransportError};
use admitgate::infra_http::ReqwestTransport;
use serde_json::json;
use std::time::Duration;

#[tokio::test]
async fn sends_method_headers_and_json_body() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/students")
        .match_header("authorization", "Bearer T1")
        .match_header("content-type", "application/json")
        .match_body(mockito::Matcher::Json(json!({ "name": "Ada" })))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id":7}"#)
        .create_async()
        .await;

    let transport =
        ReqwestTransport::new(format!("{}/api", server.url()), Duration::from_secs(5)).unwrap();
    let request = RequestDescriptor::post("/students")
        .with_header("Authorization", "Bearer T1")
        .with_json(json!({ "name": "Ada" }));

    let resp = transport.send(&request).await.unwrap();
    assert_eq!(resp.status, 201);
    assert_eq!(resp.body, json!({ "id": 7 }));
    mock.assert_async().await;
}

#[tokio::test]
async fn error_statuses_are_responses_not_errors() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/courses")
        .with_status(429)
        .with_header("Retry-After", "5")
        .with_body("Too Many Requests")
        .create_async()
        .await;

    let transport = ReqwestTransport::new(server.url(), Duration::from_secs(5)).unwrap();
    let resp = transport.send(&RequestDescriptor::get("/courses")).await.unwrap();

    assert_eq!(resp.status, 429);
    assert_eq!(resp.header("retry-after"), Some("5"));
    assert_eq!(resp.body, json!("Too Many Requests"));
}

#[tokio::test]
async fn nested_error_message_is_readable() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/auth/login")
        .with_status(401)
        .with_body(r#"{"message":{"message":"Invalid credentials"}}"#)
        .create_async()
        .await;

    let transport = ReqwestTransport::new(server.url(), Duration::from_secs(5)).unwrap();
    let resp = transport
        .send(&RequestDescriptor::post("/auth/login"))
        .await
        .unwrap();
    assert_eq!(resp.nested_message(), Some("Invalid credentials"));
}

#[tokio::test]
async fn unreachable_backend_is_a_connection_error() {
    // Port 9 (discard) is closed on test machines.
    let transport = ReqwestTransport::new("http://127.0.0.1:9", Duration::from_secs(5)).unwrap();
    let err = transport
        .send(&RequestDescriptor::get("/students"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        TransportError::Connection(_) | TransportError::Timeout
    ));
}
