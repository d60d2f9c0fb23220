//! HTTP-level dispatch behaviour.

use std::io;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use futures_util::stream;
use serde_json::{json, Value};

mod common;

use common::{json_request, router, send, test_registry};

#[tokio::test]
async fn test_single_call_echoes_id() {
    for id in [json!(1), json!("abc"), json!(0), json!(-4.5)] {
        let body = json!({"jsonrpc": "2.0", "method": "Test.Echo", "params": {"x": 1}, "id": id.clone()});
        let (status, value) = send(router(test_registry()), json_request(body.to_string())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(value["id"], id);
        assert_eq!(value["result"], json!({"x": 1}));
        assert_eq!(value["jsonrpc"], "2.0");
        assert!(value.get("error").is_none());
    }
}

#[tokio::test]
async fn test_missing_accept_rejected_before_body_read() {
    // Reading this body fails, so a 400 proves it was never touched.
    let unreadable = Body::from_stream(stream::iter(vec![Err::<Vec<u8>, _>(io::Error::new(
        io::ErrorKind::Other,
        "body must not be read",
    ))]));
    let request = Request::builder()
        .method("POST")
        .header("content-type", "application/json")
        .body(unreadable)
        .unwrap();

    let (status, value) = send(router(test_registry()), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(value["error"]["code"], -32600);
    assert_eq!(value["id"], Value::Null);
}

#[tokio::test]
async fn test_unreadable_body_is_internal_error() {
    let unreadable = Body::from_stream(stream::iter(vec![Err::<Vec<u8>, _>(io::Error::new(
        io::ErrorKind::ConnectionReset,
        "reset",
    ))]));
    let (status, value) = send(router(test_registry()), json_request(unreadable)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(value["error"]["code"], -32603);
}

#[tokio::test]
async fn test_content_type_with_charset_accepted() {
    let request = Request::builder()
        .method("PUT")
        .uri("/any/path/at/all")
        .header("accept", "application/json")
        .header("content-type", "application/json; charset=utf-8")
        .body(Body::from(r#"{"jsonrpc": "2.0", "method": "Test.Id", "id": 3}"#))
        .unwrap();
    let (status, value) = send(router(test_registry()), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["result"], 3);
}

#[tokio::test]
async fn test_wrong_content_type_rejected() {
    let request = Request::builder()
        .method("POST")
        .header("accept", "application/json")
        .header("content-type", "text/plain")
        .body(Body::from("{}"))
        .unwrap();
    let (status, _) = send(router(test_registry()), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_method_names_rejected() {
    for method in ["Foo", "Foo.Bar.Baz", ".Bar", "Foo."] {
        let body = json!({"jsonrpc": "2.0", "method": method, "id": 1});
        let (status, value) = send(router(test_registry()), json_request(body.to_string())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "method {method}");
        assert_eq!(value["error"]["code"], -32600, "method {method}");
        assert_eq!(value["id"], 1);
    }
}

#[tokio::test]
async fn test_unknown_service_is_404() {
    let body = json!({"jsonrpc": "2.0", "method": "Ghost.Anything", "id": 1});
    let (status, value) = send(router(test_registry()), json_request(body.to_string())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(value["error"]["code"], -32601);
    assert_eq!(value["error"]["message"], "Unknown service");
    assert_eq!(value["error"]["data"], json!({"methodName": "Ghost"}));
}

#[tokio::test]
async fn test_caller_error_passes_through_with_500() {
    let body = json!({"jsonrpc": "2.0", "method": "Test.Fail", "id": 8});
    let (status, value) = send(router(test_registry()), json_request(body.to_string())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(value["error"], json!({"code": -32602, "message": "always fails"}));
    assert_eq!(value["id"], 8);
}

#[tokio::test]
async fn test_empty_result() {
    let body = json!({"jsonrpc": "2.0", "method": "Test.Empty", "id": 2});
    let (status, value) = send(router(test_registry()), json_request(body.to_string())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(value, json!({"jsonrpc": "2.0", "result": null, "id": 2}));
}

#[tokio::test]
async fn test_total_parse_failure() {
    let (status, value) = send(router(test_registry()), json_request("{\"jsonrpc\": ")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(value["error"]["code"], -32700);
    assert_eq!(value["id"], Value::Null);
}

#[tokio::test]
async fn test_empty_batch() {
    let (status, value) = send(router(test_registry()), json_request("[]")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(value, json!([]));
}

#[tokio::test]
async fn test_batch_with_one_malformed_item() {
    let body = r#"[
        {"jsonrpc": "2.0", "method": "Test.Id", "id": 1},
        {"jsonrpc": "2.0", "method": "Test.Id", "id": 2},
        "not an envelope",
        {"jsonrpc": "2.0", "method": "Test.Fail", "id": 4},
        {"jsonrpc": "2.0", "method": "Ghost.Id", "id": 5}
    ]"#;
    let (status, value) = send(router(test_registry()), json_request(body)).await;
    assert_eq!(status, StatusCode::OK);

    let items = value.as_array().unwrap();
    assert_eq!(items.len(), 5);

    let invalid: Vec<&Value> = items
        .iter()
        .filter(|item| item["error"]["code"] == -32600)
        .collect();
    assert_eq!(invalid.len(), 1);
    assert_eq!(invalid[0]["id"], Value::Null);

    let mut ids: Vec<i64> = items.iter().filter_map(|item| item["id"].as_i64()).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec![1, 2, 4, 5]);

    for item in items {
        match item["id"].as_i64() {
            Some(1) => assert_eq!(item["result"], 1),
            Some(2) => assert_eq!(item["result"], 2),
            Some(4) => assert_eq!(item["error"]["code"], -32602),
            Some(5) => assert_eq!(item["error"]["code"], -32601),
            _ => {}
        }
    }
}

#[tokio::test]
async fn test_request_id_is_propagated() {
    let body = json!({"jsonrpc": "2.0", "method": "Test.Id", "id": 1});
    let response = tower::ServiceExt::oneshot(router(test_registry()), json_request(body.to_string()))
        .await
        .unwrap();
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(
        response.headers()["content-type"],
        "application/json; charset=utf-8"
    );
}
