//! `HttpEnumServiceClient` against a mocked enum service (spec.md §1
//! supplement): verifies the `GET {base}/enums` / `GET {base}/enums/{name}`
//! contract without a real enum service running.

use dynagate::enumclient::{EnumServiceClient, HttpEnumServiceClient};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn fetch_enum_parses_the_mocked_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/enums/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "status",
            "values": [["A", "Active"], ["I", "Inactive"]],
        })))
        .mount(&server)
        .await;

    let client = HttpEnumServiceClient::new(server.uri());
    let fetched = client.fetch_enum("status").await.expect("mocked enum fetch must succeed");

    assert_eq!(fetched.name, "status");
    assert_eq!(fetched.codes(), vec!["A".to_string(), "I".to_string()]);
    assert_eq!(fetched.literal_for("A"), Some("Active"));
}

#[tokio::test]
async fn fetch_enum_surfaces_a_non_success_status_as_backend_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/enums/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = HttpEnumServiceClient::new(server.uri());
    let error = client.fetch_enum("missing").await.expect_err("404 must surface as an error");
    assert!(error.to_string().contains("missing"));
}

#[tokio::test]
async fn list_enum_names_returns_every_name() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/enums"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["status", "priority"])))
        .mount(&server)
        .await;

    let client = HttpEnumServiceClient::new(server.uri());
    let names = client.list_enum_names().await.expect("mocked list must succeed");
    assert_eq!(names, vec!["status".to_string(), "priority".to_string()]);
}
