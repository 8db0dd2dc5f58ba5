//! Tests for the SKR booking account cache.

use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::{SevdeskApi, SevdeskError};

fn api_with_mock(mock_uri: &str) -> SevdeskApi {
    SevdeskApi::with_base_url(mock_uri.to_string(), "test_token".to_string())
}

#[tokio::test]
async fn skr_numbers_resolve_across_pages() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/AccountDatev"))
        .and(query_param("limit", "1000"))
        .and(query_param("offset", "0"))
        .and(query_param("countAll", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "objects": [
                { "id": "10", "number": 27, "name": "EDV-Software" },
                { "id": "11", "number": "460", "name": "Kfz" }
            ],
            "total": "3"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/AccountDatev"))
        .and(query_param("limit", "1000"))
        .and(query_param("offset", "2"))
        .and(query_param("countAll", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "objects": [
                { "id": "74", "number": 5400, "name": "Wareneingang" }
            ],
            "total": 3
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let api = api_with_mock(&mock_server.uri());
    let account = api.resolve_skr("5400").await.unwrap();
    assert_eq!(account.id, 74);
    assert_eq!(account.name, "Wareneingang");

    // Served from the cache; the mocks only allow one call each.
    let cached = api.resolve_skr("27").await.unwrap();
    assert_eq!(cached.id, 10);
}

#[tokio::test]
async fn unknown_numbers_error_with_the_number() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/AccountDatev"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "objects": [
                { "id": "74", "number": "5400", "name": "Wareneingang" }
            ]
        })))
        .mount(&mock_server)
        .await;

    let api = api_with_mock(&mock_server.uri());
    let error = api.resolve_skr("9999").await.unwrap_err();
    match error {
        SevdeskError::UnknownSkr(number) => assert_eq!(number, "9999"),
        other => panic!("expected UnknownSkr, got {other:?}"),
    }
}

#[tokio::test]
async fn accounting_types_are_sorted_by_number() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/AccountDatev"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "objects": [
                { "id": "74", "number": "5400", "name": "Wareneingang" },
                { "id": "10", "number": "0027", "name": "EDV-Software" },
                { "id": "11", "number": "0460", "name": "Kfz" }
            ]
        })))
        .mount(&mock_server)
        .await;

    let api = api_with_mock(&mock_server.uri());
    let accounts = api.accounting_types().await.unwrap();
    let numbers: Vec<&str> = accounts
        .iter()
        .map(|account| account.number.as_str())
        .collect();
    assert_eq!(numbers, vec!["0027", "0460", "5400"]);
}
