//! Tests for check account listing, creation, and balances.

use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::SevdeskApi;

fn api_with_mock(mock_uri: &str) -> SevdeskApi {
    SevdeskApi::with_base_url(mock_uri.to_string(), "test_token".to_string())
}

fn account_list() -> serde_json::Value {
    json!({
        "objects": [
            {
                "id": "1",
                "name": "Commerzbank",
                "type": "online",
                "currency": "EUR",
                "status": "100"
            },
            {
                "id": "2",
                "name": "Wise (EUR, 4711)",
                "type": "offline",
                "currency": "EUR",
                "status": 100
            },
            {
                "id": "3",
                "name": "Wise (EUR, 4711)",
                "type": "register",
                "currency": "EUR",
                "status": 100
            }
        ]
    })
}

#[tokio::test]
async fn lists_check_accounts() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/CheckAccount"))
        .respond_with(ResponseTemplate::new(200).set_body_json(account_list()))
        .mount(&mock_server)
        .await;

    let api = api_with_mock(&mock_server.uri());
    let accounts = api.get_check_accounts().await.unwrap();
    assert_eq!(accounts.len(), 3);
    assert_eq!(accounts[0].account_type.as_deref(), Some("online"));
    assert!(accounts[2].is_register());
}

#[tokio::test]
async fn finds_accounts_by_exact_name_ignoring_registers() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/CheckAccount"))
        .respond_with(ResponseTemplate::new(200).set_body_json(account_list()))
        .mount(&mock_server)
        .await;

    let api = api_with_mock(&mock_server.uri());
    let account = api.find_check_account("Wise (EUR, 4711)").await.unwrap();
    assert_eq!(account.map(|account| account.id), Some(2));

    let missing = api.find_check_account("Wise (USD, 4711)").await.unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
async fn creates_offline_clearing_accounts() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/CheckAccount"))
        .and(body_json(json!({
            "name": "Wise (USD, 4711)",
            "type": "offline",
            "currency": "USD",
            "status": 100
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "objects": {
                "id": "9",
                "name": "Wise (USD, 4711)",
                "type": "offline",
                "currency": "USD",
                "status": "100"
            }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let api = api_with_mock(&mock_server.uri());
    let account = api
        .create_clearing_account("Wise (USD, 4711)", "USD")
        .await
        .unwrap();
    assert_eq!(account.id, 9);
    assert_eq!(account.account_type.as_deref(), Some("offline"));
}

#[tokio::test]
async fn reads_the_balance_at_a_date() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/CheckAccount/2/getBalanceAtDate"))
        .and(query_param("date", "2024-03-31"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "objects": "1234.56" })))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/CheckAccount/3/getBalanceAtDate"))
        .and(query_param("date", "2024-03-31"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "objects": -12.5 })))
        .mount(&mock_server)
        .await;

    let api = api_with_mock(&mock_server.uri());
    let balance = api.get_balance_at_date(2, "2024-03-31").await.unwrap();
    assert_eq!(balance, 1234.56);

    let negative = api.get_balance_at_date(3, "2024-03-31").await.unwrap();
    assert_eq!(negative, -12.5);
}
