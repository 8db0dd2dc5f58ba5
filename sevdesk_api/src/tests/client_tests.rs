//! Tests for client construction and the shared response handling.

use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::{SevdeskApi, SevdeskError, DEFAULT_BASE_URL};

fn api_with_mock(mock_uri: &str) -> SevdeskApi {
    SevdeskApi::with_base_url(mock_uri.to_string(), "test_token".to_string())
}

#[test]
fn new_points_at_the_production_api() {
    let api = SevdeskApi::new("my_api_token".to_string());
    assert_eq!(api.base_url, DEFAULT_BASE_URL);
    assert_eq!(api.token, "my_api_token");
}

#[test]
fn trailing_slashes_are_trimmed_from_the_base_url() {
    let api = SevdeskApi::with_base_url(
        "https://sevdesk.example.com/api/v1/".to_string(),
        "token".to_string(),
    );
    assert_eq!(api.base_url, "https://sevdesk.example.com/api/v1");
}

#[tokio::test]
async fn requests_carry_the_bare_token_header() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/CheckAccount"))
        .and(header("Authorization", "test_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "objects": [] })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let api = api_with_mock(&mock_server.uri());
    let accounts = api.get_check_accounts().await.unwrap();
    assert!(accounts.is_empty());
}

#[tokio::test]
async fn null_objects_mean_an_empty_list() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/CheckAccount"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "objects": null })))
        .mount(&mock_server)
        .await;

    let api = api_with_mock(&mock_server.uri());
    let accounts = api.get_check_accounts().await.unwrap();
    assert!(accounts.is_empty());
}

#[tokio::test]
async fn structured_errors_surface_message_code_and_details() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/CheckAccount"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {
                "message": "Authentication required",
                "code": 151,
                "details": "token expired"
            }
        })))
        .mount(&mock_server)
        .await;

    let api = api_with_mock(&mock_server.uri());
    let error = api.get_check_accounts().await.unwrap_err();
    match error {
        SevdeskError::Api {
            status,
            message,
            code,
            details,
        } => {
            assert_eq!(status.as_u16(), 401);
            assert_eq!(message, "Authentication required");
            assert_eq!(code, Some(151));
            assert_eq!(details.as_deref(), Some("token expired"));
        }
        other => panic!("expected an Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn unstructured_errors_keep_the_raw_body() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/CheckAccount"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&mock_server)
        .await;

    let api = api_with_mock(&mock_server.uri());
    let error = api.get_check_accounts().await.unwrap_err();
    match error {
        SevdeskError::HttpStatus { status, body } => {
            assert_eq!(status.as_u16(), 502);
            assert_eq!(body, "Bad Gateway");
        }
        other => panic!("expected an HttpStatus error, got {other:?}"),
    }
}

#[tokio::test]
async fn malformed_bodies_are_parse_errors() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/CheckAccount"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json at all"))
        .mount(&mock_server)
        .await;

    let api = api_with_mock(&mock_server.uri());
    let error = api.get_check_accounts().await.unwrap_err();
    assert!(matches!(error, SevdeskError::Parse(_)));
}

#[test]
fn unknown_key_errors_list_the_available_keys() {
    let error = SevdeskError::UnknownKey {
        object: "Unity".to_string(),
        key: "UNITY_DAY".to_string(),
        available: vec!["UNITY_HOUR".to_string(), "UNITY_PIECE".to_string()],
    };
    assert_eq!(
        error.to_string(),
        "Unknown Unity \"UNITY_DAY\". Available: UNITY_HOUR, UNITY_PIECE"
    );
}

#[test]
fn unknown_skr_errors_name_the_number() {
    let error = SevdeskError::UnknownSkr("9999".to_string());
    assert_eq!(error.to_string(), "Unknown SKR account number 9999");
}
