//! Tests for the cached object resolver.

use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::{SevdeskApi, SevdeskError};

fn api_with_mock(mock_uri: &str) -> SevdeskApi {
    SevdeskApi::with_base_url(mock_uri.to_string(), "test_token".to_string())
}

#[tokio::test]
async fn unities_resolve_by_translation_code() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/Unity"))
        .and(query_param("limit", "1000"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "objects": [
                { "id": "1", "objectName": "Unity", "name": "Stück", "translationCode": "UNITY_PIECE" },
                { "id": "2", "objectName": "Unity", "name": "Stunde", "translationCode": "UNITY_HOUR" }
            ]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let api = api_with_mock(&mock_server.uri());
    let hour = api.resolve_unity("UNITY_HOUR").await.unwrap();
    assert_eq!(hour.id, 2);
    assert_eq!(hour.object_name, "Unity");

    // Cache hit; the mock only allows one call.
    let piece = api.resolve_unity("UNITY_PIECE").await.unwrap();
    assert_eq!(piece.id, 1);
}

#[tokio::test]
async fn tax_rules_resolve_by_code_name_or_id() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/TaxRule"))
        .and(query_param("limit", "1000"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "objects": [
                {
                    "id": "1",
                    "objectName": "TaxRule",
                    "code": "USTPFL_UMS_EINN",
                    "name": "Umsatzsteuerpflichtige Umsätze"
                },
                {
                    "id": "17",
                    "objectName": "TaxRule",
                    "code": "NICHT_IM_INLAND_STEUERBARE_LEISTUNG",
                    "name": "Nicht im Inland steuerbare Leistung"
                }
            ]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let api = api_with_mock(&mock_server.uri());
    let by_code = api.resolve_tax_rule("USTPFL_UMS_EINN").await.unwrap();
    assert_eq!(by_code.id, 1);

    let by_name = api
        .resolve_tax_rule("Nicht im Inland steuerbare Leistung")
        .await
        .unwrap();
    assert_eq!(by_name.id, 17);

    let by_id = api.resolve_tax_rule("17").await.unwrap();
    assert_eq!(by_id.id, 17);
}

#[tokio::test]
async fn misses_refresh_the_index_once_then_list_keys() {
    let mock_server = MockServer::start().await;
    // First refresh sees an incomplete collection.
    Mock::given(method("GET"))
        .and(path("/Unity"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "objects": [
                { "id": "1", "objectName": "Unity", "name": "Stück", "translationCode": "UNITY_PIECE" }
            ]
        })))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/Unity"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "objects": [
                { "id": "1", "objectName": "Unity", "name": "Stück", "translationCode": "UNITY_PIECE" },
                { "id": "2", "objectName": "Unity", "name": "Stunde", "translationCode": "UNITY_HOUR" }
            ]
        })))
        .mount(&mock_server)
        .await;

    let api = api_with_mock(&mock_server.uri());
    let error = api.resolve_unity("UNITY_HOUR").await.unwrap_err();
    match error {
        SevdeskError::UnknownKey {
            object,
            key,
            available,
        } => {
            assert_eq!(object, "Unity");
            assert_eq!(key, "UNITY_HOUR");
            assert_eq!(available, vec!["UNITY_PIECE".to_string()]);
        }
        other => panic!("expected UnknownKey, got {other:?}"),
    }

    // A later call refreshes again and finds the new unit.
    let hour = api.resolve_unity("UNITY_HOUR").await.unwrap();
    assert_eq!(hour.id, 2);
}

#[tokio::test]
async fn tax_rules_list_sorted_by_id() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/TaxRule"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "objects": [
                { "id": "9", "objectName": "TaxRule", "code": "VORST_ABZUGSF_AUFW", "name": "Vorsteuerabziehbare Aufwendungen" },
                { "id": "1", "objectName": "TaxRule", "code": "USTPFL_UMS_EINN", "name": "Umsatzsteuerpflichtige Umsätze" },
                { "id": "3", "objectName": "TaxRule", "code": "INNERGEM_LIEF", "name": "Innergemeinschaftliche Lieferungen" }
            ]
        })))
        .mount(&mock_server)
        .await;

    let api = api_with_mock(&mock_server.uri());
    let rules = api.tax_rules().await.unwrap();
    let ids: Vec<u64> = rules.iter().map(|rule| rule.id).collect();
    assert_eq!(ids, vec![1, 3, 9]);
}
