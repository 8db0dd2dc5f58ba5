//! Client for the Wise profile, balance and statement endpoints.

use log::{debug, error, info, warn};
use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::{Result, WiseError};
use crate::sca::{self, Signer, TokenStatus};

pub const WISE_BASE_URL: &str = "https://api.transferwise.com";
pub const WISE_SANDBOX_URL: &str = "https://api.sandbox.transferwise.tech";

#[derive(Debug, Clone, Deserialize)]
pub struct Profile {
    pub id: u64,
    #[serde(rename = "type", default)]
    pub profile_type: Option<String>,
}

/// A currency balance of a profile.
#[derive(Debug, Clone, Deserialize)]
pub struct Balance {
    pub id: u64,
    pub currency: String,
}

pub struct WiseApi {
    client: Client,
    token: String,
    /// Signs SIGNATURE challenges when set.
    pub signer: Option<Signer>,
    /// Answers PIN challenges without prompting when set.
    pub pin: Option<String>,
    pub base_url: String,
}

impl WiseApi {
    pub fn new(token: String) -> Self {
        Self::with_base_url(WISE_BASE_URL.to_string(), token)
    }

    pub fn with_base_url(base_url: String, token: String) -> Self {
        debug!("Creating Wise API client for {base_url}");
        Self {
            client: Client::new(),
            token,
            signer: None,
            pin: None,
            base_url,
        }
    }

    /// Profile id to operate on: the single business profile, or the
    /// first personal one when the token has no business profile.
    pub async fn pick_profile(&self) -> Result<u64> {
        let profiles = self.get_profiles().await?;
        let business: Vec<u64> = profiles
            .iter()
            .filter(|profile| profile.profile_type.as_deref() == Some("BUSINESS"))
            .map(|profile| profile.id)
            .collect();
        match business.as_slice() {
            [id] => {
                info!("Using business profile {id}");
                return Ok(*id);
            }
            [] => {}
            many => {
                let ids: Vec<String> = many.iter().map(u64::to_string).collect();
                return Err(WiseError::Profile(format!(
                    "Found multiple business profiles: {}. Select one with --profile or WISE_PROFILE",
                    ids.join(", ")
                )));
            }
        }
        if let Some(personal) = profiles
            .iter()
            .find(|profile| profile.profile_type.as_deref() == Some("PERSONAL"))
        {
            warn!("No business profile found, using personal profile {}", personal.id);
            return Ok(personal.id);
        }
        Err(WiseError::Profile(
            "The token has no business or personal profile".to_string(),
        ))
    }

    pub async fn get_profiles(&self) -> Result<Vec<Profile>> {
        self.get_with_sca("/v2/profiles").await
    }

    /// Standard balances of the profile, one per held currency.
    pub async fn get_balances(&self, profile_id: u64) -> Result<Vec<Balance>> {
        let balances: Vec<Balance> = self
            .get_with_sca(&format!("/v4/profiles/{profile_id}/balances?types=STANDARD"))
            .await?;
        debug!("Profile {profile_id} holds {} balances", balances.len());
        Ok(balances)
    }

    /// Compact statement of one balance over `start..=end` (inclusive,
    /// `YYYY-MM-DD`), as the raw JSON document Wise serves.
    pub async fn get_balance_statement(
        &self,
        profile_id: u64,
        balance: &Balance,
        start: &str,
        end: &str,
    ) -> Result<serde_json::Value> {
        info!(
            "Fetching the {} statement from {start} to {end}",
            balance.currency
        );
        let path = format!(
            "/v1/profiles/{profile_id}/balance-statements/{}/statement.json\
             ?currency={}&intervalStart={start}T00:00:00.000Z\
             &intervalEnd={end}T23:59:59.999Z&type=COMPACT",
            balance.id, balance.currency
        );
        self.get_with_sca(&path).await
    }

    /// GET that passes an SCA challenge when Wise demands one. The 403
    /// carries a one-time token in the `x-2fa-approval` header; after
    /// satisfying the token's challenge the request is sent once more.
    async fn get_with_sca<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        debug!("Fetching {url}");
        let response = self.request(Method::GET, &url).send().await?;
        if response.status() == StatusCode::FORBIDDEN {
            let approval = response
                .headers()
                .get("x-2fa-approval")
                .and_then(|value| value.to_str().ok())
                .map(str::to_string);
            if let Some(approval) = approval {
                return self.retry_with_sca(&url, &approval).await;
            }
        }
        self.read_json(response, &url).await
    }

    async fn retry_with_sca<T: DeserializeOwned>(&self, url: &str, approval: &str) -> Result<T> {
        let (one_time_token, explicit) = sca::parse_approval_header(approval)
            .ok_or_else(|| WiseError::Sca("empty x-2fa-approval header".to_string()))?;
        let challenge = match explicit {
            Some(kind) => kind,
            None => self.required_challenge(&one_time_token).await?,
        };
        info!("Passing {challenge} challenge for {url}");

        let mut request = self
            .request(Method::GET, url)
            .header("One-Time-Token", &one_time_token);
        match challenge.as_str() {
            "SIGNATURE" => {
                let signer = self.signer.as_ref().ok_or_else(|| {
                    WiseError::Sca(
                        "a SIGNATURE challenge needs the signing key from --private-key"
                            .to_string(),
                    )
                })?;
                request = request.header("X-Signature", signer.sign_challenge(&one_time_token)?);
            }
            "PIN" => {
                let pin = match &self.pin {
                    Some(pin) => pin.clone(),
                    None => prompt("Enter your 4-digit Wise PIN: ")?,
                };
                self.verify_pin(&one_time_token, &pin).await?;
            }
            "SMS" | "WHATSAPP" | "VOICE" => {
                let phone = self.trigger_otp(&one_time_token, &challenge).await?;
                let device = phone.unwrap_or_else(|| "your device".to_string());
                let code = prompt(&format!("Enter the code sent via {challenge} to {device}: "))?;
                self.verify_otp(&one_time_token, &challenge, &code).await?;
            }
            other => {
                return Err(WiseError::Sca(format!(
                    "unsupported challenge type {other:?}"
                )));
            }
        }

        // One retry per request; a second rejection surfaces as a plain
        // status error.
        let response = request.send().await?;
        self.read_json(response, url).await
    }

    async fn required_challenge(&self, one_time_token: &str) -> Result<String> {
        let url = format!("{}/v1/one-time-token/status", self.base_url);
        debug!("Fetching challenge status from {url}");
        let response = self
            .request(Method::GET, &url)
            .header("One-Time-Token", one_time_token)
            .send()
            .await?;
        let status: TokenStatus = self.read_json(response, &url).await?;
        status
            .required_challenge()
            .ok_or_else(|| WiseError::Sca("the one-time token has no pending challenge".to_string()))
    }

    async fn verify_pin(&self, one_time_token: &str, pin: &str) -> Result<()> {
        let url = format!("{}/v1/one-time-token/pin/verify", self.base_url);
        let response = self
            .request(Method::POST, &url)
            .header("One-Time-Token", one_time_token)
            .json(&serde_json::json!({ "pin": pin }))
            .send()
            .await?;
        self.check_status(response, &url).await?;
        info!("PIN verified");
        Ok(())
    }

    /// Asks Wise to send a code, returning the obfuscated phone number
    /// the trigger response names.
    async fn trigger_otp(&self, one_time_token: &str, challenge: &str) -> Result<Option<String>> {
        let url = format!(
            "{}/v1/one-time-token/{}/trigger",
            self.base_url,
            challenge.to_lowercase()
        );
        let response = self
            .request(Method::POST, &url)
            .header("One-Time-Token", one_time_token)
            .send()
            .await?;
        let body = self.check_status(response, &url).await?;
        let value: serde_json::Value = serde_json::from_str(&body).unwrap_or_default();
        Ok(value
            .get("obfuscatedPhoneNo")
            .and_then(|phone| phone.as_str())
            .map(String::from))
    }

    async fn verify_otp(&self, one_time_token: &str, challenge: &str, code: &str) -> Result<()> {
        let url = format!(
            "{}/v1/one-time-token/{}/verify",
            self.base_url,
            challenge.to_lowercase()
        );
        let response = self
            .request(Method::POST, &url)
            .header("One-Time-Token", one_time_token)
            .json(&serde_json::json!({ "otpCode": code }))
            .send()
            .await?;
        self.check_status(response, &url).await?;
        info!("{challenge} code verified");
        Ok(())
    }

    fn request(&self, method: Method, url: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("User-Agent", "wise-exporter")
    }

    async fn read_json<T: DeserializeOwned>(&self, response: Response, url: &str) -> Result<T> {
        let body = self.check_status(response, url).await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn check_status(&self, response: Response, url: &str) -> Result<String> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            error!("Request to {url} failed with status {status}: {body}");
            return Err(WiseError::HttpStatus { status, body });
        }
        Ok(body)
    }
}

fn prompt(message: &str) -> Result<String> {
    use std::io::Write;

    print!("{message}");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_json, header, header_exists, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::sca::test_keys::PKCS1_PEM;

    fn api_with_mock(mock_uri: &str) -> WiseApi {
        WiseApi::with_base_url(mock_uri.to_string(), "token".to_string())
    }

    #[tokio::test]
    async fn a_single_business_profile_is_picked() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/profiles"))
            .and(header("Authorization", "Bearer token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 16, "type": "PERSONAL"},
                {"id": 28, "type": "BUSINESS"},
            ])))
            .mount(&server)
            .await;

        let api = api_with_mock(&server.uri());
        assert_eq!(api.pick_profile().await.unwrap(), 28);
    }

    #[tokio::test]
    async fn multiple_business_profiles_need_an_explicit_choice() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/profiles"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 28, "type": "BUSINESS"},
                {"id": 29, "type": "BUSINESS"},
            ])))
            .mount(&server)
            .await;

        let api = api_with_mock(&server.uri());
        let error = api.pick_profile().await.unwrap_err();
        assert!(error.to_string().contains("WISE_PROFILE"));
        assert!(error.to_string().contains("28, 29"));
    }

    #[tokio::test]
    async fn personal_profiles_are_the_fallback() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/profiles"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 16, "type": "PERSONAL"},
                {"id": 17, "type": "PERSONAL"},
            ])))
            .mount(&server)
            .await;

        let api = api_with_mock(&server.uri());
        assert_eq!(api.pick_profile().await.unwrap(), 16);
    }

    #[tokio::test]
    async fn a_token_without_profiles_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/profiles"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let api = api_with_mock(&server.uri());
        assert!(matches!(
            api.pick_profile().await.unwrap_err(),
            WiseError::Profile(_)
        ));
    }

    #[tokio::test]
    async fn balances_are_filtered_to_standard_ones() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v4/profiles/28/balances"))
            .and(query_param("types", "STANDARD"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 200001, "currency": "EUR", "type": "STANDARD", "amount": {"value": 12.5}},
                {"id": 200002, "currency": "USD", "type": "STANDARD", "amount": {"value": 0.0}},
            ])))
            .mount(&server)
            .await;

        let api = api_with_mock(&server.uri());
        let balances = api.get_balances(28).await.unwrap();
        assert_eq!(balances.len(), 2);
        assert_eq!(balances[0].id, 200001);
        assert_eq!(balances[0].currency, "EUR");
    }

    #[tokio::test]
    async fn statements_are_fetched_compact_over_the_full_days() {
        let server = MockServer::start().await;
        let statement = json!({
            "accountHolder": {"type": "BUSINESS"},
            "transactions": [{"referenceNumber": "TRANSFER-1"}],
        });
        Mock::given(method("GET"))
            .and(path("/v1/profiles/28/balance-statements/200001/statement.json"))
            .and(query_param("currency", "EUR"))
            .and(query_param("intervalStart", "2024-02-01T00:00:00.000Z"))
            .and(query_param("intervalEnd", "2024-02-29T23:59:59.999Z"))
            .and(query_param("type", "COMPACT"))
            .respond_with(ResponseTemplate::new(200).set_body_json(statement.clone()))
            .mount(&server)
            .await;

        let api = api_with_mock(&server.uri());
        let balance = Balance {
            id: 200001,
            currency: "EUR".to_string(),
        };
        let fetched = api
            .get_balance_statement(28, &balance, "2024-02-01", "2024-02-29")
            .await
            .unwrap();
        assert_eq!(fetched, statement);
    }

    #[tokio::test]
    async fn signature_challenges_are_signed_and_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/profiles"))
            .respond_with(ResponseTemplate::new(403).insert_header("x-2fa-approval", "ott-123"))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/one-time-token/status"))
            .and(header("One-Time-Token", "ott-123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "oneTimeTokenProperties": {
                    "challenges": [
                        {"type": "SIGNATURE", "required": true, "passed": false},
                    ]
                }
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v2/profiles"))
            .and(header("One-Time-Token", "ott-123"))
            .and(header_exists("X-Signature"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 28, "type": "BUSINESS"},
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let mut api = api_with_mock(&server.uri());
        api.signer = Some(Signer::from_pem(PKCS1_PEM).unwrap());
        assert_eq!(api.pick_profile().await.unwrap(), 28);
    }

    #[tokio::test]
    async fn explicit_pin_challenges_verify_before_the_retry() {
        let server = MockServer::start().await;
        // The header names the challenge, so no status roundtrip happens.
        Mock::given(method("GET"))
            .and(path("/v2/profiles"))
            .respond_with(ResponseTemplate::new(403).insert_header("x-2fa-approval", "ott-9 PIN"))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/one-time-token/pin/verify"))
            .and(header("One-Time-Token", "ott-9"))
            .and(body_json(json!({"pin": "1234"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "verified"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v2/profiles"))
            .and(header("One-Time-Token", "ott-9"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 28, "type": "BUSINESS"},
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let mut api = api_with_mock(&server.uri());
        api.pin = Some("1234".to_string());
        assert_eq!(api.pick_profile().await.unwrap(), 28);
    }

    #[tokio::test]
    async fn a_second_rejection_is_final() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/profiles"))
            .respond_with(
                ResponseTemplate::new(403).insert_header("x-2fa-approval", "ott-1 SIGNATURE"),
            )
            .mount(&server)
            .await;

        let mut api = api_with_mock(&server.uri());
        api.signer = Some(Signer::from_pem(PKCS1_PEM).unwrap());
        match api.pick_profile().await.unwrap_err() {
            WiseError::HttpStatus { status, .. } => assert_eq!(status, StatusCode::FORBIDDEN),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn a_forbidden_answer_without_a_token_is_a_plain_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/profiles"))
            .respond_with(ResponseTemplate::new(403).set_body_string("go away"))
            .mount(&server)
            .await;

        let api = api_with_mock(&server.uri());
        let error = api.pick_profile().await.unwrap_err();
        assert!(matches!(error, WiseError::HttpStatus { .. }));
    }

    #[tokio::test]
    async fn signature_challenges_without_a_key_fail_fast() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/profiles"))
            .respond_with(
                ResponseTemplate::new(403).insert_header("x-2fa-approval", "ott-1 SIGNATURE"),
            )
            .mount(&server)
            .await;

        let api = api_with_mock(&server.uri());
        let error = api.pick_profile().await.unwrap_err();
        match error {
            WiseError::Sca(msg) => assert!(msg.contains("--private-key")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn unknown_challenge_types_are_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/profiles"))
            .respond_with(
                ResponseTemplate::new(403).insert_header("x-2fa-approval", "ott-1 CAPTCHA"),
            )
            .mount(&server)
            .await;

        let api = api_with_mock(&server.uri());
        let error = api.pick_profile().await.unwrap_err();
        match error {
            WiseError::Sca(msg) => assert!(msg.contains("CAPTCHA")),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
