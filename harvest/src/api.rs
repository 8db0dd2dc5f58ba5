//! Thin client for the Harvest v2 REST API.

use log::{debug, error, info, warn};
use reqwest::Client;

use crate::error::{HarvestError, Result};
use crate::models::{CurrentUser, TimeEntriesPage, TimeEntry};

const HARVEST_BASE_URL: &str = "https://api.harvestapp.com/v2";

pub struct HarvestApi {
    client: Client,
    account_id: String,
    token: String,
    pub base_url: String,
}

impl HarvestApi {
    pub fn new(account_id: String, token: String) -> Self {
        debug!("Creating Harvest API client for account {account_id}");
        Self {
            client: Client::new(),
            account_id,
            token,
            base_url: HARVEST_BASE_URL.to_string(),
        }
    }

    /// The user the token belongs to.
    pub async fn get_current_user(&self) -> Result<CurrentUser> {
        let url = format!("{}/users/me", self.base_url);
        let user: CurrentUser = self.get_json(&url).await?;
        info!("Authenticated as {}", user.display_name());
        Ok(user)
    }

    /// All time entries between `from` and `to` (inclusive), following the
    /// pagination links. Dates are `YYYY-MM-DD`.
    pub async fn get_time_entries(&self, from: &str, to: &str) -> Result<Vec<TimeEntry>> {
        let mut url = format!("{}/time_entries?from={}&to={}", self.base_url, from, to);
        let mut entries = Vec::new();
        loop {
            debug!("Fetching time entries page: {url}");
            let page: TimeEntriesPage = self.get_json(&url).await?;
            entries.extend(page.time_entries);
            match page.links.next {
                Some(next) => {
                    // A server that hands back the page we just fetched
                    // would loop us forever.
                    if next == url {
                        warn!("Pagination link points back at {url}, stopping");
                        break;
                    }
                    url = next;
                }
                None => break,
            }
        }
        info!("Fetched {} time entries from {from} to {to}", entries.len());
        Ok(entries)
    }

    /// Set the tracked hours of an entry, returning the updated entry.
    pub async fn update_time_entry_hours(&self, entry_id: u64, hours: f64) -> Result<TimeEntry> {
        let url = format!("{}/time_entries/{}", self.base_url, entry_id);
        debug!("Setting entry {entry_id} to {hours} hours");
        let response = self
            .request(reqwest::Method::PATCH, &url)
            .json(&serde_json::json!({ "hours": hours }))
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            error!("Updating entry {entry_id} failed with status {status}: {body}");
            return Err(HarvestError::HttpStatus { status, body });
        }
        Ok(serde_json::from_str(&body)?)
    }

    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Harvest-Account-id", &self.account_id)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self.request(reqwest::Method::GET, url).send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            error!("Request to {url} failed with status {status}: {body}");
            return Err(HarvestError::HttpStatus { status, body });
        }
        Ok(serde_json::from_str(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param, query_param_is_missing};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn api_with_mock(mock_uri: &str) -> HarvestApi {
        let mut api = HarvestApi::new("1234".to_string(), "token".to_string());
        api.base_url = mock_uri.to_string();
        api
    }

    fn entry_json(id: u64, hours: f64) -> serde_json::Value {
        json!({
            "id": id,
            "spent_date": "2024-02-05",
            "hours": hours,
            "rounded_hours": hours,
            "notes": null,
            "is_locked": false,
            "user": { "id": 1, "name": "Jane Doe" },
            "client": { "id": 2, "name": "ACME", "currency": "EUR" },
            "project": { "id": 3, "name": "Website" },
            "task": { "id": 4, "name": "Development" },
            "user_assignment": { "id": 5, "hourly_rate": 90.0 },
            "billable": true,
            "billable_rate": 100.0
        })
    }

    #[tokio::test]
    async fn current_user_is_fetched_with_auth_headers() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/me"))
            .and(header("Authorization", "Bearer token"))
            .and(header("Harvest-Account-id", "1234"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 42,
                "first_name": "Jane",
                "last_name": "Doe",
                "email": "jane@example.com"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let api = api_with_mock(&mock_server.uri());
        let user = api.get_current_user().await.unwrap();
        assert_eq!(user.display_name(), "Jane Doe");
    }

    #[tokio::test]
    async fn time_entries_follow_pagination_links() {
        let mock_server = MockServer::start().await;
        let second_page = format!(
            "{}/time_entries?from=2024-02-01&to=2024-02-29&page=2",
            mock_server.uri()
        );

        Mock::given(method("GET"))
            .and(path("/time_entries"))
            .and(query_param_is_missing("page"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "time_entries": [entry_json(1, 1.0), entry_json(2, 2.0)],
                "links": { "next": second_page }
            })))
            .expect(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/time_entries"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "time_entries": [entry_json(3, 0.5)],
                "links": { "next": null }
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let api = api_with_mock(&mock_server.uri());
        let entries = api
            .get_time_entries("2024-02-01", "2024-02-29")
            .await
            .unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[2].id, 3);
        assert_eq!(entries[0].client.currency.as_deref(), Some("EUR"));
    }

    #[tokio::test]
    async fn repeated_pagination_link_does_not_loop() {
        let mock_server = MockServer::start().await;
        let first_page = format!(
            "{}/time_entries?from=2024-02-01&to=2024-02-29",
            mock_server.uri()
        );

        Mock::given(method("GET"))
            .and(path("/time_entries"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "time_entries": [entry_json(1, 1.0)],
                "links": { "next": first_page }
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let api = api_with_mock(&mock_server.uri());
        let entries = api
            .get_time_entries("2024-02-01", "2024-02-29")
            .await
            .unwrap();
        assert_eq!(entries.len(), 1);
    }

    #[tokio::test]
    async fn update_patches_hours() {
        let mock_server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/time_entries/7"))
            .and(body_json(json!({ "hours": 1.25 })))
            .respond_with(ResponseTemplate::new(200).set_body_json(entry_json(7, 1.25)))
            .expect(1)
            .mount(&mock_server)
            .await;

        let api = api_with_mock(&mock_server.uri());
        let entry = api.update_time_entry_hours(7, 1.25).await.unwrap();
        assert_eq!(entry.id, 7);
        assert_eq!(entry.hours, 1.25);
    }

    #[tokio::test]
    async fn http_errors_carry_status_and_body() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/me"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid token"))
            .mount(&mock_server)
            .await;

        let api = api_with_mock(&mock_server.uri());
        let error = api.get_current_user().await.unwrap_err();
        match error {
            HarvestError::HttpStatus { status, body } => {
                assert_eq!(status.as_u16(), 401);
                assert_eq!(body, "invalid token");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
