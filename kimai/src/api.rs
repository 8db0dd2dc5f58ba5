//! Thin client for the Kimai REST API.
//!
//! Kimai paginates with a `page` query parameter and reports the page
//! count in the `X-Total-Pages` response header.

use log::{debug, error, info};
use reqwest::Client;

use crate::error::{KimaiError, Result};
use crate::models::{ActivityInfo, CustomerInfo, ProjectInfo, TimeEntry, TimeEntryFull, UserInfo};

pub struct KimaiApi {
    client: Client,
    token: String,
    pub base_url: String,
}

impl KimaiApi {
    pub fn new(base_url: String, token: String) -> Self {
        debug!("Creating Kimai API client for {base_url}");
        Self {
            client: Client::new(),
            token,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// All visible projects.
    pub async fn get_projects(&self) -> Result<Vec<ProjectInfo>> {
        let projects: Vec<ProjectInfo> = self
            .get_paginated("/api/projects", &[("visible", "1".to_string())])
            .await?;
        info!("Fetched {} visible projects", projects.len());
        Ok(projects)
    }

    /// All visible users.
    pub async fn get_users(&self) -> Result<Vec<UserInfo>> {
        self.get_paginated("/api/users", &[("visible", "1".to_string())])
            .await
    }

    pub async fn get_user(&self, id: u64) -> Result<UserInfo> {
        self.get_json(&format!("/api/users/{id}")).await
    }

    pub async fn get_customer(&self, id: u64) -> Result<CustomerInfo> {
        self.get_json(&format!("/api/customers/{id}")).await
    }

    pub async fn get_activity(&self, id: u64) -> Result<ActivityInfo> {
        self.get_json(&format!("/api/activities/{id}")).await
    }

    /// Billable timesheets of one user for one customer between `begin`
    /// and `end` (`%Y-%m-%dT%H:%M:%S`).
    pub async fn get_timesheets(
        &self,
        user: u64,
        customer: u64,
        begin: &str,
        end: &str,
    ) -> Result<Vec<TimeEntry>> {
        let query = [
            ("user", user.to_string()),
            ("customer", customer.to_string()),
            ("begin", begin.to_string()),
            ("end", end.to_string()),
            ("billable", "1".to_string()),
            ("size", "100".to_string()),
        ];
        let entries: Vec<TimeEntry> = self.get_paginated("/api/timesheets", &query).await?;
        debug!(
            "Fetched {} timesheets for user {user}, customer {customer}",
            entries.len()
        );
        Ok(entries)
    }

    /// One timesheet by id, including its rates.
    pub async fn get_timesheet(&self, id: u64) -> Result<TimeEntryFull> {
        self.get_json(&format!("/api/timesheets/{id}")).await
    }

    async fn get_paginated<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>> {
        let url = format!("{}{}", self.base_url, endpoint);
        let mut page = 1u32;
        let mut items = Vec::new();
        loop {
            debug!("Fetching {url} page {page}");
            let response = self
                .client
                .get(&url)
                .header("Authorization", format!("Bearer {}", self.token))
                .query(query)
                .query(&[("page", page.to_string())])
                .send()
                .await?;
            let status = response.status();
            let total_pages = response
                .headers()
                .get("X-Total-Pages")
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.parse::<u32>().ok())
                .unwrap_or(1);
            let body = response.text().await?;
            if !status.is_success() {
                error!("Request to {url} failed with status {status}: {body}");
                return Err(KimaiError::HttpStatus { status, body });
            }
            let page_items: Vec<T> = serde_json::from_str(&body)?;
            items.extend(page_items);
            if page >= total_pages {
                break;
            }
            page += 1;
        }
        Ok(items)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!("Fetching {url}");
        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.token))
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            error!("Request to {url} failed with status {status}: {body}");
            return Err(KimaiError::HttpStatus { status, body });
        }
        Ok(serde_json::from_str(&body)?)
    }
}
