//! Request plumbing shared by all endpoint groups.

use log::{debug, error};
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SevdeskError};
use crate::SevdeskApi;

/// List envelope: `{"objects": […]}`, plus `"total"` when the request
/// asked for `countAll=true`.
#[derive(Debug, Deserialize)]
pub(crate) struct ListResponse<T> {
    pub objects: Option<Vec<T>>,
    #[serde(default)]
    pub total: Option<serde_json::Value>,
}

impl<T> ListResponse<T> {
    /// `total` arrives as a number or a numeric string depending on the
    /// endpoint.
    fn total_count(&self) -> Option<u64> {
        match self.total.as_ref()? {
            serde_json::Value::Number(number) => number.as_u64(),
            serde_json::Value::String(text) => text.parse().ok(),
            _ => None,
        }
    }
}

/// Envelope for endpoints that answer with one object.
#[derive(Debug, Deserialize)]
pub(crate) struct ObjectResponse<T> {
    pub objects: T,
}

impl SevdeskApi {
    /// SevDesk authenticates with the bare token, no `Bearer` prefix.
    pub(crate) fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.client
            .request(method, url)
            .header("Authorization", &self.token)
    }

    /// Reads the body, turning non-2xx responses into typed errors.
    pub(crate) async fn read_body(&self, response: Response, url: &str) -> Result<String> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            error!("Request to {url} failed with status {status}: {body}");
            return Err(SevdeskError::from_response(status, body));
        }
        debug!("Response from {url}: {body}");
        Ok(body)
    }

    /// GET returning the `objects` array; a missing or null array means
    /// an empty result.
    pub(crate) async fn get_list<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>> {
        Ok(self.get_page(endpoint, query).await?.0)
    }

    /// GET returning the `objects` array together with the `total`
    /// count carried by `countAll=true` requests.
    pub(crate) async fn get_page<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<(Vec<T>, Option<u64>)> {
        let url = format!("{}/{}", self.base_url, endpoint);
        debug!("Fetching {url}");
        let response = self.request(Method::GET, &url).query(query).send().await?;
        let body = self.read_body(response, &url).await?;
        let list: ListResponse<T> = serde_json::from_str(&body)?;
        let total = list.total_count();
        Ok((list.objects.unwrap_or_default(), total))
    }

    /// GET for one object; SevDesk wraps those in a one-element
    /// `objects` array.
    pub(crate) async fn get_single<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let mut objects: Vec<T> = self.get_list(endpoint, query).await?;
        if objects.is_empty() {
            return Err(SevdeskError::UnexpectedResponse(format!(
                "{endpoint} returned no objects"
            )));
        }
        Ok(objects.remove(0))
    }

    /// POST with a JSON body, returning the `objects` payload.
    pub(crate) async fn post_json<T, B>(&self, endpoint: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send_json(Method::POST, endpoint, body).await
    }

    pub(crate) async fn put_json<T, B>(&self, endpoint: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send_json(Method::PUT, endpoint, body).await
    }

    async fn send_json<T, B>(&self, method: Method, endpoint: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = format!("{}/{}", self.base_url, endpoint);
        debug!("{method} {url}");
        let response = self
            .request(method, &url)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await?;
        let body = self.read_body(response, &url).await?;
        let parsed: ObjectResponse<T> = serde_json::from_str(&body)?;
        Ok(parsed.objects)
    }

    pub(crate) async fn delete(&self, endpoint: &str) -> Result<()> {
        let url = format!("{}/{}", self.base_url, endpoint);
        debug!("DELETE {url}");
        let response = self.request(Method::DELETE, &url).send().await?;
        self.read_body(response, &url).await?;
        Ok(())
    }
}
