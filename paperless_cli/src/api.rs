//! Thin client for the Paperless-ngx REST API.

use std::time::Duration;

use log::{debug, error, info, warn};
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{PaperlessError, Result};
use crate::models::{
    BulkEditMethod, Correspondent, Document, DocumentSearch, DocumentType, DocumentUpdate,
    DocumentUpload, PaginatedResponse, Tag, TagCreate, TagUpdate, Task, TaskStatus,
};

pub struct PaperlessApi {
    client: Client,
    token: String,
    pub base_url: String,
}

impl PaperlessApi {
    pub fn new(base_url: String, token: String) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        debug!("Creating Paperless API client for {base_url}");
        Self {
            client: Client::new(),
            token,
            base_url,
        }
    }

    /// All tags, following the pagination links.
    pub async fn get_tags(&self) -> Result<Vec<Tag>> {
        self.get_all("/api/tags/").await
    }

    pub async fn get_tag(&self, id: u64) -> Result<Tag> {
        self.get_json(&format!("{}/api/tags/{id}/", self.base_url))
            .await
    }

    pub async fn create_tag(&self, tag: &TagCreate) -> Result<Tag> {
        let url = format!("{}/api/tags/", self.base_url);
        debug!("Creating tag {}", tag.name);
        self.send_json(self.request(Method::POST, &url).json(tag))
            .await
    }

    pub async fn update_tag(&self, id: u64, update: &TagUpdate) -> Result<Tag> {
        let url = format!("{}/api/tags/{id}/", self.base_url);
        self.send_json(self.request(Method::PATCH, &url).json(update))
            .await
    }

    pub async fn delete_tag(&self, id: u64) -> Result<()> {
        let url = format!("{}/api/tags/{id}/", self.base_url);
        self.send_no_content(self.request(Method::DELETE, &url))
            .await
    }

    /// Map tag names to ids, ignoring case. Unknown names fail the whole
    /// lookup so a typo cannot silently drop a filter.
    pub async fn resolve_tag_ids(&self, names: &[String]) -> Result<Vec<u64>> {
        let tags = self.get_tags().await?;
        let mut ids = Vec::new();
        let mut unknown = Vec::new();
        for name in names {
            let wanted = name.trim();
            match tags.iter().find(|t| t.name.eq_ignore_ascii_case(wanted)) {
                Some(tag) => ids.push(tag.id),
                None => unknown.push(wanted.to_string()),
            }
        }
        if !unknown.is_empty() {
            let mut available: Vec<String> = tags.into_iter().map(|t| t.name).collect();
            available.sort();
            return Err(PaperlessError::UnknownTags { unknown, available });
        }
        Ok(ids)
    }

    pub async fn get_correspondents(&self) -> Result<Vec<Correspondent>> {
        self.get_all("/api/correspondents/").await
    }

    pub async fn get_correspondent(&self, id: u64) -> Result<Correspondent> {
        self.get_json(&format!("{}/api/correspondents/{id}/", self.base_url))
            .await
    }

    pub async fn get_document_types(&self) -> Result<Vec<DocumentType>> {
        self.get_all("/api/document_types/").await
    }

    pub async fn get_document_type(&self, id: u64) -> Result<DocumentType> {
        self.get_json(&format!("{}/api/document_types/{id}/", self.base_url))
            .await
    }

    /// One page of search results; the envelope carries the total count
    /// so callers can print pagination hints.
    pub async fn search_documents(
        &self,
        search: &DocumentSearch,
    ) -> Result<PaginatedResponse<Document>> {
        let url = format!("{}/api/documents/", self.base_url);
        let response = self
            .request(Method::GET, &url)
            .query(&search.to_query())
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            error!("Document search failed with status {status}: {body}");
            return Err(PaperlessError::HttpStatus { status, body });
        }
        Ok(serde_json::from_str(&body)?)
    }

    pub async fn get_document(&self, id: u64) -> Result<Document> {
        self.get_json(&format!("{}/api/documents/{id}/", self.base_url))
            .await
    }

    pub async fn update_document(&self, id: u64, update: &DocumentUpdate) -> Result<Document> {
        let url = format!("{}/api/documents/{id}/", self.base_url);
        debug!("Patching document {id}");
        self.send_json(self.request(Method::PATCH, &url).json(update))
            .await
    }

    pub async fn delete_document(&self, id: u64) -> Result<()> {
        let url = format!("{}/api/documents/{id}/", self.base_url);
        self.send_no_content(self.request(Method::DELETE, &url))
            .await
    }

    /// Extracted metadata of a document, passed through as raw JSON.
    pub async fn get_document_metadata(&self, id: u64) -> Result<Value> {
        self.get_json(&format!("{}/api/documents/{id}/metadata/", self.base_url))
            .await
    }

    /// Download the archived version of a document, or the original when
    /// `original` is set. Returns the bytes and the filename the server
    /// suggests in its `Content-Disposition` header.
    pub async fn download_document(
        &self,
        id: u64,
        original: bool,
    ) -> Result<(Vec<u8>, Option<String>)> {
        let mut url = format!("{}/api/documents/{id}/download/", self.base_url);
        if original {
            url.push_str("?original=true");
        }
        let response = self.request(Method::GET, &url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await?;
            error!("Downloading document {id} failed with status {status}: {body}");
            return Err(PaperlessError::HttpStatus { status, body });
        }
        let filename = response
            .headers()
            .get(reqwest::header::CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
            .and_then(suggested_filename);
        let bytes = response.bytes().await?;
        info!("Downloaded document {id} ({} bytes)", bytes.len());
        Ok((bytes.to_vec(), filename))
    }

    /// Upload a document for consumption. Returns the id of the task that
    /// processes it; pass that to [`PaperlessApi::wait_for_task`].
    pub async fn upload_document(&self, upload: DocumentUpload) -> Result<String> {
        let url = format!("{}/api/documents/post_document/", self.base_url);
        let mime = guess_mime(&upload.file_name);
        info!("Uploading {} ({mime})", upload.file_name);

        let part = reqwest::multipart::Part::bytes(upload.bytes)
            .file_name(upload.file_name)
            .mime_str(mime)?;
        let mut form = reqwest::multipart::Form::new().part("document", part);
        if let Some(title) = upload.title {
            form = form.text("title", title);
        }
        for tag in upload.tags {
            form = form.text("tags", tag.to_string());
        }
        if let Some(correspondent) = upload.correspondent {
            form = form.text("correspondent", correspondent.to_string());
        }
        if let Some(document_type) = upload.document_type {
            form = form.text("document_type", document_type.to_string());
        }

        let response = self
            .request(Method::POST, &url)
            .multipart(form)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            error!("Upload failed with status {status}: {body}");
            return Err(PaperlessError::HttpStatus { status, body });
        }
        // The endpoint answers with the task uuid as a JSON string.
        let task_id: String = serde_json::from_str(&body)
            .unwrap_or_else(|_| body.trim().trim_matches('"').to_string());
        debug!("Upload accepted as task {task_id}");
        Ok(task_id)
    }

    /// Look up a task by its uuid. The endpoint answers with a bare array.
    pub async fn get_task(&self, task_id: &str) -> Result<Option<Task>> {
        let url = format!("{}/api/tasks/", self.base_url);
        let response = self
            .request(Method::GET, &url)
            .query(&[("task_id", task_id)])
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            error!("Task lookup failed with status {status}: {body}");
            return Err(PaperlessError::HttpStatus { status, body });
        }
        let mut tasks: Vec<Task> = serde_json::from_str(&body)?;
        Ok(if tasks.is_empty() {
            None
        } else {
            Some(tasks.remove(0))
        })
    }

    /// Poll a task until it leaves the queue. Returns the task on
    /// `SUCCESS`; any other terminal state is an error carrying the
    /// task's result string.
    pub async fn wait_for_task(&self, task_id: &str, poll: Duration) -> Result<Task> {
        loop {
            let task = self
                .get_task(task_id)
                .await?
                .ok_or_else(|| PaperlessError::TaskNotFound(task_id.to_string()))?;
            match task.status {
                TaskStatus::Pending | TaskStatus::Started => {
                    debug!("Task {task_id} is still running");
                    tokio::time::sleep(poll).await;
                }
                TaskStatus::Success => {
                    info!("Task {task_id} finished");
                    return Ok(task);
                }
                _ => {
                    return Err(PaperlessError::TaskFailed {
                        task_id: task_id.to_string(),
                        result: task
                            .result
                            .unwrap_or_else(|| format!("status {:?}", task.status)),
                    })
                }
            }
        }
    }

    /// Apply one operation to many documents at once.
    pub async fn bulk_edit(
        &self,
        documents: &[u64],
        bulk_method: BulkEditMethod,
        parameters: Value,
    ) -> Result<()> {
        let url = format!("{}/api/documents/bulk_edit/", self.base_url);
        let body = serde_json::json!({
            "documents": documents,
            "method": bulk_method,
            "parameters": parameters,
        });
        debug!("Bulk edit of {} documents: {body}", documents.len());
        let result: Value = self
            .send_json(self.request(Method::POST, &url).json(&body))
            .await?;
        debug!("Bulk edit answered {result}");
        Ok(())
    }

    fn request(&self, method: Method, url: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .header("Authorization", format!("Token {}", self.token))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self.request(Method::GET, url).send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            error!("Request to {url} failed with status {status}: {body}");
            return Err(PaperlessError::HttpStatus { status, body });
        }
        Ok(serde_json::from_str(&body)?)
    }

    /// Collect every page of a list endpoint into one vector.
    async fn get_all<T: DeserializeOwned>(&self, first_page: &str) -> Result<Vec<T>> {
        let mut url = format!("{}{}", self.base_url, first_page);
        let mut items = Vec::new();
        loop {
            debug!("Fetching page: {url}");
            let page: PaginatedResponse<T> = self.get_json(&url).await?;
            items.extend(page.results);
            match page.next {
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
        Ok(items)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<T> {
        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            error!("Request failed with status {status}: {body}");
            return Err(PaperlessError::HttpStatus { status, body });
        }
        Ok(serde_json::from_str(&body)?)
    }

    async fn send_no_content(&self, builder: reqwest::RequestBuilder) -> Result<()> {
        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await?;
            error!("Request failed with status {status}: {body}");
            return Err(PaperlessError::HttpStatus { status, body });
        }
        Ok(())
    }
}

/// Filename the server suggests, from a `Content-Disposition` value like
/// `attachment; filename="scan.pdf"`.
fn suggested_filename(value: &str) -> Option<String> {
    let marker = "filename=";
    let start = value.find(marker)? + marker.len();
    let rest = value[start..].trim().trim_start_matches('"');
    let end = rest.find('"').unwrap_or(rest.len());
    let name = rest[..end].trim_end_matches(';').trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

fn guess_mime(file_name: &str) -> &'static str {
    let extension = file_name
        .rsplit('.')
        .next()
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match extension.as_str() {
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "tif" | "tiff" => "image/tiff",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}
