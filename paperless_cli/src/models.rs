//! Request and response types of the Paperless-ngx REST API.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Envelope of every list endpoint. `next`/`previous` are absolute URLs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    pub id: u64,
    pub name: String,
    pub slug: Option<String>,
    pub color: Option<String>,
    #[serde(default)]
    pub is_inbox_tag: bool,
    #[serde(default)]
    pub document_count: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TagCreate {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub is_inbox_tag: bool,
}

/// Partial tag update; only the set fields are sent.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TagUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_inbox_tag: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Correspondent {
    pub id: u64,
    pub name: String,
    pub slug: Option<String>,
    #[serde(default)]
    pub document_count: u64,
    pub last_correspondence: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentType {
    pub id: u64,
    pub name: String,
    pub slug: Option<String>,
    #[serde(default)]
    pub document_count: u64,
}

/// A stored document. Timestamps stay as the ISO strings the API sends;
/// the CLI only displays them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: u64,
    pub title: String,
    pub correspondent: Option<u64>,
    pub document_type: Option<u64>,
    #[serde(default)]
    pub tags: Vec<u64>,
    pub created: String,
    pub added: Option<String>,
    pub modified: Option<String>,
    #[serde(default)]
    pub content: String,
    pub original_file_name: Option<String>,
    pub archive_serial_number: Option<u64>,
}

impl Document {
    /// The date part of the creation timestamp.
    pub fn created_date(&self) -> &str {
        self.created.split('T').next().unwrap_or(&self.created)
    }
}

/// Query of the document search endpoint.
#[derive(Debug, Clone)]
pub struct DocumentSearch {
    pub query: Option<String>,
    pub tag_ids: Vec<u64>,
    pub page: u32,
    pub page_size: u32,
    pub ordering: Option<String>,
}

impl Default for DocumentSearch {
    fn default() -> Self {
        Self {
            query: None,
            tag_ids: Vec::new(),
            page: 1,
            page_size: 25,
            ordering: None,
        }
    }
}

impl DocumentSearch {
    pub(crate) fn to_query(&self) -> Vec<(String, String)> {
        let mut query = vec![
            ("page".to_string(), self.page.to_string()),
            ("page_size".to_string(), self.page_size.to_string()),
        ];
        if let Some(text) = &self.query {
            query.push(("query".to_string(), text.clone()));
        }
        if !self.tag_ids.is_empty() {
            let ids: Vec<String> = self.tag_ids.iter().map(u64::to_string).collect();
            query.push(("tags__id__in".to_string(), ids.join(",")));
        }
        if let Some(ordering) = &self.ordering {
            query.push(("ordering".to_string(), ordering.clone()));
        }
        query
    }
}

/// Partial document update sent as a PATCH; only the set fields change.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DocumentUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correspondent: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_type: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<u64>>,
}

/// A document to upload. The bytes are read by the caller so the client
/// stays free of filesystem concerns.
#[derive(Debug, Clone)]
pub struct DocumentUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub title: Option<String>,
    pub tags: Vec<u64>,
    pub correspondent: Option<u64>,
    pub document_type: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TaskStatus {
    Pending,
    Started,
    Success,
    Failure,
    Retry,
    Revoked,
    #[serde(other)]
    Unknown,
}

/// A background task, usually the consumer run of an upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub task_id: String,
    pub status: TaskStatus,
    pub task_file_name: Option<String>,
    pub result: Option<String>,
    /// Integer in older Paperless releases, string in newer ones.
    #[serde(default)]
    pub related_document: Option<Value>,
}

impl Task {
    /// Id of the document this task produced, if any.
    pub fn document_id(&self) -> Option<i64> {
        match &self.related_document {
            Some(Value::Number(n)) => n.as_i64(),
            Some(Value::String(s)) => s.parse().ok(),
            _ => None,
        }
    }
}

/// Operations of the bulk edit endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BulkEditMethod {
    AddTag,
    RemoveTag,
    Delete,
}
