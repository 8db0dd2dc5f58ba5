use std::fmt;

/// Errors returned by the Paperless-ngx client.
#[derive(Debug)]
pub enum PaperlessError {
    /// Network failure while talking to the Paperless instance.
    Network(reqwest::Error),
    /// Paperless answered with an unexpected status code.
    HttpStatus {
        status: reqwest::StatusCode,
        body: String,
    },
    /// Paperless answered with a body that does not match the expected shape.
    Parse(serde_json::Error),
    /// Tag names that do not exist on the server.
    UnknownTags {
        unknown: Vec<String>,
        available: Vec<String>,
    },
    /// The tasks endpoint knows nothing about this task id.
    TaskNotFound(String),
    /// A background task finished unsuccessfully.
    TaskFailed { task_id: String, result: String },
}

impl fmt::Display for PaperlessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaperlessError::Network(err) => write!(f, "Network error: {err}"),
            PaperlessError::HttpStatus { status, body } => {
                write!(f, "Paperless returned status {status}: {body}")
            }
            PaperlessError::Parse(err) => write!(f, "Failed to parse Paperless response: {err}"),
            PaperlessError::UnknownTags { unknown, available } => write!(
                f,
                "Unknown tags: {}. Available tags: {}",
                unknown.join(", "),
                available.join(", ")
            ),
            PaperlessError::TaskNotFound(task_id) => write!(f, "Task {task_id} not found"),
            PaperlessError::TaskFailed { task_id, result } => {
                write!(f, "Task {task_id} failed: {result}")
            }
        }
    }
}

impl std::error::Error for PaperlessError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PaperlessError::Network(err) => Some(err),
            PaperlessError::Parse(err) => Some(err),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for PaperlessError {
    fn from(err: reqwest::Error) -> Self {
        PaperlessError::Network(err)
    }
}

impl From<serde_json::Error> for PaperlessError {
    fn from(err: serde_json::Error) -> Self {
        PaperlessError::Parse(err)
    }
}

pub type Result<T> = std::result::Result<T, PaperlessError>;
