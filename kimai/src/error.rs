use std::fmt;

/// Errors returned by the Kimai client and the export pipeline.
#[derive(Debug)]
pub enum KimaiError {
    /// Network failure while talking to Kimai.
    Network(reqwest::Error),
    /// Kimai answered with an unexpected status code.
    HttpStatus {
        status: reqwest::StatusCode,
        body: String,
    },
    /// Kimai answered with a body that does not match the expected shape.
    Parse(serde_json::Error),
    /// A date argument could not be parsed.
    InvalidDate(String),
    /// No visible user matches the given name.
    UserNotFound(String),
    /// More than one visible user matches the given name.
    AmbiguousUser(String),
    /// The exchange rate store could not satisfy a conversion.
    Rates(ecbx::EcbxError),
    /// Writing the CSV export failed.
    Csv(csv::Error),
    Io(std::io::Error),
}

impl fmt::Display for KimaiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KimaiError::Network(err) => write!(f, "Network error: {err}"),
            KimaiError::HttpStatus { status, body } => {
                write!(f, "Kimai returned status {status}: {body}")
            }
            KimaiError::Parse(err) => write!(f, "Failed to parse Kimai response: {err}"),
            KimaiError::InvalidDate(input) => {
                write!(f, "Invalid date: {input}. Use YYYY-MM-DD or YYYYMMDD")
            }
            KimaiError::UserNotFound(user) => write!(f, "User {user} not found"),
            KimaiError::AmbiguousUser(user) => {
                write!(f, "Multiple users match {user}, use the exact username")
            }
            KimaiError::Rates(err) => write!(f, "Exchange rate lookup failed: {err}"),
            KimaiError::Csv(err) => write!(f, "Failed to write CSV: {err}"),
            KimaiError::Io(err) => write!(f, "I/O error: {err}"),
        }
    }
}

impl std::error::Error for KimaiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            KimaiError::Network(err) => Some(err),
            KimaiError::Parse(err) => Some(err),
            KimaiError::Rates(err) => Some(err),
            KimaiError::Csv(err) => Some(err),
            KimaiError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for KimaiError {
    fn from(err: reqwest::Error) -> Self {
        KimaiError::Network(err)
    }
}

impl From<serde_json::Error> for KimaiError {
    fn from(err: serde_json::Error) -> Self {
        KimaiError::Parse(err)
    }
}

impl From<ecbx::EcbxError> for KimaiError {
    fn from(err: ecbx::EcbxError) -> Self {
        KimaiError::Rates(err)
    }
}

impl From<csv::Error> for KimaiError {
    fn from(err: csv::Error) -> Self {
        KimaiError::Csv(err)
    }
}

impl From<std::io::Error> for KimaiError {
    fn from(err: std::io::Error) -> Self {
        KimaiError::Io(err)
    }
}

pub type Result<T> = std::result::Result<T, KimaiError>;
