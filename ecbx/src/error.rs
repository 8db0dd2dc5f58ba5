//! Error types for ecbx

use std::fmt;

/// Unified error type for ecbx operations
#[derive(Debug)]
pub enum EcbxError {
    /// HTTP request failed (network error, timeout, etc.)
    Network(reqwest::Error),
    /// HTTP error status code
    HttpStatus(reqwest::StatusCode),
    /// Failed to parse the ECB XML feed
    Xml(quick_xml::Error),
    /// Database operation failed
    Database(rusqlite::Error),
    /// A date flag or argument could not be parsed
    InvalidDate(String),
    /// No rate stored for the pair around the requested date
    NoRateAvailable {
        base: String,
        target: String,
        date: String,
    },
    /// No observation date could be resolved for the requested date
    NoDataForDate(String),
    /// Filesystem operation failed
    Io(std::io::Error),
    /// Database has no rates yet (run initialize first)
    NotInitialized,
    /// Database already holds rates (initialize refused)
    AlreadyInitialized,
}

impl fmt::Display for EcbxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EcbxError::Network(e) => write!(f, "Network error: {}", e),
            EcbxError::HttpStatus(status) => write!(f, "HTTP error: {}", status),
            EcbxError::Xml(e) => write!(f, "XML parse error: {}", e),
            EcbxError::Database(e) => write!(f, "Database error: {}", e),
            EcbxError::InvalidDate(input) => {
                write!(
                    f,
                    "Invalid date format: {}. Use YYYY-MM-DD or YYYYMMDD",
                    input
                )
            }
            EcbxError::NoRateAvailable { base, target, date } => {
                write!(
                    f,
                    "No exchange rate found for {} to {} around {}",
                    base, target, date
                )
            }
            EcbxError::NoDataForDate(date) => {
                write!(f, "No rates stored around {}", date)
            }
            EcbxError::Io(e) => write!(f, "I/O error: {}", e),
            EcbxError::NotInitialized => {
                write!(f, "Database not initialized. Run 'initialize' first")
            }
            EcbxError::AlreadyInitialized => {
                write!(
                    f,
                    "Database already contains rates. Run 'update' to fetch new ones"
                )
            }
        }
    }
}

impl std::error::Error for EcbxError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EcbxError::Network(e) => Some(e),
            EcbxError::HttpStatus(_) => None,
            EcbxError::Xml(e) => Some(e),
            EcbxError::Database(e) => Some(e),
            EcbxError::InvalidDate(_) => None,
            EcbxError::NoRateAvailable { .. } => None,
            EcbxError::NoDataForDate(_) => None,
            EcbxError::Io(e) => Some(e),
            EcbxError::NotInitialized => None,
            EcbxError::AlreadyInitialized => None,
        }
    }
}

impl From<reqwest::Error> for EcbxError {
    fn from(err: reqwest::Error) -> Self {
        EcbxError::Network(err)
    }
}

impl From<quick_xml::Error> for EcbxError {
    fn from(err: quick_xml::Error) -> Self {
        EcbxError::Xml(err)
    }
}

impl From<rusqlite::Error> for EcbxError {
    fn from(err: rusqlite::Error) -> Self {
        EcbxError::Database(err)
    }
}

impl From<std::io::Error> for EcbxError {
    fn from(err: std::io::Error) -> Self {
        EcbxError::Io(err)
    }
}

/// Result alias for ecbx operations
pub type Result<T> = std::result::Result<T, EcbxError>;
