use std::fmt;

/// Errors returned by the Wise client.
#[derive(Debug)]
pub enum WiseError {
    /// Network failure while talking to Wise.
    Network(reqwest::Error),
    /// Wise answered with an unexpected status code.
    HttpStatus {
        status: reqwest::StatusCode,
        body: String,
    },
    /// Wise answered with a body that does not match the expected shape.
    Parse(serde_json::Error),
    /// An SCA challenge could not be passed.
    Sca(String),
    /// The signing key could not be read or used.
    Key(String),
    /// No usable profile for the token.
    Profile(String),
    /// A date argument could not be parsed.
    InvalidDate(String),
    Io(std::io::Error),
}

impl fmt::Display for WiseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WiseError::Network(err) => write!(f, "Network error: {err}"),
            WiseError::HttpStatus { status, body } => {
                write!(f, "Wise returned status {status}: {body}")
            }
            WiseError::Parse(err) => write!(f, "Failed to parse Wise response: {err}"),
            WiseError::Sca(msg) => write!(f, "SCA challenge failed: {msg}"),
            WiseError::Key(msg) => write!(f, "Private key error: {msg}"),
            WiseError::Profile(msg) => write!(f, "{msg}"),
            WiseError::InvalidDate(input) => {
                write!(f, "Invalid date: {input}. Use YYYY-MM-DD or YYYYMMDD")
            }
            WiseError::Io(err) => write!(f, "I/O error: {err}"),
        }
    }
}

impl std::error::Error for WiseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            WiseError::Network(err) => Some(err),
            WiseError::Parse(err) => Some(err),
            WiseError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for WiseError {
    fn from(err: reqwest::Error) -> Self {
        WiseError::Network(err)
    }
}

impl From<serde_json::Error> for WiseError {
    fn from(err: serde_json::Error) -> Self {
        WiseError::Parse(err)
    }
}

impl From<std::io::Error> for WiseError {
    fn from(err: std::io::Error) -> Self {
        WiseError::Io(err)
    }
}

pub type Result<T> = std::result::Result<T, WiseError>;
