//! Error type shared by the whole client.

use std::error::Error;
use std::fmt;

use serde::Deserialize;

pub type Result<T> = std::result::Result<T, SevdeskError>;

#[derive(Debug)]
pub enum SevdeskError {
    /// Connection or protocol failure below the HTTP layer.
    Network(reqwest::Error),
    /// Non-2xx response whose body carried no SevDesk error object.
    HttpStatus {
        status: reqwest::StatusCode,
        body: String,
    },
    /// Non-2xx response with SevDesk's structured error payload.
    Api {
        status: reqwest::StatusCode,
        message: String,
        code: Option<i64>,
        details: Option<String>,
    },
    /// Response body could not be decoded.
    Parse(serde_json::Error),
    /// 2xx response whose shape did not match the endpoint contract.
    UnexpectedResponse(String),
    /// SKR booking account number missing from the AccountDatev index.
    UnknownSkr(String),
    /// Lookup key not found even after refreshing the cached index.
    UnknownKey {
        object: String,
        key: String,
        available: Vec<String>,
    },
}

impl SevdeskError {
    /// Classifies a non-2xx response, preferring SevDesk's own error
    /// envelope (`{"error": {"message": …, "code": …, "details": …}}`)
    /// over the raw body.
    pub(crate) fn from_response(status: reqwest::StatusCode, body: String) -> Self {
        #[derive(Deserialize)]
        struct Envelope {
            error: ErrorObject,
        }
        #[derive(Deserialize)]
        struct ErrorObject {
            message: Option<String>,
            #[serde(default)]
            code: Option<serde_json::Value>,
            #[serde(default)]
            details: Option<serde_json::Value>,
        }

        if let Ok(envelope) = serde_json::from_str::<Envelope>(&body) {
            if let Some(message) = envelope.error.message {
                let code = envelope.error.code.as_ref().and_then(|value| {
                    value
                        .as_i64()
                        .or_else(|| value.as_str().and_then(|text| text.parse().ok()))
                });
                let details = envelope.error.details.and_then(|value| match value {
                    serde_json::Value::Null => None,
                    serde_json::Value::String(text) => Some(text),
                    other => Some(other.to_string()),
                });
                return SevdeskError::Api {
                    status,
                    message,
                    code,
                    details,
                };
            }
        }
        SevdeskError::HttpStatus { status, body }
    }
}

impl fmt::Display for SevdeskError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SevdeskError::Network(err) => write!(f, "Network error: {err}"),
            SevdeskError::HttpStatus { status, body } => {
                write!(f, "SevDesk returned status {status}: {body}")
            }
            SevdeskError::Api {
                status,
                message,
                code,
                details,
            } => {
                write!(f, "SevDesk API error ({status}): {message}")?;
                if let Some(code) = code {
                    write!(f, " [code {code}]")?;
                }
                if let Some(details) = details {
                    write!(f, ": {details}")?;
                }
                Ok(())
            }
            SevdeskError::Parse(err) => write!(f, "Failed to parse SevDesk response: {err}"),
            SevdeskError::UnexpectedResponse(message) => {
                write!(f, "Unexpected SevDesk response: {message}")
            }
            SevdeskError::UnknownSkr(number) => {
                write!(f, "Unknown SKR account number {number}")
            }
            SevdeskError::UnknownKey {
                object,
                key,
                available,
            } => {
                write!(
                    f,
                    "Unknown {object} {key:?}. Available: {}",
                    available.join(", ")
                )
            }
        }
    }
}

impl Error for SevdeskError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            SevdeskError::Network(err) => Some(err),
            SevdeskError::Parse(err) => Some(err),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for SevdeskError {
    fn from(err: reqwest::Error) -> Self {
        SevdeskError::Network(err)
    }
}

impl From<serde_json::Error> for SevdeskError {
    fn from(err: serde_json::Error) -> Self {
        SevdeskError::Parse(err)
    }
}
