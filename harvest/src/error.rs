use std::fmt;

/// Errors returned by the Harvest client and the export pipeline.
#[derive(Debug)]
pub enum HarvestError {
    /// Network failure while talking to Harvest.
    Network(reqwest::Error),
    /// Harvest answered with an unexpected status code.
    HttpStatus {
        status: reqwest::StatusCode,
        body: String,
    },
    /// Harvest answered with a body that does not match the expected shape.
    Parse(serde_json::Error),
    /// A date argument could not be parsed.
    InvalidDate(String),
    /// Entries of one task are billed in different currencies.
    CurrencyMismatch {
        client: String,
        task: String,
        expected: String,
        found: String,
    },
    /// The exchange rate store could not satisfy a conversion.
    Rates(ecbx::EcbxError),
    /// Writing the CSV export failed.
    Csv(csv::Error),
    Io(std::io::Error),
}

impl fmt::Display for HarvestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HarvestError::Network(err) => write!(f, "Network error: {err}"),
            HarvestError::HttpStatus { status, body } => {
                write!(f, "Harvest returned status {status}: {body}")
            }
            HarvestError::Parse(err) => write!(f, "Failed to parse Harvest response: {err}"),
            HarvestError::InvalidDate(input) => {
                write!(f, "Invalid date: {input}. Use YYYY-MM-DD or YYYYMMDD")
            }
            HarvestError::CurrencyMismatch {
                client,
                task,
                expected,
                found,
            } => write!(
                f,
                "Entries for {client} - {task} mix currencies {expected} and {found}"
            ),
            HarvestError::Rates(err) => write!(f, "Exchange rate lookup failed: {err}"),
            HarvestError::Csv(err) => write!(f, "Failed to write CSV: {err}"),
            HarvestError::Io(err) => write!(f, "I/O error: {err}"),
        }
    }
}

impl std::error::Error for HarvestError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HarvestError::Network(err) => Some(err),
            HarvestError::Parse(err) => Some(err),
            HarvestError::Rates(err) => Some(err),
            HarvestError::Csv(err) => Some(err),
            HarvestError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for HarvestError {
    fn from(err: reqwest::Error) -> Self {
        HarvestError::Network(err)
    }
}

impl From<serde_json::Error> for HarvestError {
    fn from(err: serde_json::Error) -> Self {
        HarvestError::Parse(err)
    }
}

impl From<ecbx::EcbxError> for HarvestError {
    fn from(err: ecbx::EcbxError) -> Self {
        HarvestError::Rates(err)
    }
}

impl From<csv::Error> for HarvestError {
    fn from(err: csv::Error) -> Self {
        HarvestError::Csv(err)
    }
}

impl From<std::io::Error> for HarvestError {
    fn from(err: std::io::Error) -> Self {
        HarvestError::Io(err)
    }
}

pub type Result<T> = std::result::Result<T, HarvestError>;
