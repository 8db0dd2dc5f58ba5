use std::fmt;

/// Errors of the invoice and statement pipelines.
#[derive(Debug)]
pub enum InvoicerError {
    /// The billing report is unusable (empty, malformed rows).
    Report(String),
    /// A computed unit price strays too far from the reported rate.
    PriceMismatch {
        name: String,
        unit_price: f64,
        hourly_rate: f64,
    },
    /// A date in the report could not be parsed.
    InvalidDate(String),
    /// A statement record carries data the importer cannot use.
    Record { id: String, problem: String },
    /// The same currency was mapped to two accounts.
    DuplicateCurrency(String),
    /// A statement row's currency has no account mapping.
    UnmappedCurrency(String),
    /// No API token could be resolved.
    Auth(String),
    /// SevDesk rejected a request.
    Api(sevdesk_api::SevdeskError),
    /// Reading the statement CSV failed.
    Csv(csv::Error),
    Parse(serde_json::Error),
    Io(std::io::Error),
}

impl fmt::Display for InvoicerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvoicerError::Report(msg) => write!(f, "Unusable report: {msg}"),
            InvoicerError::PriceMismatch {
                name,
                unit_price,
                hourly_rate,
            } => write!(
                f,
                "Position {name:?}: unit price {unit_price} does not match \
                 the hourly rate {hourly_rate}"
            ),
            InvoicerError::InvalidDate(input) => {
                write!(f, "Invalid date: {input}. Use YYYY-MM-DD or YYYYMMDD")
            }
            InvoicerError::Record { id, problem } => {
                write!(f, "Statement record {id}: {problem}")
            }
            InvoicerError::DuplicateCurrency(currency) => {
                write!(f, "Currency {currency} is mapped to more than one account")
            }
            InvoicerError::UnmappedCurrency(currency) => write!(
                f,
                "No account mapping for currency {currency}; add one with \
                 --add-account or skip it with --ignore-currency"
            ),
            InvoicerError::Auth(msg) => write!(f, "Authentication error: {msg}"),
            InvoicerError::Api(err) => write!(f, "{err}"),
            InvoicerError::Csv(err) => write!(f, "Failed to read the statement CSV: {err}"),
            InvoicerError::Parse(err) => write!(f, "Failed to parse JSON: {err}"),
            InvoicerError::Io(err) => write!(f, "I/O error: {err}"),
        }
    }
}

impl std::error::Error for InvoicerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            InvoicerError::Api(err) => Some(err),
            InvoicerError::Csv(err) => Some(err),
            InvoicerError::Parse(err) => Some(err),
            InvoicerError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<sevdesk_api::SevdeskError> for InvoicerError {
    fn from(err: sevdesk_api::SevdeskError) -> Self {
        InvoicerError::Api(err)
    }
}

impl From<csv::Error> for InvoicerError {
    fn from(err: csv::Error) -> Self {
        InvoicerError::Csv(err)
    }
}

impl From<serde_json::Error> for InvoicerError {
    fn from(err: serde_json::Error) -> Self {
        InvoicerError::Parse(err)
    }
}

impl From<std::io::Error> for InvoicerError {
    fn from(err: std::io::Error) -> Self {
        InvoicerError::Io(err)
    }
}

pub type Result<T> = std::result::Result<T, InvoicerError>;
