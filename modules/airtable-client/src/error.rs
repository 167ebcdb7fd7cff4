use thiserror::Error;

pub type Result<T> = std::result::Result<T, AirtableError>;

#[derive(Debug, Error)]
pub enum AirtableError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Airtable accepts at most {max} records per request, got {got}")]
    TooManyRecords { got: usize, max: usize },

    #[error("Invalid table URL: {0}")]
    Url(String),
}

impl From<reqwest::Error> for AirtableError {
    fn from(err: reqwest::Error) -> Self {
        AirtableError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for AirtableError {
    fn from(err: serde_json::Error) -> Self {
        AirtableError::Parse(err.to_string())
    }
}

impl From<url::ParseError> for AirtableError {
    fn from(err: url::ParseError) -> Self {
        AirtableError::Url(err.to_string())
    }
}
