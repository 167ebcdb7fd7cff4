use thiserror::Error;

pub type Result<T> = std::result::Result<T, PhantomBusterError>;

#[derive(Debug, Error)]
pub enum PhantomBusterError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Container {container_id} exited with code {exit_code}")]
    ContainerFailed { container_id: String, exit_code: i64 },
}

impl From<reqwest::Error> for PhantomBusterError {
    fn from(err: reqwest::Error) -> Self {
        PhantomBusterError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for PhantomBusterError {
    fn from(err: serde_json::Error) -> Self {
        PhantomBusterError::Parse(err.to_string())
    }
}
