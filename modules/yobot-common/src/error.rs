use thiserror::Error;

#[derive(Error, Debug)]
pub enum YobotError {
    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Notification error: {0}")]
    Notify(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unsupported operation for {provider}: {operation}")]
    Unsupported {
        provider: String,
        operation: &'static str,
    },
}
