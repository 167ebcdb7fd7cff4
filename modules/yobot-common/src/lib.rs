pub mod breaker;
pub mod config;
pub mod error;
pub mod quality;
pub mod safety;
pub mod types;
pub mod validation;

pub use breaker::{BreakerError, BreakerState, CircuitBreaker};
pub use config::Config;
pub use error::YobotError;
pub use quality::*;
pub use safety::*;
pub use types::*;
pub use validation::{FieldError, ValidationError, Validator};
