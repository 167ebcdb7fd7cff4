pub mod backend;
pub mod noop;
pub mod slack;

pub use backend::NotifyBackend;
pub use noop::NoopBackend;
pub use slack::SlackWebhook;
