pub mod campaign;
pub mod gate;
pub mod jobs;
pub mod normalize;
pub mod notify;
pub mod pipeline;
pub mod providers;
pub mod store;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod traits;

pub use campaign::{CampaignLogger, IntegrationEvent, IntegrationEventKind};
pub use gate::{Admitted, GateAuditEntry, GateVerdict, ModeGate, ScrapeContext};
pub use jobs::{CollectedJob, JobRegistry, JobTicket, PollStart};
pub use normalize::{normalize_batch, NormalizedBatch};
pub use notify::{NoopBackend, NotifyBackend, SlackWebhook};
pub use pipeline::{LeadPipeline, ScrapeReport};
pub use providers::{LeadProvider, PolledJob, ProviderFetch, ProviderSet, ScrapeOutcome};
pub use store::{ChunkFailure, LeadStore, StoreReport};
pub use traits::RecordTable;
