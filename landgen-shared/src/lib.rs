pub mod ids;
pub mod models;

pub use ids::RecordId;
pub use models::lookup::Lookup;
pub use models::outcome::{OutcomeCounters, ReasonCode, ResultKind, TriggerKind, TriggerOutcome};
