pub mod dedup;
pub mod branch_match;
pub mod synthesizer;
pub mod runner;

pub use branch_match::{BranchResolution, BranchResolver, Reconciliation};
pub use dedup::{DuplicateIndex, PageKey};
pub use runner::{TriggerError, TriggerRunner};
pub use synthesizer::{PageSynthesizer, SynthesisReport};
