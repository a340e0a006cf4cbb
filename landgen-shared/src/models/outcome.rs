use serde::{Deserialize, Serialize};
use std::fmt;

/// Which automation produced an outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    BranchMatch,
    NewLocation,
    OfferUpdated,
    NewKeyword,
}

impl fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TriggerKind::BranchMatch => "branch_match",
            TriggerKind::NewLocation => "new_location",
            TriggerKind::OfferUpdated => "offer_updated",
            TriggerKind::NewKeyword => "new_keyword",
        };
        f.write_str(name)
    }
}

/// Discriminated result of a trigger run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultKind {
    Success,
    Warning,
    Error,
    Skipped,
    NoChange,
    Updated,
}

/// Machine-readable reason attached to non-success outcomes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonCode {
    MissingClient,
    MissingLocation,
    NoActiveBranches,
    DefaultBranchFallback,
    AmbiguousServiceArea,
    BranchAlreadyCorrect,
    OfferNotActive,
    ServiceInactive,
    NoKeywords,
    NoValidKeywords,
    NoMatchingOffers,
    NoMatchingServices,
    NoMatchingLocations,
    NoLocationsServedByBranches,
    BatchFailures,
}

/// Operation-specific counters. Only the ones a trigger sets are serialized.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeCounters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invalid_keywords: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_batches: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matching_offers: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub services_processed: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub services_without_keywords: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locations_processed: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locations_scanned: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords_processed: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_total: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offer_status: Option<String>,
}

/// Structured result handed back to whatever invoked a trigger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerOutcome {
    pub trigger: TriggerKind,
    pub result: ResultKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<ReasonCode>,
    /// Display name of the record that fired the trigger
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(flatten)]
    pub counters: OutcomeCounters,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl TriggerOutcome {
    pub fn new(trigger: TriggerKind, result: ResultKind, message: impl Into<String>) -> Self {
        Self {
            trigger,
            result,
            message: message.into(),
            reason: None,
            subject: None,
            counters: OutcomeCounters::default(),
            warnings: Vec::new(),
        }
    }

    pub fn with_reason(mut self, reason: ReasonCode) -> Self {
        self.reason = Some(reason);
        self
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn with_counters(mut self, counters: OutcomeCounters) -> Self {
        self.counters = counters;
        self
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }

    /// Errors are the only results an operator must act on.
    pub fn is_error(&self) -> bool {
        self.result == ResultKind::Error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_serializes_flat() {
        let outcome = TriggerOutcome::new(
            TriggerKind::NewLocation,
            ResultKind::Warning,
            "No matching offers - pages not created",
        )
        .with_reason(ReasonCode::NoMatchingOffers)
        .with_subject("Denver")
        .with_counters(OutcomeCounters {
            matching_offers: Some(0),
            ..Default::default()
        });

        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["trigger"], "new_location");
        assert_eq!(json["result"], "warning");
        assert_eq!(json["reason"], "no_matching_offers");
        assert_eq!(json["matchingOffers"], 0);
        assert!(json.get("created").is_none());
        assert!(json.get("warnings").is_none());
    }
}
