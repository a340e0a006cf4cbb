use landgen_catalog::CoverageIndex;
use landgen_core::{Branch, FieldUpdate, Page, PageUpdate};
use landgen_shared::{
    OutcomeCounters, ReasonCode, RecordId, ResultKind, TriggerKind, TriggerOutcome,
};
use std::collections::HashMap;
use tracing::{info, warn};

pub const MATCH_SOURCE_SERVICE_AREA: &str = "service_area";
pub const MATCH_SOURCE_DEFAULT_BRANCH: &str = "default_branch";

const WARNING_NOTE_PREFIX: &str = "WARNING: ";
const ERROR_NOTE_PREFIX: &str = "ERROR: ";

/// Notes the resolver wrote itself and may overwrite or clear
fn is_resolver_note(notes: &str) -> bool {
    notes.starts_with(WARNING_NOTE_PREFIX) || notes.starts_with(ERROR_NOTE_PREFIX)
}

/// Branch a (client, location) pair should be served by
#[derive(Debug, Clone, PartialEq)]
pub enum BranchResolution {
    /// Found through an active service-area edge. `passed_over` lists the
    /// branches of any further active edges into the same location.
    ServiceArea {
        branch: RecordId,
        branch_name: String,
        passed_over: Vec<RecordId>,
    },
    /// No edge serves the location; first active client branch by name
    DefaultBranch { branch: RecordId, branch_name: String },
    NoActiveBranches,
}

impl BranchResolution {
    pub fn branch(&self) -> Option<&RecordId> {
        match self {
            BranchResolution::ServiceArea { branch, .. }
            | BranchResolution::DefaultBranch { branch, .. } => Some(branch),
            BranchResolution::NoActiveBranches => None,
        }
    }

    pub fn match_source(&self) -> Option<&'static str> {
        match self {
            BranchResolution::ServiceArea { .. } => Some(MATCH_SOURCE_SERVICE_AREA),
            BranchResolution::DefaultBranch { .. } => Some(MATCH_SOURCE_DEFAULT_BRANCH),
            BranchResolution::NoActiveBranches => None,
        }
    }
}

/// Write (if any) and outcome of reconciling one page
#[derive(Debug, Clone)]
pub struct Reconciliation {
    pub update: Option<PageUpdate>,
    pub outcome: TriggerOutcome,
}

pub struct BranchResolver<'a> {
    coverage: &'a CoverageIndex,
    branches: HashMap<&'a RecordId, &'a Branch>,
    by_name: Vec<&'a Branch>,
}

impl<'a> BranchResolver<'a> {
    pub fn new(coverage: &'a CoverageIndex, branches: &'a [Branch]) -> Self {
        let mut by_name: Vec<&Branch> = branches.iter().filter(|b| b.active).collect();
        by_name.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));

        Self {
            coverage,
            branches: branches.iter().map(|b| (&b.id, b)).collect(),
            by_name,
        }
    }

    pub fn resolve(&self, client: &RecordId, location: &RecordId) -> BranchResolution {
        // Edges into the location, limited to branches of this client when
        // the branch's owner is known
        let candidates: Vec<&RecordId> = self
            .coverage
            .edges_for_location(location)
            .iter()
            .map(|edge| &edge.branch)
            .filter(|branch| {
                self.branches
                    .get(branch)
                    .and_then(|b| b.client.as_ref())
                    .map_or(true, |owner| owner == client)
            })
            .collect();

        if let Some((first, rest)) = candidates.split_first() {
            return BranchResolution::ServiceArea {
                branch: (*first).clone(),
                branch_name: self.name_of(first),
                passed_over: rest.iter().map(|b| (*b).clone()).collect(),
            };
        }

        match self
            .by_name
            .iter()
            .find(|b| b.client.as_ref() == Some(client))
        {
            Some(branch) => BranchResolution::DefaultBranch {
                branch: branch.id.clone(),
                branch_name: branch.name.clone(),
            },
            None => BranchResolution::NoActiveBranches,
        }
    }

    /// Compare the stored branch with the resolved one and decide the write.
    /// A page that is already correct produces no update.
    pub fn reconcile(&self, page: &Page, location_label: &str) -> Reconciliation {
        let outcome = |result, message: String| {
            TriggerOutcome::new(TriggerKind::BranchMatch, result, message)
                .with_subject(page.id.to_string())
        };

        let Some(client) = page.client.as_ref() else {
            return Reconciliation {
                update: None,
                outcome: outcome(ResultKind::Skipped, "Client is required".to_string())
                    .with_reason(ReasonCode::MissingClient),
            };
        };
        let Some(location) = page.location.as_ref() else {
            return Reconciliation {
                update: None,
                outcome: outcome(ResultKind::Skipped, "Location is empty".to_string())
                    .with_reason(ReasonCode::MissingLocation),
            };
        };

        let resolution = self.resolve(client, location);

        let (branch, branch_name) = match &resolution {
            BranchResolution::NoActiveBranches => {
                let note = format!(
                    "{}No active branches exist for client {}. Create a branch first.",
                    ERROR_NOTE_PREFIX, client
                );
                warn!(page = %page.id, client = %client, "No active branches for client");

                let stale = page.matched_branch.is_some()
                    || page.notes.as_deref() != Some(note.as_str());
                let update = stale.then(|| PageUpdate {
                    matched_branch: FieldUpdate::Clear,
                    notes: FieldUpdate::Set(note),
                });
                return Reconciliation {
                    update,
                    outcome: outcome(
                        ResultKind::Error,
                        "No branches exist for client".to_string(),
                    )
                    .with_reason(ReasonCode::NoActiveBranches),
                };
            }
            BranchResolution::ServiceArea {
                branch,
                branch_name,
                ..
            }
            | BranchResolution::DefaultBranch {
                branch,
                branch_name,
            } => (branch, branch_name),
        };

        let counters = OutcomeCounters {
            match_source: resolution.match_source().map(str::to_string),
            ..Default::default()
        };

        let (reason, warning) = match &resolution {
            BranchResolution::DefaultBranch { .. } => (
                Some(ReasonCode::DefaultBranchFallback),
                Some(format!(
                    "{}No service area found for {}, using default branch: {}",
                    WARNING_NOTE_PREFIX, location_label, branch_name
                )),
            ),
            BranchResolution::ServiceArea { passed_over, .. } if !passed_over.is_empty() => {
                let passed: Vec<&str> = passed_over.iter().map(RecordId::as_str).collect();
                (
                    Some(ReasonCode::AmbiguousServiceArea),
                    Some(format!(
                        "{}{} has {} active service areas; using {} over {}",
                        WARNING_NOTE_PREFIX,
                        location_label,
                        passed_over.len() + 1,
                        branch_name,
                        passed.join(", ")
                    )),
                )
            }
            _ => (None, None),
        };

        // Notes are replaced rather than appended so a re-run never stacks them
        let notes = match (&warning, page.notes.as_deref()) {
            (Some(warning), current) if current != Some(warning.as_str()) => {
                FieldUpdate::Set(warning.clone())
            }
            (None, Some(current)) if is_resolver_note(current) => FieldUpdate::Clear,
            _ => FieldUpdate::Keep,
        };
        let matched_branch = if page.matched_branch.as_ref() == Some(branch) {
            FieldUpdate::Keep
        } else {
            FieldUpdate::Set(branch.clone())
        };

        if matched_branch.is_keep() && notes.is_keep() {
            return Reconciliation {
                update: None,
                outcome: outcome(
                    ResultKind::NoChange,
                    "Matched branch already correct".to_string(),
                )
                .with_reason(ReasonCode::BranchAlreadyCorrect)
                .with_counters(counters),
            };
        }

        let message = if matched_branch.is_keep() {
            format!("Branch notes refreshed for {}", branch_name)
        } else {
            format!("Matched branch set to {}", branch_name)
        };
        let mut result = outcome(ResultKind::Updated, message).with_counters(counters);
        if let Some(reason) = reason {
            result = result.with_reason(reason);
        }
        if let Some(warning) = warning {
            result = result.with_warning(warning);
        }

        info!(
            page = %page.id,
            branch = %branch,
            source = resolution.match_source().unwrap_or_default(),
            "Correcting matched branch"
        );

        Reconciliation {
            update: Some(PageUpdate {
                matched_branch,
                notes,
            }),
            outcome: result,
        }
    }

    fn name_of(&self, id: &RecordId) -> String {
        self.branches
            .get(id)
            .map(|b| b.name.clone())
            .unwrap_or_else(|| id.to_string())
    }
}
