use chrono::{NaiveDate, Utc};
use landgen_catalog::CoverageIndex;
use landgen_core::{Location, Offer, Page, RecordStore, Service, ServiceArea, StoreError};
use landgen_offer::{offers_for_location, offers_for_service, TargetingFilter, TargetingOutcome};
use landgen_shared::{
    OutcomeCounters, ReasonCode, RecordId, ResultKind, TriggerKind, TriggerOutcome,
};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{info, warn};

use crate::branch_match::BranchResolver;
use crate::dedup::DuplicateIndex;
use crate::synthesizer::{PageSynthesizer, SynthesisReport};

/// Above this many candidate pages an offer update is logged as large
const LARGE_RUN_THRESHOLD: usize = 500;

/// Conditions that halt a trigger invocation. Everything else is reported
/// through the returned outcome.
#[derive(Debug, thiserror::Error)]
pub enum TriggerError {
    #[error("Missing {0} input id")]
    MissingInput(&'static str),

    #[error("{table} record not found: {id}")]
    NotFound { table: &'static str, id: RecordId },

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type TriggerResult = Result<TriggerOutcome, TriggerError>;

/// Entry points for the four record-store automations
pub struct TriggerRunner {
    store: Arc<dyn RecordStore>,
    synthesizer: PageSynthesizer,
    today: Option<NaiveDate>,
}

impl TriggerRunner {
    pub fn new(store: Arc<dyn RecordStore>, synthesizer: PageSynthesizer) -> Self {
        Self {
            store,
            synthesizer,
            today: None,
        }
    }

    /// Pin the date offer windows are evaluated against
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Utc::now().date_naive())
    }

    /// Reconcile a page's matched branch with the one its location resolves to
    pub async fn match_branch(&self, page_id: &RecordId) -> TriggerResult {
        require(page_id, "page")?;
        info!(page = %page_id, "Branch matching started");

        let page = self
            .store
            .get_page(page_id)
            .await?
            .ok_or_else(|| not_found("Pages", page_id))?;

        let location_label = match &page.location {
            Some(id) => self
                .store
                .get_location(id)
                .await?
                .map(|l| l.display_name())
                .unwrap_or_else(|| id.to_string()),
            None => String::new(),
        };

        let (branches, areas) =
            tokio::join!(self.store.list_branches(), self.store.list_service_areas());
        let (branches, areas) = (branches?, areas?);

        let coverage = CoverageIndex::new(&areas);
        let resolver = BranchResolver::new(&coverage, &branches);
        let reconciliation = resolver.reconcile(&page, &location_label);

        if let Some(update) = reconciliation.update {
            self.store.update_page(&page.id, &update).await?;
        }

        Ok(reconciliation.outcome)
    }

    /// Generate pages for a newly created location
    pub async fn location_created(&self, location_id: &RecordId) -> TriggerResult {
        require(location_id, "location")?;

        let location = self
            .store
            .get_location(location_id)
            .await?
            .ok_or_else(|| not_found("Locations", location_id))?;
        let subject = location.display_name();
        info!(location = %location.id, name = %subject, "New location trigger started");

        let snapshot = self.snapshot().await?;
        // The new location may not be visible in a listing yet
        let mut locations = snapshot.locations;
        if !locations.iter().any(|l| l.id == location.id) {
            locations.push(location.clone());
        }
        let Some(location) = locations.iter().find(|l| l.id == location.id) else {
            return Err(not_found("Locations", location_id));
        };

        let coverage = CoverageIndex::new(&snapshot.service_areas);
        let filter =
            TargetingFilter::new(&snapshot.services, &locations, &coverage, self.today());
        let matches = offers_for_location(&filter, &snapshot.offers, location);

        if matches.is_empty() {
            warn!(location = %subject, "No matching offers - pages not created");
            return Ok(TriggerOutcome::new(
                TriggerKind::NewLocation,
                ResultKind::Warning,
                "No matching offers - pages not created",
            )
            .with_reason(ReasonCode::NoMatchingOffers)
            .with_subject(subject)
            .with_counters(OutcomeCounters {
                matching_offers: Some(0),
                created: Some(0),
                ..Default::default()
            }));
        }

        let mut index = DuplicateIndex::from_pages(&snapshot.pages);
        let report = self.synthesizer.run(&*self.store, &matches, &mut index).await;

        let services_processed = matches
            .iter()
            .flat_map(|m| m.services.iter().map(|s| &s.id))
            .collect::<BTreeSet<_>>()
            .len();

        let counters = OutcomeCounters {
            matching_offers: Some(matches.len()),
            services_processed: Some(services_processed),
            ..report_counters(&report)
        };
        Ok(summarize(TriggerKind::NewLocation, &report, counters).with_subject(subject))
    }

    /// Regenerate pages for an offer whose dates or targeting changed
    pub async fn offer_updated(&self, offer_id: &RecordId) -> TriggerResult {
        require(offer_id, "offer")?;

        let offer = self
            .store
            .get_offer(offer_id)
            .await?
            .ok_or_else(|| not_found("Offers", offer_id))?;
        let today = self.today();
        let status = offer.status_on(today);
        info!(
            offer = %offer.id,
            name = %offer.name,
            %status,
            services = %offer.target_services.describe(),
            locations = %offer.target_locations.describe(),
            branches = %offer.target_branches.describe(),
            "Offer updated trigger started"
        );

        let snapshot = self.snapshot().await?;
        let coverage = CoverageIndex::new(&snapshot.service_areas);
        let filter = TargetingFilter::new(&snapshot.services, &snapshot.locations, &coverage, today);

        let matched = match filter.match_offer(&offer) {
            TargetingOutcome::NotActive(status) => {
                return Ok(TriggerOutcome::new(
                    TriggerKind::OfferUpdated,
                    ResultKind::Skipped,
                    format!("Offer is {}, not Active", status),
                )
                .with_reason(ReasonCode::OfferNotActive)
                .with_subject(offer.name.clone())
                .with_counters(OutcomeCounters {
                    offer_status: Some(status.to_string()),
                    ..Default::default()
                }));
            }
            TargetingOutcome::NoMatches(no_match) => {
                warn!(offer = %offer.id, reason = no_match.describe(), "Offer matches nothing");
                return Ok(TriggerOutcome::new(
                    TriggerKind::OfferUpdated,
                    ResultKind::Warning,
                    no_match.describe(),
                )
                .with_reason(no_match.reason())
                .with_subject(offer.name.clone())
                .with_counters(OutcomeCounters {
                    created: Some(0),
                    offer_status: Some(status.to_string()),
                    ..Default::default()
                }));
            }
            TargetingOutcome::Matched(matched) => matched,
        };

        let policy = self.synthesizer.policy();
        let estimated_total: usize = matched
            .services
            .iter()
            .map(|s| policy.parse_field(s.keywords.as_deref()).valid.len())
            .sum::<usize>()
            * matched.locations.len();
        if estimated_total > LARGE_RUN_THRESHOLD {
            warn!(estimated_total, "Offer update will create a large number of pages");
        }

        let services_processed = matched.services.len();
        let locations_processed = matched.locations.len();
        let mut index = DuplicateIndex::from_pages(&snapshot.pages);
        let report = self
            .synthesizer
            .run(&*self.store, std::slice::from_ref(&matched), &mut index)
            .await;

        let counters = OutcomeCounters {
            services_processed: Some(services_processed),
            locations_processed: Some(locations_processed),
            estimated_total: Some(estimated_total),
            offer_status: Some(status.to_string()),
            ..report_counters(&report)
        };
        Ok(summarize(TriggerKind::OfferUpdated, &report, counters).with_subject(offer.name.clone()))
    }

    /// Generate pages for the keywords on a service
    pub async fn keywords_changed(&self, service_id: &RecordId) -> TriggerResult {
        require(service_id, "service")?;

        let service = self
            .store
            .get_service(service_id)
            .await?
            .ok_or_else(|| not_found("Services", service_id))?;
        let subject = service.name.clone();
        info!(service = %service.id, name = %subject, "New keyword trigger started");

        if !service.active {
            return Ok(TriggerOutcome::new(
                TriggerKind::NewKeyword,
                ResultKind::Skipped,
                "Service is not active",
            )
            .with_reason(ReasonCode::ServiceInactive)
            .with_subject(subject));
        }

        if service.keywords.as_deref().map_or(true, |k| k.trim().is_empty()) {
            return Ok(TriggerOutcome::new(
                TriggerKind::NewKeyword,
                ResultKind::Skipped,
                "Service has no keywords",
            )
            .with_reason(ReasonCode::NoKeywords)
            .with_subject(subject));
        }

        let parsed = self
            .synthesizer
            .policy()
            .parse_field(service.keywords.as_deref());
        if parsed.is_empty() {
            return Ok(TriggerOutcome::new(
                TriggerKind::NewKeyword,
                ResultKind::Warning,
                "No valid keywords after validation",
            )
            .with_reason(ReasonCode::NoValidKeywords)
            .with_subject(subject)
            .with_counters(OutcomeCounters {
                invalid_keywords: Some(parsed.rejected.len()),
                created: Some(0),
                ..Default::default()
            }));
        }

        let snapshot = self.snapshot().await?;
        // Match against the freshly read record, which may be newer than the
        // listing or missing from it
        let mut services = snapshot.services;
        match services.iter_mut().find(|s| s.id == service.id) {
            Some(listed) => *listed = service.clone(),
            None => services.push(service.clone()),
        }
        let Some(service) = services.iter().find(|s| s.id == service.id) else {
            return Err(not_found("Services", service_id));
        };

        let coverage = CoverageIndex::new(&snapshot.service_areas);
        let filter =
            TargetingFilter::new(&services, &snapshot.locations, &coverage, self.today());
        let matches = offers_for_service(&filter, &snapshot.offers, service);

        if matches.is_empty() {
            warn!(service = %subject, "No active offers match this service");
            return Ok(TriggerOutcome::new(
                TriggerKind::NewKeyword,
                ResultKind::Warning,
                "No active offers match this service",
            )
            .with_reason(ReasonCode::NoMatchingOffers)
            .with_subject(subject)
            .with_counters(OutcomeCounters {
                matching_offers: Some(0),
                created: Some(0),
                ..Default::default()
            }));
        }

        let mut index = DuplicateIndex::from_pages(&snapshot.pages);
        let report = self.synthesizer.run(&*self.store, &matches, &mut index).await;

        let counters = OutcomeCounters {
            matching_offers: Some(matches.len()),
            locations_scanned: Some(snapshot.locations.len()),
            ..report_counters(&report)
        };
        Ok(summarize(TriggerKind::NewKeyword, &report, counters).with_subject(subject))
    }

    /// Fresh read of everything page synthesis needs. The page listing backs
    /// the duplicate index and completes before any write of this run.
    async fn snapshot(&self) -> Result<Snapshot, TriggerError> {
        let (services, locations, offers, service_areas, pages) = tokio::join!(
            self.store.list_services(),
            self.store.list_locations(),
            self.store.list_offers(),
            self.store.list_service_areas(),
            self.store.list_pages(),
        );

        Ok(Snapshot {
            services: services?,
            locations: locations?,
            offers: offers?,
            service_areas: service_areas?,
            pages: pages?,
        })
    }
}

struct Snapshot {
    services: Vec<Service>,
    locations: Vec<Location>,
    offers: Vec<Offer>,
    service_areas: Vec<ServiceArea>,
    pages: Vec<Page>,
}

fn require(id: &RecordId, what: &'static str) -> Result<(), TriggerError> {
    if id.is_blank() {
        return Err(TriggerError::MissingInput(what));
    }
    Ok(())
}

fn not_found(table: &'static str, id: &RecordId) -> TriggerError {
    TriggerError::NotFound {
        table,
        id: id.clone(),
    }
}

fn report_counters(report: &SynthesisReport) -> OutcomeCounters {
    OutcomeCounters {
        created: Some(report.created),
        skipped: Some(report.skipped_duplicates),
        errors: Some(report.errors),
        invalid_keywords: Some(report.invalid_keywords),
        failed_batches: (report.failed_batches > 0).then_some(report.failed_batches),
        services_without_keywords: (report.services_without_keywords > 0)
            .then_some(report.services_without_keywords),
        keywords_processed: Some(report.keywords_processed),
        ..Default::default()
    }
}

fn summarize(
    trigger: TriggerKind,
    report: &SynthesisReport,
    counters: OutcomeCounters,
) -> TriggerOutcome {
    let message = format!(
        "Created {} pages ({} duplicates skipped, {} invalid keywords)",
        report.created, report.skipped_duplicates, report.invalid_keywords
    );
    info!(
        %trigger,
        created = report.created,
        skipped = report.skipped_duplicates,
        errors = report.errors,
        "Trigger complete"
    );

    if report.has_errors() {
        let mut outcome = TriggerOutcome::new(
            trigger,
            ResultKind::Warning,
            format!("{}; {} pages failed", message, report.errors),
        )
        .with_reason(ReasonCode::BatchFailures)
        .with_counters(counters);
        for msg in &report.error_messages {
            outcome = outcome.with_warning(msg.clone());
        }
        outcome
    } else {
        TriggerOutcome::new(trigger, ResultKind::Success, message).with_counters(counters)
    }
}
