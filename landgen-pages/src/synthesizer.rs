use landgen_catalog::{KeywordPolicy, ParsedKeywords};
use landgen_core::{NewPage, PageRepository, Service};
use landgen_offer::OfferMatch;
use landgen_shared::RecordId;
use std::collections::HashMap;
use tracing::{debug, error, info, warn};

use crate::dedup::{DuplicateIndex, PageKey};

pub const DEFAULT_BATCH_SIZE: usize = 50;

/// Counts from one synthesizer run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SynthesisReport {
    pub created: usize,
    pub skipped_duplicates: usize,
    pub invalid_keywords: usize,
    pub services_without_keywords: usize,
    pub keywords_processed: usize,
    pub errors: usize,
    pub failed_batches: usize,
    /// First error message of each failed batch or rejected record
    pub error_messages: Vec<String>,
}

impl SynthesisReport {
    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }
}

/// Expands offer matches into page candidates, drops duplicates and
/// commits the rest in bounded batches.
#[derive(Debug, Clone)]
pub struct PageSynthesizer {
    policy: KeywordPolicy,
    batch_size: usize,
}

impl Default for PageSynthesizer {
    fn default() -> Self {
        Self::new(KeywordPolicy::default(), DEFAULT_BATCH_SIZE)
    }
}

impl PageSynthesizer {
    pub fn new(policy: KeywordPolicy, batch_size: usize) -> Self {
        Self {
            policy,
            batch_size: batch_size.max(1),
        }
    }

    pub fn policy(&self) -> &KeywordPolicy {
        &self.policy
    }

    /// Build the creation queue for `matches`. Every candidate key is checked
    /// against, then added to, `index`.
    pub fn plan(
        &self,
        matches: &[OfferMatch<'_>],
        index: &mut DuplicateIndex,
        report: &mut SynthesisReport,
    ) -> Vec<NewPage> {
        let mut parsed: HashMap<&RecordId, ParsedKeywords> = HashMap::new();
        let mut queued = Vec::new();

        for matched in matches {
            let offer = matched.offer;
            let locations = matched.locations.ids();

            for service in &matched.services {
                let keywords = parsed.entry(&service.id).or_insert_with(|| {
                    let keywords = self.parse_service(service);
                    report.invalid_keywords += keywords.rejected.len();
                    report.keywords_processed += keywords.valid.len();
                    if keywords.is_empty() {
                        report.services_without_keywords += 1;
                    }
                    keywords
                });

                for keyword in &keywords.valid {
                    for location in &locations {
                        let key = PageKey::new(&service.id, location.as_ref(), keyword, &offer.id);
                        if !index.insert(key) {
                            report.skipped_duplicates += 1;
                            continue;
                        }

                        let client = service.client.clone().or_else(|| offer.client.clone());
                        match NewPage::new(
                            client,
                            service.id.clone(),
                            location.clone(),
                            keyword.as_str(),
                            offer.id.clone(),
                        ) {
                            Ok(page) => {
                                debug!(
                                    service = %service.id,
                                    location = ?location,
                                    keyword = %keyword,
                                    offer = %offer.id,
                                    "Queued page"
                                );
                                queued.push(page);
                            }
                            Err(e) => {
                                warn!(error = %e, "Dropping page candidate");
                                report.errors += 1;
                                report.error_messages.push(e.to_string());
                            }
                        }
                    }
                }
            }
        }

        queued
    }

    /// Commit `queued` in batches. A refused batch is counted and the
    /// remaining batches still go out.
    pub async fn commit<R>(&self, store: &R, queued: &[NewPage], report: &mut SynthesisReport)
    where
        R: PageRepository + ?Sized,
    {
        let total_batches = queued.len().div_ceil(self.batch_size);

        for (i, batch) in queued.chunks(self.batch_size).enumerate() {
            match store.create_pages(batch).await {
                Ok(insert) => {
                    report.created += insert.created.len();
                    for rejected in &insert.rejected {
                        error!(
                            batch = i + 1,
                            index = rejected.index,
                            reason = %rejected.reason,
                            "Page rejected by record store"
                        );
                        report.errors += 1;
                        report.error_messages.push(rejected.reason.clone());
                    }
                    info!(
                        batch = i + 1,
                        total_batches,
                        created = insert.created.len(),
                        "Created page batch"
                    );
                }
                Err(e) => {
                    error!(batch = i + 1, total_batches, error = %e, "Page batch failed");
                    report.errors += batch.len();
                    report.failed_batches += 1;
                    report.error_messages.push(e.to_string());
                }
            }
        }
    }

    /// Plan and commit in one go
    pub async fn run<R>(
        &self,
        store: &R,
        matches: &[OfferMatch<'_>],
        index: &mut DuplicateIndex,
    ) -> SynthesisReport
    where
        R: PageRepository + ?Sized,
    {
        let mut report = SynthesisReport::default();
        let queued = self.plan(matches, index, &mut report);

        info!(
            queued = queued.len(),
            skipped = report.skipped_duplicates,
            invalid_keywords = report.invalid_keywords,
            "Page candidates ready"
        );

        self.commit(store, &queued, &mut report).await;
        report
    }

    fn parse_service(&self, service: &Service) -> ParsedKeywords {
        let parsed = self.policy.parse_field(service.keywords.as_deref());
        if parsed.is_empty() {
            warn!(service = %service.id, name = %service.name, "Service has no valid keywords");
        }
        parsed
    }
}
