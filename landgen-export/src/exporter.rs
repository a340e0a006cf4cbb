use chrono::Utc;
use landgen_core::{RecordStore, StoreError};
use landgen_store::app_config::ExportConfig;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

use crate::model::{BranchCoordinates, ContentData, ExportMetadata};
use crate::testimonials::TestimonialIndex;
use crate::transform::{PageRejection, PageTransformer, StaffIndex};

pub const TABLES_EXPORTED: [&str; 4] = ["Pages", "Testimonials", "Branch Staff", "Branch Locations"];

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("No valid pages to export ({rejected} rejected); pages need a service slug and a location slug")]
    NoValidPages { rejected: usize },

    #[error("Export read failed: {0}")]
    Store(#[from] StoreError),

    #[error("Failed to serialize export: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to write export: {0}")]
    Io(#[from] std::io::Error),
}

pub type ExportResult<T> = Result<T, ExportError>;

#[derive(Debug)]
pub struct ExportReport {
    pub content: ContentData,
    pub rejected: Vec<PageRejection>,
}

impl ExportReport {
    /// The first `limit` rejections, then a line counting the rest
    pub fn error_lines(&self, limit: usize) -> Vec<String> {
        let mut lines: Vec<String> = self
            .rejected
            .iter()
            .take(limit)
            .map(ToString::to_string)
            .collect();
        if self.rejected.len() > limit {
            lines.push(format!("... and {} more", self.rejected.len() - limit));
        }
        lines
    }
}

/// Joins every page with its auxiliary tables into the renderer's artifact
pub struct Exporter {
    store: Arc<dyn RecordStore>,
    config: ExportConfig,
}

impl Exporter {
    pub fn new(store: Arc<dyn RecordStore>, config: ExportConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    pub async fn build(&self) -> ExportResult<ExportReport> {
        let started = Instant::now();

        let (pages, testimonials, staff, branches) = tokio::join!(
            self.store.list_page_views(),
            self.store.list_active_testimonials(),
            self.store.list_active_staff(),
            self.store.list_branches(),
        );
        let pages = pages?;
        let branches = branches?;
        let testimonials = testimonials.unwrap_or_else(|e| {
            warn!(error = %e, "Testimonials unavailable, exporting without social proof");
            Vec::new()
        });
        let staff = staff.unwrap_or_else(|e| {
            warn!(error = %e, "Branch staff unavailable, exporting without staff");
            Vec::new()
        });
        info!(
            pages = pages.len(),
            testimonials = testimonials.len(),
            staff = staff.len(),
            "Fetched export tables"
        );

        let transformer = PageTransformer::new(
            &self.config,
            TestimonialIndex::new(testimonials),
            StaffIndex::new(staff),
        );
        info!(
            clients = transformer.testimonials().clients(),
            branches = transformer.staff().branches(),
            "Grouped testimonials and staff"
        );

        let mut valid = Vec::with_capacity(pages.len());
        let mut rejected = Vec::new();
        for view in &pages {
            match transformer.transform(view) {
                Ok(page) => valid.push(page),
                Err(rejection) => rejected.push(rejection),
            }
        }

        let branches: Vec<BranchCoordinates> = branches
            .into_iter()
            .filter(|b| b.active)
            .map(|b| BranchCoordinates {
                branch_id: b.id.to_string(),
                branch_name: b.name,
                latitude: b.latitude,
                longitude: b.longitude,
            })
            .collect();

        let report = ExportReport {
            content: ContentData {
                metadata: ExportMetadata {
                    export_date: Utc::now().to_rfc3339(),
                    total_pages: valid.len(),
                    export_duration_ms: started.elapsed().as_millis() as u64,
                    tables_exported: TABLES_EXPORTED.iter().map(|t| t.to_string()).collect(),
                },
                pages: valid,
                branches,
            },
            rejected,
        };

        if !report.rejected.is_empty() {
            warn!(skipped = report.rejected.len(), "Pages skipped due to validation errors");
            for line in report.error_lines(self.config.error_report_limit) {
                warn!("  - {}", line);
            }
        }

        if report.content.pages.is_empty() {
            error!("No valid pages to export");
            return Err(ExportError::NoValidPages {
                rejected: report.rejected.len(),
            });
        }

        info!(pages = report.content.metadata.total_pages, "Transformed valid pages");
        Ok(report)
    }

    /// Serialize the artifact as pretty JSON; returns the bytes written
    pub async fn write(&self, report: &ExportReport, path: impl AsRef<Path>) -> ExportResult<usize> {
        let json = serde_json::to_string_pretty(&report.content)?;
        tokio::fs::write(path.as_ref(), &json).await?;
        info!(
            path = %path.as_ref().display(),
            kb = %format!("{:.2}", json.len() as f64 / 1024.0),
            "Export written"
        );
        Ok(json.len())
    }

    /// Build and write to the configured output path
    pub async fn run(&self) -> ExportResult<ExportReport> {
        let report = self.build().await?;
        self.write(&report, &self.config.output_path).await?;
        Ok(report)
    }
}
