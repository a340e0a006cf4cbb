use async_trait::async_trait;
use landgen_shared::RecordId;

use crate::entities::{
    Branch, Client, Location, NewPage, Offer, Page, PageUpdate, Service, ServiceArea,
    StaffMember, Testimonial,
};
use crate::views::PageView;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{table} record not found: {id}")]
    NotFound { table: &'static str, id: RecordId },

    #[error("Malformed {table} record {id}: {reason}")]
    Decode {
        table: &'static str,
        id: String,
        reason: String,
    },

    #[error("Batch rejected by record store: {0}")]
    BatchRejected(String),

    #[error("Record store request failed: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// A record the store refused within an otherwise accepted batch
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedRecord {
    pub index: usize,
    pub reason: String,
}

/// Per-record result of a bulk create
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchInsert {
    pub created: Vec<RecordId>,
    pub rejected: Vec<RejectedRecord>,
}

/// Operator-maintained reference tables
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    async fn list_clients(&self) -> StoreResult<Vec<Client>>;

    async fn list_locations(&self) -> StoreResult<Vec<Location>>;

    async fn get_location(&self, id: &RecordId) -> StoreResult<Option<Location>>;

    async fn list_services(&self) -> StoreResult<Vec<Service>>;

    async fn get_service(&self, id: &RecordId) -> StoreResult<Option<Service>>;

    async fn list_branches(&self) -> StoreResult<Vec<Branch>>;

    async fn list_service_areas(&self) -> StoreResult<Vec<ServiceArea>>;
}

#[async_trait]
pub trait OfferRepository: Send + Sync {
    async fn list_offers(&self) -> StoreResult<Vec<Offer>>;

    async fn get_offer(&self, id: &RecordId) -> StoreResult<Option<Offer>>;
}

/// Generated pages. Pages are only ever added or corrected, never deleted.
#[async_trait]
pub trait PageRepository: Send + Sync {
    async fn list_pages(&self) -> StoreResult<Vec<Page>>;

    async fn get_page(&self, id: &RecordId) -> StoreResult<Option<Page>>;

    /// Create one bounded batch. An `Err` means the whole batch was refused.
    async fn create_pages(&self, pages: &[NewPage]) -> StoreResult<BatchInsert>;

    async fn update_page(&self, id: &RecordId, update: &PageUpdate) -> StoreResult<()>;
}

/// Read side used by the export
#[async_trait]
pub trait ContentRepository: Send + Sync {
    async fn list_page_views(&self) -> StoreResult<Vec<PageView>>;

    async fn list_active_testimonials(&self) -> StoreResult<Vec<Testimonial>>;

    async fn list_active_staff(&self) -> StoreResult<Vec<StaffMember>>;
}

/// Everything the pipeline needs from the record store
pub trait RecordStore:
    CatalogRepository + OfferRepository + PageRepository + ContentRepository
{
}

impl<T> RecordStore for T where
    T: CatalogRepository + OfferRepository + PageRepository + ContentRepository
{
}
