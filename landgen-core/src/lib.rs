pub mod entities;
pub mod targeting;
pub mod views;
pub mod repository;

pub use entities::{
    Branch, Client, FieldUpdate, Location, NewPage, Offer, OfferStatus, Page, PageContent,
    PageUpdate, Service, ServiceArea, StaffMember, Testimonial,
};
pub use targeting::Targeting;
pub use views::{assemble_page_views, PageLinks, PageView};
pub use repository::{
    BatchInsert, CatalogRepository, ContentRepository, OfferRepository, PageRepository,
    RecordStore, RejectedRecord, StoreError, StoreResult,
};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
