use chrono::NaiveDate;
use landgen_shared::RecordId;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::targeting::Targeting;
use crate::{CoreError, CoreResult};

fn default_true() -> bool {
    true
}

fn default_workflow_status() -> String {
    "Draft".to_string()
}

/// A business whose pages are generated
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    pub id: RecordId,
    pub name: String,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub primary_color: Option<String>,
    #[serde(default)]
    pub secondary_color: Option<String>,
    #[serde(default)]
    pub google_fonts: Option<String>,
    #[serde(default)]
    pub gtm_container_id: Option<String>,
    #[serde(default)]
    pub ga_property_id: Option<String>,
}

/// A city pages can target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: RecordId,
    pub city: String,
    pub state: String,
    pub slug: String,
    #[serde(default = "default_true")]
    pub active: bool,
    /// Comma-separated SEO keywords for the city
    #[serde(default)]
    pub seo_keywords: Option<String>,
}

impl Location {
    pub fn display_name(&self) -> String {
        if self.state.is_empty() {
            self.city.clone()
        } else {
            format!("{} {}", self.city, self.state)
        }
    }
}

/// A service a client sells, with its operator-edited keyword list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: RecordId,
    pub name: String,
    pub slug: String,
    /// Free text, comma-separated
    #[serde(default)]
    pub keywords: Option<String>,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub client: Option<RecordId>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Offer status derived from its validity window
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OfferStatus {
    Scheduled,
    Active,
    Expired,
}

impl fmt::Display for OfferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            OfferStatus::Scheduled => "Scheduled",
            OfferStatus::Active => "Active",
            OfferStatus::Expired => "Expired",
        };
        f.write_str(label)
    }
}

/// A promotional campaign and its targeting rules
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Offer {
    pub id: RecordId,
    pub name: String,
    #[serde(default)]
    pub client: Option<RecordId>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub target_services: Targeting,
    #[serde(default)]
    pub target_locations: Targeting,
    #[serde(default)]
    pub target_branches: Targeting,
    #[serde(default)]
    pub offer_type: Option<String>,
    #[serde(default)]
    pub discount_value: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub fine_print: Option<String>,
    #[serde(default)]
    pub utm_campaign: Option<String>,
}

impl Offer {
    /// Status as of `today`. Both ends of the window are inclusive; a missing
    /// start means already started and a missing end means open-ended.
    pub fn status_on(&self, today: NaiveDate) -> OfferStatus {
        if self.start_date.is_some_and(|start| today < start) {
            OfferStatus::Scheduled
        } else if self.end_date.is_some_and(|end| today > end) {
            OfferStatus::Expired
        } else {
            OfferStatus::Active
        }
    }
}

/// A client's physical office
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Branch {
    pub id: RecordId,
    pub name: String,
    #[serde(default)]
    pub client: Option<RecordId>,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub hours: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

/// Edge declaring that a branch serves a location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceArea {
    pub id: RecordId,
    #[serde(default)]
    pub branch: Option<RecordId>,
    #[serde(default)]
    pub location: Option<RecordId>,
    #[serde(default = "default_true")]
    pub active: bool,
}

/// Generated and operator-edited content carried on a page.
/// Opaque at this layer; the export parses and shapes it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageContent {
    #[serde(default)]
    pub page_number: Option<u64>,
    #[serde(default)]
    pub url_slug: Option<String>,
    #[serde(default)]
    pub page_url: Option<String>,
    #[serde(default)]
    pub seo_title: Option<String>,
    #[serde(default)]
    pub seo_description: Option<String>,
    #[serde(default)]
    pub h1_headline: Option<String>,
    #[serde(default)]
    pub hero_subheadline: Option<String>,
    #[serde(default)]
    pub hero_image_url: Option<String>,
    #[serde(default)]
    pub hero_image_alt: Option<String>,
    #[serde(default)]
    pub cta_text: Option<String>,
    #[serde(default)]
    pub cta_action_type: Option<String>,
    #[serde(default)]
    pub cta_action_value: Option<String>,
    #[serde(default)]
    pub trust_bar: [Option<String>; 5],
    /// JSON array text
    #[serde(default)]
    pub faqs: Option<String>,
    /// JSON array text
    #[serde(default)]
    pub benefits: Option<String>,
    /// JSON array text
    #[serde(default)]
    pub process_steps: Option<String>,
    #[serde(default)]
    pub utm_source: Option<String>,
    #[serde(default)]
    pub utm_medium: Option<String>,
}

/// One generated landing page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    pub id: RecordId,
    #[serde(default)]
    pub client: Option<RecordId>,
    #[serde(default)]
    pub service: Option<RecordId>,
    /// `None` for national pages
    #[serde(default)]
    pub location: Option<RecordId>,
    #[serde(default)]
    pub target_keyword: Option<String>,
    #[serde(default)]
    pub offer: Option<RecordId>,
    #[serde(default)]
    pub matched_branch: Option<RecordId>,
    #[serde(default)]
    pub published: bool,
    #[serde(default = "default_workflow_status")]
    pub status: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub content: PageContent,
}

/// A page queued for creation. Workflow status is left to the store default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPage {
    pub client: Option<RecordId>,
    pub service: RecordId,
    pub location: Option<RecordId>,
    pub target_keyword: String,
    pub offer: RecordId,
    pub published: bool,
}

impl NewPage {
    pub fn new(
        client: Option<RecordId>,
        service: RecordId,
        location: Option<RecordId>,
        target_keyword: impl Into<String>,
        offer: RecordId,
    ) -> CoreResult<Self> {
        let target_keyword = target_keyword.into();
        if target_keyword.trim().is_empty() {
            return Err(CoreError::ValidationError(format!(
                "page for service {} has an empty target keyword",
                service
            )));
        }

        Ok(Self {
            client,
            service,
            location,
            target_keyword,
            offer,
            published: false,
        })
    }

    /// Materialize as a stored page under a store-assigned id
    pub fn into_page(self, id: RecordId) -> Page {
        Page {
            id,
            client: self.client,
            service: Some(self.service),
            location: self.location,
            target_keyword: Some(self.target_keyword),
            offer: Some(self.offer),
            matched_branch: None,
            published: self.published,
            status: default_workflow_status(),
            notes: None,
            content: PageContent::default(),
        }
    }
}

/// What a partial update does to one optional field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldUpdate<T> {
    Keep,
    Set(T),
    Clear,
}

impl<T> Default for FieldUpdate<T> {
    fn default() -> Self {
        FieldUpdate::Keep
    }
}

impl<T> FieldUpdate<T> {
    pub fn is_keep(&self) -> bool {
        matches!(self, FieldUpdate::Keep)
    }

    /// The value written by `Set`
    pub fn value(&self) -> Option<&T> {
        match self {
            FieldUpdate::Set(value) => Some(value),
            FieldUpdate::Keep | FieldUpdate::Clear => None,
        }
    }
}

impl<T: Clone> FieldUpdate<T> {
    pub fn apply(&self, field: &mut Option<T>) {
        match self {
            FieldUpdate::Keep => {}
            FieldUpdate::Set(value) => *field = Some(value.clone()),
            FieldUpdate::Clear => *field = None,
        }
    }
}

/// Partial update of a page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageUpdate {
    pub matched_branch: FieldUpdate<RecordId>,
    pub notes: FieldUpdate<String>,
}

/// A customer review
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Testimonial {
    pub id: RecordId,
    #[serde(default)]
    pub client: Option<RecordId>,
    #[serde(default)]
    pub service: Option<RecordId>,
    #[serde(default)]
    pub branch: Option<RecordId>,
    #[serde(default)]
    pub rating: Option<u8>,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub customer_city: Option<String>,
    #[serde(default)]
    pub customer_state: Option<String>,
    #[serde(default)]
    pub review_title: Option<String>,
    #[serde(default)]
    pub review_text: Option<String>,
    #[serde(default)]
    pub review_date: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
}

/// A team member shown on a branch's pages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffMember {
    pub id: RecordId,
    #[serde(default)]
    pub branch: Option<RecordId>,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub job_title: Option<String>,
    #[serde(default)]
    pub years_experience: Option<u32>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub primary_contact: bool,
}
