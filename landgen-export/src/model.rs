//! Shape of the export artifact read by the site renderer. Field names are
//! part of that contract and serialize in camelCase.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentData {
    pub pages: Vec<EnhancedPage>,
    pub metadata: ExportMetadata,
    /// Every active branch's coordinates, checked by the coordinate gate
    #[serde(default)]
    pub branches: Vec<BranchCoordinates>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportMetadata {
    pub export_date: String,
    pub total_pages: usize,
    pub export_duration_ms: u64,
    pub tables_exported: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchCoordinates {
    pub branch_id: String,
    pub branch_name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhancedPage {
    pub page_id: u64,
    pub url_slug: String,
    pub page_url: String,
    /// Service slug
    pub service: String,
    /// Location slug
    pub location: String,
    pub seo: SeoData,
    pub hero: HeroData,
    pub trust_bar: TrustBar,
    pub content: ContentSections,
    pub social_proof: SocialProof,
    pub branch: BranchData,
    pub branding: Branding,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offer: Option<OfferData>,
    pub tracking: Tracking,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeoData {
    pub title: String,
    pub description: String,
    pub canonical_url: String,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeroData {
    pub h1_headline: String,
    pub subheadline: String,
    pub image_url: String,
    pub image_alt: String,
    pub primary_cta: CtaAction,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CtaAction {
    pub text: String,
    /// `phone`, `form` or `link`
    pub action_type: String,
    pub action_value: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrustBar {
    pub signals: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentSections {
    pub service_description: String,
    pub benefits: Vec<BenefitItem>,
    pub process_steps: Vec<ProcessStep>,
    pub faqs: Vec<FaqItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenefitItem {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessStep {
    pub step_number: u32,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeline: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaqItem {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialProof {
    pub testimonials: Vec<TestimonialItem>,
    pub aggregate_rating: f64,
    pub total_reviews: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestimonialItem {
    pub customer_name: String,
    pub city: String,
    pub state: String,
    pub rating: u8,
    pub review_title: String,
    pub review_text: String,
    pub review_date: String,
    pub source: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BranchData {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub address: String,
    pub timezone: String,
    pub hours: String,
    pub staff: Vec<StaffItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffItem {
    pub name: String,
    pub job_title: String,
    pub years_experience: u32,
    pub bio: String,
    pub photo_url: String,
    pub is_primary_contact: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Branding {
    pub primary_color: String,
    pub secondary_color: String,
    pub logo_url: String,
    pub google_fonts: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferData {
    pub name: String,
    #[serde(rename = "type")]
    pub offer_type: String,
    pub discount_value: String,
    pub description: String,
    pub fine_print: String,
    pub start_date: String,
    pub end_date: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tracking {
    pub gtm_id: String,
    pub ga_property_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utm_campaign: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utm_source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utm_medium: Option<String>,
}
