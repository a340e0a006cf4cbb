use landgen_core::{PageView, StaffMember};
use landgen_shared::{Lookup, RecordId};
use landgen_store::app_config::ExportConfig;
use std::collections::HashMap;

use crate::content::{parse_list, split_csv};
use crate::model::{
    BranchData, Branding, ContentSections, CtaAction, EnhancedPage, HeroData, OfferData,
    SeoData, StaffItem, Tracking, TrustBar,
};
use crate::testimonials::{social_proof, TestimonialIndex};

/// A page left out of the export. The rest of the export carries on.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PageRejection {
    #[error("{page}: Missing Service Slug")]
    MissingServiceSlug { page: RecordId },

    #[error("{page}: Missing Location Slug")]
    MissingLocationSlug { page: RecordId },
}

impl PageRejection {
    pub fn page(&self) -> &RecordId {
        match self {
            PageRejection::MissingServiceSlug { page } => page,
            PageRejection::MissingLocationSlug { page } => page,
        }
    }
}

/// Active staff grouped by the branch they work at
#[derive(Debug, Default)]
pub struct StaffIndex {
    by_branch: HashMap<RecordId, Vec<StaffMember>>,
}

impl StaffIndex {
    pub fn new(staff: Vec<StaffMember>) -> Self {
        let mut by_branch: HashMap<RecordId, Vec<StaffMember>> = HashMap::new();
        for member in staff {
            if let Some(branch) = member.branch.clone() {
                by_branch.entry(branch).or_default().push(member);
            }
        }
        Self { by_branch }
    }

    pub fn branches(&self) -> usize {
        self.by_branch.len()
    }

    pub fn for_branch(&self, branch: Option<&RecordId>) -> &[StaffMember] {
        branch
            .and_then(|b| self.by_branch.get(b))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

fn text(lookup: &Lookup<String>) -> String {
    lookup.text().unwrap_or_default().to_string()
}

fn text_or(lookup: &Lookup<String>, default: &str) -> String {
    lookup.text().unwrap_or(default).to_string()
}

fn field(value: &Option<String>) -> String {
    non_blank(value).unwrap_or_default()
}

fn field_or(value: &Option<String>, default: &str) -> String {
    non_blank(value).unwrap_or_else(|| default.to_string())
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Shapes page views into the renderer's page model
pub struct PageTransformer<'a> {
    config: &'a ExportConfig,
    testimonials: TestimonialIndex,
    staff: StaffIndex,
}

impl<'a> PageTransformer<'a> {
    pub fn new(config: &'a ExportConfig, testimonials: TestimonialIndex, staff: StaffIndex) -> Self {
        Self {
            config,
            testimonials,
            staff,
        }
    }

    pub fn testimonials(&self) -> &TestimonialIndex {
        &self.testimonials
    }

    pub fn staff(&self) -> &StaffIndex {
        &self.staff
    }

    pub fn transform(&self, view: &PageView) -> Result<EnhancedPage, PageRejection> {
        let service = view
            .service_slug
            .text()
            .ok_or_else(|| PageRejection::MissingServiceSlug { page: view.id.clone() })?;
        let location = view
            .location_slug
            .text()
            .ok_or_else(|| PageRejection::MissingLocationSlug { page: view.id.clone() })?;

        let c = &view.content;
        let page_url = field(&c.page_url);
        let branch_phone = text(&view.branch_phone);
        let page_key = view.id.as_str();

        let selected = self.testimonials.select(
            view.client_id(),
            view.service_id(),
            view.branch_id(),
        );

        let staff = self
            .staff
            .for_branch(view.branch_id())
            .iter()
            .map(|s| StaffItem {
                name: field(&s.full_name),
                job_title: field(&s.job_title),
                years_experience: s.years_experience.unwrap_or(0),
                bio: field(&s.bio),
                photo_url: field(&s.photo_url),
                is_primary_contact: s.primary_contact,
            })
            .collect();

        let action_value = field_or(&c.cta_action_value, &self.config.cta_action_value)
            .replace(&self.config.phone_placeholder, &branch_phone);

        let offer = view.offer_id().map(|_| OfferData {
            name: text(&view.offer_name),
            offer_type: text(&view.offer_type),
            discount_value: text(&view.discount_value),
            description: text(&view.offer_description),
            fine_print: text(&view.fine_print),
            start_date: text(&view.offer_start_date),
            end_date: text(&view.offer_end_date),
        });

        Ok(EnhancedPage {
            page_id: c.page_number.unwrap_or(0),
            url_slug: field(&c.url_slug),
            page_url: page_url.clone(),
            service: service.to_string(),
            location: location.to_string(),
            seo: SeoData {
                title: field_or(&c.seo_title, &format!("{} in {}", service, location)),
                description: field(&c.seo_description),
                canonical_url: page_url,
                keywords: split_csv(view.seo_keywords.text()),
            },
            hero: HeroData {
                h1_headline: field(&c.h1_headline),
                subheadline: field(&c.hero_subheadline),
                image_url: field(&c.hero_image_url),
                image_alt: field(&c.hero_image_alt),
                primary_cta: CtaAction {
                    text: field_or(&c.cta_text, &self.config.cta_text),
                    action_type: field_or(&c.cta_action_type, &self.config.cta_action_type),
                    action_value,
                },
            },
            trust_bar: TrustBar {
                signals: c.trust_bar.iter().filter_map(non_blank).collect(),
            },
            content: ContentSections {
                service_description: text(&view.service_description),
                benefits: parse_list("benefits", page_key, c.benefits.as_deref()),
                process_steps: parse_list("process_steps", page_key, c.process_steps.as_deref()),
                faqs: parse_list("faqs", page_key, c.faqs.as_deref()),
            },
            social_proof: social_proof(&selected),
            branch: BranchData {
                name: text(&view.branch_name),
                phone: branch_phone,
                email: text(&view.branch_email),
                address: text(&view.branch_address),
                timezone: text(&view.branch_timezone),
                hours: text(&view.branch_hours),
                staff,
            },
            branding: Branding {
                primary_color: text_or(&view.primary_color, &self.config.primary_color),
                secondary_color: text_or(&view.secondary_color, &self.config.secondary_color),
                logo_url: text(&view.logo_url),
                google_fonts: text_or(&view.google_fonts, &self.config.font),
            },
            offer,
            tracking: Tracking {
                gtm_id: text(&view.gtm_container_id),
                ga_property_id: text(&view.ga_property_id),
                utm_campaign: view.utm_campaign.text().map(str::to_string),
                utm_source: non_blank(&c.utm_source),
                utm_medium: non_blank(&c.utm_medium),
            },
        })
    }
}
