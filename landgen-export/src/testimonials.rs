use landgen_core::Testimonial;
use landgen_shared::RecordId;
use std::collections::HashMap;

use crate::model::{SocialProof, TestimonialItem};

pub const MIN_RATING: u8 = 4;
pub const MAX_PER_PAGE: usize = 5;

/// Active testimonials grouped by client
#[derive(Debug, Default)]
pub struct TestimonialIndex {
    by_client: HashMap<RecordId, Vec<Testimonial>>,
}

impl TestimonialIndex {
    pub fn new(testimonials: Vec<Testimonial>) -> Self {
        let mut by_client: HashMap<RecordId, Vec<Testimonial>> = HashMap::new();
        for testimonial in testimonials {
            if let Some(client) = testimonial.client.clone() {
                by_client.entry(client).or_default().push(testimonial);
            }
        }
        Self { by_client }
    }

    pub fn clients(&self) -> usize {
        self.by_client.len()
    }

    /// Testimonials of `client` fit for a page: rated 4 or more, and
    /// matching the page's service and branch wherever the testimonial names one.
    pub fn select(
        &self,
        client: Option<&RecordId>,
        service: Option<&RecordId>,
        branch: Option<&RecordId>,
    ) -> Vec<&Testimonial> {
        let Some(all) = client.and_then(|c| self.by_client.get(c)) else {
            return Vec::new();
        };

        all.iter()
            .filter(|t| t.rating.unwrap_or(0) >= MIN_RATING)
            .filter(|t| t.service.is_none() || t.service.as_ref() == service)
            .filter(|t| t.branch.is_none() || t.branch.as_ref() == branch)
            .take(MAX_PER_PAGE)
            .collect()
    }
}

/// Mean rating to one decimal place; 0 when there are none
pub fn average_rating(ratings: &[u8]) -> f64 {
    if ratings.is_empty() {
        return 0.0;
    }
    let sum: u32 = ratings.iter().map(|&r| u32::from(r)).sum();
    let mean = f64::from(sum) / ratings.len() as f64;
    (mean * 10.0).round() / 10.0
}

pub fn social_proof(selected: &[&Testimonial]) -> SocialProof {
    let testimonials: Vec<TestimonialItem> = selected
        .iter()
        .map(|t| TestimonialItem {
            customer_name: t.customer_name.clone().unwrap_or_else(|| "Anonymous".to_string()),
            city: t.customer_city.clone().unwrap_or_default(),
            state: t.customer_state.clone().unwrap_or_default(),
            rating: t.rating.unwrap_or(5),
            review_title: t.review_title.clone().unwrap_or_default(),
            review_text: t.review_text.clone().unwrap_or_default(),
            review_date: t.review_date.clone().unwrap_or_default(),
            source: t.source.clone().unwrap_or_else(|| "Direct".to_string()),
        })
        .collect();

    let ratings: Vec<u8> = testimonials.iter().map(|t| t.rating).collect();
    SocialProof {
        aggregate_rating: average_rating(&ratings),
        total_reviews: testimonials.len(),
        testimonials,
    }
}
