use landgen_core::{Location, Offer, Service};
use tracing::debug;

use crate::targeting::{LocationScope, OfferMatch, TargetingFilter, TargetingOutcome};

/// Offers whose targeting covers a single (newly created) location.
/// Each match is narrowed to that location.
pub fn offers_for_location<'a>(
    filter: &TargetingFilter<'a>,
    offers: &'a [Offer],
    location: &'a Location,
) -> Vec<OfferMatch<'a>> {
    offers
        .iter()
        .filter_map(|offer| match filter.match_offer(offer) {
            TargetingOutcome::Matched(matched) if matched.locations.contains(&location.id) => {
                Some(OfferMatch {
                    locations: LocationScope::Locations(vec![location]),
                    ..matched
                })
            }
            TargetingOutcome::Matched(_) => {
                debug!(offer = %offer.id, location = %location.id, "Offer does not reach location");
                None
            }
            _ => None,
        })
        .collect()
}

/// Offers whose targeting covers a single service. Each match is narrowed
/// to that service and keeps the offer's full location scope.
pub fn offers_for_service<'a>(
    filter: &TargetingFilter<'a>,
    offers: &'a [Offer],
    service: &'a Service,
) -> Vec<OfferMatch<'a>> {
    offers
        .iter()
        .filter_map(|offer| match filter.match_offer(offer) {
            TargetingOutcome::Matched(matched)
                if matched.services.iter().any(|s| s.id == service.id) =>
            {
                Some(OfferMatch {
                    services: vec![service],
                    ..matched
                })
            }
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use landgen_catalog::CoverageIndex;
    use landgen_core::Targeting;
    use landgen_shared::RecordId;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 4, 1).unwrap()
    }

    fn service(id: &str) -> Service {
        Service {
            id: RecordId::new(id),
            name: id.to_string(),
            slug: id.to_string(),
            keywords: None,
            active: true,
            client: Some(RecordId::new("acme")),
            description: None,
        }
    }

    fn location(id: &str) -> Location {
        Location {
            id: RecordId::new(id),
            city: id.to_string(),
            state: "CO".to_string(),
            slug: id.to_lowercase(),
            active: true,
            seo_keywords: None,
        }
    }

    fn offer(id: &str, locations: Targeting, services: Targeting) -> Offer {
        Offer {
            id: RecordId::new(id),
            name: id.to_string(),
            client: Some(RecordId::new("acme")),
            start_date: None,
            end_date: None,
            target_services: services,
            target_locations: locations,
            target_branches: Targeting::Unrestricted,
            offer_type: None,
            discount_value: None,
            description: None,
            fine_print: None,
            utm_campaign: None,
        }
    }

    #[test]
    fn test_location_centric_keeps_unrestricted_and_targeting_offers() {
        let services = vec![service("bath")];
        let locations = vec![location("denver"), location("boulder")];
        let coverage = CoverageIndex::default();
        let filter = TargetingFilter::new(&services, &locations, &coverage, today());

        let offers = vec![
            offer("everywhere", Targeting::Unrestricted, Targeting::Unrestricted),
            offer("boulder-only", Targeting::only(["boulder"]), Targeting::Unrestricted),
            offer("denver-only", Targeting::only(["denver"]), Targeting::Unrestricted),
        ];

        let matches = offers_for_location(&filter, &offers, &locations[0]);
        let ids: Vec<_> = matches.iter().map(|m| m.offer.id.as_str()).collect();
        assert_eq!(ids, vec!["everywhere", "denver-only"]);
        assert!(matches.iter().all(|m| m.locations.len() == 1));
    }

    #[test]
    fn test_service_centric_narrows_to_service() {
        let services = vec![service("bath"), service("kitchen")];
        let locations = vec![location("denver")];
        let coverage = CoverageIndex::default();
        let filter = TargetingFilter::new(&services, &locations, &coverage, today());

        let offers = vec![
            offer("all", Targeting::Unrestricted, Targeting::Unrestricted),
            offer("kitchen-only", Targeting::Unrestricted, Targeting::only(["kitchen"])),
        ];

        let matches = offers_for_service(&filter, &offers, &services[0]);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].offer.id.as_str(), "all");
        assert_eq!(matches[0].services.len(), 1);
    }
}
