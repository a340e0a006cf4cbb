use chrono::NaiveDate;
use landgen_catalog::CoverageIndex;
use landgen_core::{Location, Offer, OfferStatus, Service};
use landgen_shared::{ReasonCode, RecordId};
use tracing::debug;

/// Where an offer's pages land
#[derive(Debug, Clone, PartialEq)]
pub enum LocationScope<'a> {
    /// No locations exist anywhere; one location-less page per keyword
    National,
    Locations(Vec<&'a Location>),
}

impl<'a> LocationScope<'a> {
    pub fn len(&self) -> usize {
        match self {
            LocationScope::National => 1,
            LocationScope::Locations(locations) => locations.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: &RecordId) -> bool {
        match self {
            LocationScope::National => false,
            LocationScope::Locations(locations) => locations.iter().any(|l| &l.id == id),
        }
    }

    /// Location ids in scope, `None` standing for the national page
    pub fn ids(&self) -> Vec<Option<RecordId>> {
        match self {
            LocationScope::National => vec![None],
            LocationScope::Locations(locations) => {
                locations.iter().map(|l| Some(l.id.clone())).collect()
            }
        }
    }
}

/// An active offer and the (service, location) pairs it applies to
#[derive(Debug, Clone)]
pub struct OfferMatch<'a> {
    pub offer: &'a Offer,
    pub services: Vec<&'a Service>,
    pub locations: LocationScope<'a>,
}

/// Why an active offer produced nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoMatch {
    NoServices,
    NoLocations,
    NoLocationsServedByBranches,
}

impl NoMatch {
    pub fn reason(self) -> ReasonCode {
        match self {
            NoMatch::NoServices => ReasonCode::NoMatchingServices,
            NoMatch::NoLocations => ReasonCode::NoMatchingLocations,
            NoMatch::NoLocationsServedByBranches => ReasonCode::NoLocationsServedByBranches,
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            NoMatch::NoServices => "No matching services found",
            NoMatch::NoLocations => "No matching locations found",
            NoMatch::NoLocationsServedByBranches => {
                "No locations served by the targeted branches"
            }
        }
    }
}

#[derive(Debug, Clone)]
pub enum TargetingOutcome<'a> {
    NotActive(OfferStatus),
    NoMatches(NoMatch),
    Matched(OfferMatch<'a>),
}

/// Read-only evaluation of offer targeting against one snapshot of the
/// catalog. Never writes.
pub struct TargetingFilter<'a> {
    services: &'a [Service],
    locations: &'a [Location],
    coverage: &'a CoverageIndex,
    today: NaiveDate,
}

impl<'a> TargetingFilter<'a> {
    pub fn new(
        services: &'a [Service],
        locations: &'a [Location],
        coverage: &'a CoverageIndex,
        today: NaiveDate,
    ) -> Self {
        Self {
            services,
            locations,
            coverage,
            today,
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn match_offer(&self, offer: &'a Offer) -> TargetingOutcome<'a> {
        let status = offer.status_on(self.today);
        if status != OfferStatus::Active {
            debug!(offer = %offer.id, %status, "Offer not active");
            return TargetingOutcome::NotActive(status);
        }

        let services = self.matching_services(offer);
        if services.is_empty() {
            return TargetingOutcome::NoMatches(NoMatch::NoServices);
        }

        let locations = match self.matching_locations(offer) {
            Ok(scope) => scope,
            Err(no_match) => return TargetingOutcome::NoMatches(no_match),
        };

        debug!(
            offer = %offer.id,
            services = services.len(),
            locations = locations.len(),
            "Offer targeting resolved"
        );

        TargetingOutcome::Matched(OfferMatch {
            offer,
            services,
            locations,
        })
    }

    fn matching_services(&self, offer: &Offer) -> Vec<&'a Service> {
        self.services
            .iter()
            .filter(|s| s.active)
            .filter(|s| match offer.target_services.ids() {
                Some(_) => offer.target_services.admits(&s.id),
                // Unrestricted means every active service in the offer's client scope
                None => match &offer.client {
                    Some(client) => s.client.as_ref() == Some(client),
                    None => true,
                },
            })
            .collect()
    }

    fn matching_locations(&self, offer: &Offer) -> Result<LocationScope<'a>, NoMatch> {
        if self.locations.is_empty() {
            return Ok(LocationScope::National);
        }

        let mut locations: Vec<&'a Location> = self
            .locations
            .iter()
            .filter(|l| offer.target_locations.admits(&l.id))
            .collect();
        if locations.is_empty() {
            return Err(NoMatch::NoLocations);
        }

        // Branch targets narrow the set; they never widen it
        if let Some(reachable) = self.coverage.reachable_locations(&offer.target_branches) {
            locations.retain(|l| reachable.contains(&l.id));
            if locations.is_empty() {
                return Err(NoMatch::NoLocationsServedByBranches);
            }
        }

        Ok(LocationScope::Locations(locations))
    }
}
