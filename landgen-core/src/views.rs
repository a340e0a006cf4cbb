use landgen_shared::{Lookup, RecordId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use crate::entities::{Branch, Client, Location, Offer, Page, PageContent, Service};

/// A page row as the store exposes it for export: the page's own fields
/// plus lookups pulled through its client, service, location, branch and
/// offer links.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageView {
    pub id: RecordId,
    #[serde(default)]
    pub client: Vec<RecordId>,
    #[serde(default)]
    pub service: Vec<RecordId>,
    #[serde(default)]
    pub location: Vec<RecordId>,
    #[serde(default)]
    pub matched_branch: Vec<RecordId>,
    #[serde(default)]
    pub offer: Vec<RecordId>,
    #[serde(default)]
    pub target_keyword: Option<String>,
    #[serde(default)]
    pub content: PageContent,

    // Service lookups
    #[serde(default)]
    pub service_slug: Lookup<String>,
    #[serde(default)]
    pub service_name: Lookup<String>,
    #[serde(default)]
    pub service_description: Lookup<String>,

    // Location lookups
    #[serde(default)]
    pub location_slug: Lookup<String>,
    #[serde(default)]
    pub city: Lookup<String>,
    #[serde(default)]
    pub state: Lookup<String>,
    #[serde(default)]
    pub seo_keywords: Lookup<String>,

    // Branch lookups
    #[serde(default)]
    pub branch_name: Lookup<String>,
    #[serde(default)]
    pub branch_phone: Lookup<String>,
    #[serde(default)]
    pub branch_email: Lookup<String>,
    #[serde(default)]
    pub branch_address: Lookup<String>,
    #[serde(default)]
    pub branch_timezone: Lookup<String>,
    #[serde(default)]
    pub branch_hours: Lookup<String>,

    // Client lookups
    #[serde(default)]
    pub primary_color: Lookup<String>,
    #[serde(default)]
    pub secondary_color: Lookup<String>,
    #[serde(default)]
    pub logo_url: Lookup<String>,
    #[serde(default)]
    pub google_fonts: Lookup<String>,
    #[serde(default)]
    pub gtm_container_id: Lookup<String>,
    #[serde(default)]
    pub ga_property_id: Lookup<String>,

    // Offer lookups
    #[serde(default)]
    pub offer_name: Lookup<String>,
    #[serde(default)]
    pub offer_type: Lookup<String>,
    #[serde(default)]
    pub discount_value: Lookup<String>,
    #[serde(default)]
    pub offer_description: Lookup<String>,
    #[serde(default)]
    pub fine_print: Lookup<String>,
    #[serde(default)]
    pub offer_start_date: Lookup<String>,
    #[serde(default)]
    pub offer_end_date: Lookup<String>,
    #[serde(default)]
    pub utm_campaign: Lookup<String>,
}

/// Linked records a page points at, resolved by the caller
#[derive(Debug, Clone, Copy, Default)]
pub struct PageLinks<'a> {
    pub client: Option<&'a Client>,
    pub service: Option<&'a Service>,
    pub location: Option<&'a Location>,
    pub branch: Option<&'a Branch>,
    pub offer: Option<&'a Offer>,
}

fn links(id: &Option<RecordId>) -> Vec<RecordId> {
    id.iter().cloned().collect()
}

fn lookup<T, F>(record: Option<&T>, field: F) -> Lookup<String>
where
    F: FnOnce(&T) -> Option<String>,
{
    Lookup::from(record.and_then(field))
}

impl PageView {
    /// Join a page with the records it links to
    pub fn assemble(page: &Page, linked: PageLinks<'_>) -> Self {
        let PageLinks {
            client,
            service,
            location,
            branch,
            offer,
        } = linked;

        Self {
            id: page.id.clone(),
            client: links(&page.client),
            service: links(&page.service),
            location: links(&page.location),
            matched_branch: links(&page.matched_branch),
            offer: links(&page.offer),
            target_keyword: page.target_keyword.clone(),
            content: page.content.clone(),

            service_slug: lookup(service, |s| Some(s.slug.clone())),
            service_name: lookup(service, |s| Some(s.name.clone())),
            service_description: lookup(service, |s| s.description.clone()),

            location_slug: lookup(location, |l| Some(l.slug.clone())),
            city: lookup(location, |l| Some(l.city.clone())),
            state: lookup(location, |l| Some(l.state.clone())),
            seo_keywords: lookup(location, |l| l.seo_keywords.clone()),

            branch_name: lookup(branch, |b| Some(b.name.clone())),
            branch_phone: lookup(branch, |b| b.phone.clone()),
            branch_email: lookup(branch, |b| b.email.clone()),
            branch_address: lookup(branch, |b| b.address.clone()),
            branch_timezone: lookup(branch, |b| b.timezone.clone()),
            branch_hours: lookup(branch, |b| b.hours.clone()),

            primary_color: lookup(client, |c| c.primary_color.clone()),
            secondary_color: lookup(client, |c| c.secondary_color.clone()),
            logo_url: lookup(client, |c| c.logo_url.clone()),
            google_fonts: lookup(client, |c| c.google_fonts.clone()),
            gtm_container_id: lookup(client, |c| c.gtm_container_id.clone()),
            ga_property_id: lookup(client, |c| c.ga_property_id.clone()),

            offer_name: lookup(offer, |o| Some(o.name.clone())),
            offer_type: lookup(offer, |o| o.offer_type.clone()),
            discount_value: lookup(offer, |o| o.discount_value.clone()),
            offer_description: lookup(offer, |o| o.description.clone()),
            fine_print: lookup(offer, |o| o.fine_print.clone()),
            offer_start_date: lookup(offer, |o| o.start_date.map(|d| d.to_string())),
            offer_end_date: lookup(offer, |o| o.end_date.map(|d| d.to_string())),
            utm_campaign: lookup(offer, |o| o.utm_campaign.clone()),
        }
    }

    pub fn client_id(&self) -> Option<&RecordId> {
        self.client.first()
    }

    pub fn service_id(&self) -> Option<&RecordId> {
        self.service.first()
    }

    pub fn branch_id(&self) -> Option<&RecordId> {
        self.matched_branch.first()
    }

    pub fn offer_id(&self) -> Option<&RecordId> {
        self.offer.first()
    }
}

/// Join every page with its linked records in one pass
pub fn assemble_page_views(
    pages: &[Page],
    clients: &[Client],
    services: &[Service],
    locations: &[Location],
    branches: &[Branch],
    offers: &[Offer],
) -> Vec<PageView> {
    fn index<'a, T>(
        records: &'a [T],
        id: impl Fn(&'a T) -> &'a RecordId,
    ) -> HashMap<&'a RecordId, &'a T> {
        records.iter().map(|r| (id(r), r)).collect()
    }

    fn resolve<'a, T>(
        table: &'static str,
        page: &RecordId,
        link: &Option<RecordId>,
        records: &HashMap<&'a RecordId, &'a T>,
    ) -> Option<&'a T> {
        let id = link.as_ref()?;
        let found = records.get(id).copied();
        if found.is_none() {
            debug!(page = %page, table, linked = %id, "Dangling link on page");
        }
        found
    }

    let clients = index(clients, |c| &c.id);
    let services = index(services, |s| &s.id);
    let locations = index(locations, |l| &l.id);
    let branches = index(branches, |b| &b.id);
    let offers = index(offers, |o| &o.id);

    pages
        .iter()
        .map(|page| {
            let linked = PageLinks {
                client: resolve("Clients", &page.id, &page.client, &clients),
                service: resolve("Services", &page.id, &page.service, &services),
                location: resolve("Locations", &page.id, &page.location, &locations),
                branch: resolve("Branches", &page.id, &page.matched_branch, &branches),
                offer: resolve("Offers", &page.id, &page.offer, &offers),
            };
            PageView::assemble(page, linked)
        })
        .collect()
}
