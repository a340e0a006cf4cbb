use chrono::NaiveDate;
use landgen_catalog::KeywordPolicy;
use async_trait::async_trait;
use landgen_core::{
    BatchInsert, Branch, CatalogRepository, Client, ContentRepository, Location, NewPage, Offer,
    OfferRepository, Page, PageRepository, PageUpdate, PageView, Service, ServiceArea,
    StaffMember, StoreResult, Targeting, Testimonial,
};
use landgen_pages::{PageKey, PageSynthesizer, TriggerError, TriggerRunner};
use landgen_shared::{ReasonCode, RecordId, ResultKind};
use landgen_store::{Dataset, MemoryStore};
use std::collections::HashSet;
use std::sync::Arc;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 4, 1).unwrap()
}

fn id(s: &str) -> RecordId {
    RecordId::new(s)
}

fn client() -> Client {
    Client {
        id: id("acme"),
        name: "Acme Baths".to_string(),
        domain: Some("acmebaths.com".to_string()),
        active: true,
        logo_url: None,
        primary_color: None,
        secondary_color: None,
        google_fonts: None,
        gtm_container_id: None,
        ga_property_id: None,
    }
}

fn location(key: &str, city: &str, state: &str) -> Location {
    Location {
        id: id(key),
        city: city.to_string(),
        state: state.to_string(),
        slug: city.to_lowercase().replace(' ', "-"),
        active: true,
        seo_keywords: None,
    }
}

fn bathroom_service(keywords: &str) -> Service {
    Service {
        id: id("bath"),
        name: "Bathroom Remodeling".to_string(),
        slug: "bathroom-remodeling".to_string(),
        keywords: Some(keywords.to_string()),
        active: true,
        client: Some(id("acme")),
        description: None,
    }
}

fn offer(key: &str) -> Offer {
    Offer {
        id: id(key),
        name: key.to_string(),
        client: Some(id("acme")),
        start_date: NaiveDate::from_ymd_opt(2025, 3, 1),
        end_date: NaiveDate::from_ymd_opt(2025, 5, 31),
        target_services: Targeting::Unrestricted,
        target_locations: Targeting::Unrestricted,
        target_branches: Targeting::Unrestricted,
        offer_type: Some("Percentage".to_string()),
        discount_value: Some("15%".to_string()),
        description: None,
        fine_print: None,
        utm_campaign: None,
    }
}

fn branch(key: &str, name: &str) -> Branch {
    Branch {
        id: id(key),
        name: name.to_string(),
        client: Some(id("acme")),
        active: true,
        phone: Some("(330) 555-0100".to_string()),
        email: None,
        address: None,
        timezone: None,
        hours: None,
        latitude: Some(41.14),
        longitude: Some(-81.86),
    }
}

fn area(key: &str, branch: &str, location: &str) -> ServiceArea {
    ServiceArea {
        id: id(key),
        branch: Some(id(branch)),
        location: Some(id(location)),
        active: true,
    }
}

/// One service with two valid keywords and one too short, two active offers,
/// three Ohio locations
fn ohio_dataset() -> Dataset {
    Dataset {
        clients: vec![client()],
        locations: vec![
            location("strongsville", "Strongsville", "OH"),
            location("medina", "Medina", "OH"),
            location("brunswick", "Brunswick", "OH"),
        ],
        services: vec![bathroom_service("bathroom remodel, tub install, ab")],
        offers: vec![offer("spring"), offer("summer")],
        branches: vec![branch("b-medina", "Medina Branch"), branch("b-akron", "Akron Branch")],
        service_areas: vec![
            area("sa1", "b-medina", "strongsville"),
            area("sa2", "b-medina", "medina"),
        ],
        ..Default::default()
    }
}

fn runner(store: Arc<MemoryStore>) -> TriggerRunner {
    TriggerRunner::new(store, PageSynthesizer::default()).with_today(today())
}

async fn assert_unique(store: &MemoryStore) {
    let pages = store.list_pages().await.unwrap();
    let mut seen = HashSet::new();
    for page in &pages {
        let key = PageKey::of_page(page).expect("generated pages carry a full key");
        assert!(seen.insert(key), "duplicate page {:?}", page.id);
    }
}

#[tokio::test]
async fn test_new_keywords_create_twelve_pages_then_none() {
    let store = Arc::new(MemoryStore::new(ohio_dataset()));
    let runner = runner(store.clone());

    let first = runner.keywords_changed(&id("bath")).await.unwrap();
    assert_eq!(first.result, ResultKind::Success);
    assert_eq!(first.counters.created, Some(12));
    assert_eq!(first.counters.skipped, Some(0));
    assert_eq!(first.counters.invalid_keywords, Some(1));
    assert_eq!(first.counters.matching_offers, Some(2));
    assert_eq!(store.page_count().await, 12);

    let second = runner.keywords_changed(&id("bath")).await.unwrap();
    assert_eq!(second.counters.created, Some(0));
    assert_eq!(second.counters.skipped, Some(12));
    assert_eq!(store.page_count().await, 12);

    let pages = store.list_pages().await.unwrap();
    assert!(pages.iter().all(|p| !p.published && p.status == "Draft"));
    assert!(pages.iter().all(|p| p.target_keyword.as_deref() != Some("ab")));
    assert!(pages.iter().all(|p| p.client == Some(id("acme"))));
}

#[tokio::test]
async fn test_new_location_without_offers_is_a_warning() {
    let mut dataset = ohio_dataset();
    dataset.locations.push(location("denver", "Denver", "CO"));
    for offer in &mut dataset.offers {
        offer.target_locations = Targeting::only(["strongsville"]);
    }
    let store = Arc::new(MemoryStore::new(dataset));

    let outcome = runner(store.clone())
        .location_created(&id("denver"))
        .await
        .unwrap();

    assert_eq!(outcome.result, ResultKind::Warning);
    assert_eq!(outcome.reason, Some(ReasonCode::NoMatchingOffers));
    assert_eq!(outcome.counters.created, Some(0));
    assert!(!outcome.is_error());
    assert_eq!(store.page_count().await, 0);
}

#[tokio::test]
async fn test_new_location_creates_pages_for_that_location_only() {
    let store = Arc::new(MemoryStore::new(ohio_dataset()));

    let outcome = runner(store.clone())
        .location_created(&id("medina"))
        .await
        .unwrap();

    // 2 keywords x 2 offers
    assert_eq!(outcome.counters.created, Some(4));
    let pages = store.list_pages().await.unwrap();
    assert!(pages.iter().all(|p| p.location == Some(id("medina"))));
}

#[tokio::test]
async fn test_overlapping_triggers_never_duplicate() {
    let store = Arc::new(MemoryStore::new(ohio_dataset()));
    let runner = runner(store.clone());

    runner.location_created(&id("medina")).await.unwrap();
    runner.offer_updated(&id("spring")).await.unwrap();
    runner.keywords_changed(&id("bath")).await.unwrap();
    runner.offer_updated(&id("summer")).await.unwrap();
    runner.location_created(&id("brunswick")).await.unwrap();

    assert_eq!(store.page_count().await, 12);
    assert_unique(&store).await;
}

#[tokio::test]
async fn test_offer_branch_targets_intersect_locations() {
    let mut dataset = ohio_dataset();
    dataset.offers = vec![Offer {
        target_locations: Targeting::only(["strongsville", "medina", "brunswick"]),
        target_branches: Targeting::only(["b-medina"]),
        ..offer("spring")
    }];
    let store = Arc::new(MemoryStore::new(dataset));

    let outcome = runner(store.clone())
        .offer_updated(&id("spring"))
        .await
        .unwrap();

    assert_eq!(outcome.counters.locations_processed, Some(2));
    assert_eq!(outcome.counters.estimated_total, Some(4));
    assert_eq!(outcome.counters.created, Some(4));
    let pages = store.list_pages().await.unwrap();
    assert!(pages.iter().all(|p| p.location != Some(id("brunswick"))));
}

#[tokio::test]
async fn test_expired_offer_is_skipped() {
    let mut dataset = ohio_dataset();
    dataset.offers[0].end_date = NaiveDate::from_ymd_opt(2025, 3, 15);
    let store = Arc::new(MemoryStore::new(dataset));

    let outcome = runner(store.clone())
        .offer_updated(&id("spring"))
        .await
        .unwrap();

    assert_eq!(outcome.result, ResultKind::Skipped);
    assert_eq!(outcome.reason, Some(ReasonCode::OfferNotActive));
    assert_eq!(outcome.counters.offer_status.as_deref(), Some("Expired"));
    assert_eq!(store.page_count().await, 0);
}

#[tokio::test]
async fn test_one_explicit_service_target() {
    let mut dataset = ohio_dataset();
    dataset.services.push(Service {
        id: id("kitchen"),
        name: "Kitchen Remodeling".to_string(),
        slug: "kitchen-remodeling".to_string(),
        keywords: Some("kitchen remodel".to_string()),
        active: true,
        client: Some(id("acme")),
        description: None,
    });
    dataset.offers = vec![Offer {
        target_services: Targeting::only(["kitchen"]),
        ..offer("spring")
    }];
    let store = Arc::new(MemoryStore::new(dataset));

    let outcome = runner(store.clone())
        .offer_updated(&id("spring"))
        .await
        .unwrap();

    assert_eq!(outcome.counters.services_processed, Some(1));
    assert_eq!(outcome.counters.created, Some(3));
    let pages = store.list_pages().await.unwrap();
    assert!(pages.iter().all(|p| p.service == Some(id("kitchen"))));
}

#[tokio::test]
async fn test_failed_batch_does_not_stop_the_rest() {
    let store = Arc::new(MemoryStore::new(ohio_dataset()));
    store.fail_batch(1).await;
    let runner = TriggerRunner::new(
        store.clone(),
        PageSynthesizer::new(KeywordPolicy::default(), 5),
    )
    .with_today(today());

    let outcome = runner.keywords_changed(&id("bath")).await.unwrap();
    assert_eq!(outcome.result, ResultKind::Warning);
    assert_eq!(outcome.reason, Some(ReasonCode::BatchFailures));
    assert_eq!(outcome.counters.created, Some(7));
    assert_eq!(outcome.counters.errors, Some(5));
    assert_eq!(outcome.counters.failed_batches, Some(1));

    // A re-run fills in exactly the pages the refused batch would have made
    let retry = runner.keywords_changed(&id("bath")).await.unwrap();
    assert_eq!(retry.result, ResultKind::Success);
    assert_eq!(retry.counters.created, Some(5));
    assert_eq!(retry.counters.skipped, Some(7));
    assert_unique(&store).await;
}

#[tokio::test]
async fn test_inactive_service_and_empty_keywords_are_skipped() {
    let mut dataset = ohio_dataset();
    dataset.services[0].active = false;
    dataset.services.push(Service {
        id: id("roof"),
        keywords: Some("  ".to_string()),
        ..bathroom_service("")
    });
    let store = Arc::new(MemoryStore::new(dataset));
    let runner = runner(store.clone());

    let inactive = runner.keywords_changed(&id("bath")).await.unwrap();
    assert_eq!(inactive.result, ResultKind::Skipped);
    assert_eq!(inactive.reason, Some(ReasonCode::ServiceInactive));

    let blank = runner.keywords_changed(&id("roof")).await.unwrap();
    assert_eq!(blank.result, ResultKind::Skipped);
    assert_eq!(blank.reason, Some(ReasonCode::NoKeywords));
}

#[tokio::test]
async fn test_national_pages_when_no_locations_exist() {
    let mut dataset = ohio_dataset();
    dataset.locations.clear();
    dataset.service_areas.clear();
    let store = Arc::new(MemoryStore::new(dataset));
    let runner = runner(store.clone());

    let outcome = runner.keywords_changed(&id("bath")).await.unwrap();
    assert_eq!(outcome.counters.created, Some(4));
    let pages = store.list_pages().await.unwrap();
    assert!(pages.iter().all(|p| p.location.is_none()));

    let again = runner.keywords_changed(&id("bath")).await.unwrap();
    assert_eq!(again.counters.created, Some(0));
    assert_eq!(again.counters.skipped, Some(4));
}

#[tokio::test]
async fn test_branch_matching_is_idempotent() {
    let store = Arc::new(MemoryStore::new(ohio_dataset()));
    let runner = runner(store.clone());
    runner.location_created(&id("strongsville")).await.unwrap();

    let page_id = store.list_pages().await.unwrap()[0].id.clone();

    let first = runner.match_branch(&page_id).await.unwrap();
    assert_eq!(first.result, ResultKind::Updated);
    assert_eq!(first.counters.match_source.as_deref(), Some("service_area"));
    assert_eq!(store.page_updates(), 1);

    let second = runner.match_branch(&page_id).await.unwrap();
    assert_eq!(second.result, ResultKind::NoChange);
    assert_eq!(store.page_updates(), 1);

    let page = store.get_page(&page_id).await.unwrap().unwrap();
    assert_eq!(page.matched_branch, Some(id("b-medina")));
}

#[tokio::test]
async fn test_branch_drift_is_corrected_with_fallback_warning() {
    let store = Arc::new(MemoryStore::new(ohio_dataset()));
    let runner = runner(store.clone());
    runner.location_created(&id("brunswick")).await.unwrap();
    let page_id = store.list_pages().await.unwrap()[0].id.clone();

    let outcome = runner.match_branch(&page_id).await.unwrap();
    assert_eq!(outcome.reason, Some(ReasonCode::DefaultBranchFallback));
    assert_eq!(outcome.counters.match_source.as_deref(), Some("default_branch"));

    let page = store.get_page(&page_id).await.unwrap().unwrap();
    // "Akron Branch" sorts before "Medina Branch"
    assert_eq!(page.matched_branch, Some(id("b-akron")));
    assert!(page.notes.unwrap().contains("Brunswick OH"));

    let again = runner.match_branch(&page_id).await.unwrap();
    assert_eq!(again.result, ResultKind::NoChange);
    assert_eq!(store.page_updates(), 1);
}

#[tokio::test]
async fn test_unknown_input_ids_halt() {
    let store = Arc::new(MemoryStore::new(ohio_dataset()));
    let runner = runner(store);

    assert!(matches!(
        runner.match_branch(&id("recMissing")).await,
        Err(TriggerError::NotFound { table: "Pages", .. })
    ));
    assert!(matches!(
        runner.offer_updated(&id("")).await,
        Err(TriggerError::MissingInput("offer"))
    ));
}

#[tokio::test]
async fn test_clean_match_clears_fallback_warning() {
    let store = Arc::new(MemoryStore::new(ohio_dataset()));
    let runner = runner(store.clone());
    runner.location_created(&id("brunswick")).await.unwrap();
    let page_id = store.list_pages().await.unwrap()[0].id.clone();

    runner.match_branch(&page_id).await.unwrap();
    let page = store.get_page(&page_id).await.unwrap().unwrap();
    assert_eq!(page.matched_branch, Some(id("b-akron")));
    assert!(page.notes.is_some());

    store
        .edit(|data| data.service_areas.push(area("sa3", "b-medina", "brunswick")))
        .await;

    let outcome = runner.match_branch(&page_id).await.unwrap();
    assert_eq!(outcome.result, ResultKind::Updated);
    assert_eq!(outcome.counters.match_source.as_deref(), Some("service_area"));
    let page = store.get_page(&page_id).await.unwrap().unwrap();
    assert_eq!(page.matched_branch, Some(id("b-medina")));
    assert_eq!(page.notes, None);
}

#[tokio::test]
async fn test_losing_every_branch_unassigns_the_page() {
    let store = Arc::new(MemoryStore::new(ohio_dataset()));
    let runner = runner(store.clone());
    runner.location_created(&id("strongsville")).await.unwrap();
    let page_id = store.list_pages().await.unwrap()[0].id.clone();
    runner.match_branch(&page_id).await.unwrap();

    store
        .edit(|data| data.branches.iter_mut().for_each(|b| b.active = false))
        .await;

    let outcome = runner.match_branch(&page_id).await.unwrap();
    assert_eq!(outcome.result, ResultKind::Error);
    assert_eq!(outcome.reason, Some(ReasonCode::NoActiveBranches));
    let page = store.get_page(&page_id).await.unwrap().unwrap();
    assert_eq!(page.matched_branch, None);
    assert!(page.notes.as_deref().unwrap().starts_with("ERROR: No active branches"));

    let updates = store.page_updates();
    let again = runner.match_branch(&page_id).await.unwrap();
    assert_eq!(again.result, ResultKind::Error);
    assert_eq!(store.page_updates(), updates);

    store
        .edit(|data| data.branches.iter_mut().for_each(|b| b.active = true))
        .await;

    let restored = runner.match_branch(&page_id).await.unwrap();
    assert_eq!(restored.result, ResultKind::Updated);
    let page = store.get_page(&page_id).await.unwrap().unwrap();
    assert_eq!(page.matched_branch, Some(id("b-medina")));
    assert_eq!(page.notes, None);
}

#[tokio::test]
async fn test_refused_records_are_counted_per_page() {
    let store = Arc::new(MemoryStore::new(ohio_dataset()));
    store.refuse_keyword("tub install").await;
    let runner = runner(store.clone());

    let outcome = runner.keywords_changed(&id("bath")).await.unwrap();
    assert_eq!(outcome.result, ResultKind::Warning);
    assert_eq!(outcome.reason, Some(ReasonCode::BatchFailures));
    assert_eq!(outcome.counters.created, Some(6));
    assert_eq!(outcome.counters.errors, Some(6));
    assert_eq!(outcome.counters.failed_batches, None);
    assert_eq!(outcome.warnings.len(), 6);

    let pages = store.list_pages().await.unwrap();
    assert!(pages
        .iter()
        .all(|p| p.target_keyword.as_deref() == Some("bathroom remodel")));
}

/// Serves a fixed, possibly outdated, service listing; everything else
/// reads through to the memory store
struct LaggingListing {
    inner: MemoryStore,
    listed: Vec<Service>,
}

#[async_trait]
impl CatalogRepository for LaggingListing {
    async fn list_clients(&self) -> StoreResult<Vec<Client>> {
        self.inner.list_clients().await
    }

    async fn list_locations(&self) -> StoreResult<Vec<Location>> {
        self.inner.list_locations().await
    }

    async fn get_location(&self, id: &RecordId) -> StoreResult<Option<Location>> {
        self.inner.get_location(id).await
    }

    async fn list_services(&self) -> StoreResult<Vec<Service>> {
        Ok(self.listed.clone())
    }

    async fn get_service(&self, id: &RecordId) -> StoreResult<Option<Service>> {
        self.inner.get_service(id).await
    }

    async fn list_branches(&self) -> StoreResult<Vec<Branch>> {
        self.inner.list_branches().await
    }

    async fn list_service_areas(&self) -> StoreResult<Vec<ServiceArea>> {
        self.inner.list_service_areas().await
    }
}

#[async_trait]
impl OfferRepository for LaggingListing {
    async fn list_offers(&self) -> StoreResult<Vec<Offer>> {
        self.inner.list_offers().await
    }

    async fn get_offer(&self, id: &RecordId) -> StoreResult<Option<Offer>> {
        self.inner.get_offer(id).await
    }
}

#[async_trait]
impl PageRepository for LaggingListing {
    async fn list_pages(&self) -> StoreResult<Vec<Page>> {
        self.inner.list_pages().await
    }

    async fn get_page(&self, id: &RecordId) -> StoreResult<Option<Page>> {
        self.inner.get_page(id).await
    }

    async fn create_pages(&self, pages: &[NewPage]) -> StoreResult<BatchInsert> {
        self.inner.create_pages(pages).await
    }

    async fn update_page(&self, id: &RecordId, update: &PageUpdate) -> StoreResult<()> {
        self.inner.update_page(id, update).await
    }
}

#[async_trait]
impl ContentRepository for LaggingListing {
    async fn list_page_views(&self) -> StoreResult<Vec<PageView>> {
        self.inner.list_page_views().await
    }

    async fn list_active_testimonials(&self) -> StoreResult<Vec<Testimonial>> {
        self.inner.list_active_testimonials().await
    }

    async fn list_active_staff(&self) -> StoreResult<Vec<StaffMember>> {
        self.inner.list_active_staff().await
    }
}

#[tokio::test]
async fn test_new_keywords_use_the_fresh_service_record() {
    // Listing still carries the service's old keyword list
    let stale = LaggingListing {
        inner: MemoryStore::new(ohio_dataset()),
        listed: vec![bathroom_service("bathroom remodel")],
    };
    // Listing has not caught up with the service at all
    let missing = LaggingListing {
        inner: MemoryStore::new(ohio_dataset()),
        listed: Vec::new(),
    };

    for store in [stale, missing] {
        let store = Arc::new(store);
        let runner = TriggerRunner::new(store.clone(), PageSynthesizer::default()).with_today(today());

        let outcome = runner.keywords_changed(&id("bath")).await.unwrap();
        assert_eq!(outcome.result, ResultKind::Success);
        assert_eq!(outcome.counters.matching_offers, Some(2));
        assert_eq!(outcome.counters.created, Some(12));

        let pages = store.list_pages().await.unwrap();
        assert!(pages
            .iter()
            .any(|p| p.target_keyword.as_deref() == Some("tub install")));
    }
}
