use async_trait::async_trait;
use chrono::NaiveDate;
use landgen_core::{
    assemble_page_views, BatchInsert, Branch, CatalogRepository, Client, ContentRepository,
    Location, NewPage, Offer, OfferRepository, Page, PageContent, PageRepository, PageUpdate,
    PageView, Service, ServiceArea, StaffMember, StoreError, StoreResult, Targeting,
    Testimonial,
};
use landgen_shared::RecordId;
use serde_json::Value;
use sqlx::PgPool;
use tracing::{debug, error};
use uuid::Uuid;

/// Record store backed by Postgres
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn backend(e: sqlx::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

fn link(id: Option<String>) -> Option<RecordId> {
    id.filter(|s| !s.trim().is_empty()).map(RecordId::from)
}

fn targeting(ids: Vec<String>) -> Targeting {
    Targeting::from(ids.into_iter().map(RecordId::from).collect::<Vec<_>>())
}

// Internal structs for type-safe querying

#[derive(sqlx::FromRow)]
struct ClientRow {
    id: String,
    name: String,
    domain: Option<String>,
    active: bool,
    logo_url: Option<String>,
    primary_color: Option<String>,
    secondary_color: Option<String>,
    google_fonts: Option<String>,
    gtm_container_id: Option<String>,
    ga_property_id: Option<String>,
}

impl From<ClientRow> for Client {
    fn from(row: ClientRow) -> Self {
        Client {
            id: row.id.into(),
            name: row.name,
            domain: row.domain,
            active: row.active,
            logo_url: row.logo_url,
            primary_color: row.primary_color,
            secondary_color: row.secondary_color,
            google_fonts: row.google_fonts,
            gtm_container_id: row.gtm_container_id,
            ga_property_id: row.ga_property_id,
        }
    }
}

#[derive(sqlx::FromRow)]
struct LocationRow {
    id: String,
    city: String,
    state: String,
    slug: String,
    active: bool,
    seo_keywords: Option<String>,
}

impl From<LocationRow> for Location {
    fn from(row: LocationRow) -> Self {
        Location {
            id: row.id.into(),
            city: row.city,
            state: row.state,
            slug: row.slug,
            active: row.active,
            seo_keywords: row.seo_keywords,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ServiceRow {
    id: String,
    name: String,
    slug: String,
    keywords: Option<String>,
    active: bool,
    client_id: Option<String>,
    description: Option<String>,
}

impl From<ServiceRow> for Service {
    fn from(row: ServiceRow) -> Self {
        Service {
            id: row.id.into(),
            name: row.name,
            slug: row.slug,
            keywords: row.keywords,
            active: row.active,
            client: link(row.client_id),
            description: row.description,
        }
    }
}

#[derive(sqlx::FromRow)]
struct OfferRow {
    id: String,
    name: String,
    client_id: Option<String>,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    target_services: Vec<String>,
    target_locations: Vec<String>,
    target_branches: Vec<String>,
    offer_type: Option<String>,
    discount_value: Option<String>,
    description: Option<String>,
    fine_print: Option<String>,
    utm_campaign: Option<String>,
}

impl From<OfferRow> for Offer {
    fn from(row: OfferRow) -> Self {
        Offer {
            id: row.id.into(),
            name: row.name,
            client: link(row.client_id),
            start_date: row.start_date,
            end_date: row.end_date,
            target_services: targeting(row.target_services),
            target_locations: targeting(row.target_locations),
            target_branches: targeting(row.target_branches),
            offer_type: row.offer_type,
            discount_value: row.discount_value,
            description: row.description,
            fine_print: row.fine_print,
            utm_campaign: row.utm_campaign,
        }
    }
}

#[derive(sqlx::FromRow)]
struct BranchRow {
    id: String,
    name: String,
    client_id: Option<String>,
    active: bool,
    phone: Option<String>,
    email: Option<String>,
    address: Option<String>,
    timezone: Option<String>,
    hours: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
}

impl From<BranchRow> for Branch {
    fn from(row: BranchRow) -> Self {
        Branch {
            id: row.id.into(),
            name: row.name,
            client: link(row.client_id),
            active: row.active,
            phone: row.phone,
            email: row.email,
            address: row.address,
            timezone: row.timezone,
            hours: row.hours,
            latitude: row.latitude,
            longitude: row.longitude,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ServiceAreaRow {
    id: String,
    branch_id: Option<String>,
    location_id: Option<String>,
    active: bool,
}

impl From<ServiceAreaRow> for ServiceArea {
    fn from(row: ServiceAreaRow) -> Self {
        ServiceArea {
            id: row.id.into(),
            branch: link(row.branch_id),
            location: link(row.location_id),
            active: row.active,
        }
    }
}

#[derive(sqlx::FromRow)]
struct PageRow {
    id: String,
    client_id: Option<String>,
    service_id: Option<String>,
    location_id: Option<String>,
    target_keyword: Option<String>,
    offer_id: Option<String>,
    matched_branch_id: Option<String>,
    published: bool,
    status: String,
    notes: Option<String>,
    content: Value,
}

impl TryFrom<PageRow> for Page {
    type Error = StoreError;

    fn try_from(row: PageRow) -> Result<Self, Self::Error> {
        let content: PageContent =
            serde_json::from_value(row.content).map_err(|e| StoreError::Decode {
                table: "pages",
                id: row.id.clone(),
                reason: e.to_string(),
            })?;

        Ok(Page {
            id: row.id.into(),
            client: link(row.client_id),
            service: link(row.service_id),
            location: link(row.location_id),
            target_keyword: row.target_keyword,
            offer: link(row.offer_id),
            matched_branch: link(row.matched_branch_id),
            published: row.published,
            status: row.status,
            notes: row.notes,
            content,
        })
    }
}

#[derive(sqlx::FromRow)]
struct TestimonialRow {
    id: String,
    client_id: Option<String>,
    service_id: Option<String>,
    branch_id: Option<String>,
    rating: Option<i16>,
    active: bool,
    customer_name: Option<String>,
    customer_city: Option<String>,
    customer_state: Option<String>,
    review_title: Option<String>,
    review_text: Option<String>,
    review_date: Option<String>,
    source: Option<String>,
}

impl From<TestimonialRow> for Testimonial {
    fn from(row: TestimonialRow) -> Self {
        Testimonial {
            id: row.id.into(),
            client: link(row.client_id),
            service: link(row.service_id),
            branch: link(row.branch_id),
            rating: row.rating.and_then(|r| u8::try_from(r).ok()),
            active: row.active,
            customer_name: row.customer_name,
            customer_city: row.customer_city,
            customer_state: row.customer_state,
            review_title: row.review_title,
            review_text: row.review_text,
            review_date: row.review_date,
            source: row.source,
        }
    }
}

#[derive(sqlx::FromRow)]
struct StaffRow {
    id: String,
    branch_id: Option<String>,
    active: bool,
    full_name: Option<String>,
    job_title: Option<String>,
    years_experience: Option<i32>,
    bio: Option<String>,
    photo_url: Option<String>,
    primary_contact: bool,
}

impl From<StaffRow> for StaffMember {
    fn from(row: StaffRow) -> Self {
        StaffMember {
            id: row.id.into(),
            branch: link(row.branch_id),
            active: row.active,
            full_name: row.full_name,
            job_title: row.job_title,
            years_experience: row.years_experience.and_then(|y| u32::try_from(y).ok()),
            bio: row.bio,
            photo_url: row.photo_url,
            primary_contact: row.primary_contact,
        }
    }
}

const CLIENT_COLUMNS: &str = "id, name, domain, active, logo_url, primary_color, \
    secondary_color, google_fonts, gtm_container_id, ga_property_id";
const LOCATION_COLUMNS: &str = "id, city, state, slug, active, seo_keywords";
const SERVICE_COLUMNS: &str = "id, name, slug, keywords, active, client_id, description";
const OFFER_COLUMNS: &str = "id, name, client_id, start_date, end_date, target_services, \
    target_locations, target_branches, offer_type, discount_value, description, fine_print, \
    utm_campaign";
const BRANCH_COLUMNS: &str = "id, name, client_id, active, phone, email, address, timezone, \
    hours, latitude, longitude";
const PAGE_COLUMNS: &str = "id, client_id, service_id, location_id, target_keyword, offer_id, \
    matched_branch_id, published, status, notes, content";

impl PgStore {
    async fn fetch_all<R, T>(&self, sql: &str) -> StoreResult<Vec<T>>
    where
        R: for<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> + Send + Unpin,
        T: From<R>,
    {
        let rows: Vec<R> = sqlx::query_as(sql)
            .fetch_all(&self.pool)
            .await
            .map_err(backend)?;
        Ok(rows.into_iter().map(T::from).collect())
    }

    async fn fetch_by_id<R, T>(&self, sql: &str, id: &RecordId) -> StoreResult<Option<T>>
    where
        R: for<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> + Send + Unpin,
        T: From<R>,
    {
        let row: Option<R> = sqlx::query_as(sql)
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;
        Ok(row.map(T::from))
    }
}

#[async_trait]
impl CatalogRepository for PgStore {
    async fn list_clients(&self) -> StoreResult<Vec<Client>> {
        self.fetch_all::<ClientRow, _>(&format!("SELECT {} FROM clients ORDER BY id", CLIENT_COLUMNS))
            .await
    }

    async fn list_locations(&self) -> StoreResult<Vec<Location>> {
        self.fetch_all::<LocationRow, _>(&format!(
            "SELECT {} FROM locations ORDER BY created_at, id",
            LOCATION_COLUMNS
        ))
        .await
    }

    async fn get_location(&self, id: &RecordId) -> StoreResult<Option<Location>> {
        self.fetch_by_id::<LocationRow, _>(
            &format!("SELECT {} FROM locations WHERE id = $1", LOCATION_COLUMNS),
            id,
        )
        .await
    }

    async fn list_services(&self) -> StoreResult<Vec<Service>> {
        self.fetch_all::<ServiceRow, _>(&format!(
            "SELECT {} FROM services ORDER BY created_at, id",
            SERVICE_COLUMNS
        ))
        .await
    }

    async fn get_service(&self, id: &RecordId) -> StoreResult<Option<Service>> {
        self.fetch_by_id::<ServiceRow, _>(
            &format!("SELECT {} FROM services WHERE id = $1", SERVICE_COLUMNS),
            id,
        )
        .await
    }

    async fn list_branches(&self) -> StoreResult<Vec<Branch>> {
        self.fetch_all::<BranchRow, _>(&format!("SELECT {} FROM branches ORDER BY id", BRANCH_COLUMNS))
            .await
    }

    async fn list_service_areas(&self) -> StoreResult<Vec<ServiceArea>> {
        self.fetch_all::<ServiceAreaRow, _>(
            "SELECT id, branch_id, location_id, active FROM service_areas ORDER BY id",
        )
        .await
    }
}

#[async_trait]
impl OfferRepository for PgStore {
    async fn list_offers(&self) -> StoreResult<Vec<Offer>> {
        self.fetch_all::<OfferRow, _>(&format!(
            "SELECT {} FROM offers ORDER BY created_at, id",
            OFFER_COLUMNS
        ))
        .await
    }

    async fn get_offer(&self, id: &RecordId) -> StoreResult<Option<Offer>> {
        self.fetch_by_id::<OfferRow, _>(
            &format!("SELECT {} FROM offers WHERE id = $1", OFFER_COLUMNS),
            id,
        )
        .await
    }
}

#[async_trait]
impl PageRepository for PgStore {
    async fn list_pages(&self) -> StoreResult<Vec<Page>> {
        let rows: Vec<PageRow> = sqlx::query_as(&format!(
            "SELECT {} FROM pages ORDER BY created_at, id",
            PAGE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        rows.into_iter().map(Page::try_from).collect()
    }

    async fn get_page(&self, id: &RecordId) -> StoreResult<Option<Page>> {
        let row: Option<PageRow> =
            sqlx::query_as(&format!("SELECT {} FROM pages WHERE id = $1", PAGE_COLUMNS))
                .bind(id.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(backend)?;

        row.map(Page::try_from).transpose()
    }

    async fn create_pages(&self, pages: &[NewPage]) -> StoreResult<BatchInsert> {
        let mut tx = self.pool.begin().await.map_err(backend)?;
        let mut insert = BatchInsert::default();

        for page in pages {
            let id = format!("rec{}", Uuid::new_v4().simple());
            let result = sqlx::query(
                r#"
                INSERT INTO pages (id, client_id, service_id, location_id, target_keyword, offer_id, published)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(&id)
            .bind(page.client.as_ref().map(RecordId::as_str))
            .bind(page.service.as_str())
            .bind(page.location.as_ref().map(RecordId::as_str))
            .bind(&page.target_keyword)
            .bind(page.offer.as_str())
            .bind(page.published)
            .execute(&mut *tx)
            .await;

            // One bad row refuses the whole batch; the transaction rolls back on drop
            if let Err(e) = result {
                error!(keyword = %page.target_keyword, error = %e, "Page insert failed");
                return Err(StoreError::BatchRejected(e.to_string()));
            }
            debug!(page = %id, keyword = %page.target_keyword, "Inserted page");
            insert.created.push(RecordId::from(id));
        }

        tx.commit().await.map_err(backend)?;
        Ok(insert)
    }

    async fn update_page(&self, id: &RecordId, update: &PageUpdate) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE pages
            SET matched_branch_id = CASE WHEN $2 THEN $3 ELSE matched_branch_id END,
                notes = CASE WHEN $4 THEN $5 ELSE notes END
            WHERE id = $1
            "#,
        )
        .bind(id.as_str())
        .bind(!update.matched_branch.is_keep())
        .bind(update.matched_branch.value().map(RecordId::as_str))
        .bind(!update.notes.is_keep())
        .bind(update.notes.value().map(String::as_str))
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                table: "Pages",
                id: id.clone(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ContentRepository for PgStore {
    async fn list_page_views(&self) -> StoreResult<Vec<PageView>> {
        let (pages, clients, services, locations, branches, offers) = tokio::try_join!(
            self.list_pages(),
            self.list_clients(),
            self.list_services(),
            self.list_locations(),
            self.list_branches(),
            self.list_offers(),
        )?;

        Ok(assemble_page_views(
            &pages, &clients, &services, &locations, &branches, &offers,
        ))
    }

    async fn list_active_testimonials(&self) -> StoreResult<Vec<Testimonial>> {
        self.fetch_all::<TestimonialRow, _>(
            "SELECT id, client_id, service_id, branch_id, rating, active, customer_name, \
             customer_city, customer_state, review_title, review_text, review_date, source \
             FROM testimonials WHERE active ORDER BY id",
        )
        .await
    }

    async fn list_active_staff(&self) -> StoreResult<Vec<StaffMember>> {
        self.fetch_all::<StaffRow, _>(
            "SELECT id, branch_id, active, full_name, job_title, years_experience, bio, \
             photo_url, primary_contact FROM staff_members WHERE active \
             ORDER BY primary_contact DESC, id",
        )
        .await
    }
}
