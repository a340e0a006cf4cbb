use async_trait::async_trait;
use landgen_core::{
    assemble_page_views, BatchInsert, Branch, CatalogRepository, Client, ContentRepository,
    Location, NewPage, Offer, OfferRepository, Page, PageRepository, PageUpdate, PageView,
    RejectedRecord, Service, ServiceArea, StaffMember, StoreError, StoreResult, Testimonial,
};
use landgen_shared::RecordId;
use std::collections::{BTreeSet, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::fixtures::Dataset;

/// Record store held in memory. Tables keep insertion order.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Dataset>,
    failing_batches: RwLock<BTreeSet<usize>>,
    refused_keywords: RwLock<HashSet<String>>,
    batch_calls: AtomicUsize,
    page_updates: AtomicUsize,
}

impl MemoryStore {
    pub fn new(dataset: Dataset) -> Self {
        Self {
            tables: RwLock::new(dataset),
            ..Default::default()
        }
    }

    pub async fn from_fixture(path: impl AsRef<Path>) -> StoreResult<Self> {
        Ok(Self::new(Dataset::from_path(path).await?))
    }

    /// Refuse the `n`th create batch (zero-based) of this store's lifetime
    pub async fn fail_batch(&self, n: usize) {
        self.failing_batches.write().await.insert(n);
    }

    /// Refuse individual records targeting `keyword`; the rest of their
    /// batch is still inserted
    pub async fn refuse_keyword(&self, keyword: impl Into<String>) {
        self.refused_keywords.write().await.insert(keyword.into());
    }

    /// Edit the tables in place, as an operator would between runs
    pub async fn edit(&self, f: impl FnOnce(&mut Dataset) + Send) {
        f(&mut *self.tables.write().await);
    }

    /// Copy of every table as it stands now
    pub async fn dataset(&self) -> Dataset {
        self.tables.read().await.clone()
    }

    /// Number of page updates applied so far
    pub fn page_updates(&self) -> usize {
        self.page_updates.load(Ordering::SeqCst)
    }

    pub async fn page_count(&self) -> usize {
        self.tables.read().await.pages.len()
    }
}

fn find<T: Clone>(rows: &[T], id: &RecordId, key: impl Fn(&T) -> &RecordId) -> Option<T> {
    rows.iter().find(|r| key(r) == id).cloned()
}

fn new_record_id() -> RecordId {
    RecordId::new(format!("rec{}", Uuid::new_v4().simple()))
}

#[async_trait]
impl CatalogRepository for MemoryStore {
    async fn list_clients(&self) -> StoreResult<Vec<Client>> {
        Ok(self.tables.read().await.clients.clone())
    }

    async fn list_locations(&self) -> StoreResult<Vec<Location>> {
        Ok(self.tables.read().await.locations.clone())
    }

    async fn get_location(&self, id: &RecordId) -> StoreResult<Option<Location>> {
        Ok(find(&self.tables.read().await.locations, id, |l| &l.id))
    }

    async fn list_services(&self) -> StoreResult<Vec<Service>> {
        Ok(self.tables.read().await.services.clone())
    }

    async fn get_service(&self, id: &RecordId) -> StoreResult<Option<Service>> {
        Ok(find(&self.tables.read().await.services, id, |s| &s.id))
    }

    async fn list_branches(&self) -> StoreResult<Vec<Branch>> {
        Ok(self.tables.read().await.branches.clone())
    }

    async fn list_service_areas(&self) -> StoreResult<Vec<ServiceArea>> {
        Ok(self.tables.read().await.service_areas.clone())
    }
}

#[async_trait]
impl OfferRepository for MemoryStore {
    async fn list_offers(&self) -> StoreResult<Vec<Offer>> {
        Ok(self.tables.read().await.offers.clone())
    }

    async fn get_offer(&self, id: &RecordId) -> StoreResult<Option<Offer>> {
        Ok(find(&self.tables.read().await.offers, id, |o| &o.id))
    }
}

#[async_trait]
impl PageRepository for MemoryStore {
    async fn list_pages(&self) -> StoreResult<Vec<Page>> {
        Ok(self.tables.read().await.pages.clone())
    }

    async fn get_page(&self, id: &RecordId) -> StoreResult<Option<Page>> {
        Ok(find(&self.tables.read().await.pages, id, |p| &p.id))
    }

    async fn create_pages(&self, pages: &[NewPage]) -> StoreResult<BatchInsert> {
        let call = self.batch_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_batches.read().await.contains(&call) {
            return Err(StoreError::BatchRejected(format!(
                "batch {} refused ({} records)",
                call,
                pages.len()
            )));
        }

        let refused = self.refused_keywords.read().await;
        let mut tables = self.tables.write().await;
        let mut insert = BatchInsert::default();
        for (index, page) in pages.iter().enumerate() {
            if refused.contains(&page.target_keyword) {
                insert.rejected.push(RejectedRecord {
                    index,
                    reason: format!("Target Keyword \"{}\" refused", page.target_keyword),
                });
                continue;
            }
            let id = new_record_id();
            debug!(page = %id, keyword = %page.target_keyword, "Inserting page");
            tables.pages.push(page.clone().into_page(id.clone()));
            insert.created.push(id);
        }

        Ok(insert)
    }

    async fn update_page(&self, id: &RecordId, update: &PageUpdate) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        let page = tables
            .pages
            .iter_mut()
            .find(|p| &p.id == id)
            .ok_or_else(|| StoreError::NotFound {
                table: "Pages",
                id: id.clone(),
            })?;

        update.matched_branch.apply(&mut page.matched_branch);
        update.notes.apply(&mut page.notes);
        self.page_updates.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl ContentRepository for MemoryStore {
    async fn list_page_views(&self) -> StoreResult<Vec<PageView>> {
        let tables = self.tables.read().await;
        Ok(assemble_page_views(
            &tables.pages,
            &tables.clients,
            &tables.services,
            &tables.locations,
            &tables.branches,
            &tables.offers,
        ))
    }

    async fn list_active_testimonials(&self) -> StoreResult<Vec<Testimonial>> {
        let tables = self.tables.read().await;
        Ok(tables.testimonials.iter().filter(|t| t.active).cloned().collect())
    }

    async fn list_active_staff(&self) -> StoreResult<Vec<StaffMember>> {
        let tables = self.tables.read().await;
        Ok(tables.staff.iter().filter(|s| s.active).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use landgen_core::FieldUpdate;

    fn new_page(keyword: &str) -> NewPage {
        NewPage::new(
            None,
            RecordId::new("svc"),
            None,
            keyword,
            RecordId::new("offer"),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_and_update_pages() {
        let store = MemoryStore::default();
        let insert = store
            .create_pages(&[new_page("shower"), new_page("tub install")])
            .await
            .unwrap();
        assert_eq!(insert.created.len(), 2);

        let id = &insert.created[0];
        store
            .update_page(
                id,
                &PageUpdate {
                    matched_branch: FieldUpdate::Set(RecordId::new("branch")),
                    notes: FieldUpdate::Set("checked".to_string()),
                },
            )
            .await
            .unwrap();

        let page = store.get_page(id).await.unwrap().unwrap();
        assert_eq!(page.matched_branch, Some(RecordId::new("branch")));
        assert_eq!(page.status, "Draft");

        store
            .update_page(
                id,
                &PageUpdate {
                    matched_branch: FieldUpdate::Clear,
                    notes: FieldUpdate::Keep,
                },
            )
            .await
            .unwrap();
        let page = store.get_page(id).await.unwrap().unwrap();
        assert_eq!(page.matched_branch, None);
        assert_eq!(page.notes.as_deref(), Some("checked"));
        assert_eq!(store.page_updates(), 2);
    }

    #[tokio::test]
    async fn test_refused_records_do_not_sink_the_batch() {
        let store = MemoryStore::default();
        store.refuse_keyword("tub install").await;

        let insert = store
            .create_pages(&[new_page("shower"), new_page("tub install"), new_page("vanity")])
            .await
            .unwrap();
        assert_eq!(insert.created.len(), 2);
        assert_eq!(insert.rejected.len(), 1);
        assert_eq!(insert.rejected[0].index, 1);
        assert_eq!(store.page_count().await, 2);
    }

    #[tokio::test]
    async fn test_injected_batch_failure() {
        let store = MemoryStore::default();
        store.fail_batch(1).await;

        assert!(store.create_pages(&[new_page("shower")]).await.is_ok());
        assert!(matches!(
            store.create_pages(&[new_page("tub install")]).await,
            Err(StoreError::BatchRejected(_))
        ));
        assert!(store.create_pages(&[new_page("vanity")]).await.is_ok());
        assert_eq!(store.page_count().await, 2);
    }

    #[tokio::test]
    async fn test_update_missing_page() {
        let store = MemoryStore::default();
        let result = store
            .update_page(&RecordId::new("nope"), &PageUpdate::default())
            .await;
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
    }
}
