use landgen_core::Page;
use landgen_shared::RecordId;
use std::collections::HashSet;

/// Composite identity of a page. `location` is `None` for national pages.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageKey {
    pub service: RecordId,
    pub location: Option<RecordId>,
    pub keyword: String,
    pub offer: RecordId,
}

impl PageKey {
    pub fn new(
        service: &RecordId,
        location: Option<&RecordId>,
        keyword: &str,
        offer: &RecordId,
    ) -> Self {
        Self {
            service: service.clone(),
            location: location.cloned(),
            keyword: keyword.trim().to_string(),
            offer: offer.clone(),
        }
    }

    /// Key of a stored page; pages without a service, offer or keyword
    /// can never collide with a candidate and have none.
    pub fn of_page(page: &Page) -> Option<Self> {
        let service = page.service.as_ref()?;
        let offer = page.offer.as_ref()?;
        let keyword = page.target_keyword.as_deref()?;
        Some(Self::new(service, page.location.as_ref(), keyword, offer))
    }
}

/// Keys of every stored page, built from a fresh read at the start of a run.
/// Keys queued during the run are added too, so one run never queues the
/// same page twice.
#[derive(Debug, Default)]
pub struct DuplicateIndex {
    keys: HashSet<PageKey>,
}

impl DuplicateIndex {
    pub fn from_pages(pages: &[Page]) -> Self {
        Self {
            keys: pages.iter().filter_map(PageKey::of_page).collect(),
        }
    }

    #[cfg(test)]
    fn contains(&self, key: &PageKey) -> bool {
        self.keys.contains(key)
    }

    /// Record a key; `false` if it was already present.
    pub fn insert(&mut self, key: PageKey) -> bool {
        self.keys.insert(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
