//! Paginated cache store that decides between cached pages and backend fetches.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

use super::clock::{Clock, SystemClock};
use super::filters::ListFilters;
use super::page::{PageEntry, PageState};
use super::traits::{CacheSource, Listable};
use crate::error::{GatewayError, Result};

pub const DEFAULT_TTL_MS: i64 = 60_000;
pub const DEFAULT_ITEMS_PER_PAGE: usize = 10;

/// A page served by the cache.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageView<T> {
  pub items: Vec<T>,
  pub current_page: u32,
  pub total_pages: u32,
  pub total_items: usize,
  pub source: CacheSource,
  pub cached_at: Option<DateTime<Utc>>,
  pub cache_key: String,
}

/// Diagnostic view of the whole store.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheSnapshot {
  pub entity: &'static str,
  pub current_page: u32,
  pub filters: ListFilters,
  pub total_items: usize,
  pub total_pages: u32,
  pub cache_key: String,
  pub pages: BTreeMap<u32, PageSnapshot>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSnapshot {
  pub state: PageState,
  pub items: usize,
  pub error: Option<String>,
  pub timestamp: Option<DateTime<Utc>>,
}

struct CacheState<T> {
  pages: HashMap<u32, PageEntry<T>>,
  current_page: u32,
  filters: ListFilters,
  total_items: usize,
  total_pages: u32,
  /// Bumped whenever cached pages are discarded; fetches started under an
  /// older generation do not write back.
  generation: u64,
}

impl<T> Default for CacheState<T> {
  fn default() -> Self {
    Self {
      pages: HashMap::new(),
      current_page: 1,
      filters: ListFilters::default(),
      total_items: 0,
      total_pages: 1,
      generation: 0,
    }
  }
}

impl<T> CacheState<T> {
  /// Any criteria change starts over from page 1 with an empty cache.
  fn reset(&mut self) {
    self.clear_pages();
    self.current_page = 1;
  }

  fn clear_pages(&mut self) {
    self.pages.clear();
    self.generation += 1;
  }
}

/// Clears the loading flag of a page if its fetch future is dropped early.
struct LoadingGuard<'a, T> {
  state: &'a Mutex<CacheState<T>>,
  page: u32,
  generation: u64,
  armed: bool,
}

impl<T> LoadingGuard<'_, T> {
  fn disarm(&mut self) {
    self.armed = false;
  }
}

impl<T> Drop for LoadingGuard<'_, T> {
  fn drop(&mut self) {
    if !self.armed {
      return;
    }
    if let Ok(mut state) = self.state.lock() {
      if state.generation == self.generation {
        if let Some(entry) = state.pages.get_mut(&self.page) {
          entry.clear_loading();
        }
      }
    }
  }
}

/// Page cache for one entity type.
///
/// Pages are keyed by page number under the current filters. A page younger
/// than the TTL with no error is served without calling the backend. There is
/// no in-flight de-duplication: two misses for the same page both fetch, and
/// whichever finishes last is what the cache holds. A fetch that finishes
/// after the criteria changed (or the cache was invalidated) is returned to
/// its caller but not stored.
pub struct PageCache<T: Listable> {
  state: Mutex<CacheState<T>>,
  clock: Arc<dyn Clock>,
  ttl: Duration,
  items_per_page: usize,
}

impl<T: Listable> PageCache<T> {
  pub fn new() -> Self {
    Self::with_clock(Arc::new(SystemClock))
  }

  pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
    Self {
      state: Mutex::new(CacheState::default()),
      clock,
      ttl: Duration::milliseconds(DEFAULT_TTL_MS),
      items_per_page: DEFAULT_ITEMS_PER_PAGE,
    }
  }

  fn lock(&self) -> Result<MutexGuard<'_, CacheState<T>>> {
    self
      .state
      .lock()
      .map_err(|e| GatewayError::Cache(format!("Lock poisoned: {}", e)))
  }

  /// Replace all criteria. Returns whether anything changed.
  pub fn set_filters(&self, filters: ListFilters) -> Result<bool> {
    let mut state = self.lock()?;
    if state.filters == filters {
      return Ok(false);
    }
    info!(entity = T::entity_type(), ?filters, "List criteria changed, clearing page cache");
    state.filters = filters;
    state.reset();
    Ok(true)
  }

  /// Drop every cached page, keeping criteria and current page.
  pub fn invalidate(&self) -> Result<()> {
    let mut state = self.lock()?;
    state.clear_pages();
    debug!(entity = T::entity_type(), "Page cache invalidated");
    Ok(())
  }

  /// Serve `page` (or the current page) from cache, fetching on a miss.
  ///
  /// 1. Valid errorless entry - return it, no fetch
  /// 2. Otherwise mark loading and call `fetcher` for the full result set
  /// 3. Filter, sort, and slice to the page window; store with a fresh timestamp
  /// 4. On failure, record the error on the entry and keep its old items
  ///
  /// Steps 3 and 4 only touch the store if no reset happened meanwhile.
  pub async fn fetch_page<F, Fut>(&self, page: Option<u32>, fetcher: F) -> Result<PageView<T>>
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Vec<T>>>,
  {
    let (page, filters, generation) = {
      let mut state = self.lock()?;
      let page = page.unwrap_or(state.current_page).max(1);
      state.current_page = page;

      let now = self.clock.now();
      if let Some(entry) = state.pages.get(&page) {
        if entry.is_servable(now, self.ttl) {
          debug!(entity = T::entity_type(), page, "Page cache hit");
          return Ok(PageView {
            items: entry.items.clone(),
            current_page: page,
            total_pages: state.total_pages,
            total_items: state.total_items,
            source: CacheSource::Cache,
            cached_at: entry.timestamp,
            cache_key: state.filters.cache_hash(T::entity_type()),
          });
        }
      }

      state.pages.entry(page).or_default().mark_loading();
      (page, state.filters.clone(), state.generation)
    };

    let mut guard = LoadingGuard {
      state: &self.state,
      page,
      generation,
      armed: true,
    };

    debug!(entity = T::entity_type(), page, "Page cache miss, fetching");
    let outcome = fetcher().await;
    guard.disarm();

    match outcome {
      Ok(all) => {
        let matching = filters.apply(all);
        let total_items = matching.len();
        let total_pages = total_pages(total_items, self.items_per_page);
        let start = (page as usize - 1) * self.items_per_page;
        let items: Vec<T> = matching
          .into_iter()
          .skip(start)
          .take(self.items_per_page)
          .collect();

        let now = self.clock.now();
        let mut state = self.lock()?;
        if self.is_current(&state, generation, page) {
          state.total_items = total_items;
          state.total_pages = total_pages;
          state
            .pages
            .entry(page)
            .or_default()
            .mark_loaded(items.clone(), now);
        }

        Ok(PageView {
          items,
          current_page: page,
          total_pages,
          total_items,
          source: CacheSource::Network,
          cached_at: Some(now),
          cache_key: filters.cache_hash(T::entity_type()),
        })
      }
      Err(e) => {
        let message = format!("Failed to load page {}: {}", page, e);
        warn!(entity = T::entity_type(), page, error = %e, "Page fetch failed");
        let mut state = self.lock()?;
        if self.is_current(&state, generation, page) {
          state.pages.entry(page).or_default().mark_error(message.clone());
        }
        Err(GatewayError::Cache(message))
      }
    }
  }

  fn is_current(&self, state: &CacheState<T>, generation: u64, page: u32) -> bool {
    let current = state.generation == generation;
    if !current {
      debug!(entity = T::entity_type(), page, "Cache reset during fetch, result not stored");
    }
    current
  }

  pub fn snapshot(&self) -> Result<CacheSnapshot> {
    let state = self.lock()?;
    let now = self.clock.now();
    let pages = state
      .pages
      .iter()
      .map(|(page, entry)| {
        (
          *page,
          PageSnapshot {
            state: entry.state(now, self.ttl),
            items: entry.items.len(),
            error: entry.error.clone(),
            timestamp: entry.timestamp,
          },
        )
      })
      .collect();

    Ok(CacheSnapshot {
      entity: T::entity_type(),
      current_page: state.current_page,
      filters: state.filters.clone(),
      total_items: state.total_items,
      total_pages: state.total_pages,
      cache_key: state.filters.cache_hash(T::entity_type()),
      pages,
    })
  }
}

impl<T: Listable> Default for PageCache<T> {
  fn default() -> Self {
    Self::new()
  }
}

fn total_pages(total_items: usize, items_per_page: usize) -> u32 {
  (total_items.div_ceil(items_per_page)).max(1) as u32
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::clock::ManualClock;
  use crate::cache::filters::{SortOrder, SortSpec};
  use std::cmp::Ordering;
  use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

  #[derive(Debug, Clone, Serialize, PartialEq)]
  struct Item {
    id: usize,
    name: String,
    status: &'static str,
  }

  impl Listable for Item {
    fn entity_type() -> &'static str {
      "item"
    }
    fn search_fields(&self) -> Vec<&str> {
      vec![self.name.as_str()]
    }
    fn status(&self) -> Option<&str> {
      Some(self.status)
    }
    fn sort_fields() -> &'static [&'static str] {
      &["id"]
    }
    fn compare_by(&self, other: &Self, field: &str) -> Ordering {
      match field {
        "id" => self.id.cmp(&other.id),
        _ => Ordering::Equal,
      }
    }
  }

  fn items(n: usize) -> Vec<Item> {
    (1..=n)
      .map(|id| Item {
        id,
        name: format!("item {}", id),
        status: if id % 2 == 0 { "inactive" } else { "active" },
      })
      .collect()
  }

  /// Backend double counting how often it is called.
  #[derive(Clone, Default)]
  struct Backend {
    calls: Arc<AtomicUsize>,
  }

  impl Backend {
    fn fetch(&self, n: usize) -> impl Future<Output = Result<Vec<Item>>> {
      self.calls.fetch_add(1, AtomicOrdering::SeqCst);
      async move { Ok(items(n)) }
    }

    fn calls(&self) -> usize {
      self.calls.load(AtomicOrdering::SeqCst)
    }
  }

  fn search(query: &str) -> ListFilters {
    ListFilters::new(Some(query), None, None)
  }

  fn cache() -> (PageCache<Item>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new());
    (PageCache::with_clock(clock.clone()), clock)
  }

  #[tokio::test]
  async fn test_repeat_fetch_hits_cache() {
    let (cache, _) = cache();
    let backend = Backend::default();

    let first = cache.fetch_page(Some(1), || backend.fetch(25)).await.unwrap();
    let second = cache.fetch_page(Some(1), || backend.fetch(25)).await.unwrap();

    assert_eq!(backend.calls(), 1);
    assert_eq!(first.source, CacheSource::Network);
    assert_eq!(second.source, CacheSource::Cache);
    assert_eq!(first.items, second.items);
  }

  #[tokio::test]
  async fn test_page_window_and_totals() {
    let (cache, _) = cache();
    let backend = Backend::default();

    let page = cache.fetch_page(Some(3), || backend.fetch(25)).await.unwrap();
    let ids: Vec<usize> = page.items.iter().map(|i| i.id).collect();
    assert_eq!(ids, (21..=25).collect::<Vec<_>>());
    assert_eq!(page.total_items, 25);
    assert_eq!(page.total_pages, 3);
    assert_eq!(cache.snapshot().unwrap().current_page, 3);
  }

  #[tokio::test]
  async fn test_empty_result_has_one_page() {
    let (cache, _) = cache();
    let page = cache
      .fetch_page(None, || async { Ok(Vec::<Item>::new()) })
      .await
      .unwrap();
    assert!(page.items.is_empty());
    assert_eq!(page.total_pages, 1);
    assert_eq!(page.current_page, 1);
  }

  #[tokio::test]
  async fn test_expired_page_is_refetched() {
    let (cache, clock) = cache();
    let backend = Backend::default();

    cache.fetch_page(Some(1), || backend.fetch(5)).await.unwrap();
    clock.advance(Duration::milliseconds(59_999));
    cache.fetch_page(Some(1), || backend.fetch(5)).await.unwrap();
    assert_eq!(backend.calls(), 1);

    clock.advance(Duration::milliseconds(1));
    let page = cache.fetch_page(Some(1), || backend.fetch(5)).await.unwrap();
    assert_eq!(backend.calls(), 2);
    assert_eq!(page.source, CacheSource::Network);
  }

  #[tokio::test]
  async fn test_filter_change_resets_page_and_clears_cache() {
    let (cache, _) = cache();
    let backend = Backend::default();

    cache.fetch_page(Some(1), || backend.fetch(30)).await.unwrap();
    cache.fetch_page(Some(2), || backend.fetch(30)).await.unwrap();
    assert_eq!(cache.snapshot().unwrap().current_page, 2);

    assert!(cache.set_filters(search("item 1")).unwrap());
    let snapshot = cache.snapshot().unwrap();
    assert_eq!(snapshot.current_page, 1);
    assert!(snapshot.pages.is_empty());

    let page = cache.fetch_page(None, || backend.fetch(30)).await.unwrap();
    assert_eq!(backend.calls(), 3);
    assert_eq!(page.current_page, 1);
    // "item 1", "item 10".."item 19"
    assert_eq!(page.total_items, 11);

    assert!(cache
      .set_filters(ListFilters::new(Some("item 1"), Some("inactive"), None))
      .unwrap());
    assert_eq!(cache.snapshot().unwrap().current_page, 1);
    cache.fetch_page(None, || backend.fetch(30)).await.unwrap();
    assert_eq!(backend.calls(), 4);
  }

  #[tokio::test]
  async fn test_identical_filter_is_noop() {
    let (cache, _) = cache();
    let backend = Backend::default();

    cache.set_filters(search("item")).unwrap();
    cache.fetch_page(Some(2), || backend.fetch(30)).await.unwrap();
    assert!(!cache.set_filters(search(" item ")).unwrap());
    assert!(!cache
      .set_filters(ListFilters::new(Some("item"), Some("all"), None))
      .unwrap());
    assert_eq!(cache.snapshot().unwrap().current_page, 2);

    cache.fetch_page(None, || backend.fetch(30)).await.unwrap();
    assert_eq!(backend.calls(), 1);
  }

  #[tokio::test]
  async fn test_sort_change_clears_cache() {
    let (cache, _) = cache();
    let backend = Backend::default();

    cache.fetch_page(Some(1), || backend.fetch(12)).await.unwrap();
    let sort = SortSpec {
      field: "id".into(),
      order: SortOrder::Desc,
    };
    cache.set_filters(ListFilters::new(None, None, Some(sort))).unwrap();
    let page = cache.fetch_page(None, || backend.fetch(12)).await.unwrap();

    assert_eq!(backend.calls(), 2);
    assert_eq!(page.items[0].id, 12);
  }

  #[tokio::test]
  async fn test_failure_keeps_previous_items() {
    let (cache, clock) = cache();
    let backend = Backend::default();

    cache.fetch_page(Some(1), || backend.fetch(5)).await.unwrap();
    clock.advance(Duration::milliseconds(DEFAULT_TTL_MS));

    let err = cache
      .fetch_page(Some(1), || async {
        Err::<Vec<Item>, _>(GatewayError::Decode("backend down".into()))
      })
      .await
      .unwrap_err();
    assert!(err.to_string().starts_with("Failed to load page 1: "));

    let snapshot = cache.snapshot().unwrap();
    let entry = &snapshot.pages[&1];
    assert_eq!(entry.state, PageState::Error);
    assert_eq!(entry.items, 5);

    // The error forces a refetch even though the entry has items
    cache.fetch_page(Some(1), || backend.fetch(5)).await.unwrap();
    assert_eq!(backend.calls(), 2);
    assert_eq!(cache.snapshot().unwrap().pages[&1].state, PageState::Loaded);
  }

  #[tokio::test]
  async fn test_failure_does_not_touch_other_pages() {
    let (cache, _) = cache();
    let backend = Backend::default();

    cache.fetch_page(Some(1), || backend.fetch(25)).await.unwrap();
    let _ = cache
      .fetch_page(Some(2), || async {
        Err::<Vec<Item>, _>(GatewayError::Decode("nope".into()))
      })
      .await;

    let page = cache.fetch_page(Some(1), || backend.fetch(25)).await.unwrap();
    assert_eq!(page.source, CacheSource::Cache);
  }

  #[tokio::test]
  async fn test_concurrent_misses_both_fetch() {
    let (cache, _) = cache();
    let backend = Backend::default();

    let slow = |n: usize| {
      let backend = backend.clone();
      move || {
        let fut = backend.fetch(n);
        async move {
          tokio::time::sleep(std::time::Duration::from_millis(20)).await;
          fut.await
        }
      }
    };

    let (a, b) = futures::join!(
      cache.fetch_page(Some(1), slow(3)),
      cache.fetch_page(Some(1), slow(4))
    );
    assert_eq!(a.unwrap().source, CacheSource::Network);
    assert_eq!(b.unwrap().source, CacheSource::Network);
    assert_eq!(backend.calls(), 2);
  }

  #[tokio::test]
  async fn test_invalidate_keeps_criteria() {
    let (cache, _) = cache();
    let backend = Backend::default();

    cache.set_filters(search("item")).unwrap();
    cache.fetch_page(Some(2), || backend.fetch(30)).await.unwrap();
    cache.invalidate().unwrap();

    let snapshot = cache.snapshot().unwrap();
    assert_eq!(snapshot.current_page, 2);
    assert_eq!(snapshot.filters.search_query, "item");
    assert!(snapshot.pages.is_empty());
    cache.fetch_page(None, || backend.fetch(30)).await.unwrap();
    assert_eq!(backend.calls(), 2);
  }

  #[tokio::test]
  async fn test_fetch_finishing_after_filter_change_is_not_stored() {
    let (cache, _) = cache();
    let backend = Backend::default();

    let slow = {
      let backend = backend.clone();
      move || {
        let fut = backend.fetch(30);
        async move {
          tokio::time::sleep(std::time::Duration::from_millis(50)).await;
          fut.await
        }
      }
    };
    let change = async {
      tokio::time::sleep(std::time::Duration::from_millis(10)).await;
      cache.set_filters(search("item 2")).unwrap();
    };

    let (stale, ()) = futures::join!(cache.fetch_page(Some(1), slow), change);
    // The caller that started the fetch still gets its own result
    let stale = stale.unwrap();
    assert_eq!(stale.source, CacheSource::Network);
    assert_eq!(stale.total_items, 30);
    assert_eq!(stale.cache_key, ListFilters::default().cache_hash("item"));

    let snapshot = cache.snapshot().unwrap();
    assert!(snapshot.pages.is_empty());
    assert_eq!(snapshot.total_items, 0);

    let page = cache.fetch_page(Some(1), || backend.fetch(30)).await.unwrap();
    assert_eq!(page.source, CacheSource::Network);
    assert_eq!(backend.calls(), 2);
    // "item 2", "item 20".."item 29"
    assert_eq!(page.total_items, 11);
    assert!(page.items.iter().all(|i| i.name.contains("item 2")));
  }

  #[tokio::test]
  async fn test_fetch_finishing_after_invalidate_is_not_stored() {
    let (cache, _) = cache();
    let backend = Backend::default();

    let slow = {
      let backend = backend.clone();
      move || {
        let fut = backend.fetch(5);
        async move {
          tokio::time::sleep(std::time::Duration::from_millis(30)).await;
          fut.await
        }
      }
    };
    let invalidate = async {
      tokio::time::sleep(std::time::Duration::from_millis(5)).await;
      cache.invalidate().unwrap();
    };
    let (result, ()) = futures::join!(cache.fetch_page(Some(1), slow), invalidate);
    assert!(result.is_ok());

    let page = cache.fetch_page(Some(1), || backend.fetch(5)).await.unwrap();
    assert_eq!(page.source, CacheSource::Network);
    assert_eq!(backend.calls(), 2);
  }

  #[tokio::test]
  async fn test_dropped_fetch_does_not_stay_loading() {
    let (cache, _) = cache();

    let pending = cache.fetch_page(Some(1), || async {
      tokio::time::sleep(std::time::Duration::from_secs(5)).await;
      Ok(items(3))
    });
    let timed_out = tokio::time::timeout(std::time::Duration::from_millis(10), pending).await;
    assert!(timed_out.is_err());

    let snapshot = cache.snapshot().unwrap();
    assert_eq!(snapshot.pages[&1].state, PageState::Unloaded);
  }
}
