//! A single paginated listing: browse or search, bound to one backend.

use std::sync::Arc;

use tracing::{debug, warn};

use super::dedup::dedupe;
use crate::models::{effective_page, map_record, PageKey, PageResult};
use crate::sources::{NewsSource, SourceError};

/// Parameters of one page load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadParams {
    /// Page to load; `None` means the first page
    pub key: Option<PageKey>,

    /// Number of items the pager would like; backends choose their own page size
    pub load_size: usize,
}

impl LoadParams {
    pub fn new(key: Option<PageKey>, load_size: usize) -> Self {
        Self { key, load_size }
    }
}

/// Outcome of a page load. Failures are values, never panics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadResult {
    Page(PageResult),
    Error(SourceError),
}

/// Loaded pages plus the consumer's last anchor, used to pick a refresh key.
#[derive(Debug, Clone, Copy)]
pub struct PagingState<'a> {
    pub pages: &'a [PageResult],
    pub anchor_position: Option<usize>,
}

impl<'a> PagingState<'a> {
    /// The page holding `position`, or the last page when it lies past the end
    pub fn closest_page_to_position(&self, position: usize) -> Option<&'a PageResult> {
        let mut start = 0;
        for page in self.pages {
            if position < start + page.len() {
                return Some(page);
            }
            start += page.len();
        }
        self.pages.last()
    }
}

/// One paginated listing of articles.
///
/// A browse listing is bound to a fixed set of outlet ids; a search listing
/// is additionally bound to a query. Every load goes to the backend, then
/// through [`dedupe`] and [`map_record`] in that order.
#[derive(Debug, Clone)]
pub struct PageSource {
    remote: Arc<dyn NewsSource>,
    sources: String,
    api_key: String,
    query: Option<String>,
}

impl PageSource {
    /// A listing of the newest articles from `sources`
    pub fn browse<S: AsRef<str>>(
        remote: Arc<dyn NewsSource>,
        sources: &[S],
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            remote,
            sources: join_sources(sources),
            api_key: api_key.into(),
            query: None,
        }
    }

    /// A listing of articles from `sources` matching `query`
    pub fn search<S: AsRef<str>>(
        remote: Arc<dyn NewsSource>,
        query: impl Into<String>,
        sources: &[S],
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            remote,
            sources: join_sources(sources),
            api_key: api_key.into(),
            query: Some(query.into()),
        }
    }

    /// Search query, `None` for browse listings
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// Comma-joined outlet ids sent to the backend
    pub fn sources(&self) -> &str {
        &self.sources
    }

    /// Load one page.
    ///
    /// `next_key` is set while the number of deduplicated items on this page
    /// is below the backend's `total_results`. That compares one page against
    /// the whole listing, so heavy duplication can end or extend paging
    /// earlier or later than the true end of data.
    pub async fn load(&self, params: LoadParams) -> LoadResult {
        let page = effective_page(params.key);

        let fetched = match &self.query {
            Some(query) => {
                self.remote
                    .fetch_page_for_query(query, &self.sources, page, &self.api_key)
                    .await
            }
            None => {
                self.remote
                    .fetch_page(&self.sources, page, &self.api_key)
                    .await
            }
        };

        let fetched = match fetched {
            Ok(fetched) => fetched,
            Err(e) => {
                warn!(
                    source = self.remote.id(),
                    page,
                    query = self.query.as_deref(),
                    "Error loading news page: {}",
                    e
                );
                return LoadResult::Error(e);
            }
        };

        let raw_count = fetched.records.len();
        let items: Vec<_> = dedupe(fetched.records)
            .into_iter()
            .map(map_record)
            .collect();

        debug!(
            source = self.remote.id(),
            page,
            load_size = params.load_size,
            count = items.len(),
            duplicates = raw_count - items.len(),
            total_results = fetched.total_results,
            "Loaded news page"
        );

        let next_key = if (items.len() as u64) < fetched.total_results {
            page.checked_add(1)
        } else {
            None
        };
        let prev_key = if page > 1 { Some(page - 1) } else { None };

        LoadResult::Page(PageResult {
            items,
            prev_key,
            next_key,
        })
    }

    /// Key to restart loading from so the anchored item stays in view.
    ///
    /// Uses the page closest to the anchor: one past its `prev_key`, else one
    /// before its `next_key`. `None` (no anchor, no pages, or a lone page with
    /// neither key) means start from the first page.
    pub fn refresh_key(&self, state: &PagingState<'_>) -> Option<PageKey> {
        let anchor = state.anchor_position?;
        let page = state.closest_page_to_position(anchor)?;
        page.prev_key
            .map(|prev| prev + 1)
            .or_else(|| page.next_key.map(|next| next - 1))
    }
}

fn join_sources<S: AsRef<str>>(sources: &[S]) -> String {
    sources
        .iter()
        .map(|s| s.as_ref())
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FetchedPage, RawRecord, UNTITLED};
    use crate::sources::mock::{make_page, MockSource};

    fn page(prev: Option<PageKey>, next: Option<PageKey>, len: usize) -> PageResult {
        PageResult {
            items: (0..len)
                .map(|i| RawRecord::titled(format!("t{}", i)).into_article())
                .collect(),
            prev_key: prev,
            next_key: next,
        }
    }

    fn unwrap_page(result: LoadResult) -> PageResult {
        match result {
            LoadResult::Page(page) => page,
            LoadResult::Error(e) => panic!("expected page, got {}", e),
        }
    }

    #[tokio::test]
    async fn test_first_page_keys() {
        let mock = Arc::new(MockSource::new());
        mock.set_response(None, 1, Ok(make_page("a", 0..10, 25)));

        let source = PageSource::browse(mock.clone(), &["bbc-news", "cnn"], "key");
        let result = unwrap_page(source.load(LoadParams::new(None, 10)).await);

        assert_eq!(result.items.len(), 10);
        assert_eq!(result.prev_key, None);
        assert_eq!(result.next_key, Some(2));
        assert_eq!(mock.calls()[0].sources, "bbc-news,cnn");
    }

    #[tokio::test]
    async fn test_none_key_same_as_page_one() {
        let mock = Arc::new(MockSource::new());
        mock.set_response(None, 1, Ok(make_page("a", 0..4, 9)));
        let source = PageSource::browse(mock.clone(), &["cnn"], "key");

        let implicit = source.load(LoadParams::new(None, 10)).await;
        let explicit = source.load(LoadParams::new(Some(1), 10)).await;

        assert_eq!(implicit, explicit);
        let pages: Vec<u32> = mock.calls().iter().map(|c| c.page).collect();
        assert_eq!(pages, vec![1, 1]);
    }

    #[tokio::test]
    async fn test_middle_page_keys() {
        let mock = Arc::new(MockSource::new());
        mock.set_response(None, 3, Ok(make_page("a", 20..30, 100)));
        let source = PageSource::browse(mock, &["cnn"], "key");

        let result = unwrap_page(source.load(LoadParams::new(Some(3), 10)).await);

        assert_eq!(result.prev_key, Some(2));
        assert_eq!(result.next_key, Some(4));
    }

    #[tokio::test]
    async fn test_no_next_key_when_page_covers_total() {
        let mock = Arc::new(MockSource::new());
        mock.set_response(None, 1, Ok(make_page("a", 0..5, 5)));
        let source = PageSource::browse(mock, &["cnn"], "key");

        let result = unwrap_page(source.load(LoadParams::new(None, 10)).await);
        assert_eq!(result.next_key, None);
    }

    #[tokio::test]
    async fn test_empty_page() {
        let mock = Arc::new(MockSource::new());
        let source = PageSource::browse(mock, &["cnn"], "key");

        let result = unwrap_page(source.load(LoadParams::new(None, 10)).await);
        assert!(result.items.is_empty());
        assert_eq!(result.next_key, None);
    }

    #[tokio::test]
    async fn test_dedupes_before_mapping() {
        let mut fetched = make_page("a", 0..2, 30);
        fetched.records.push(RawRecord::default().author("x"));
        fetched.records.push(RawRecord::titled(UNTITLED));
        fetched.records.push(RawRecord::default().author("y"));
        fetched.records.push(RawRecord::titled("a 0"));

        let mock = Arc::new(MockSource::new());
        mock.set_response(None, 1, Ok(fetched));
        let source = PageSource::browse(mock, &["cnn"], "key");

        let result = unwrap_page(source.load(LoadParams::new(None, 10)).await);

        let titles: Vec<&str> = result.items.iter().map(|a| a.title.as_str()).collect();
        // Missing and literal "Untitled" titles are distinct raw keys.
        assert_eq!(titles, vec!["a 0", "a 1", UNTITLED, UNTITLED]);
        assert_eq!(result.items[2].author, "x");
    }

    #[tokio::test]
    async fn test_search_uses_query() {
        let mock = Arc::new(MockSource::new());
        mock.set_response(Some("rust"), 1, Ok(make_page("rust", 0..3, 3)));
        let source = PageSource::search(mock.clone(), "rust", &["cnn"], "key");

        let result = unwrap_page(source.load(LoadParams::new(None, 10)).await);

        assert_eq!(result.items.len(), 3);
        assert_eq!(source.query(), Some("rust"));
        assert_eq!(mock.calls()[0].query.as_deref(), Some("rust"));
    }

    #[tokio::test]
    async fn test_error_is_a_value() {
        let mock = Arc::new(MockSource::new());
        mock.set_response(
            None,
            1,
            Err(SourceError::Network("connection reset".to_string())),
        );
        let source = PageSource::browse(mock, &["cnn"], "key");

        let result = source.load(LoadParams::new(None, 10)).await;
        assert_eq!(
            result,
            LoadResult::Error(SourceError::Network("connection reset".to_string()))
        );
    }

    #[tokio::test]
    async fn test_exhaustion_compares_page_to_total() {
        // 10 records, 3 repeats: 7 items is still below total 8, so paging
        // continues even though the listing may be exhausted.
        let mut fetched = make_page("a", 0..7, 8);
        for i in 0..3 {
            fetched.records.push(RawRecord::titled(format!("a {}", i)));
        }
        let mock = Arc::new(MockSource::new());
        mock.set_response(None, 1, Ok(fetched));
        let source = PageSource::browse(mock, &["cnn"], "key");

        let result = unwrap_page(source.load(LoadParams::new(None, 10)).await);

        assert_eq!(result.items.len(), 7);
        assert_eq!(result.next_key, Some(2));
    }

    #[test]
    fn test_refresh_key() {
        let source = PageSource::browse(Arc::new(MockSource::new()), &["cnn"], "key");
        let pages = vec![page(Some(1), Some(3), 10), page(Some(2), Some(4), 10)];

        let state = PagingState {
            pages: &pages,
            anchor_position: Some(12),
        };
        assert_eq!(source.refresh_key(&state), Some(3));

        let state = PagingState {
            pages: &pages,
            anchor_position: Some(0),
        };
        assert_eq!(source.refresh_key(&state), Some(2));

        let state = PagingState {
            pages: &pages,
            anchor_position: Some(500),
        };
        assert_eq!(source.refresh_key(&state), Some(3));
    }

    #[test]
    fn test_refresh_key_falls_back_to_next_key() {
        let source = PageSource::browse(Arc::new(MockSource::new()), &["cnn"], "key");
        let pages = vec![page(None, Some(2), 10)];
        let state = PagingState {
            pages: &pages,
            anchor_position: Some(4),
        };
        assert_eq!(source.refresh_key(&state), Some(1));
    }

    #[test]
    fn test_refresh_key_none() {
        let source = PageSource::browse(Arc::new(MockSource::new()), &["cnn"], "key");

        let lone = vec![page(None, None, 3)];
        let no_anchor = PagingState {
            pages: &lone,
            anchor_position: None,
        };
        assert_eq!(source.refresh_key(&no_anchor), None);

        let anchored = PagingState {
            pages: &lone,
            anchor_position: Some(1),
        };
        assert_eq!(source.refresh_key(&anchored), None);

        let empty = PagingState {
            pages: &[],
            anchor_position: Some(1),
        };
        assert_eq!(source.refresh_key(&empty), None);
    }

    #[test]
    fn test_closest_page_skips_empty_pages() {
        let pages = vec![page(None, Some(2), 2), page(Some(1), Some(3), 0), page(Some(2), None, 2)];
        let state = PagingState {
            pages: &pages,
            anchor_position: None,
        };
        assert_eq!(state.closest_page_to_position(2).map(|p| p.key()), Some(3));
    }

    #[test]
    fn test_fetched_page_helper() {
        assert_eq!(FetchedPage::empty().total_results, 0);
    }
}
