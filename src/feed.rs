//! Consumer-facing feeds.
//!
//! A [`NewsFeed`] is what a screen holds for the browse listing; a
//! [`SearchFeed`] adds debounced search text on top. Both must be disposed
//! when their consumer goes away.

use std::sync::Arc;
use std::time::Duration;

use futures_util::Stream;

use crate::models::Article;
use crate::paging::{
    LoadOutcome, PageSource, Pager, PagerConfig, PagingSnapshot, QueryController, QueryPhase,
    SourceFactory, UiState,
};

/// A browsable, refreshable list of articles.
#[derive(Debug, Clone)]
pub struct NewsFeed {
    pager: Pager,
}

impl NewsFeed {
    /// A feed over `source`. Call [`NewsFeed::refresh`] to load the first page.
    pub fn new(source: PageSource, config: PagerConfig) -> Self {
        Self {
            pager: Pager::create(source, config),
        }
    }

    fn from_pager(pager: Pager) -> Self {
        Self { pager }
    }

    pub fn pager(&self) -> &Pager {
        &self.pager
    }

    /// Live list of loaded articles; grows with each page and restarts on refresh
    pub fn observe_items(&self) -> impl Stream<Item = Arc<[Article]>> + Send + 'static {
        self.pager.observe_items()
    }

    /// Live UI state
    pub fn observe_ui_state(&self) -> impl Stream<Item = UiState> + Send + 'static {
        self.pager.observe_ui_state()
    }

    pub fn snapshot(&self) -> PagingSnapshot {
        self.pager.snapshot()
    }

    pub fn ui_state(&self) -> UiState {
        self.pager.ui_state()
    }

    pub async fn refresh(&self) -> LoadOutcome {
        self.pager.refresh().await
    }

    /// Load the next page, if there is one
    pub async fn load_more(&self) -> LoadOutcome {
        self.pager.load_next().await
    }

    /// Re-issue the last failed load
    pub async fn retry(&self) -> LoadOutcome {
        self.pager.retry().await
    }

    /// Article at `index`, loading more when close to the end
    pub async fn get(&self, index: usize) -> Option<Article> {
        self.pager.get(index).await
    }

    pub fn dispose(&self) {
        self.pager.dispose();
    }
}

/// A feed whose listing follows a search query.
#[derive(Debug, Clone)]
pub struct SearchFeed {
    feed: NewsFeed,
    controller: QueryController,
}

impl SearchFeed {
    /// An idle search feed; nothing is loaded until a non-empty query settles.
    pub fn new(factory: SourceFactory, config: PagerConfig, debounce: Duration) -> Self {
        let pager = Pager::without_source(config);
        let controller = QueryController::new(pager.clone(), factory, debounce);
        Self {
            feed: NewsFeed::from_pager(pager),
            controller,
        }
    }

    /// The underlying list
    pub fn feed(&self) -> &NewsFeed {
        &self.feed
    }

    /// Replace the search text; see [`QueryController::set_query`]
    pub fn set_query(&self, text: impl Into<String>) {
        self.controller.set_query(text);
    }

    pub fn query(&self) -> String {
        self.controller.query()
    }

    pub fn phase(&self) -> QueryPhase {
        self.controller.phase()
    }

    pub fn observe_items(&self) -> impl Stream<Item = Arc<[Article]>> + Send + 'static {
        self.feed.observe_items()
    }

    pub fn observe_ui_state(&self) -> impl Stream<Item = UiState> + Send + 'static {
        self.feed.observe_ui_state()
    }

    pub fn ui_state(&self) -> UiState {
        self.feed.ui_state()
    }

    pub async fn refresh(&self) -> LoadOutcome {
        self.feed.refresh().await
    }

    pub async fn load_more(&self) -> LoadOutcome {
        self.feed.load_more().await
    }

    pub async fn retry(&self) -> LoadOutcome {
        self.feed.retry().await
    }

    /// Wait until the pending search, if any, has loaded its first page.
    pub async fn settled(&self) {
        let mut phase = self.controller.subscribe_phase();
        // A closed channel means the controller is gone; nothing to wait for.
        let _ = phase.wait_for(|p| *p == QueryPhase::Idle).await;
    }

    pub fn dispose(&self) {
        self.controller.dispose();
        self.feed.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::mock::{make_page, MockSource};
    use crate::sources::NewsSource;
    use futures_util::StreamExt;

    #[tokio::test]
    async fn test_news_feed_load_more() {
        let mock = Arc::new(MockSource::new());
        mock.set_response(None, 1, Ok(make_page("a", 0..10, 25)));
        mock.set_response(None, 2, Ok(make_page("b", 0..10, 25)));
        let feed = NewsFeed::new(
            PageSource::browse(mock.clone(), &["bbc-news"], "key"),
            PagerConfig::default(),
        );

        feed.refresh().await;
        feed.load_more().await;

        let items = Box::pin(feed.observe_items()).next().await.unwrap();
        assert_eq!(items.len(), 20);
        assert_eq!(items[10].title, "b 0");
        assert_eq!(feed.ui_state(), UiState::Success);
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_feed_settles() {
        let mock = Arc::new(MockSource::new());
        mock.set_response(Some("climate"), 1, Ok(make_page("climate", 0..5, 5)));
        let remote: Arc<dyn NewsSource> = mock.clone();
        let factory: SourceFactory =
            Arc::new(move |q: &str| PageSource::search(remote.clone(), q, &["cnn"], "key"));
        let feed = SearchFeed::new(factory, PagerConfig::default(), Duration::from_millis(100));
        assert_eq!(feed.ui_state(), UiState::Idle);

        feed.set_query("climate");
        feed.settled().await;

        assert_eq!(feed.query(), "climate");
        assert_eq!(feed.feed().snapshot().len(), 5);
        assert_eq!(feed.ui_state(), UiState::Success);

        feed.dispose();
        assert!(feed.feed().pager().is_disposed());
    }
}
