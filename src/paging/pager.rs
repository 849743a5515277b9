//! Pager: loaded pages of one listing presented as a single growing list.
//!
//! A [`Pager`] owns an in-memory cache of pages for exactly one consumer.
//! All mutation goes through its methods; consumers only ever see immutable
//! [`PagingSnapshot`]s, either on demand or pushed through a `watch` channel.
//!
//! # Cancellation
//!
//! Every refresh, source change, [`Pager::cancel`] and [`Pager::dispose`]
//! bumps a generation counter. A load remembers the generation it started
//! under and its result is dropped on arrival if the counter has moved on,
//! so superseded results never reach the cache. Dropping a load future
//! mid-flight restores that direction to `NotLoading`.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_util::Stream;
use tokio::sync::watch;
use tracing::debug;

use super::load_state::{reduce, Direction, LoadState, LoadStates, UiState};
use super::page_source::{LoadParams, LoadResult, PageSource, PagingState};
use crate::models::{Article, PageKey, PageResult};
use crate::sources::SourceError;

/// Pager tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagerConfig {
    /// Items requested per load
    pub page_size: usize,

    /// How close to either end an access must be to trigger the next load
    pub prefetch_distance: usize,
}

impl Default for PagerConfig {
    fn default() -> Self {
        Self {
            page_size: 10,
            prefetch_distance: 10,
        }
    }
}

/// What a load request ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A page was applied to the cache
    Loaded { key: PageKey, count: usize },
    /// The load failed; the direction's state now carries the error
    Failed(SourceError),
    /// Nothing to do: end reached, load already in flight, no source, or disposed
    Skipped,
    /// Superseded before completion; the result was discarded
    Cancelled,
}

impl LoadOutcome {
    pub fn is_loaded(&self) -> bool {
        matches!(self, LoadOutcome::Loaded { .. })
    }
}

/// Immutable view of a pager at one point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagingSnapshot {
    items: Arc<[Article]>,
    load_states: LoadStates,
    started: bool,
    prev_key: Option<PageKey>,
    next_key: Option<PageKey>,
    query: Option<String>,
}

impl PagingSnapshot {
    fn idle() -> Self {
        Self {
            items: Arc::from(Vec::new()),
            load_states: LoadStates::default(),
            started: false,
            prev_key: None,
            next_key: None,
            query: None,
        }
    }

    /// Loaded items in page order
    pub fn items(&self) -> &Arc<[Article]> {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn load_states(&self) -> &LoadStates {
        &self.load_states
    }

    /// Coarse UI state derived from the refresh state and item count
    pub fn ui_state(&self) -> UiState {
        reduce(
            self.started.then_some(&self.load_states.refresh),
            self.items.len(),
        )
    }

    /// Key of the page before the first loaded one
    pub fn prev_key(&self) -> Option<PageKey> {
        self.prev_key
    }

    /// Key of the page after the last loaded one
    pub fn next_key(&self) -> Option<PageKey> {
        self.next_key
    }

    /// Whether the end of the listing has been reached
    pub fn end_reached(&self) -> bool {
        self.started && !self.is_empty() && self.next_key.is_none()
    }

    /// Failure of the last "load more", shown as a retry affordance
    pub fn append_error(&self) -> Option<&SourceError> {
        self.load_states.append.error()
    }

    /// Search query of the listing, if any
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }
}

/// What the pager looked like before the refresh now in flight.
#[derive(Debug, Clone)]
struct RefreshRollback {
    started: bool,
    load_states: LoadStates,
    refresh_key: Option<PageKey>,
}

#[derive(Debug, Default)]
struct PagerState {
    source: Option<Arc<PageSource>>,
    pages: VecDeque<PageResult>,
    load_states: LoadStates,
    started: bool,
    generation: u64,
    /// Start key of the last refresh, replayed by retry
    refresh_key: Option<PageKey>,
    anchor: Option<usize>,
    /// Set while a refresh is in flight; restored if it is abandoned
    rollback: Option<RefreshRollback>,
    disposed: bool,
}

impl PagerState {
    fn item_count(&self) -> usize {
        self.pages.iter().map(PageResult::len).sum()
    }

    fn item_at(&self, mut index: usize) -> Option<Article> {
        for page in &self.pages {
            if index < page.len() {
                return page.items.get(index).cloned();
            }
            index -= page.len();
        }
        None
    }

    fn adjacent_key(&self, direction: Direction) -> Option<PageKey> {
        match direction {
            Direction::Append => self.pages.back().and_then(|p| p.next_key),
            Direction::Prepend => self.pages.front().and_then(|p| p.prev_key),
            Direction::Refresh => None,
        }
    }

    fn snapshot(&self) -> PagingSnapshot {
        PagingSnapshot {
            items: self
                .pages
                .iter()
                .flat_map(|p| p.items.iter().cloned())
                .collect(),
            load_states: self.load_states.clone(),
            started: self.started,
            prev_key: self.pages.front().and_then(|p| p.prev_key),
            next_key: self.pages.back().and_then(|p| p.next_key),
            query: self
                .source
                .as_ref()
                .and_then(|s| s.query().map(str::to_string)),
        }
    }

    fn reset(&mut self) {
        self.generation += 1;
        self.pages.clear();
        self.load_states = LoadStates::default();
        self.started = false;
        self.refresh_key = None;
        self.anchor = None;
        self.rollback = None;
    }

    /// Give up on the in-flight load of `direction` without applying anything.
    ///
    /// An abandoned refresh puts back the state it replaced, so a pager that
    /// had never loaded reads as idle again rather than empty.
    fn abandon(&mut self, direction: Direction) {
        if direction == Direction::Refresh {
            if let Some(rollback) = self.rollback.take() {
                self.started = rollback.started;
                self.refresh_key = rollback.refresh_key;
                self.load_states = rollback.load_states;
                for direction in [Direction::Refresh, Direction::Append, Direction::Prepend] {
                    let slot = self.load_states.get_mut(direction);
                    if slot.is_loading() {
                        *slot = LoadState::NotLoading;
                    }
                }
                return;
            }
        }
        let slot = self.load_states.get_mut(direction);
        if slot.is_loading() {
            *slot = LoadState::NotLoading;
        }
    }
}

#[derive(Debug)]
struct PagerInner {
    config: PagerConfig,
    state: Mutex<PagerState>,
    snapshot: watch::Sender<PagingSnapshot>,
}

impl PagerInner {
    fn lock(&self) -> MutexGuard<'_, PagerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, state: &PagerState) {
        self.snapshot.send_replace(state.snapshot());
    }
}

/// Restores a direction to `NotLoading` if its load future is dropped early.
struct InFlight<'a> {
    inner: &'a PagerInner,
    direction: Direction,
    generation: u64,
    armed: bool,
}

impl<'a> InFlight<'a> {
    fn new(inner: &'a PagerInner, direction: Direction, generation: u64) -> Self {
        Self {
            inner,
            direction,
            generation,
            armed: true,
        }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut state = self.inner.lock();
        if state.generation == self.generation
            && state.load_states.get(self.direction).is_loading()
        {
            debug!(direction = ?self.direction, "Load dropped before completion");
            state.abandon(self.direction);
            self.inner.publish(&state);
        }
    }
}

/// A lazily growing list over one [`PageSource`].
///
/// Cloning a `Pager` yields another handle to the same cache. Create one per
/// consumer and call [`Pager::dispose`] when the consumer goes away.
#[derive(Debug, Clone)]
pub struct Pager {
    inner: Arc<PagerInner>,
}

impl Pager {
    /// Create a pager over `source`. Nothing is loaded until [`Pager::refresh`].
    pub fn create(source: PageSource, config: PagerConfig) -> Self {
        let pager = Self::without_source(config);
        pager.set_source(source);
        pager
    }

    /// Create a pager with no listing yet; loads are skipped until
    /// [`Pager::set_source`] is called.
    pub fn without_source(config: PagerConfig) -> Self {
        let (snapshot, _) = watch::channel(PagingSnapshot::idle());
        Self {
            inner: Arc::new(PagerInner {
                config,
                state: Mutex::new(PagerState::default()),
                snapshot,
            }),
        }
    }

    pub fn config(&self) -> PagerConfig {
        self.inner.config
    }

    /// Current snapshot
    pub fn snapshot(&self) -> PagingSnapshot {
        self.inner.snapshot.borrow().clone()
    }

    /// Current UI state
    pub fn ui_state(&self) -> UiState {
        self.inner.snapshot.borrow().ui_state()
    }

    /// Receive every published snapshot
    pub fn subscribe(&self) -> watch::Receiver<PagingSnapshot> {
        self.inner.snapshot.subscribe()
    }

    /// Stream of the item list, yielding the current list first and then
    /// again whenever it changes. Ends when the last pager handle is dropped.
    pub fn observe_items(&self) -> impl Stream<Item = Arc<[Article]>> + Send + 'static {
        let mut rx = self.subscribe();
        async_stream::stream! {
            let mut last: Option<Arc<[Article]>> = None;
            loop {
                let items = rx.borrow_and_update().items().clone();
                if last.as_deref() != Some(&*items) {
                    last = Some(items.clone());
                    yield items;
                }
                if rx.changed().await.is_err() {
                    break;
                }
            }
        }
    }

    /// Stream of the UI state, yielding the current state first and then
    /// every distinct change. Ends when the last pager handle is dropped.
    pub fn observe_ui_state(&self) -> impl Stream<Item = UiState> + Send + 'static {
        let mut rx = self.subscribe();
        async_stream::stream! {
            let mut last = None;
            loop {
                let ui_state = rx.borrow_and_update().ui_state();
                if last != Some(ui_state) {
                    last = Some(ui_state);
                    yield ui_state;
                }
                if rx.changed().await.is_err() {
                    break;
                }
            }
        }
    }

    /// The listing currently paged
    pub fn source(&self) -> Option<Arc<PageSource>> {
        self.inner.lock().source.clone()
    }

    /// Point the pager at another listing, discarding the cache and any
    /// in-flight load. The pager is idle again until the next refresh.
    pub fn set_source(&self, source: PageSource) {
        let mut state = self.inner.lock();
        if state.disposed {
            return;
        }
        state.reset();
        state.source = Some(Arc::new(source));
        self.inner.publish(&state);
    }

    /// Discard the results of every in-flight load. Loaded items stay, and a
    /// cancelled refresh leaves the pager as it was before that refresh.
    pub fn cancel(&self) {
        let mut state = self.inner.lock();
        state.generation += 1;
        for direction in [Direction::Refresh, Direction::Append, Direction::Prepend] {
            if state.load_states.get(direction).is_loading() {
                state.abandon(direction);
            }
        }
        self.inner.publish(&state);
    }

    /// Release the cache and cancel in-flight loads. Every later call is a no-op.
    pub fn dispose(&self) {
        let mut state = self.inner.lock();
        if state.disposed {
            return;
        }
        state.reset();
        state.source = None;
        state.disposed = true;
        self.inner.publish(&state);
        debug!("Pager disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.lock().disposed
    }

    /// Reload from the first page.
    ///
    /// Items already shown stay visible until the new first page arrives and
    /// replaces the whole cache; a failed refresh keeps them. A second refresh
    /// issued before the first completes supersedes it.
    pub async fn refresh(&self) -> LoadOutcome {
        self.refresh_from(None).await
    }

    /// Reload starting at the page around the consumer's last accessed item.
    pub async fn reload_at_anchor(&self) -> LoadOutcome {
        let key = self.refresh_key();
        self.refresh_from(key).await
    }

    /// Key a refresh would start from to keep the last accessed item in view
    pub fn refresh_key(&self) -> Option<PageKey> {
        let state = self.inner.lock();
        let source = state.source.clone()?;
        let pages: Vec<PageResult> = state.pages.iter().cloned().collect();
        source.refresh_key(&PagingState {
            pages: &pages,
            anchor_position: state.anchor,
        })
    }

    async fn refresh_from(&self, key: Option<PageKey>) -> LoadOutcome {
        let (source, generation) = {
            let mut state = self.inner.lock();
            if state.disposed {
                return LoadOutcome::Skipped;
            }
            let Some(source) = state.source.clone() else {
                return LoadOutcome::Skipped;
            };
            state.generation += 1;
            if state.rollback.is_none() {
                state.rollback = Some(RefreshRollback {
                    started: state.started,
                    load_states: state.load_states.clone(),
                    refresh_key: state.refresh_key,
                });
            }
            state.started = true;
            state.refresh_key = key;
            state.load_states = LoadStates {
                refresh: LoadState::Loading,
                ..Default::default()
            };
            self.inner.publish(&state);
            (source, state.generation)
        };

        let mut in_flight = InFlight::new(&self.inner, Direction::Refresh, generation);
        let result = source
            .load(LoadParams::new(key, self.inner.config.page_size))
            .await;
        in_flight.disarm();

        let mut state = self.inner.lock();
        if state.generation != generation {
            debug!(generation, "Discarding superseded refresh result");
            return LoadOutcome::Cancelled;
        }

        state.rollback = None;
        let outcome = match result {
            LoadResult::Page(page) => {
                let outcome = LoadOutcome::Loaded {
                    key: page.key(),
                    count: page.len(),
                };
                state.pages = VecDeque::from([page]);
                state.anchor = None;
                state.load_states.refresh = LoadState::NotLoading;
                outcome
            }
            LoadResult::Error(e) => {
                state.load_states.refresh = LoadState::Error(e.clone());
                LoadOutcome::Failed(e)
            }
        };
        self.inner.publish(&state);
        outcome
    }

    /// Load the page after the last loaded one and append it.
    ///
    /// Skipped when there is no next page or an append is already in flight.
    pub async fn load_next(&self) -> LoadOutcome {
        self.load_adjacent(Direction::Append).await
    }

    /// Load the page before the first loaded one and prepend it.
    pub async fn load_previous(&self) -> LoadOutcome {
        self.load_adjacent(Direction::Prepend).await
    }

    async fn load_adjacent(&self, direction: Direction) -> LoadOutcome {
        let (source, generation, key) = {
            let mut state = self.inner.lock();
            if state.disposed || state.load_states.refresh.is_loading() {
                return LoadOutcome::Skipped;
            }
            let Some(source) = state.source.clone() else {
                return LoadOutcome::Skipped;
            };
            if state.load_states.get(direction).is_loading() {
                return LoadOutcome::Skipped;
            }
            let Some(key) = state.adjacent_key(direction) else {
                return LoadOutcome::Skipped;
            };
            *state.load_states.get_mut(direction) = LoadState::Loading;
            self.inner.publish(&state);
            (source, state.generation, key)
        };

        let mut in_flight = InFlight::new(&self.inner, direction, generation);
        let result = source
            .load(LoadParams::new(Some(key), self.inner.config.page_size))
            .await;
        in_flight.disarm();

        let mut state = self.inner.lock();
        if state.generation != generation {
            debug!(generation, ?direction, "Discarding superseded page result");
            return LoadOutcome::Cancelled;
        }

        let outcome = match result {
            LoadResult::Page(page) => {
                let count = page.len();
                if direction == Direction::Prepend {
                    state.pages.push_front(page);
                    state.anchor = state.anchor.map(|a| a + count);
                } else {
                    state.pages.push_back(page);
                }
                *state.load_states.get_mut(direction) = LoadState::NotLoading;
                LoadOutcome::Loaded { key, count }
            }
            LoadResult::Error(e) => {
                *state.load_states.get_mut(direction) = LoadState::Error(e.clone());
                LoadOutcome::Failed(e)
            }
        };
        self.inner.publish(&state);
        outcome
    }

    /// Re-issue whichever operation last failed: refresh (from the same
    /// start key), then append, then prepend.
    pub async fn retry(&self) -> LoadOutcome {
        let (states, key) = {
            let state = self.inner.lock();
            (state.load_states.clone(), state.refresh_key)
        };

        if states.refresh.is_error() {
            self.refresh_from(key).await
        } else if states.append.is_error() {
            self.load_next().await
        } else if states.prepend.is_error() {
            self.load_previous().await
        } else {
            LoadOutcome::Skipped
        }
    }

    /// Item at `index`, recording it as the consumer's anchor.
    ///
    /// Accessing within `prefetch_distance` of either end loads the adjacent
    /// page before returning.
    pub async fn get(&self, index: usize) -> Option<Article> {
        let (item, near_end, near_start) = {
            let mut state = self.inner.lock();
            if state.disposed {
                return None;
            }
            state.anchor = Some(index);
            let distance = self.inner.config.prefetch_distance;
            (
                state.item_at(index),
                index.saturating_add(distance) >= state.item_count(),
                index < distance,
            )
        };

        if near_end {
            self.load_next().await;
        }
        if near_start {
            self.load_previous().await;
        }
        item
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::mock::{make_page, MockSource};
    use futures_util::StreamExt;
    use std::time::Duration;

    fn pager_with(mock: &Arc<MockSource>) -> Pager {
        Pager::create(
            PageSource::browse(mock.clone(), &["bbc-news"], "key"),
            PagerConfig::default(),
        )
    }

    fn titles(snapshot: &PagingSnapshot) -> Vec<String> {
        snapshot.items().iter().map(|a| a.title.clone()).collect()
    }

    #[tokio::test]
    async fn test_idle_until_refresh() {
        let mock = Arc::new(MockSource::new());
        let pager = pager_with(&mock);

        assert_eq!(pager.ui_state(), UiState::Idle);
        assert!(mock.calls().is_empty());
    }

    #[tokio::test]
    async fn test_refresh_then_append_preserves_order() {
        let mock = Arc::new(MockSource::new());
        mock.set_response(None, 1, Ok(make_page("p1", 0..3, 9)));
        mock.set_response(None, 2, Ok(make_page("p2", 0..3, 9)));
        mock.set_response(None, 3, Ok(make_page("p3", 0..3, 3)));
        let pager = pager_with(&mock);

        assert_eq!(
            pager.refresh().await,
            LoadOutcome::Loaded { key: 1, count: 3 }
        );
        assert!(pager.load_next().await.is_loaded());
        assert!(pager.load_next().await.is_loaded());
        assert_eq!(pager.load_next().await, LoadOutcome::Skipped);

        let snapshot = pager.snapshot();
        let mut expected = Vec::new();
        for prefix in ["p1", "p2", "p3"] {
            for n in 0..3 {
                expected.push(format!("{} {}", prefix, n));
            }
        }
        assert_eq!(titles(&snapshot), expected);
        assert!(snapshot.end_reached());
        assert_eq!(snapshot.ui_state(), UiState::Success);
    }

    #[tokio::test]
    async fn test_append_error_keeps_items() {
        let mock = Arc::new(MockSource::new());
        mock.set_response(None, 1, Ok(make_page("p1", 0..5, 50)));
        mock.enqueue(None, 2, Err(SourceError::Network("timeout".to_string())));
        mock.set_response(None, 2, Ok(make_page("p2", 0..5, 50)));
        let pager = pager_with(&mock);

        pager.refresh().await;
        assert!(matches!(pager.load_next().await, LoadOutcome::Failed(_)));

        let snapshot = pager.snapshot();
        assert_eq!(snapshot.len(), 5);
        assert_eq!(snapshot.ui_state(), UiState::Success);
        assert!(snapshot.append_error().is_some());

        assert!(pager.retry().await.is_loaded());
        let snapshot = pager.snapshot();
        assert_eq!(snapshot.len(), 10);
        assert!(snapshot.append_error().is_none());
    }

    #[tokio::test]
    async fn test_one_append_in_flight() {
        let mock = Arc::new(MockSource::new());
        mock.set_response(None, 1, Ok(make_page("p1", 0..5, 50)));
        mock.set_response(None, 2, Ok(make_page("p2", 0..5, 50)));
        let pager = pager_with(&mock);
        pager.refresh().await;

        mock.set_delay(Duration::from_millis(20));
        let (a, b) = tokio::join!(pager.load_next(), pager.load_next());

        assert!(a.is_loaded());
        assert_eq!(b, LoadOutcome::Skipped);
        let appends = mock.calls().iter().filter(|c| c.page == 2).count();
        assert_eq!(appends, 1);
    }

    #[tokio::test]
    async fn test_one_prepend_in_flight() {
        let mock = Arc::new(MockSource::new());
        mock.set_response(None, 2, Ok(make_page("p2", 0..5, 50)));
        mock.set_response(None, 3, Ok(make_page("p3", 0..5, 50)));
        let pager = pager_with(&mock);
        assert!(pager.refresh_from(Some(3)).await.is_loaded());

        mock.set_delay(Duration::from_millis(20));
        let (a, b) = tokio::join!(pager.load_previous(), pager.load_previous());

        assert!(a.is_loaded());
        assert_eq!(b, LoadOutcome::Skipped);
        let prepends = mock.calls().iter().filter(|c| c.page == 2).count();
        assert_eq!(prepends, 1);
        assert_eq!(pager.snapshot().len(), 10);
        assert_eq!(pager.snapshot().prev_key(), Some(1));
    }

    #[tokio::test]
    async fn test_cancelled_first_refresh_reads_idle() {
        let mock = Arc::new(MockSource::new());
        mock.set_response(None, 1, Ok(make_page("p1", 0..2, 2)));
        mock.set_delay(Duration::from_millis(20));
        let pager = pager_with(&mock);

        let canceller = pager.clone();
        let (outcome, _) = tokio::join!(pager.refresh(), async move {
            tokio::task::yield_now().await;
            assert_eq!(canceller.ui_state(), UiState::Loading);
            canceller.cancel();
            assert_eq!(canceller.ui_state(), UiState::Idle);
        });

        assert_eq!(outcome, LoadOutcome::Cancelled);
        let snapshot = pager.snapshot();
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.ui_state(), UiState::Idle);
    }

    #[tokio::test]
    async fn test_cancelled_refresh_keeps_previous_state() {
        let mock = Arc::new(MockSource::new());
        mock.set_response(None, 1, Ok(make_page("p1", 0..3, 30)));
        mock.enqueue(None, 2, Err(SourceError::Network("reset".to_string())));
        let pager = pager_with(&mock);
        pager.refresh().await;
        pager.load_next().await;
        assert!(pager.snapshot().append_error().is_some());

        mock.set_delay(Duration::from_millis(20));
        let canceller = pager.clone();
        let (outcome, _) = tokio::join!(pager.refresh(), async move {
            tokio::task::yield_now().await;
            canceller.cancel();
        });

        assert_eq!(outcome, LoadOutcome::Cancelled);
        let snapshot = pager.snapshot();
        assert_eq!(snapshot.len(), 3);
        assert_eq!(snapshot.ui_state(), UiState::Success);
        assert!(snapshot.append_error().is_some());
        assert_eq!(snapshot.load_states().refresh, LoadState::NotLoading);
    }

    #[tokio::test]
    async fn test_refresh_supersedes_refresh() {
        let mock = Arc::new(MockSource::new());
        mock.set_response(None, 1, Ok(make_page("p1", 0..4, 4)));
        mock.set_delay(Duration::from_millis(10));
        let pager = pager_with(&mock);

        let (first, second) = tokio::join!(pager.refresh(), pager.refresh());

        assert_eq!(first, LoadOutcome::Cancelled);
        assert!(second.is_loaded());
        assert_eq!(pager.snapshot().len(), 4);
    }

    #[tokio::test]
    async fn test_refresh_cancels_append() {
        let mock = Arc::new(MockSource::new());
        mock.set_response(None, 1, Ok(make_page("p1", 0..2, 20)));
        mock.set_response(None, 2, Ok(make_page("p2", 0..2, 20)));
        let pager = pager_with(&mock);
        pager.refresh().await;

        mock.set_delay(Duration::from_millis(10));
        let (append, refresh) = tokio::join!(pager.load_next(), pager.refresh());

        assert_eq!(append, LoadOutcome::Cancelled);
        assert!(refresh.is_loaded());
        assert_eq!(titles(&pager.snapshot()), vec!["p1 0", "p1 1"]);
        assert_eq!(pager.snapshot().load_states().append, LoadState::NotLoading);
    }

    #[tokio::test]
    async fn test_stale_items_visible_while_refreshing() {
        let mock = Arc::new(MockSource::new());
        mock.set_response(None, 1, Ok(make_page("p1", 0..3, 3)));
        let pager = pager_with(&mock);
        pager.refresh().await;

        let mut rx = pager.subscribe();
        mock.set_delay(Duration::from_millis(10));
        let refreshing = pager.clone();
        let handle = tokio::spawn(async move { refreshing.refresh().await });

        rx.changed().await.unwrap();
        {
            let snapshot = rx.borrow_and_update();
            assert_eq!(snapshot.ui_state(), UiState::Loading);
            assert_eq!(snapshot.len(), 3);
        }
        assert!(handle.await.unwrap().is_loaded());
        assert_eq!(pager.ui_state(), UiState::Success);
    }

    #[tokio::test]
    async fn test_dropped_load_restores_state() {
        let mock = Arc::new(MockSource::new());
        mock.set_response(None, 1, Ok(make_page("p1", 0..2, 20)));
        let pager = pager_with(&mock);
        pager.refresh().await;

        mock.set_delay(Duration::from_secs(60));
        let result = tokio::time::timeout(Duration::from_millis(5), pager.load_next()).await;
        assert!(result.is_err());

        assert_eq!(pager.snapshot().load_states().append, LoadState::NotLoading);
    }

    #[tokio::test]
    async fn test_prepend_after_anchor_reload() {
        let mock = Arc::new(MockSource::new());
        mock.set_response(None, 1, Ok(make_page("p1", 0..2, 20)));
        mock.set_response(None, 2, Ok(make_page("p2", 0..2, 20)));
        mock.set_response(None, 3, Ok(make_page("p3", 0..2, 20)));
        let pager = Pager::create(
            PageSource::browse(mock.clone(), &["cnn"], "key"),
            PagerConfig {
                page_size: 2,
                prefetch_distance: 0,
            },
        );

        pager.refresh().await;
        pager.load_next().await;
        pager.load_next().await;
        assert_eq!(pager.get(4).await.map(|a| a.title), Some("p3 0".to_string()));
        assert_eq!(pager.refresh_key(), Some(3));

        assert_eq!(
            pager.reload_at_anchor().await,
            LoadOutcome::Loaded { key: 3, count: 2 }
        );
        assert_eq!(pager.snapshot().prev_key(), Some(2));

        assert!(pager.load_previous().await.is_loaded());
        assert_eq!(titles(&pager.snapshot()), vec!["p2 0", "p2 1", "p3 0", "p3 1"]);
    }

    #[tokio::test]
    async fn test_get_prefetches_near_end() {
        let mock = Arc::new(MockSource::new());
        mock.set_response(None, 1, Ok(make_page("p1", 0..10, 30)));
        mock.set_response(None, 2, Ok(make_page("p2", 0..10, 30)));
        let pager = Pager::create(
            PageSource::browse(mock.clone(), &["cnn"], "key"),
            PagerConfig {
                page_size: 10,
                prefetch_distance: 3,
            },
        );
        pager.refresh().await;

        assert!(pager.get(2).await.is_some());
        assert_eq!(pager.snapshot().len(), 10);

        assert!(pager.get(7).await.is_some());
        assert_eq!(pager.snapshot().len(), 20);
        assert_eq!(pager.get(99).await, None);
    }

    #[tokio::test]
    async fn test_dispose() {
        let mock = Arc::new(MockSource::new());
        mock.set_response(None, 1, Ok(make_page("p1", 0..2, 20)));
        let pager = pager_with(&mock);
        pager.refresh().await;

        pager.dispose();

        assert!(pager.is_disposed());
        assert!(pager.snapshot().is_empty());
        assert_eq!(pager.refresh().await, LoadOutcome::Skipped);
        assert_eq!(pager.load_next().await, LoadOutcome::Skipped);
        assert_eq!(pager.get(0).await, None);
    }

    #[tokio::test]
    async fn test_dispose_discards_in_flight() {
        let mock = Arc::new(MockSource::new());
        mock.set_response(None, 1, Ok(make_page("p1", 0..2, 20)));
        mock.set_delay(Duration::from_millis(10));
        let pager = pager_with(&mock);

        let disposer = pager.clone();
        let (outcome, _) = tokio::join!(pager.refresh(), async move {
            tokio::task::yield_now().await;
            disposer.dispose();
        });

        assert_eq!(outcome, LoadOutcome::Cancelled);
        assert!(pager.snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_set_source_resets() {
        let mock = Arc::new(MockSource::new());
        mock.set_response(None, 1, Ok(make_page("p1", 0..2, 20)));
        let pager = pager_with(&mock);
        pager.refresh().await;

        pager.set_source(PageSource::search(mock.clone(), "rust", &["cnn"], "key"));

        let snapshot = pager.snapshot();
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.ui_state(), UiState::Idle);
        assert_eq!(snapshot.query(), Some("rust"));
    }

    #[tokio::test]
    async fn test_without_source_skips() {
        let pager = Pager::without_source(PagerConfig::default());
        assert_eq!(pager.refresh().await, LoadOutcome::Skipped);
        assert_eq!(pager.retry().await, LoadOutcome::Skipped);
        assert!(pager.source().is_none());
    }

    #[tokio::test]
    async fn test_observe_ui_state() {
        let mock = Arc::new(MockSource::new());
        mock.set_response(None, 1, Ok(make_page("p1", 0..2, 2)));
        let pager = pager_with(&mock);
        let mut states = Box::pin(pager.observe_ui_state());

        assert_eq!(states.next().await, Some(UiState::Idle));
        pager.refresh().await;
        // Intermediate Loading may be coalesced by the watch channel.
        let mut last = states.next().await;
        if last == Some(UiState::Loading) {
            last = states.next().await;
        }
        assert_eq!(last, Some(UiState::Success));
    }

    #[tokio::test]
    async fn test_observe_items_ends_on_drop() {
        let mock = Arc::new(MockSource::new());
        mock.set_response(None, 1, Ok(make_page("p1", 0..2, 2)));
        let pager = pager_with(&mock);
        pager.refresh().await;

        let mut items = Box::pin(pager.observe_items());
        assert_eq!(items.next().await.map(|i| i.len()), Some(2));

        drop(pager);
        assert_eq!(items.next().await, None);
    }
}
