//! Debounced search-query handling.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::page_source::PageSource;
use super::pager::Pager;

/// Default quiet period before a query change triggers a search
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(100);

/// Builds the listing for a query.
pub type SourceFactory = Arc<dyn Fn(&str) -> PageSource + Send + Sync>;

/// Where the controller is between a query change and its first page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryPhase {
    #[default]
    Idle,
    /// Waiting for the query to settle
    Debouncing,
    /// First page of the current query in flight
    Searching,
}

#[derive(Debug, Default)]
struct QueryState {
    query: String,
    generation: u64,
    pending: Option<JoinHandle<()>>,
    disposed: bool,
}

struct QueryInner {
    pager: Pager,
    factory: SourceFactory,
    debounce: Duration,
    state: Mutex<QueryState>,
    phase: watch::Sender<QueryPhase>,
}

impl QueryInner {
    fn lock(&self) -> MutexGuard<'_, QueryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn search(self: Arc<Self>, generation: u64) {
        tokio::time::sleep(self.debounce).await;

        {
            let state = self.lock();
            if state.generation != generation || state.disposed {
                return;
            }
            if state.query.is_empty() {
                debug!("Empty query, keeping current results");
                self.phase.send_replace(QueryPhase::Idle);
                return;
            }
            info!(query = %state.query, "Searching");
            self.phase.send_replace(QueryPhase::Searching);
            self.pager.set_source((self.factory)(&state.query));
        }

        let outcome = self.pager.refresh().await;
        debug!(?outcome, generation, "Search finished");

        let state = self.lock();
        if state.generation == generation {
            self.phase.send_replace(QueryPhase::Idle);
        }
    }
}

/// Owns the current search text and re-points a [`Pager`] at a new listing
/// once the text has been stable for the debounce window.
///
/// Every change cancels the pending search and any in-flight load of the
/// previous query; the last write wins.
#[derive(Clone)]
pub struct QueryController {
    inner: Arc<QueryInner>,
}

impl std::fmt::Debug for QueryController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryController")
            .field("query", &self.query())
            .field("phase", &self.phase())
            .field("debounce", &self.inner.debounce)
            .finish()
    }
}

impl QueryController {
    pub fn new(pager: Pager, factory: SourceFactory, debounce: Duration) -> Self {
        let (phase, _) = watch::channel(QueryPhase::Idle);
        Self {
            inner: Arc::new(QueryInner {
                pager,
                factory,
                debounce,
                state: Mutex::new(QueryState::default()),
                phase,
            }),
        }
    }

    /// The pager driven by this controller
    pub fn pager(&self) -> &Pager {
        &self.inner.pager
    }

    /// Current search text
    pub fn query(&self) -> String {
        self.inner.lock().query.clone()
    }

    pub fn phase(&self) -> QueryPhase {
        *self.inner.phase.borrow()
    }

    pub fn subscribe_phase(&self) -> watch::Receiver<QueryPhase> {
        self.inner.phase.subscribe()
    }

    /// Replace the search text.
    ///
    /// The search starts after the debounce window unless another change
    /// arrives first. An empty query performs no search and leaves the
    /// current results in place.
    ///
    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime.
    pub fn set_query(&self, text: impl Into<String>) {
        let mut state = self.inner.lock();
        if state.disposed {
            return;
        }

        state.query = text.into();
        state.generation += 1;
        if let Some(pending) = state.pending.take() {
            pending.abort();
        }
        self.inner.pager.cancel();
        self.inner.phase.send_replace(QueryPhase::Debouncing);

        let generation = state.generation;
        state.pending = Some(tokio::spawn(self.inner.clone().search(generation)));
    }

    /// Stop the pending search. Later changes are ignored.
    pub fn dispose(&self) {
        let mut state = self.inner.lock();
        state.disposed = true;
        state.generation += 1;
        if let Some(pending) = state.pending.take() {
            pending.abort();
        }
        self.inner.phase.send_replace(QueryPhase::Idle);
    }
}
