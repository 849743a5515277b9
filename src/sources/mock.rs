//! Mock backend for testing purposes.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::models::{FetchedPage, RawRecord};
use crate::sources::{NewsSource, SourceCapabilities, SourceError};

type Scripted = Result<FetchedPage, SourceError>;

/// A call observed by the mock, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockCall {
    /// Search query, `None` for browse calls
    pub query: Option<String>,
    pub sources: String,
    pub page: u32,
}

#[derive(Debug, Default)]
struct Script {
    fixed: HashMap<(Option<String>, u32), Scripted>,
    queued: HashMap<(Option<String>, u32), VecDeque<Scripted>>,
    calls: Vec<MockCall>,
    delay: Duration,
}

/// A mock backend that returns scripted pages.
///
/// Responses are keyed by `(query, page)`, where the query is `None` for
/// browse calls. One-shot responses queued with [`MockSource::enqueue`] are
/// served before the fixed response set with [`MockSource::set_response`].
/// Unscripted pages come back empty.
#[derive(Debug, Default)]
pub struct MockSource {
    script: Mutex<Script>,
}

impl MockSource {
    /// Create a new mock backend.
    pub fn new() -> Self {
        Self::default()
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Always answer `(query, page)` with `response`.
    pub fn set_response(&self, query: Option<&str>, page: u32, response: Scripted) {
        self.script()
            .fixed
            .insert((query.map(str::to_string), page), response);
    }

    /// Answer the next request for `(query, page)` with `response`, once.
    pub fn enqueue(&self, query: Option<&str>, page: u32, response: Scripted) {
        self.script()
            .queued
            .entry((query.map(str::to_string), page))
            .or_default()
            .push_back(response);
    }

    /// Delay every response by `delay`.
    pub fn set_delay(&self, delay: Duration) {
        self.script().delay = delay;
    }

    /// All calls received so far.
    pub fn calls(&self) -> Vec<MockCall> {
        self.script().calls.clone()
    }

    async fn respond(&self, query: Option<&str>, sources: &str, page: u32) -> Scripted {
        let (response, delay) = {
            let mut script = self.script();
            script.calls.push(MockCall {
                query: query.map(str::to_string),
                sources: sources.to_string(),
                page,
            });

            let key = (query.map(str::to_string), page);
            let queued = script.queued.get_mut(&key).and_then(VecDeque::pop_front);
            let response = queued
                .or_else(|| script.fixed.get(&key).cloned())
                .unwrap_or_else(|| Ok(FetchedPage::empty()));
            (response, script.delay)
        };

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        response
    }
}

#[async_trait]
impl NewsSource for MockSource {
    fn id(&self) -> &str {
        "mock"
    }

    fn name(&self) -> &str {
        "Mock Source"
    }

    fn capabilities(&self) -> SourceCapabilities {
        SourceCapabilities::BROWSE | SourceCapabilities::SEARCH
    }

    async fn fetch_page(
        &self,
        sources: &str,
        page: u32,
        _api_key: &str,
    ) -> Result<FetchedPage, SourceError> {
        self.respond(None, sources, page).await
    }

    async fn fetch_page_for_query(
        &self,
        query: &str,
        sources: &str,
        page: u32,
        _api_key: &str,
    ) -> Result<FetchedPage, SourceError> {
        self.respond(Some(query), sources, page).await
    }
}

/// Helper to build a page of fully-populated records titled `{prefix} {n}`.
pub fn make_page(prefix: &str, range: std::ops::Range<usize>, total_results: u64) -> FetchedPage {
    let records = range
        .map(|n| {
            RawRecord::titled(format!("{} {}", prefix, n))
                .author("Mock Author")
                .content("Mock content")
                .published_at("2024-01-01T00:00:00Z")
                .url(format!("https://example.com/{}/{}", prefix, n))
        })
        .collect();
    FetchedPage::new(records, total_results)
}
