//! newsdata.io backend.
//!
//! newsdata.io paginates with an opaque `nextPage` cursor instead of page
//! numbers. The backend remembers the cursor handed out with page `n` and
//! replays it when page `n + 1` is requested for the same query and sources.
//! A page that came back without a cursor ends the listing: the page after
//! it is answered locally as empty. Asking for a page whose cursor was never
//! seen is an invalid request.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;
use url::Url;

use crate::models::{FetchedPage, RawRecord};
use crate::sources::{status_error, NewsSource, SourceCapabilities, SourceError};
use crate::utils::{base_url, HttpClient};

pub const NEWSDATA_BASE_URL: &str = "https://newsdata.io/api/1/";

/// Listings whose cursors are kept at once; the oldest is forgotten first.
const MAX_SCOPES: usize = 8;

/// Cursor handed out for a page. `None` means the page before was the last.
type Cursor = Option<String>;

/// Cursors per listing, keyed by `query|sources`.
#[derive(Debug, Default)]
struct CursorBook {
    scopes: HashMap<String, HashMap<u32, Cursor>>,
    order: VecDeque<String>,
}

impl CursorBook {
    /// Forget what an earlier walk of `scope` learned; page 1 starts over.
    fn restart(&mut self, scope: &str) {
        self.order.retain(|s| s != scope);
        self.order.push_back(scope.to_string());
        self.scopes.insert(scope.to_string(), HashMap::new());
        while self.order.len() > MAX_SCOPES {
            if let Some(oldest) = self.order.pop_front() {
                self.scopes.remove(&oldest);
            }
        }
    }

    fn lookup(&self, scope: &str, page: u32) -> Option<&Cursor> {
        self.scopes.get(scope).and_then(|pages| pages.get(&page))
    }

    /// Record what page `page` said about the page after it.
    fn record(&mut self, scope: &str, page: u32, next: Cursor) {
        if let Some(pages) = self.scopes.get_mut(scope) {
            pages.insert(page + 1, next);
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.scopes.len()
    }
}

/// newsdata.io backend
#[derive(Debug)]
pub struct NewsDataSource {
    client: Arc<HttpClient>,
    base_url: Url,
    cursors: Mutex<CursorBook>,
}

impl NewsDataSource {
    pub fn new() -> Result<Self, SourceError> {
        Self::with_base_url(NEWSDATA_BASE_URL)
    }

    /// Point the backend at another host (mirrors, tests)
    pub fn with_base_url(base: &str) -> Result<Self, SourceError> {
        Ok(Self {
            client: Arc::new(HttpClient::new()?),
            base_url: base_url(base)?,
            cursors: Mutex::new(CursorBook::default()),
        })
    }

    fn scope(query: Option<&str>, sources: &str) -> String {
        format!("{}|{}", query.unwrap_or_default(), sources)
    }

    fn book(&self) -> MutexGuard<'_, CursorBook> {
        self.cursors.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Cursor to send for `page`: `Ok(None)` for page 1, `Ok(Some(None))`
    /// once the listing has ended.
    fn cursor_for(&self, scope: &str, page: u32) -> Result<Option<Cursor>, SourceError> {
        let mut book = self.book();
        if page <= 1 {
            book.restart(scope);
            return Ok(None);
        }

        book.lookup(scope, page).cloned().map(Some).ok_or_else(|| {
            SourceError::InvalidRequest(format!(
                "no cursor known for page {} (load page {} first)",
                page,
                page - 1
            ))
        })
    }

    async fn news(
        &self,
        query: Option<&str>,
        sources: &str,
        page: u32,
        api_key: &str,
    ) -> Result<FetchedPage, SourceError> {
        let scope = Self::scope(query, sources);
        let cursor = match self.cursor_for(&scope, page)? {
            Some(None) => {
                debug!(page, "newsdata.io listing already ended");
                return Ok(FetchedPage::empty());
            }
            Some(Some(cursor)) => Some(cursor),
            None => None,
        };

        let mut params = vec![("apikey", api_key.to_string()), ("domain", sources.to_string())];
        if let Some(query) = query {
            params.push(("q", query.to_string()));
        }
        if let Some(cursor) = cursor {
            params.push(("page", cursor));
        }

        let url = self.base_url.join("news")?;
        let response = self
            .client
            .get(url)
            .query(&params)
            .send()
            .await
            .map_err(|e| SourceError::Network(format!("Failed to reach newsdata.io: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SourceError::Network(format!("Failed to read newsdata.io body: {}", e)))?;

        // Error bodies reuse `results` for an object, so look at `status` first.
        let value: serde_json::Value = match serde_json::from_str(&body) {
            Ok(value) => value,
            Err(_) if !status.is_success() => return Err(status_error("newsdata.io", status)),
            Err(e) => return Err(e.into()),
        };

        if value.get("status").and_then(|s| s.as_str()) != Some("success") {
            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                return Err(SourceError::RateLimit);
            }
            let message = value
                .pointer("/results/message")
                .and_then(|m| m.as_str())
                .map(str::to_string)
                .unwrap_or_else(|| format!("newsdata.io returned status: {}", status));
            return Err(SourceError::Api(message));
        }

        let data: NdResponse = serde_json::from_value(value)?;

        self.book().record(&scope, page, data.next_page);

        Ok(FetchedPage {
            records: data.results.into_iter().map(RawRecord::from).collect(),
            status: data.status,
            total_results: data.total_results,
        })
    }
}

#[async_trait]
impl NewsSource for NewsDataSource {
    fn id(&self) -> &str {
        "newsdata"
    }

    fn name(&self) -> &str {
        "newsdata.io"
    }

    fn capabilities(&self) -> SourceCapabilities {
        SourceCapabilities::BROWSE | SourceCapabilities::SEARCH
    }

    async fn fetch_page(
        &self,
        sources: &str,
        page: u32,
        api_key: &str,
    ) -> Result<FetchedPage, SourceError> {
        self.news(None, sources, page, api_key).await
    }

    async fn fetch_page_for_query(
        &self,
        query: &str,
        sources: &str,
        page: u32,
        api_key: &str,
    ) -> Result<FetchedPage, SourceError> {
        self.news(Some(query), sources, page, api_key).await
    }
}

// ===== newsdata.io Types =====

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NdResponse {
    status: String,
    #[serde(default)]
    total_results: u64,
    #[serde(default)]
    results: Vec<NdResult>,
    #[serde(default)]
    next_page: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NdResult {
    title: Option<String>,
    link: Option<String>,
    #[serde(default)]
    creator: Option<Vec<String>>,
    content: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    image_url: Option<String>,
}

impl From<NdResult> for RawRecord {
    fn from(result: NdResult) -> Self {
        let author = result
            .creator
            .filter(|names| !names.is_empty())
            .map(|names| names.join(", "));

        RawRecord {
            author,
            title: result.title,
            content: result.content,
            published_at: result.pub_date,
            url: result.link,
            url_to_image: result.image_url,
        }
    }
}
