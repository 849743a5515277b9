//! Remote news backends behind a common trait.
//!
//! This module defines the [`NewsSource`] trait that every backend implements.
//! A backend turns a page number (and optionally a search query) into one
//! [`FetchedPage`]: the raw records of that page plus the total number of
//! results the backend reports for the listing.
//!
//! # Backends
//!
//! - `newsapi` - newsapi.org `/v2/everything` (page-numbered)
//! - `newsdata` - newsdata.io `/api/1/news` (cursor-based, adapted to page numbers)
//! - [`MockSource`] - scripted responses for tests and offline use
//!
//! Backends are looked up by id through the [`SourceRegistry`].
//!
//! # Errors
//!
//! Backends report failures as [`SourceError`]. Transport failures map to
//! [`SourceError::Network`], malformed bodies to [`SourceError::Parse`].
//! Nothing above the backend ever panics on a failed fetch: the paging layer
//! turns errors into load states.

mod newsapi;
mod newsdata;
mod registry;

pub mod mock;

pub use mock::MockSource;
pub use newsapi::NewsApiSource;
pub use newsdata::NewsDataSource;

pub use registry::{SourceCapabilities, SourceRegistry};

use crate::models::FetchedPage;
use async_trait::async_trait;

/// The NewsSource trait defines the interface for all remote news backends.
///
/// # Implementing a New Backend
///
/// 1. Create a new struct that implements `NewsSource`
/// 2. Implement `id`, `name` and `fetch_page`
/// 3. Implement `fetch_page_for_query` and advertise `SEARCH` if the backend can search
/// 4. Add the backend to `SourceRegistry::new()` or register it dynamically
#[async_trait]
pub trait NewsSource: Send + Sync + std::fmt::Debug {
    /// Unique identifier for this backend (e.g. "newsapi")
    fn id(&self) -> &str;

    /// Human-readable name of this backend
    fn name(&self) -> &str;

    /// Describe the capabilities of this backend
    fn capabilities(&self) -> SourceCapabilities {
        SourceCapabilities::BROWSE
    }

    /// Whether this backend supports query search
    fn supports_search(&self) -> bool {
        self.capabilities().contains(SourceCapabilities::SEARCH)
    }

    /// Fetch one page of the listing for a comma-joined list of source ids
    async fn fetch_page(
        &self,
        sources: &str,
        page: u32,
        api_key: &str,
    ) -> Result<FetchedPage, SourceError>;

    /// Fetch one page of search results for `query`
    async fn fetch_page_for_query(
        &self,
        _query: &str,
        _sources: &str,
        _page: u32,
        _api_key: &str,
    ) -> Result<FetchedPage, SourceError> {
        Err(SourceError::NotImplemented)
    }
}

/// Errors that can occur when fetching from a backend
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
    /// The requested operation is not implemented for this backend
    #[error("Operation not implemented for this source")]
    NotImplemented,

    /// Network or connection failure
    #[error("Network error: {0}")]
    Network(String),

    /// Malformed response body
    #[error("Parse error: {0}")]
    Parse(String),

    /// Invalid request parameters
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimit,

    /// Error reported by the backend itself
    #[error("API error: {0}")]
    Api(String),

    /// Other error
    #[error("Error: {0}")]
    Other(String),
}

impl SourceError {
    /// Whether this is a transport-level failure
    pub fn is_transport(&self) -> bool {
        matches!(self, SourceError::Network(_))
    }

    /// Whether the response could not be decoded
    pub fn is_decode(&self) -> bool {
        matches!(self, SourceError::Parse(_))
    }
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            SourceError::Parse(err.to_string())
        } else {
            SourceError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::Parse(format!("JSON: {}", err))
    }
}

impl From<url::ParseError> for SourceError {
    fn from(err: url::ParseError) -> Self {
        SourceError::InvalidRequest(format!("URL: {}", err))
    }
}

/// Map a non-success HTTP status to a [`SourceError`]
pub(crate) fn status_error(backend: &str, status: reqwest::StatusCode) -> SourceError {
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        SourceError::RateLimit
    } else {
        SourceError::Api(format!("{} returned status: {}", backend, status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_capabilities() {
        let caps = SourceCapabilities::BROWSE | SourceCapabilities::SEARCH;

        assert!(caps.contains(SourceCapabilities::BROWSE));
        assert!(caps.contains(SourceCapabilities::SEARCH));
        assert!(!SourceCapabilities::BROWSE.contains(SourceCapabilities::SEARCH));
    }

    #[test]
    fn test_error_taxonomy() {
        assert!(SourceError::Network("refused".to_string()).is_transport());
        assert!(SourceError::Parse("bad json".to_string()).is_decode());
        assert!(!SourceError::RateLimit.is_transport());
    }

    #[test]
    fn test_status_error() {
        assert_eq!(
            status_error("NewsAPI", reqwest::StatusCode::TOO_MANY_REQUESTS),
            SourceError::RateLimit
        );
        assert!(matches!(
            status_error("NewsAPI", reqwest::StatusCode::INTERNAL_SERVER_ERROR),
            SourceError::Api(_)
        ));
    }

    #[test]
    fn test_serde_error_is_decode() {
        let err: SourceError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(err.is_decode());
    }
}
