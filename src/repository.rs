//! Wiring of a backend, its credential and paging settings into feeds.

use std::sync::Arc;
use std::time::Duration;

use crate::config::{Config, DEFAULT_BROWSE_SOURCES, DEFAULT_SEARCH_SOURCES};
use crate::feed::{NewsFeed, SearchFeed};
use crate::paging::{PageSource, PagerConfig, SourceFactory, DEFAULT_DEBOUNCE};
use crate::sources::{NewsApiSource, NewsDataSource, NewsSource, SourceError, SourceRegistry};

/// Builds browse and search feeds against one backend.
#[derive(Debug, Clone)]
pub struct NewsRepository {
    remote: Arc<dyn NewsSource>,
    api_key: String,
    browse_sources: Vec<String>,
    search_sources: Vec<String>,
    paging: PagerConfig,
    debounce: Duration,
}

impl NewsRepository {
    /// A repository with the default outlets and paging settings
    pub fn new(remote: Arc<dyn NewsSource>, api_key: impl Into<String>) -> Self {
        Self {
            remote,
            api_key: api_key.into(),
            browse_sources: DEFAULT_BROWSE_SOURCES.iter().map(|s| s.to_string()).collect(),
            search_sources: DEFAULT_SEARCH_SOURCES.iter().map(|s| s.to_string()).collect(),
            paging: PagerConfig::default(),
            debounce: DEFAULT_DEBOUNCE,
        }
    }

    /// A repository for the configured backend.
    ///
    /// `base_url` replaces the backend's endpoint; otherwise the backend is
    /// taken from `registry`.
    pub fn from_config(
        config: &Config,
        registry: &SourceRegistry,
        api_key: impl Into<String>,
    ) -> Result<Self, SourceError> {
        let backend = config.api.backend;
        let remote: Arc<dyn NewsSource> = match (&config.api.base_url, backend) {
            (Some(url), crate::config::Backend::NewsApi) => {
                Arc::new(NewsApiSource::with_base_url(url)?)
            }
            (Some(url), crate::config::Backend::NewsData) => {
                Arc::new(NewsDataSource::with_base_url(url)?)
            }
            (None, _) => registry.get_required(backend.id())?.clone(),
        };

        Ok(Self::new(remote, api_key)
            .with_browse_sources(config.feeds.browse_sources.clone())
            .with_search_sources(config.feeds.search_sources.clone())
            .with_paging(config.paging.pager_config())
            .with_debounce(config.paging.debounce()))
    }

    pub fn with_browse_sources(mut self, sources: Vec<String>) -> Self {
        self.browse_sources = sources;
        self
    }

    pub fn with_search_sources(mut self, sources: Vec<String>) -> Self {
        self.search_sources = sources;
        self
    }

    pub fn with_paging(mut self, paging: PagerConfig) -> Self {
        self.paging = paging;
        self
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn remote(&self) -> &Arc<dyn NewsSource> {
        &self.remote
    }

    pub fn paging(&self) -> PagerConfig {
        self.paging
    }

    /// The browse listing
    pub fn browse_source(&self) -> PageSource {
        PageSource::browse(self.remote.clone(), &self.browse_sources, self.api_key.clone())
    }

    /// The search listing for `query`
    pub fn search_source(&self, query: &str) -> PageSource {
        PageSource::search(
            self.remote.clone(),
            query,
            &self.search_sources,
            self.api_key.clone(),
        )
    }

    /// Factory used by search feeds to build a listing per query
    pub fn search_factory(&self) -> SourceFactory {
        let repository = self.clone();
        Arc::new(move |query: &str| repository.search_source(query))
    }

    /// A fresh browse feed; nothing is loaded until it is refreshed
    pub fn get_news(&self) -> NewsFeed {
        NewsFeed::new(self.browse_source(), self.paging)
    }

    /// A fresh search feed driven by [`SearchFeed::set_query`]
    pub fn search_news(&self) -> SearchFeed {
        SearchFeed::new(self.search_factory(), self.paging, self.debounce)
    }

    /// A feed for one fixed query, without debouncing
    pub fn search_once(&self, query: &str) -> NewsFeed {
        NewsFeed::new(self.search_source(query), self.paging)
    }
}
