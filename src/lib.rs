//! # News Pager
//!
//! A client-side engine that pages news articles from a remote API, drops
//! duplicates, and exposes the result as a live, lazily growing list with a
//! coarse UI state and debounced search.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`models`]: Core data structures (Article, RawRecord, PageResult)
//! - [`sources`]: Remote backends behind the [`NewsSource`] trait
//! - [`paging`]: Page sources, the pager cache, the UI-state reducer and the query controller
//! - [`feed`]: Consumer-facing browse and search feeds
//! - [`repository`]: Builds feeds from a backend and configuration
//! - [`settings`]: Boolean settings store and the onboarding flag
//! - [`utils`]: HTTP client and display helpers
//! - [`ui`]: Terminal status output for the CLI
//! - [`config`]: Configuration management

pub mod config;
pub mod feed;
pub mod models;
pub mod paging;
pub mod repository;
pub mod settings;
pub mod sources;
pub mod ui;
pub mod utils;

// Re-export commonly used types
pub use feed::{NewsFeed, SearchFeed};
pub use models::Article;
pub use paging::{Pager, UiState};
pub use repository::NewsRepository;
pub use sources::{NewsSource, SourceError, SourceRegistry};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
