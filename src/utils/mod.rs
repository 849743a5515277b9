//! Utility modules shared by the backends and the CLI.
//!
//! - [`HttpClient`]: shared reqwest client with sensible timeouts
//! - [`articles_table`] / [`articles_plain`]: terminal rendering of article lists
//! - [`truncate_with_ellipsis`] / [`format_published`]: text helpers for display

mod display;
mod http;

pub use display::{
    articles_plain, articles_table, format_published, truncate_with_ellipsis, MAX_TITLE_WIDTH,
};
pub(crate) use http::base_url;
pub use http::HttpClient;
