//! Page keys and loaded page results.

use serde::{Deserialize, Serialize};

use super::Article;

/// Positive page number. Page 1 is used whenever no key is supplied.
pub type PageKey = u32;

/// The page loaded when no key is given.
pub const FIRST_PAGE: PageKey = 1;

/// Resolve an optional key to the page that will actually be requested.
///
/// `None` and `Some(0)` both mean the first page.
pub fn effective_page(key: Option<PageKey>) -> PageKey {
    key.unwrap_or(FIRST_PAGE).max(FIRST_PAGE)
}

/// A loaded page of articles together with its neighbouring keys.
///
/// `prev_key` is `None` exactly when this is the first page; `next_key` is
/// `None` once the backend reports no further results for this listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageResult {
    /// Articles of this page in backend order, deduplicated
    pub items: Vec<Article>,

    /// Key of the page before this one
    pub prev_key: Option<PageKey>,

    /// Key of the page after this one
    pub next_key: Option<PageKey>,
}

impl PageResult {
    /// Key of this page, derived from its neighbours
    pub fn key(&self) -> PageKey {
        self.prev_key.map_or(FIRST_PAGE, |prev| prev + 1)
    }

    /// Number of articles on this page
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether this page carries no articles
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
