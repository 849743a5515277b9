//! Article model and the raw record shape returned by remote backends.

use serde::{Deserialize, Serialize};

/// Placeholder used when a record carries no author.
pub const UNKNOWN_AUTHOR: &str = "Unknown Author";

/// Placeholder used when a record carries no title.
pub const UNTITLED: &str = "Untitled";

/// Placeholder used when a record carries no body text.
pub const NO_CONTENT: &str = "No content available";

/// Placeholder used when a record carries no publication date.
pub const UNKNOWN_DATE: &str = "Unknown Date";

/// A news article as shown to consumers.
///
/// Built once from a [`RawRecord`] by [`map_record`] and never mutated
/// afterwards. Every field is always populated: missing values from the
/// backend are replaced by fixed placeholders (or an empty string for URLs).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Article {
    /// Article author, or [`UNKNOWN_AUTHOR`]
    pub author: String,

    /// Headline, or [`UNTITLED`]
    pub title: String,

    /// Body text, or [`NO_CONTENT`]
    pub content: String,

    /// Publication date as reported by the backend, or [`UNKNOWN_DATE`]
    pub published_date: String,

    /// Link to the full article (empty when unknown)
    pub url: String,

    /// Link to the lead image (empty when unknown)
    pub image_url: String,
}

impl Article {
    /// Whether the article carries a lead image
    pub fn has_image(&self) -> bool {
        !self.image_url.is_empty()
    }
}

/// A record as delivered by a remote backend, after adapting field names.
///
/// All fields are optional because feeds routinely omit them. The core never
/// mutates a record; it only deduplicates and maps it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    pub author: Option<String>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub published_at: Option<String>,
    pub url: Option<String>,
    pub url_to_image: Option<String>,
}

impl RawRecord {
    /// Create a record with only a title set
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    /// Set the author
    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    /// Set the body text
    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Set the publication date
    pub fn published_at(mut self, date: impl Into<String>) -> Self {
        self.published_at = Some(date.into());
        self
    }

    /// Set the article URL
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Set the image URL
    pub fn url_to_image(mut self, url: impl Into<String>) -> Self {
        self.url_to_image = Some(url.into());
        self
    }

    /// Convert into an [`Article`], substituting placeholders for missing fields
    pub fn into_article(self) -> Article {
        Article {
            author: self.author.unwrap_or_else(|| UNKNOWN_AUTHOR.to_string()),
            title: self.title.unwrap_or_else(|| UNTITLED.to_string()),
            content: self.content.unwrap_or_else(|| NO_CONTENT.to_string()),
            published_date: self.published_at.unwrap_or_else(|| UNKNOWN_DATE.to_string()),
            url: self.url.unwrap_or_default(),
            image_url: self.url_to_image.unwrap_or_default(),
        }
    }
}

/// Map a raw record into an [`Article`]. Total: never fails.
pub fn map_record(record: RawRecord) -> Article {
    record.into_article()
}

impl From<RawRecord> for Article {
    fn from(record: RawRecord) -> Self {
        record.into_article()
    }
}

/// One page of records as returned by a backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchedPage {
    /// Records in backend order, duplicates included
    pub records: Vec<RawRecord>,

    /// Backend status string ("ok", "success", ...)
    pub status: String,

    /// Total number of results the backend reports for the whole listing
    pub total_results: u64,
}

impl FetchedPage {
    /// Create a successful page
    pub fn new(records: Vec<RawRecord>, total_results: u64) -> Self {
        Self {
            records,
            status: "ok".to_string(),
            total_results,
        }
    }

    /// An empty page with no further results
    pub fn empty() -> Self {
        Self::new(Vec::new(), 0)
    }
}
