//! newsapi.org backend.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use url::Url;

use crate::models::{FetchedPage, RawRecord};
use crate::sources::{status_error, NewsSource, SourceCapabilities, SourceError};
use crate::utils::{base_url, HttpClient};

pub const NEWSAPI_BASE_URL: &str = "https://newsapi.org/v2/";

/// newsapi.org backend
///
/// Uses the `/everything` endpoint, which is page-numbered and reports
/// `totalResults` for the whole listing.
#[derive(Debug, Clone)]
pub struct NewsApiSource {
    client: Arc<HttpClient>,
    base_url: Url,
}

impl NewsApiSource {
    pub fn new() -> Result<Self, SourceError> {
        Self::with_base_url(NEWSAPI_BASE_URL)
    }

    /// Point the backend at another host (mirrors, tests)
    pub fn with_base_url(base: &str) -> Result<Self, SourceError> {
        Ok(Self {
            client: Arc::new(HttpClient::new()?),
            base_url: base_url(base)?,
        })
    }

    async fn everything(&self, params: &[(&str, String)]) -> Result<FetchedPage, SourceError> {
        let url = self.base_url.join("everything")?;

        let response = self
            .client
            .get(url)
            .query(params)
            .send()
            .await
            .map_err(|e| SourceError::Network(format!("Failed to reach NewsAPI: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(match serde_json::from_str::<NaError>(&body) {
                Ok(err) if status != reqwest::StatusCode::TOO_MANY_REQUESTS => {
                    SourceError::Api(format!("{}: {}", err.code, err.message))
                }
                _ => status_error("NewsAPI", status),
            });
        }

        let data: NaResponse = response
            .json()
            .await
            .map_err(|e| SourceError::Parse(format!("Failed to parse JSON: {}", e)))?;

        if data.status != "ok" {
            return Err(SourceError::Api(
                data.message
                    .unwrap_or_else(|| format!("NewsAPI status: {}", data.status)),
            ));
        }

        Ok(FetchedPage {
            records: data.articles.into_iter().map(RawRecord::from).collect(),
            status: data.status,
            total_results: data.total_results,
        })
    }
}

#[async_trait]
impl NewsSource for NewsApiSource {
    fn id(&self) -> &str {
        "newsapi"
    }

    fn name(&self) -> &str {
        "NewsAPI"
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
        self.everything(&[
            ("page", page.to_string()),
            ("sources", sources.to_string()),
            ("apiKey", api_key.to_string()),
        ])
        .await
    }

    async fn fetch_page_for_query(
        &self,
        query: &str,
        sources: &str,
        page: u32,
        api_key: &str,
    ) -> Result<FetchedPage, SourceError> {
        self.everything(&[
            ("q", query.to_string()),
            ("page", page.to_string()),
            ("sources", sources.to_string()),
            ("apiKey", api_key.to_string()),
        ])
        .await
    }
}

// ===== NewsAPI Types =====

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NaResponse {
    status: String,
    #[serde(default)]
    total_results: u64,
    #[serde(default)]
    articles: Vec<NaArticle>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NaError {
    code: String,
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NaArticle {
    author: Option<String>,
    title: Option<String>,
    content: Option<String>,
    published_at: Option<String>,
    url: Option<String>,
    url_to_image: Option<String>,
}

impl From<NaArticle> for RawRecord {
    fn from(article: NaArticle) -> Self {
        RawRecord {
            author: article.author,
            title: article.title,
            content: article.content,
            published_at: article.published_at,
            url: article.url,
            url_to_image: article.url_to_image,
        }
    }
}
