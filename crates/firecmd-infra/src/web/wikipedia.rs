//! Wikipedia REST client for one language edition.
//!
//! Looks the term up as a page title first. An unknown title falls back to
//! the best full-text search hit; a disambiguation page is answered with the
//! titles it links to.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use firecmd_core::tool::wiki::{Encyclopedia, PageLookup, PageSummary};
use firecmd_types::tool::ToolError;

use super::{check_status, network_error, read_json};

const USER_AGENT: &str = concat!("firecmd/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct SummaryResponse {
    #[serde(rename = "type", default)]
    page_type: String,
    title: String,
    #[serde(default)]
    extract: String,
    content_urls: Option<ContentUrls>,
}

#[derive(Debug, Deserialize)]
struct ContentUrls {
    desktop: Option<PageUrl>,
}

#[derive(Debug, Deserialize)]
struct PageUrl {
    page: String,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    query: Option<QueryBody>,
}

#[derive(Debug, Deserialize)]
struct QueryBody {
    #[serde(default)]
    search: Vec<SearchHit>,
    #[serde(default)]
    pages: Vec<LinkedPage>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    title: String,
}

#[derive(Debug, Deserialize)]
struct LinkedPage {
    #[serde(default)]
    links: Vec<SearchHit>,
}

pub struct WikipediaClient {
    http: reqwest::Client,
    base_url: String,
}

impl WikipediaClient {
    pub fn new(http: reqwest::Client, language: &str) -> Self {
        Self {
            http,
            base_url: format!("https://{language}.wikipedia.org"),
        }
    }

    fn summary_url(&self, title: &str) -> String {
        format!(
            "{}/api/rest_v1/page/summary/{}",
            self.base_url,
            urlencoding::encode(&title.replace(' ', "_"))
        )
    }

    /// `None` when no page has this title.
    async fn summary(&self, title: &str) -> Result<Option<SummaryResponse>, ToolError> {
        let response = self
            .http
            .get(self.summary_url(title))
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .send()
            .await
            .map_err(network_error)?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        read_json(check_status(response).await?, "page summary").await.map(Some)
    }

    async fn action_query(&self, params: &[(&str, &str)]) -> Result<QueryBody, ToolError> {
        let response = self
            .http
            .get(format!("{}/w/api.php", self.base_url))
            .query(&[("action", "query"), ("format", "json"), ("formatversion", "2")])
            .query(params)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .send()
            .await
            .map_err(network_error)?;
        let parsed: QueryResponse = read_json(check_status(response).await?, "query").await?;
        parsed
            .query
            .ok_or_else(|| ToolError::MissingField("query".to_string()))
    }

    async fn search_title(&self, term: &str) -> Result<Option<String>, ToolError> {
        let body = self
            .action_query(&[("list", "search"), ("srsearch", term), ("srlimit", "1")])
            .await?;
        Ok(body.search.into_iter().next().map(|hit| hit.title))
    }

    async fn linked_titles(&self, title: &str) -> Result<Vec<String>, ToolError> {
        let body = self
            .action_query(&[("prop", "links"), ("titles", title), ("pllimit", "max"), ("plnamespace", "0")])
            .await?;
        Ok(body
            .pages
            .into_iter()
            .flat_map(|p| p.links)
            .map(|l| l.title)
            .collect())
    }

    async fn resolve(&self, summary: SummaryResponse) -> Result<PageLookup, ToolError> {
        if summary.page_type == "disambiguation" {
            let options = self.linked_titles(&summary.title).await?;
            return Ok(PageLookup::Disambiguation { options });
        }
        let url = summary
            .content_urls
            .and_then(|u| u.desktop)
            .map(|d| d.page)
            .unwrap_or_else(|| self.summary_url(&summary.title));
        Ok(PageLookup::Page(PageSummary {
            title: summary.title,
            extract: summary.extract,
            url,
        }))
    }
}

#[async_trait]
impl Encyclopedia for WikipediaClient {
    async fn lookup(&self, query: &str) -> Result<PageLookup, ToolError> {
        if let Some(summary) = self.summary(query).await? {
            return self.resolve(summary).await;
        }
        debug!(query, "no exact page, searching");
        let title = self
            .search_title(query)
            .await?
            .ok_or_else(|| ToolError::InvalidInput(format!("페이지를 찾을 수 없습니다: {query}")))?;
        let summary = self
            .summary(&title)
            .await?
            .ok_or_else(|| ToolError::InvalidInput(format!("페이지를 찾을 수 없습니다: {title}")))?;
        self.resolve(summary).await
    }
}
