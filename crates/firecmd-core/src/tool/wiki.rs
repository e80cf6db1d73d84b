//! Encyclopedia lookup.
//!
//! Always answers with a JSON object: `success` plus either the page
//! summary or an `error` (and `options` for ambiguous terms).

use std::sync::Arc;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{info, warn};

use firecmd_types::tool::ToolError;

use super::{Tool, parse_args, schema_of};

pub const AMBIGUOUS_TERM: &str = "여러 결과가 발견되었습니다";

/// Summary of one encyclopedia page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageSummary {
    pub title: String,
    pub extract: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PageLookup {
    Page(PageSummary),
    /// The term names several pages; `options` are candidate titles.
    Disambiguation { options: Vec<String> },
}

/// Encyclopedia backend for one fixed language edition.
#[async_trait]
pub trait Encyclopedia: Send + Sync {
    async fn lookup(&self, query: &str) -> Result<PageLookup, ToolError>;
}

/// Cut `text` to `max_chars` characters, marking the cut with `...`.
pub fn truncate_summary(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}...", &text[..byte_idx]),
        None => text.to_string(),
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct WikiArgs {
    /// 검색어
    pub query: String,
}

pub struct WikipediaTool {
    encyclopedia: Arc<dyn Encyclopedia>,
    summary_chars: usize,
    max_options: usize,
}

impl WikipediaTool {
    pub fn new(encyclopedia: Arc<dyn Encyclopedia>, summary_chars: usize, max_options: usize) -> Self {
        Self {
            encyclopedia,
            summary_chars,
            max_options,
        }
    }

    /// Lookup result as the JSON object returned to the model.
    pub async fn search(&self, query: &str) -> Value {
        match self.encyclopedia.lookup(query).await {
            Ok(PageLookup::Page(page)) => json!({
                "success": true,
                "title": page.title,
                "summary": truncate_summary(&page.extract, self.summary_chars),
                "url": page.url,
            }),
            Ok(PageLookup::Disambiguation { options }) => json!({
                "success": false,
                "error": AMBIGUOUS_TERM,
                "options": options.into_iter().take(self.max_options).collect::<Vec<_>>(),
            }),
            Err(e) => {
                warn!(query, error = %e, "Encyclopedia lookup failed");
                json!({
                    "success": false,
                    "error": e.to_string(),
                })
            }
        }
    }
}

#[async_trait]
impl Tool for WikipediaTool {
    fn name(&self) -> &str {
        "wikipedia"
    }

    fn description(&self) -> &str {
        "위키피디아에서 정보를 검색합니다. 검색 결과(제목, 요약, URL)를 담은 객체를 반환합니다."
    }

    fn args_schema(&self) -> Value {
        schema_of::<WikiArgs>()
    }

    async fn call(&self, args: Value) -> Result<String, ToolError> {
        let WikiArgs { query } = parse_args(args)?;
        info!(query = %query, "Encyclopedia lookup");
        Ok(self.search(&query).await.to_string())
    }
}
