//! Local news collection through a browsing sub-agent.
//!
//! `browser_tool_agent` narrows the incident address to city/district
//! granularity, builds the Google News search URL for it and hands both to
//! a sub-agent whose only tool is `browser`.

use std::sync::Arc;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use firecmd_types::agent::{AgentConfig, AgentState};
use firecmd_types::config::NewsSettings;
use firecmd_types::tool::ToolError;

use crate::agent::engine::Agent;
use crate::agent::prompt::NEWS_SYSTEM_PROMPT;
use crate::llm::box_provider::BoxLlmProvider;

use super::wiki::truncate_summary;
use super::{Tool, ToolRegistry, parse_args, schema_of};

/// Administrative suffixes kept when narrowing an address.
const REGION_SUFFIXES: [char; 4] = ['시', '도', '군', '구'];
const MAX_REGION_TOKENS: usize = 3;

/// Reduce an address to its leading administrative units.
///
/// Keeps up to three leading tokens ending in 시/도/군/구. When the first
/// token is not one of them, the first token alone is used.
pub fn normalize_region(address: &str) -> String {
    let mut tokens = address.split_whitespace();
    let Some(first) = tokens.next() else {
        return String::new();
    };

    fn is_unit(token: &str) -> bool {
        token.chars().last().is_some_and(|c| REGION_SUFFIXES.contains(&c))
    }
    if !is_unit(first) {
        return first.to_string();
    }

    let mut kept = vec![first];
    kept.extend(
        tokens
            .take_while(|t| is_unit(t))
            .take(MAX_REGION_TOKENS - 1),
    );
    kept.join(" ")
}

/// Google News search URL for a region, Korean edition.
pub fn google_news_url(region: &str) -> String {
    format!(
        "https://news.google.com/search?q={}&hl=ko&gl=KR&ceid=KR%3Ako",
        urlencoding::encode(region)
    )
}

/// Fetches a web page as readable text.
#[async_trait]
pub trait Browser: Send + Sync {
    async fn fetch_text(&self, url: &str) -> Result<String, ToolError>;
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct BrowseArgs {
    /// Absolute URL of the page to open
    pub url: String,
}

/// The sub-agent's page fetching tool.
pub struct BrowseTool {
    browser: Arc<dyn Browser>,
    max_page_chars: usize,
}

impl BrowseTool {
    pub fn new(browser: Arc<dyn Browser>, max_page_chars: usize) -> Self {
        Self {
            browser,
            max_page_chars,
        }
    }
}

#[async_trait]
impl Tool for BrowseTool {
    fn name(&self) -> &str {
        "browser"
    }

    fn description(&self) -> &str {
        "Open a web page and return its readable text content."
    }

    fn args_schema(&self) -> Value {
        schema_of::<BrowseArgs>()
    }

    async fn call(&self, args: Value) -> Result<String, ToolError> {
        let BrowseArgs { url } = parse_args(args)?;
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ToolError::InvalidInput(format!("not an http url: {url}")));
        }
        debug!(url = %url, "Fetching page");
        let text = self.browser.fetch_text(&url).await?;
        Ok(truncate_summary(&text, self.max_page_chars))
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct NewsArgs {
    /// 검색할 지역과 수집할 정보 유형
    pub prompt: String,
}

pub struct NewsAgentTool {
    provider: Arc<BoxLlmProvider>,
    tools: Arc<ToolRegistry>,
    config: AgentConfig,
}

impl NewsAgentTool {
    pub fn new(provider: Arc<BoxLlmProvider>, browser: Arc<dyn Browser>, settings: &NewsSettings) -> Self {
        let mut tools = ToolRegistry::new();
        tools.register(Arc::new(BrowseTool::new(browser, settings.max_page_chars)));
        Self {
            provider,
            tools: Arc::new(tools),
            config: AgentConfig {
                name: "NewsBrowserAgent".to_string(),
                model: settings.model_id.clone(),
                system_prompt: NEWS_SYSTEM_PROMPT.to_string(),
                max_tokens: settings.max_tokens,
                temperature: None,
                max_tool_rounds: settings.max_tool_rounds,
            },
        }
    }

    /// Message handed to the sub-agent for one request.
    pub fn task_message(prompt: &str) -> String {
        let region = normalize_region(prompt);
        format!(
            "{prompt}\n\n검색 지역: {region}\n방문할 웹사이트: {}",
            google_news_url(&region)
        )
    }
}

#[async_trait]
impl Tool for NewsAgentTool {
    fn name(&self) -> &str {
        "browser_tool_agent"
    }

    fn description(&self) -> &str {
        "소방 대응 지휘를 위한 지역 상황을 Google 뉴스 검색 페이지를 방문해 수집합니다. \
         prompt에는 주소를 넣으며, 번지와 도로명은 제거되고 시/구 단위로 검색됩니다 \
         (예: \"서울특별시 강남구 남부순환로 06284\" → \"서울특별시 강남구\"). \
         검색 결과 종합 정보(기사 제목, 업데이트 시간, 기사 출처)를 반환합니다."
    }

    fn args_schema(&self) -> Value {
        schema_of::<NewsArgs>()
    }

    async fn call(&self, args: Value) -> Result<String, ToolError> {
        let NewsArgs { prompt } = parse_args(args)?;
        info!(prompt = %prompt, "Starting news sub-agent");

        let agent = Agent::new(
            self.config.clone(),
            Arc::clone(&self.provider),
            Arc::clone(&self.tools),
            Vec::new(),
            AgentState::default(),
        );
        let answer = agent.invoke(Self::task_message(&prompt)).await?;
        Ok(answer)
    }
}
