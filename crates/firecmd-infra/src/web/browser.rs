//! Page fetcher for the news sub-agent's `browser` tool.
//!
//! Downloads a page and reduces its HTML to readable text lines.

use async_trait::async_trait;
use tracing::debug;

use firecmd_core::tool::news::Browser;
use firecmd_types::tool::ToolError;

use super::{check_status, network_error};

const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0 Safari/537.36";

/// Wrap width for rendered pages. Wide enough that headlines stay on one line.
const TEXT_WIDTH: usize = 200;

/// Readable text of an HTML document, one non-empty line per block.
pub fn html_to_text(html: &str) -> String {
    html2text::from_read(html.as_bytes(), TEXT_WIDTH)
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

pub struct HttpBrowser {
    http: reqwest::Client,
}

impl HttpBrowser {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Browser for HttpBrowser {
    async fn fetch_text(&self, url: &str) -> Result<String, ToolError> {
        let response = self
            .http
            .get(url)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .header(reqwest::header::ACCEPT_LANGUAGE, "ko-KR,ko;q=0.9")
            .send()
            .await
            .map_err(network_error)?;
        let html = check_status(response)
            .await?
            .text()
            .await
            .map_err(network_error)?;
        let text = html_to_text(&html);
        debug!(url, html_bytes = html.len(), text_chars = text.chars().count(), "page fetched");
        Ok(text)
    }
}
