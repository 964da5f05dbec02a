//! 文本浏览器工具：navigate / current_page / extract_text
//!
//! 三个工具共享一个 BrowserSession（reqwest 抓取 + html2text 提取可读文本）。
//! 会话在 Agent 调用结束后由 ShutdownCoordinator 统一释放。

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use html2text::from_read;
use reqwest::Client;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::core::{ShutdownCleanup, ToolError};
use crate::tools::Tool;

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

#[derive(Debug, Clone, Default)]
struct Page {
    url: String,
    html: String,
}

/// 共享浏览会话：当前页面 URL 与原始 HTML
pub struct BrowserSession {
    client: Client,
    page: Mutex<Option<Page>>,
    max_chars: usize,
}

/// 简易去除 HTML 标签（html2text 失败时的回退）
fn strip_html_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' => {
                in_tag = false;
                out.push(' ');
            }
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut s: String = text.chars().take(max_chars).collect();
    s.push_str("\n...[truncated]");
    s
}

impl BrowserSession {
    pub fn new(timeout_secs: u64, max_chars: usize) -> Arc<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_default();
        Arc::new(Self {
            client,
            page: Mutex::new(None),
            max_chars,
        })
    }

    pub async fn navigate(&self, url: &str) -> Result<String, ToolError> {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ToolError::Failed(format!("Invalid URL: {}", url)));
        }
        tracing::info!(url = %url, "browser navigate");
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ToolError::Failed(format!("Request failed: {}", e)))?;
        let status = resp.status();
        let final_url = resp.url().to_string();
        let html = resp
            .text()
            .await
            .map_err(|e| ToolError::Failed(format!("Read body failed: {}", e)))?;
        *self.page.lock().await = Some(Page {
            url: final_url.clone(),
            html,
        });
        if !status.is_success() {
            return Ok(format!("Navigated to {} with HTTP {}", final_url, status));
        }
        Ok(format!("Navigated to {}", final_url))
    }

    pub async fn current_url(&self) -> Result<String, ToolError> {
        self.page
            .lock()
            .await
            .as_ref()
            .map(|p| p.url.clone())
            .ok_or_else(|| ToolError::Failed("No page is open. Use navigate first.".to_string()))
    }

    pub async fn extract_text(&self) -> Result<String, ToolError> {
        let guard = self.page.lock().await;
        let page = guard
            .as_ref()
            .ok_or_else(|| ToolError::Failed("No page is open. Use navigate first.".to_string()))?;
        Ok(truncate(&html_to_text(&page.html), self.max_chars))
    }

    pub async fn close(&self) {
        self.page.lock().await.take();
    }
}

fn html_to_text(html: &str) -> String {
    match from_read(html.as_bytes(), 120) {
        Ok(text) if !text.trim().is_empty() => text,
        _ => strip_html_tags(html),
    }
}

#[async_trait]
impl ShutdownCleanup for BrowserSession {
    async fn cleanup(&self) -> anyhow::Result<()> {
        self.close().await;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "browser-session"
    }
}

pub struct NavigateTool {
    session: Arc<BrowserSession>,
}

impl NavigateTool {
    pub fn new(session: Arc<BrowserSession>) -> Self {
        Self { session }
    }
}

#[async_trait]
impl Tool for NavigateTool {
    fn name(&self) -> &str {
        "navigate"
    }

    fn description(&self) -> &str {
        "Open a web page in the text browser. Args: {\"url\": \"https://example.com\"}"
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "url": { "type": "string", "description": "http(s) URL to open" }
            },
            "required": ["url"]
        })
    }

    async fn execute(&self, args: Value) -> Result<String, ToolError> {
        let url = args
            .get("url")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ToolError::Failed("Missing url".to_string()))?;
        self.session.navigate(url.trim()).await
    }
}

pub struct CurrentPageTool {
    session: Arc<BrowserSession>,
}

impl CurrentPageTool {
    pub fn new(session: Arc<BrowserSession>) -> Self {
        Self { session }
    }
}

#[async_trait]
impl Tool for CurrentPageTool {
    fn name(&self) -> &str {
        "current_page"
    }

    fn description(&self) -> &str {
        "Return the URL of the page currently open in the text browser. Args: {}"
    }

    async fn execute(&self, _args: Value) -> Result<String, ToolError> {
        self.session.current_url().await
    }
}

pub struct ExtractTextTool {
    session: Arc<BrowserSession>,
}

impl ExtractTextTool {
    pub fn new(session: Arc<BrowserSession>) -> Self {
        Self { session }
    }
}

#[async_trait]
impl Tool for ExtractTextTool {
    fn name(&self) -> &str {
        "extract_text"
    }

    fn description(&self) -> &str {
        "Return the readable text of the page currently open in the text browser. Args: {}"
    }

    async fn execute(&self, _args: Value) -> Result<String, ToolError> {
        self.session.extract_text().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_html_tags() {
        assert_eq!(strip_html_tags("<p>Hello <b>world</b></p>"), "Hello world");
    }

    #[test]
    fn test_truncate_marks_cut() {
        assert_eq!(truncate("abcdef", 10), "abcdef");
        assert_eq!(truncate("abcdef", 3), "abc\n...[truncated]");
    }

    #[tokio::test]
    async fn test_tools_without_page_fail_softly() {
        let session = BrowserSession::new(1, 100);
        let err = CurrentPageTool::new(session.clone()).execute(Value::Null).await.unwrap_err();
        assert!(matches!(err, ToolError::Failed(_)));
        let err = ExtractTextTool::new(session).execute(Value::Null).await.unwrap_err();
        assert!(matches!(err, ToolError::Failed(_)));
    }

    #[tokio::test]
    async fn test_navigate_rejects_non_http_urls() {
        let session = BrowserSession::new(1, 100);
        let err = NavigateTool::new(session)
            .execute(serde_json::json!({"url": "file:///etc/passwd"}))
            .await
            .unwrap_err();
        assert_eq!(err, ToolError::Failed("Invalid URL: file:///etc/passwd".to_string()));
    }

    #[tokio::test]
    async fn test_cleanup_closes_page() {
        let session = BrowserSession::new(1, 100);
        *session.page.lock().await = Some(Page {
            url: "https://example.com/".to_string(),
            html: "<p>hi</p>".to_string(),
        });
        assert_eq!(session.current_url().await.unwrap(), "https://example.com/");
        session.cleanup().await.unwrap();
        assert!(session.current_url().await.is_err());
    }
}
