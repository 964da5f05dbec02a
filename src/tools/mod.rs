//! 行动 Agent 可用的工具：terminal、sleep 与文本浏览器（navigate / current_page / extract_text）

pub mod browser;
pub mod executor;
pub mod registry;
pub mod schema;
pub mod sleep;
pub mod terminal;

use std::sync::Arc;

use crate::config::ToolsSection;

pub use browser::{BrowserSession, CurrentPageTool, ExtractTextTool, NavigateTool};
pub use executor::ToolExecutor;
pub use registry::{Tool, ToolRegistry};
pub use schema::{tool_call_schema_json, ToolCall};
pub use sleep::SleepTool;
pub use terminal::TerminalTool;

/// 按 [tools] 配置注册全部工具；返回的 BrowserSession 需在会话结束时释放
pub fn default_registry(cfg: &ToolsSection) -> (ToolRegistry, Arc<BrowserSession>) {
    let session = BrowserSession::new(cfg.browser_timeout_secs, cfg.max_page_chars);
    let mut registry = ToolRegistry::new();
    registry.register(TerminalTool::new(cfg.terminal_timeout_secs));
    registry.register(SleepTool::new(cfg.max_sleep_secs));
    registry.register(NavigateTool::new(session.clone()));
    registry.register(CurrentPageTool::new(session.clone()));
    registry.register(ExtractTextTool::new(session.clone()));
    (registry, session)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registry_has_all_tools() {
        let (registry, _session) = default_registry(&ToolsSection::default());
        assert_eq!(
            registry.tool_names(),
            vec!["current_page", "extract_text", "navigate", "sleep", "terminal"]
        );
    }
}
