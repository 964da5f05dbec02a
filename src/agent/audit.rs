//! AuditTrail：单次 Agent 调用的动作 / 工具事件记录
//!
//! 作为 AgentObserver 传给 Agent，按发生顺序追加纯文本条目；render 为只读投影，
//! 每次渲染都从原始条目重新编号，重复调用结果一致。

/// Agent 运行过程的观察者，通知按发生顺序到达
pub trait AgentObserver: Send {
    /// Agent 层日志（模型的每次回复）
    fn on_agent_log(&mut self, log: &str);
    fn on_tool_start(&mut self, name: &str, input: &str);
    fn on_tool_end(&mut self, output: &str);
    fn on_tool_error(&mut self, error: &str);
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditTrail {
    entries: Vec<String>,
}

impl AuditTrail {
    pub fn new() -> Self {
        Self::default()
    }

    /// 编号后的文本记录，形如 `[LOG-0] ...`，条目间以换行分隔
    pub fn render(&self) -> String {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, entry)| format!("[LOG-{}] {}", i, entry))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl AgentObserver for AuditTrail {
    fn on_agent_log(&mut self, log: &str) {
        self.entries.push(format!("[AGENT] log_entry=[{}]", log));
    }

    fn on_tool_start(&mut self, name: &str, input: &str) {
        self.entries.push(format!("[TOOL] name=[{}] input=[{}]", name, input));
    }

    fn on_tool_end(&mut self, output: &str) {
        self.entries.push(format!("[TOOL] output=[{}]", output));
    }

    fn on_tool_error(&mut self, error: &str) {
        self.entries.push(format!("[TOOL] error=[{}]", error));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AuditTrail {
        let mut trail = AuditTrail::new();
        trail.on_agent_log("calling terminal");
        trail.on_tool_start("terminal", "ls");
        trail.on_tool_end("Cargo.toml");
        trail
    }

    #[test]
    fn test_render_labels_entries_in_order() {
        assert_eq!(
            sample().render(),
            "[LOG-0] [AGENT] log_entry=[calling terminal]\n\
             [LOG-1] [TOOL] name=[terminal] input=[ls]\n\
             [LOG-2] [TOOL] output=[Cargo.toml]"
        );
    }

    #[test]
    fn test_render_is_idempotent() {
        let trail = sample();
        let first = trail.render();
        assert_eq!(trail.render(), first);
        assert!(!first.contains("[LOG-0] [LOG-0]"));
    }

    #[test]
    fn test_render_after_more_events_keeps_earlier_labels() {
        let mut trail = sample();
        let before = trail.render();
        trail.on_tool_error("exit status 1");
        let after = trail.render();
        assert!(after.starts_with(&before));
        assert!(after.ends_with("[LOG-3] [TOOL] error=[exit status 1]"));
    }

    #[test]
    fn test_empty_trail_renders_empty() {
        assert_eq!(AuditTrail::new().render(), "");
    }
}
