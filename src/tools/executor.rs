//! 工具执行器
//!
//! 对每次调用施加全局超时，并输出结构化审计日志（JSON）；超时视为普通工具失败。

use std::time::{Duration, Instant};

use tokio::time::timeout;

use crate::core::ToolError;
use crate::tools::ToolRegistry;

pub struct ToolExecutor {
    registry: ToolRegistry,
    timeout: Duration,
}

impl ToolExecutor {
    pub fn new(registry: ToolRegistry, timeout: Duration) -> Self {
        Self { registry, timeout }
    }

    pub async fn execute(&self, tool_name: &str, args: serde_json::Value) -> Result<String, ToolError> {
        let start = Instant::now();
        let args_preview = args_preview(&args);
        let result = timeout(self.timeout, self.registry.execute(tool_name, args)).await;

        let outcome = match &result {
            Ok(Ok(_)) => "ok",
            Ok(Err(ToolError::Execution(_))) => "execution_error",
            Ok(Err(ToolError::Failed(_))) => "error",
            Err(_) => "timeout",
        };
        let audit = serde_json::json!({
            "event": "tool_audit",
            "tool": tool_name,
            "outcome": outcome,
            "duration_ms": start.elapsed().as_millis() as u64,
            "args_preview": args_preview,
        });
        tracing::info!(audit = %audit, "tool");

        match result {
            Ok(r) => r,
            Err(_) => Err(ToolError::Failed(format!(
                "{} timed out after {}s",
                tool_name,
                self.timeout.as_secs()
            ))),
        }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }
}

fn args_preview(args: &serde_json::Value) -> String {
    let s = args.to_string();
    if s.chars().count() > 200 {
        format!("{}...", s.chars().take(200).collect::<String>())
    } else {
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::SleepTool;

    #[tokio::test]
    async fn test_timeout_is_reported_as_plain_failure() {
        let mut registry = ToolRegistry::new();
        registry.register(SleepTool::new(10));
        let executor = ToolExecutor::new(registry, Duration::from_millis(20));
        let err = executor
            .execute("sleep", serde_json::json!({"seconds": 5}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Failed(msg) if msg.contains("timed out")));
    }

    #[test]
    fn test_args_preview_truncates() {
        let long = serde_json::json!({"command": "x".repeat(500)});
        assert!(args_preview(&long).ends_with("..."));
    }
}
