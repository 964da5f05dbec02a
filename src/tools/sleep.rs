//! Sleep 工具：等待指定秒数（例如等待页面或后台进程就绪）

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::core::ToolError;
use crate::tools::Tool;

pub struct SleepTool {
    max_secs: u64,
}

impl SleepTool {
    pub fn new(max_secs: u64) -> Self {
        Self { max_secs }
    }
}

#[async_trait]
impl Tool for SleepTool {
    fn name(&self) -> &str {
        "sleep"
    }

    fn description(&self) -> &str {
        "Wait for a number of seconds before continuing. Args: {\"seconds\": 3}"
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "seconds": { "type": "integer", "description": "How long to wait" }
            },
            "required": ["seconds"]
        })
    }

    async fn execute(&self, args: Value) -> Result<String, ToolError> {
        let seconds = args
            .get("seconds")
            .and_then(|v| v.as_u64().or_else(|| v.as_str().and_then(|s| s.trim().parse().ok())))
            .ok_or_else(|| ToolError::Failed("Missing seconds".to_string()))?;
        let seconds = seconds.min(self.max_secs);
        tokio::time::sleep(Duration::from_secs(seconds)).await;
        Ok(format!("Slept for {} seconds", seconds))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_zero_seconds() {
        let out = SleepTool::new(5).execute(serde_json::json!({"seconds": "0"})).await.unwrap();
        assert_eq!(out, "Slept for 0 seconds");
    }

    #[tokio::test]
    async fn test_missing_argument() {
        let err = SleepTool::new(5).execute(serde_json::json!({})).await.unwrap_err();
        assert_eq!(err, ToolError::Failed("Missing seconds".to_string()));
    }
}
