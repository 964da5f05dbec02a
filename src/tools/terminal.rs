//! Terminal 工具：通过 bash -c 执行命令
//!
//! 命令无法启动、超时或退出码非 0 视为执行失败（ToolError::Execution），会中止整个 Agent 调用；
//! 命中危险子串（rm -rf、mkfs 等）直接拒绝，作为普通失败反馈给 Agent。

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::process::Command;

use crate::core::{ToolError, ToolExecutionError};
use crate::tools::Tool;

/// 禁止的命令子串
const FORBIDDEN_SUBSTR: &[&str] = &[
    "rm -rf /",
    "rm -fr /",
    "mkfs",
    "dd if=",
    "> /dev/sd",
    "chmod -r 777 /",
    ":(){ :|:& };:",
    "shutdown",
    "reboot",
];

pub struct TerminalTool {
    timeout: Duration,
}

impl TerminalTool {
    pub fn new(timeout_secs: u64) -> Self {
        Self {
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    fn check_forbidden(command: &str) -> Result<(), ToolError> {
        let lower = command.to_lowercase();
        match FORBIDDEN_SUBSTR.iter().find(|f| lower.contains(*f)) {
            Some(pattern) => Err(ToolError::Failed(format!("Forbidden pattern: {}", pattern))),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Tool for TerminalTool {
    fn name(&self) -> &str {
        "terminal"
    }

    fn description(&self) -> &str {
        "Run a bash command on the local machine and return its combined output. Args: {\"command\": \"ls -la\"}"
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "command": {
                    "type": "string",
                    "description": "The bash command to execute"
                }
            },
            "required": ["command"]
        })
    }

    async fn execute(&self, args: Value) -> Result<String, ToolError> {
        let command = args
            .get("command")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .trim()
            .to_string();
        if command.is_empty() {
            return Err(ToolError::Failed("Empty command".to_string()));
        }
        Self::check_forbidden(&command)?;

        tracing::info!(command = %command, "terminal tool execute");

        let child = Command::new("bash")
            .arg("-c")
            .arg(&command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(self.timeout, child).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(ToolExecutionError {
                    command,
                    output: String::new(),
                    status: format!("failed to start: {}", e),
                }
                .into())
            }
            Err(_) => {
                return Err(ToolExecutionError {
                    command,
                    output: String::new(),
                    status: format!("timed out after {}s", self.timeout.as_secs()),
                }
                .into())
            }
        };

        let mut combined = String::from_utf8_lossy(&output.stdout).to_string();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));
        if !output.status.success() {
            return Err(ToolExecutionError {
                command,
                output: combined,
                status: output.status.to_string(),
            }
            .into());
        }
        Ok(format!(
            "Successfully ran the following command=[{}] with output=[{}]",
            command, combined
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_successful_command() {
        let out = TerminalTool::new(5)
            .execute(serde_json::json!({"command": "echo hello"}))
            .await
            .unwrap();
        assert_eq!(
            out,
            "Successfully ran the following command=[echo hello] with output=[hello\n]"
        );
    }

    #[tokio::test]
    async fn test_non_zero_exit_is_execution_error() {
        let err = TerminalTool::new(5)
            .execute(serde_json::json!({"command": "echo oops >&2; exit 3"}))
            .await
            .unwrap_err();
        match err {
            ToolError::Execution(e) => {
                assert_eq!(e.command, "echo oops >&2; exit 3");
                assert_eq!(e.output, "oops\n");
                assert!(e.status.contains('3'));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_timeout_is_execution_error() {
        let err = TerminalTool::new(1)
            .execute(serde_json::json!({"command": "sleep 5"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Execution(e) if e.status.contains("timed out")));
    }

    #[tokio::test]
    async fn test_forbidden_pattern_is_rejected() {
        let err = TerminalTool::new(5)
            .execute(serde_json::json!({"command": "sudo mkfs.ext4 /dev/sda1"}))
            .await
            .unwrap_err();
        assert_eq!(err, ToolError::Failed("Forbidden pattern: mkfs".to_string()));
    }

    #[tokio::test]
    async fn test_empty_command_is_rejected() {
        let err = TerminalTool::new(5).execute(serde_json::json!({})).await.unwrap_err();
        assert_eq!(err, ToolError::Failed("Empty command".to_string()));
    }
}
