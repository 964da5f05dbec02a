//! ToolCallingAgent：基于 JSON tool call 的行动 Agent
//!
//! 每一步调用 LLM，回复为 `{"tool": "...", "args": {...}}` 时执行工具并把结果作为观察追加到对话；
//! `tool` 为 "final" 或回复不含 JSON 时结束并返回答案。
//! 工具执行失败（ToolError::Execution）立即中止；其余工具错误反馈给模型继续。

use std::sync::Arc;

use crate::agent::{ActionAgent, AgentObserver};
use crate::core::{AgentRunError, ToolError};
use crate::llm::LlmClient;
use crate::memory::Message;
use crate::tools::{tool_call_schema_json, ToolCall, ToolExecutor};

pub const DEFAULT_MAX_STEPS: usize = 10;

/// 结束工具名：args.answer 为最终输出
const FINAL_TOOL: &str = "final";

#[derive(Debug, Clone, PartialEq)]
enum AgentStep {
    Answer(String),
    Call(ToolCall),
}

/// 解析模型回复：提取 JSON 块（```json ... ``` 或首个 `{` 到最后一个 `}`），否则视为直接回答
fn parse_reply(output: &str) -> Result<AgentStep, String> {
    let trimmed = output.trim();
    let json_str = if let Some(start) = trimmed.find("```json") {
        let rest = &trimmed[start + 7..];
        rest.find("```").map(|end| rest[..end].trim()).unwrap_or(rest.trim())
    } else if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if start < end {
            &trimmed[start..=end]
        } else {
            return Ok(AgentStep::Answer(trimmed.to_string()));
        }
    } else {
        return Ok(AgentStep::Answer(trimmed.to_string()));
    };

    let call: ToolCall = serde_json::from_str(json_str).map_err(|e| format!("{}: {}", e, json_str))?;
    if call.tool.is_empty() {
        return Ok(AgentStep::Answer(trimmed.to_string()));
    }
    if call.tool == FINAL_TOOL {
        let answer = match call.args.get("answer") {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        };
        return Ok(AgentStep::Answer(answer));
    }
    Ok(AgentStep::Call(call))
}

/// 审计中的工具输入：单个字符串参数直接展示，其余展示 JSON
fn tool_input(args: &serde_json::Value) -> String {
    if let Some(obj) = args.as_object() {
        if obj.len() == 1 {
            if let Some(serde_json::Value::String(s)) = obj.values().next() {
                return s.clone();
            }
        }
    }
    args.to_string()
}

pub struct ToolCallingAgent {
    llm: Arc<dyn LlmClient>,
    tools: ToolExecutor,
    max_steps: usize,
}

impl ToolCallingAgent {
    pub fn new(llm: Arc<dyn LlmClient>, tools: ToolExecutor) -> Self {
        Self {
            llm,
            tools,
            max_steps: DEFAULT_MAX_STEPS,
        }
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    fn system_prompt(&self) -> String {
        format!(
            "You are an agent that completes tasks on the local machine using tools.\n\
             To call a tool, reply with only a JSON object matching this schema:\n{}\n\n\
             Available tools:\n{}\n\n\
             When the task is done, reply with {{\"tool\": \"{}\", \"args\": {{\"answer\": \"<result>\"}}}}.",
            tool_call_schema_json(),
            self.tools.registry().to_schema_json(),
            FINAL_TOOL
        )
    }
}

#[async_trait::async_trait]
impl ActionAgent for ToolCallingAgent {
    async fn run(
        &self,
        instruction: &str,
        observer: &mut dyn AgentObserver,
    ) -> Result<String, AgentRunError> {
        let mut messages = vec![
            Message::system(self.system_prompt()),
            Message::user(instruction.to_string()),
        ];

        for step in 0..self.max_steps {
            let reply = self
                .llm
                .generate(&messages)
                .await
                .map_err(|e| AgentRunError::Failed(e.to_string()))?;
            let content = reply
                .content
                .ok_or_else(|| AgentRunError::Failed("agent model returned no content".to_string()))?;
            observer.on_agent_log(&content);
            tracing::debug!(step, "agent step");

            let call = match parse_reply(&content) {
                Ok(AgentStep::Answer(answer)) => return Ok(answer),
                Ok(AgentStep::Call(call)) => call,
                Err(e) => {
                    messages.push(Message::assistant(content));
                    messages.push(Message::user(format!(
                        "Error: invalid tool call JSON ({}). Reply with a single JSON tool call.",
                        e
                    )));
                    continue;
                }
            };

            observer.on_tool_start(&call.tool, &tool_input(&call.args));
            messages.push(Message::assistant(content));
            match self.tools.execute(&call.tool, call.args).await {
                Ok(output) => {
                    observer.on_tool_end(&output);
                    messages.push(Message::user(format!("Observation: {}", output)));
                }
                Err(ToolError::Execution(e)) => {
                    observer.on_tool_error(&e.to_string());
                    return Err(AgentRunError::ToolExecution(e));
                }
                Err(ToolError::Failed(msg)) => {
                    observer.on_tool_error(&msg);
                    messages.push(Message::user(format!("Error: {}", msg)));
                }
            }
        }

        Err(AgentRunError::Failed(format!(
            "agent did not finish within {} steps",
            self.max_steps
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::AuditTrail;
    use crate::llm::MockLlmClient;
    use crate::tools::{SleepTool, TerminalTool, ToolRegistry};
    use std::time::Duration;

    fn agent(mock: Arc<MockLlmClient>) -> ToolCallingAgent {
        let mut registry = ToolRegistry::new();
        registry.register(TerminalTool::new(5));
        registry.register(SleepTool::new(1));
        ToolCallingAgent::new(mock, ToolExecutor::new(registry, Duration::from_secs(10)))
    }

    #[test]
    fn test_parse_reply_variants() {
        assert_eq!(parse_reply("just text").unwrap(), AgentStep::Answer("just text".to_string()));
        assert_eq!(
            parse_reply("```json\n{\"tool\":\"final\",\"args\":{\"answer\":\"42\"}}\n```").unwrap(),
            AgentStep::Answer("42".to_string())
        );
        match parse_reply("Sure: {\"tool\":\"terminal\",\"args\":{\"command\":\"ls\"}}").unwrap() {
            AgentStep::Call(call) => {
                assert_eq!(call.tool, "terminal");
                assert_eq!(tool_input(&call.args), "ls");
            }
            other => panic!("unexpected step: {other:?}"),
        }
        assert!(parse_reply("{not json}").is_err());
    }

    #[tokio::test]
    async fn test_tool_call_then_final_answer() {
        let mock = Arc::new(
            MockLlmClient::new()
                .reply(r#"{"tool":"terminal","args":{"command":"echo hi"}}"#, 5)
                .reply(r#"{"tool":"final","args":{"answer":"printed hi"}}"#, 5),
        );
        let mut trail = AuditTrail::new();
        let out = agent(mock.clone()).run("say hi", &mut trail).await.unwrap();
        assert_eq!(out, "printed hi");

        let rendered = trail.render();
        assert!(rendered.contains("[LOG-1] [TOOL] name=[terminal] input=[echo hi]"));
        assert!(rendered.contains("[LOG-2] [TOOL] output=[Successfully ran the following command=[echo hi] with output=[hi\n]]"));

        let second = mock.call(1).unwrap();
        assert!(second.last().unwrap().content.starts_with("Observation: Successfully ran"));
    }

    #[tokio::test]
    async fn test_failing_command_aborts_run() {
        let mock = Arc::new(
            MockLlmClient::new()
                .reply(r#"{"tool":"terminal","args":{"command":"exit 1"}}"#, 5)
                .reply("unreachable", 5),
        );
        let mut trail = AuditTrail::new();
        let err = agent(mock.clone()).run("fail", &mut trail).await.unwrap_err();
        assert!(matches!(err, AgentRunError::ToolExecution(ref e) if e.command == "exit 1"));
        assert_eq!(mock.call_count(), 1);
        assert!(trail.render().contains("[TOOL] error=["));
    }

    #[tokio::test]
    async fn test_soft_tool_errors_are_fed_back() {
        let mock = Arc::new(
            MockLlmClient::new()
                .reply(r#"{"tool":"teleport","args":{}}"#, 5)
                .reply("gave up on teleporting", 5),
        );
        let mut trail = AuditTrail::new();
        let out = agent(mock.clone()).run("go", &mut trail).await.unwrap();
        assert_eq!(out, "gave up on teleporting");
        let second = mock.call(1).unwrap();
        assert_eq!(second.last().unwrap().content, "Error: Unknown tool: teleport");
    }

    #[tokio::test]
    async fn test_step_limit() {
        let call = r#"{"tool":"sleep","args":{"seconds":0}}"#;
        let mock = Arc::new(MockLlmClient::new().reply(call, 1).reply(call, 1));
        let mut trail = AuditTrail::new();
        let err = agent(mock)
            .with_max_steps(2)
            .run("loop", &mut trail)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            AgentRunError::Failed("agent did not finish within 2 steps".to_string())
        );
    }

    #[test]
    fn test_system_prompt_lists_tools() {
        let prompt = agent(Arc::new(MockLlmClient::new())).system_prompt();
        assert!(prompt.contains("\"name\": \"terminal\""));
        assert!(prompt.contains("\"final\""));
    }
}
