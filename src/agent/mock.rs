//! Mock 行动 Agent（用于测试）
//!
//! 按脚本顺序返回结果，可先向观察者报告一次工具调用；记录收到的指令。

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::agent::{ActionAgent, AgentObserver};
use crate::core::AgentRunError;

#[derive(Debug, Clone)]
struct ToolEvent {
    name: String,
    input: String,
    output: Option<String>,
}

#[derive(Debug)]
struct Step {
    tool: Option<ToolEvent>,
    result: Result<String, AgentRunError>,
}

#[derive(Debug, Default)]
pub struct MockActionAgent {
    script: Mutex<VecDeque<Step>>,
    instructions: Mutex<Vec<String>>,
}

impl MockActionAgent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn succeed(self, output: impl Into<String>) -> Self {
        self.push(Step {
            tool: None,
            result: Ok(output.into()),
        })
    }

    /// 先报告一次成功的工具调用，再返回 output
    pub fn succeed_with_tool(self, name: &str, input: &str, tool_output: &str, output: &str) -> Self {
        self.push(Step {
            tool: Some(ToolEvent {
                name: name.to_string(),
                input: input.to_string(),
                output: Some(tool_output.to_string()),
            }),
            result: Ok(output.to_string()),
        })
    }

    pub fn fail(self, err: AgentRunError) -> Self {
        self.push(Step {
            tool: None,
            result: Err(err),
        })
    }

    /// 先报告一次工具调用，再以工具错误结束
    pub fn fail_after_tool(self, name: &str, input: &str, err: AgentRunError) -> Self {
        self.push(Step {
            tool: Some(ToolEvent {
                name: name.to_string(),
                input: input.to_string(),
                output: None,
            }),
            result: Err(err),
        })
    }

    fn push(self, step: Step) -> Self {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(step);
        }
        self
    }

    pub fn call_count(&self) -> usize {
        self.instructions.lock().map(|i| i.len()).unwrap_or(0)
    }

    pub fn instructions(&self) -> Vec<String> {
        self.instructions.lock().map(|i| i.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ActionAgent for MockActionAgent {
    async fn run(
        &self,
        instruction: &str,
        observer: &mut dyn AgentObserver,
    ) -> Result<String, AgentRunError> {
        if let Ok(mut seen) = self.instructions.lock() {
            seen.push(instruction.to_string());
        }
        let step = self.script.lock().ok().and_then(|mut s| s.pop_front());
        let Some(step) = step else {
            return Err(AgentRunError::Failed("mock script exhausted".to_string()));
        };
        if let Some(tool) = step.tool {
            observer.on_tool_start(&tool.name, &tool.input);
            match (&tool.output, &step.result) {
                (Some(out), _) => observer.on_tool_end(out),
                (None, Err(e)) => observer.on_tool_error(&e.to_string()),
                (None, Ok(_)) => {}
            }
        }
        step.result
    }
}
