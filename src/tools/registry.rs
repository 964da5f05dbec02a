//! 工具注册表
//!
//! 所有工具实现 Tool trait（name / description / parameters_schema / execute），由 ToolRegistry 按名注册与查找。

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::core::ToolError;

/// 工具 trait：名称、描述（供 LLM 理解）、参数 schema、异步执行（args 为 JSON）
#[async_trait]
pub trait Tool: Send + Sync {
    /// 工具名称（用于 JSON 中的 "tool" 字段）
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {},
            "required": []
        })
    }

    async fn execute(&self, args: Value) -> Result<String, ToolError>;
}

/// 按名称存储 Arc<dyn Tool>；BTreeMap 保证 prompt 中的工具顺序稳定
#[derive(Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tool: impl Tool + 'static) {
        let name = tool.name().to_string();
        self.tools.insert(name, Arc::new(tool));
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub async fn execute(&self, name: &str, args: Value) -> Result<String, ToolError> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| ToolError::Failed(format!("Unknown tool: {name}")))?;
        tool.execute(args).await
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }

    /// 工具清单 JSON（名称、描述、参数 schema），拼入 Agent 的 system prompt
    pub fn to_schema_json(&self) -> String {
        let tools: Vec<Value> = self
            .tools
            .iter()
            .map(|(name, tool)| {
                serde_json::json!({
                    "name": name,
                    "description": tool.description(),
                    "parameters": tool.parameters_schema()
                })
            })
            .collect();
        serde_json::to_string_pretty(&tools).unwrap_or_else(|_| "[]".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::SleepTool;

    #[tokio::test]
    async fn test_unknown_tool_is_a_plain_failure() {
        let registry = ToolRegistry::new();
        let err = registry.execute("teleport", Value::Null).await.unwrap_err();
        assert_eq!(err, ToolError::Failed("Unknown tool: teleport".to_string()));
    }

    #[test]
    fn test_schema_lists_registered_tools() {
        let mut registry = ToolRegistry::new();
        registry.register(SleepTool::new(5));
        let schema = registry.to_schema_json();
        assert!(schema.contains("\"name\": \"sleep\""));
        assert_eq!(registry.tool_names(), vec!["sleep".to_string()]);
    }
}
