//! 工具调用 JSON Schema 生成
//!
//! 将「合法 tool call」的 JSON 结构注入 Agent 的 system prompt，减少模型输出格式错误。

use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};

/// 工具调用：`{"tool": "...", "args": {...}}`；`tool` 为 "final" 时 `args.answer` 即最终输出
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ToolCall {
    /// 工具名，如 terminal、sleep、navigate，或 final
    pub tool: String,
    /// 工具参数，依工具不同而不同（command、seconds、url、answer 等）
    #[serde(default)]
    pub args: serde_json::Value,
}

/// 返回工具调用的 JSON Schema 字符串，可拼入 system prompt
pub fn tool_call_schema_json() -> String {
    let schema = schema_for!(ToolCall);
    serde_json::to_string_pretty(&schema).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_names_both_fields() {
        let schema = tool_call_schema_json();
        assert!(schema.contains("\"tool\""));
        assert!(schema.contains("\"args\""));
    }
}
