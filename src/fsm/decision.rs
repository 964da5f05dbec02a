//! 从模型自由文本中读取 JSON 决策
//!
//! 取文本中第一个 JSON 对象（```json 代码块，或首个 `{` 到最后一个 `}`）；
//! 字段读取是宽松的：字段缺失或文档无法解析时返回空串，由调用方落入「无法识别 → 致命」分支。

use serde_json::Value;

use crate::core::FlowError;
use crate::fsm::Action;

/// 评审结论后的去向
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    Complete,
    Act(Action),
    Rethink,
}

/// 提取 JSON 对象文本；找不到 `{ ... }` 时返回 None
pub fn extract_json(text: &str) -> Option<&str> {
    let trimmed = text.trim();
    if let Some(start) = trimmed.find("```json") {
        let rest = &trimmed[start + 7..];
        let block = rest.find("```").map(|end| &rest[..end]).unwrap_or(rest).trim();
        if !block.is_empty() {
            return Some(block);
        }
    }
    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    (start < end).then(|| &trimmed[start..=end])
}

/// 读取顶层字段的字符串值；缺失或无法解析为空串
pub fn field(text: &str, key: &str) -> String {
    let Some(json) = extract_json(text) else {
        return String::new();
    };
    match serde_json::from_str::<Value>(json) {
        Ok(doc) => match doc.get(key) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        },
        Err(_) => String::new(),
    }
}

/// 把 type=agent 的 thought 解析为 Action
pub fn parse_action(thought: &str) -> Result<Action, serde_json::Error> {
    serde_json::from_str(extract_json(thought).unwrap_or(thought))
}

/// 根据评审结论与 thought 类型决定下一步
pub fn decide(thought: &str, judge_message: &str) -> Result<Decision, FlowError> {
    match field(judge_message, "status").as_str() {
        "good" => match field(thought, "type").as_str() {
            "complete" => Ok(Decision::Complete),
            "agent" => Ok(Decision::Act(parse_action(thought)?)),
            other => Err(FlowError::UnknownThoughtType(other.to_string())),
        },
        "bad" => Ok(Decision::Rethink),
        other => Err(FlowError::UnknownCritiqueStatus(other.to_string())),
    }
}
