//! 状态机的状态定义

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// 显式 null 与字段缺失同样视为默认值
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Agent 任务：由评审通过的 thought（type=agent）解析而来
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Action {
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub kind: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub thought: String,
    /// 交给 Agent 的指令（thought 中的 output 字段）
    #[serde(rename = "output", default, deserialize_with = "null_as_default")]
    pub instruction: String,
    #[serde(rename = "problemAnalysis", default, deserialize_with = "null_as_default")]
    pub problem_analysis: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub resources: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum State {
    Init,
    Next,
    Action(Action),
    JudgeThought {
        message: String,
    },
    JudgeAction {
        problem: String,
        message: String,
        audit_trail: String,
    },
    ThoughtDecider {
        thought: String,
        judge_message: String,
    },
    Complete,
}

impl State {
    pub fn name(&self) -> &'static str {
        match self {
            State::Init => "Init",
            State::Next => "Next",
            State::Action(_) => "Action",
            State::JudgeThought { .. } => "JudgeThought",
            State::JudgeAction { .. } => "JudgeAction",
            State::ThoughtDecider { .. } => "ThoughtDecider",
            State::Complete => "Complete",
        }
    }
}
