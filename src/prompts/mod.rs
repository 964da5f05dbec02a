//! PromptBuilder：模板名 + 变量 -> 渲染文本
//!
//! 占位符为 `{{name}}`，缺失变量即返回 PromptError（中止当前步，不会静默留空）。
//! 替换值不会被二次扫描，模型输出中出现的 `{{...}}` 原样保留。
//! 模板默认取内置文本，可由 `config/prompts/<name>.txt` 覆盖。

pub mod templates;

use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

use crate::core::PromptError;

/// 状态机使用的全部模板
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Template {
    Rules,
    Entry,
    Next,
    TurnMarker,
    BadCritique,
    AgentInstruction,
    AgentFailureReport,
    ActionOutput,
    JudgeThought,
    JudgeAction,
}

impl Template {
    pub const ALL: [Template; 10] = [
        Template::Rules,
        Template::Entry,
        Template::Next,
        Template::TurnMarker,
        Template::BadCritique,
        Template::AgentInstruction,
        Template::AgentFailureReport,
        Template::ActionOutput,
        Template::JudgeThought,
        Template::JudgeAction,
    ];

    /// 覆盖文件名（不含扩展名）与日志中的模板名
    pub fn name(self) -> &'static str {
        match self {
            Template::Rules => "rules",
            Template::Entry => "entry",
            Template::Next => "next",
            Template::TurnMarker => "turn_marker",
            Template::BadCritique => "bad_critique",
            Template::AgentInstruction => "agent_instruction",
            Template::AgentFailureReport => "agent_failure_report",
            Template::ActionOutput => "action_output",
            Template::JudgeThought => "judge_thought",
            Template::JudgeAction => "judge_action",
        }
    }

    fn builtin(self) -> &'static str {
        match self {
            Template::Rules => templates::RULES,
            Template::Entry => templates::ENTRY,
            Template::Next => templates::NEXT,
            Template::TurnMarker => templates::TURN_MARKER,
            Template::BadCritique => templates::BAD_CRITIQUE,
            Template::AgentInstruction => templates::AGENT_INSTRUCTION,
            Template::AgentFailureReport => templates::AGENT_FAILURE_REPORT,
            Template::ActionOutput => templates::ACTION_OUTPUT,
            Template::JudgeThought => templates::JUDGE_THOUGHT,
            Template::JudgeAction => templates::JUDGE_ACTION,
        }
    }
}

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").expect("placeholder regex is valid")
    })
}

/// 纯函数渲染：按出现顺序替换占位符，缺失变量报错
pub fn render(name: &str, template: &str, vars: &[(&str, &str)]) -> Result<String, PromptError> {
    let mut out = String::with_capacity(template.len());
    let mut last = 0;
    for caps in placeholder_regex().captures_iter(template) {
        let (Some(whole), Some(key)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let value = vars
            .iter()
            .find(|(k, _)| *k == key.as_str())
            .map(|(_, v)| *v)
            .ok_or_else(|| PromptError::MissingVariable {
                template: name.to_string(),
                variable: key.as_str().to_string(),
            })?;
        out.push_str(&template[last..whole.start()]);
        out.push_str(value);
        last = whole.end();
    }
    out.push_str(&template[last..]);
    Ok(out)
}

/// JSON 字符串转义（不含外层引号），用于把任意文本嵌入 JSON 模板
pub fn escape_json(input: &str) -> String {
    let quoted = serde_json::Value::String(input.to_string()).to_string();
    quoted[1..quoted.len() - 1].to_string()
}

/// 模板集合：创建后只读
#[derive(Debug, Clone, Default)]
pub struct PromptBuilder {
    overrides: HashMap<Template, String>,
}

impl PromptBuilder {
    /// 仅使用内置模板
    pub fn new() -> Self {
        Self::default()
    }

    /// 从目录加载覆盖模板，不存在的文件回退到内置模板
    pub fn load(dir: &Path) -> Self {
        let overrides = Template::ALL
            .into_iter()
            .filter_map(|t| {
                let path = dir.join(format!("{}.txt", t.name()));
                std::fs::read_to_string(&path).ok().map(|text| {
                    tracing::info!(template = t.name(), path = %path.display(), "prompt override loaded");
                    (t, text)
                })
            })
            .collect();
        Self { overrides }
    }

    pub fn with_override(mut self, template: Template, text: impl Into<String>) -> Self {
        self.overrides.insert(template, text.into());
        self
    }

    fn text(&self, template: Template) -> &str {
        self.overrides
            .get(&template)
            .map(String::as_str)
            .unwrap_or_else(|| template.builtin())
    }

    /// 渲染模板；`rules`（仅 Entry）与 `critique_schema` 片段自动注入
    pub fn render(&self, template: Template, vars: &[(&str, &str)]) -> Result<String, PromptError> {
        let rules;
        let mut all: Vec<(&str, &str)> = vars.to_vec();
        all.push(("critique_schema", templates::critique_schema()));
        if template == Template::Entry {
            rules = self.render(Template::Rules, vars)?;
            all.push(("rules", rules.as_str()));
        }
        render(template.name(), self.text(template), &all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_substitutes_all_placeholders() {
        let out = render("t", "a={{a}}, b={{ b }}, a again={{a}}", &[("a", "1"), ("b", "2")]).unwrap();
        assert_eq!(out, "a=1, b=2, a again=1");
    }

    #[test]
    fn test_missing_variable_is_an_error() {
        let err = render("next", "[Turn {{turn}}] {{problem}}", &[("turn", "1")]).unwrap_err();
        assert_eq!(
            err,
            PromptError::MissingVariable {
                template: "next".to_string(),
                variable: "problem".to_string(),
            }
        );
    }

    #[test]
    fn test_values_are_not_rescanned() {
        let out = render("t", "x={{x}}", &[("x", "{{y}}")]).unwrap();
        assert_eq!(out, "x={{y}}");
    }

    #[test]
    fn test_plain_json_braces_are_left_alone() {
        let out = render("t", r#"{"resources":{},"type":"{{t}}"}"#, &[("t", "agent")]).unwrap();
        assert_eq!(out, r#"{"resources":{},"type":"agent"}"#);
    }

    #[test]
    fn test_escape_json_handles_quotes_and_newlines() {
        assert_eq!(escape_json("say \"hi\"\nbye"), r#"say \"hi\"\nbye"#);
    }

    #[test]
    fn test_every_builtin_template_renders_with_its_slots() {
        let builder = PromptBuilder::new();
        let cases: [(Template, &[(&str, &str)]); 10] = [
            (Template::Rules, &[("problem", "p")]),
            (Template::Entry, &[("problem", "p")]),
            (Template::Next, &[("turn", "2"), ("problem", "p")]),
            (Template::TurnMarker, &[("turn", "2")]),
            (Template::BadCritique, &[("turn", "2")]),
            (Template::AgentInstruction, &[("instruction", "i"), ("resources", "{}")]),
            (Template::AgentFailureReport, &[("error", "e"), ("auditTrail", "a")]),
            (Template::ActionOutput, &[("output", "o"), ("auditTrail", "a")]),
            (Template::JudgeThought, &[("problem", "p"), ("think", "t")]),
            (Template::JudgeAction, &[("problem", "p"), ("output", "o"), ("auditTrail", "a")]),
        ];
        for (template, vars) in cases {
            let out = builder.render(template, vars);
            assert!(out.is_ok(), "{} failed: {:?}", template.name(), out);
        }
    }

    #[test]
    fn test_entry_embeds_rules_with_problem() {
        let out = PromptBuilder::new()
            .render(Template::Entry, &[("problem", "count the words")])
            .unwrap();
        assert!(out.contains("Rules! You must follow everything in this block!"));
        assert!(out.contains("The problem is: count the words"));
        assert!(out.contains("Provide only the JSON output"));
    }

    #[test]
    fn test_override_replaces_builtin() {
        let builder = PromptBuilder::new().with_override(Template::TurnMarker, "T{{turn}}");
        assert_eq!(builder.render(Template::TurnMarker, &[("turn", "4")]).unwrap(), "T4");
    }

    #[test]
    fn test_load_reads_override_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad_critique.txt"), "again {{turn}}").unwrap();
        let builder = PromptBuilder::load(dir.path());
        assert_eq!(builder.render(Template::BadCritique, &[("turn", "5")]).unwrap(), "again 5");
        assert!(builder.render(Template::TurnMarker, &[("turn", "5")]).unwrap().contains("[Turn 5]"));
    }
}
