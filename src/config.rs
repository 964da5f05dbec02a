//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `FLOW__*` 覆盖（双下划线表示嵌套，如 `FLOW__FSM__CHAT_TIMEOUT_SECS=60`）。

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub llm: LlmSection,
    pub fsm: FsmSection,
    pub agent: AgentSection,
    pub tools: ToolsSection,
    pub log: LogSection,
    pub server: ServerSection,
}

/// [llm] 段：后端选择与采样参数
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    /// 后端：openai / deepseek
    pub provider: String,
    pub model: String,
    pub base_url: Option<String>,
    pub temperature: f32,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "gpt-3.5-turbo-16k".to_string(),
            base_url: None,
            temperature: 0.05,
        }
    }
}

/// [fsm] 段：起始轮次、各类调用超时、重试间隔
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FsmSection {
    pub start_turn: u32,
    /// 评审调用（JudgeThought / JudgeAction）超时（秒）
    pub chat_timeout_secs: u64,
    /// Agent 调用超时（秒）
    pub agent_timeout_secs: u64,
    /// 思考调用（Init / Next / 差评重写）超时；未设置时不限时
    pub think_timeout_secs: Option<u64>,
    pub retry_delay_ms: u64,
}

impl Default for FsmSection {
    fn default() -> Self {
        Self {
            start_turn: 0,
            chat_timeout_secs: 30,
            agent_timeout_secs: 30,
            think_timeout_secs: None,
            retry_delay_ms: 1000,
        }
    }
}

impl FsmSection {
    pub fn chat_timeout(&self) -> Duration {
        Duration::from_secs(self.chat_timeout_secs)
    }

    pub fn agent_timeout(&self) -> Duration {
        Duration::from_secs(self.agent_timeout_secs)
    }

    pub fn think_timeout(&self) -> Option<Duration> {
        self.think_timeout_secs.map(Duration::from_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

/// [agent] 段：行动 Agent 的步数上限与可选独立模型
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AgentSection {
    pub max_steps: usize,
    pub model: Option<String>,
}

impl Default for AgentSection {
    fn default() -> Self {
        Self {
            max_steps: 10,
            model: None,
        }
    }
}

/// [tools] 段：终端超时、sleep 上限、浏览器抓取参数
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ToolsSection {
    pub terminal_timeout_secs: u64,
    pub max_sleep_secs: u64,
    pub max_page_chars: usize,
    pub browser_timeout_secs: u64,
}

impl Default for ToolsSection {
    fn default() -> Self {
        Self {
            terminal_timeout_secs: 30,
            max_sleep_secs: 60,
            max_page_chars: 8000,
            browser_timeout_secs: 15,
        }
    }
}

/// [log] 段
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogSection {
    pub level: String,
    pub pretty: bool,
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            level: "debug".to_string(),
            pretty: false,
        }
    }
}

/// [server] 段：WebSocket 输出流监听地址
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub bind_addr: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
        }
    }
}

/// 加载配置，环境变量 FLOW__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml，找到则作为第一源
/// 2. 若传入 config_path，则追加该文件（必须存在，可覆盖前面的键）
/// 3. 最后叠加环境变量 FLOW__*
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    for name in ["config/default", "../config/default"] {
        if std::path::Path::new(&format!("{}.toml", name)).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(path) = config_path {
        builder = builder.add_source(config::File::from(path).required(true));
    }

    builder = builder.add_source(
        config::Environment::with_prefix("FLOW")
            .separator("__")
            .try_parsing(true),
    );

    builder.build()?.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.fsm.start_turn, 0);
        assert_eq!(cfg.fsm.chat_timeout(), Duration::from_secs(30));
        assert_eq!(cfg.fsm.agent_timeout(), Duration::from_secs(30));
        assert!(cfg.fsm.think_timeout().is_none());
        assert_eq!(cfg.fsm.retry_delay(), Duration::from_secs(1));
        assert_eq!(cfg.log.level, "debug");
    }

    #[test]
    fn test_load_from_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[fsm]\nstart_turn = 3\nthink_timeout_secs = 90\n\n[llm]\nprovider = \"deepseek\"\nmodel = \"deepseek-chat\""
        )
        .unwrap();

        let cfg = load_config(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(cfg.fsm.start_turn, 3);
        assert_eq!(cfg.fsm.think_timeout(), Some(Duration::from_secs(90)));
        assert_eq!(cfg.fsm.chat_timeout_secs, 30);
        assert_eq!(cfg.llm.provider, "deepseek");
        assert_eq!(cfg.llm.model, "deepseek-chat");
        assert!((cfg.llm.temperature - 0.05).abs() < f32::EPSILON);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let result = load_config(Some(PathBuf::from("/nonexistent/flow.toml")));
        assert!(result.is_err());
    }
}
