//! StateMachine：思考 → 评审 → 行动 → 评审 的主循环
//!
//! 每次 step 执行当前状态的工作并切换到唯一的下一状态；任何错误都是致命的，
//! 失败的 step 不改变 state / turn / history（失败前已推送的输出除外）。

use std::future::Future;
use std::time::Duration;

use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

use crate::agent::{ActionAgentGateway, AgentFailure, AgentOutput};
use crate::config::FsmSection;
use crate::core::{AgentRunError, FlowError};
use crate::fsm::{decide, Action, Decision, State};
use crate::llm::ModelGateway;
use crate::memory::{ChatSession, Message};
use crate::prompts::{escape_json, PromptBuilder, Template};
use crate::stream::OutputSink;

/// 各类外部调用的超时；think 为 None 时思考调用不限时
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub chat: Duration,
    pub agent: Duration,
    pub think: Option<Duration>,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            chat: Duration::from_secs(30),
            agent: Duration::from_secs(30),
            think: None,
        }
    }
}

impl From<&FsmSection> for Timeouts {
    fn from(cfg: &FsmSection) -> Self {
        Self {
            chat: cfg.chat_timeout(),
            agent: cfg.agent_timeout(),
            think: cfg.think_timeout(),
        }
    }
}

/// run 的正常结束方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Completed { tokens_used: u64, turns: u32 },
    Cancelled,
}

async fn bounded<T>(
    operation: &'static str,
    limit: Option<Duration>,
    fut: impl Future<Output = T>,
) -> Result<T, FlowError> {
    match limit {
        None => Ok(fut.await),
        Some(limit) => timeout(limit, fut).await.map_err(|_| FlowError::Timeout {
            operation,
            limit,
        }),
    }
}

pub struct StateMachine {
    session_id: Uuid,
    problem: String,
    state: State,
    turn: u32,
    finished: bool,
    history: ChatSession,
    model: ModelGateway,
    agent: ActionAgentGateway,
    prompts: PromptBuilder,
    sink: OutputSink,
    timeouts: Timeouts,
}

impl StateMachine {
    pub fn new(
        problem: impl Into<String>,
        model: ModelGateway,
        agent: ActionAgentGateway,
        sink: OutputSink,
    ) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            problem: problem.into(),
            state: State::Init,
            turn: 0,
            finished: false,
            history: ChatSession::new(),
            model,
            agent,
            prompts: PromptBuilder::new(),
            sink,
            timeouts: Timeouts::default(),
        }
    }

    pub fn with_start_turn(mut self, turn: u32) -> Self {
        self.turn = turn;
        self
    }

    pub fn with_prompts(mut self, prompts: PromptBuilder) -> Self {
        self.prompts = prompts;
        self
    }

    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn problem(&self) -> &str {
        &self.problem
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn turn(&self) -> u32 {
        self.turn
    }

    pub fn tokens_used(&self) -> u64 {
        self.model.tokens_used()
    }

    pub fn history(&self) -> &ChatSession {
        &self.history
    }

    /// Complete 状态已处理完毕
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// 驱动循环：每步前检查取消；Complete 处理完后返回，遇错即返回该错误
    pub async fn run(&mut self, cancel: CancellationToken) -> Result<RunOutcome, FlowError> {
        let span = tracing::info_span!("session", id = %self.session_id);
        async {
            loop {
                if cancel.is_cancelled() {
                    tracing::info!("shutting down state loop");
                    return Ok(RunOutcome::Cancelled);
                }
                tracing::info!(turn = self.turn, state = self.state.name(), "step");
                tracing::debug!(state = ?self.state, "state content");
                if let Err(e) = self.step().await {
                    tracing::error!(error = %e, state = self.state.name(), "failed to handle state");
                    return Err(e);
                }
                if self.finished {
                    return Ok(RunOutcome::Completed {
                        tokens_used: self.tokens_used(),
                        turns: self.turn,
                    });
                }
            }
        }
        .instrument(span)
        .await
    }

    /// 执行当前状态一次
    pub async fn step(&mut self) -> Result<(), FlowError> {
        let next = match self.state.clone() {
            State::Init => self.handle_init().await?,
            State::Next => self.handle_next().await?,
            State::Action(action) => self.handle_action(action).await?,
            State::JudgeAction {
                problem,
                message,
                audit_trail,
            } => self.handle_judge_action(&problem, &message, &audit_trail).await?,
            State::JudgeThought { message } => self.handle_judge_thought(message).await?,
            State::ThoughtDecider {
                thought,
                judge_message,
            } => self.handle_thought_decider(&thought, &judge_message).await?,
            State::Complete => {
                if self.finished {
                    return Err(FlowError::AlreadyComplete);
                }
                self.sink
                    .push(format!("Completed! Tokens used: {}", self.tokens_used()))
                    .await?;
                self.finished = true;
                return Ok(());
            }
        };
        self.state = next;
        Ok(())
    }

    fn turn_var(&self) -> String {
        self.turn.to_string()
    }

    async fn think(&mut self, context: Vec<Message>) -> Result<String, FlowError> {
        let reply = bounded("think", self.timeouts.think, self.model.generate(&context)).await??;
        Ok(reply)
    }

    async fn judge(&mut self, prompt: String) -> Result<String, FlowError> {
        let context = [Message::system(prompt)];
        let reply = bounded("chat", Some(self.timeouts.chat), self.model.generate(&context)).await??;
        Ok(reply)
    }

    async fn handle_init(&mut self) -> Result<State, FlowError> {
        let vars = [("problem", self.problem.as_str())];
        let entry = self.prompts.render(Template::Entry, &vars)?;
        let rules = self.prompts.render(Template::Rules, &vars)?;

        let reply = self.think(vec![Message::system(entry)]).await?;
        self.sink.push(reply.as_str()).await?;
        self.history
            .extend([Message::system(rules), Message::assistant(reply.as_str())]);
        self.turn += 1;
        Ok(State::JudgeThought { message: reply })
    }

    async fn handle_next(&mut self) -> Result<State, FlowError> {
        let turn = self.turn_var();
        let next = self.prompts.render(
            Template::Next,
            &[("turn", turn.as_str()), ("problem", self.problem.as_str())],
        )?;
        let marker = self.prompts.render(Template::TurnMarker, &[("turn", turn.as_str())])?;

        let context = self.history.snapshot_with(Message::system(next));
        let reply = self.think(context).await?;
        self.sink.push(reply.as_str()).await?;
        self.history
            .extend([Message::system(marker), Message::assistant(reply.as_str())]);
        self.turn += 1;
        Ok(State::JudgeThought { message: reply })
    }

    async fn handle_action(&mut self, action: Action) -> Result<State, FlowError> {
        let resources = serde_json::to_string_pretty(&action.resources)?;
        let instruction = self.prompts.render(
            Template::AgentInstruction,
            &[
                ("instruction", action.instruction.as_str()),
                ("resources", resources.as_str()),
            ],
        )?;

        let result = bounded("agent", Some(self.timeouts.agent), self.agent.execute(&instruction)).await?;
        match result {
            Ok(AgentOutput {
                output,
                audit_trail,
            }) => {
                let report = self.prompts.render(
                    Template::ActionOutput,
                    &[
                        ("output", escape_json(&output).as_str()),
                        ("auditTrail", escape_json(&audit_trail).as_str()),
                    ],
                )?;
                self.sink.push(report.as_str()).await?;
                self.history.append(Message::system(report));
                Ok(State::JudgeAction {
                    problem: action.instruction,
                    message: output,
                    audit_trail,
                })
            }
            Err(AgentFailure {
                kind: AgentRunError::ToolExecution(err),
                audit_trail,
            }) => {
                tracing::warn!(error = %err, "agent tool execution failed");
                let error = err.to_string();
                let report = self.prompts.render(
                    Template::AgentFailureReport,
                    &[
                        ("error", escape_json(&error).as_str()),
                        ("auditTrail", escape_json(&audit_trail).as_str()),
                    ],
                )?;
                self.sink.push(report.as_str()).await?;
                self.history.append(Message::system(report));
                Ok(State::JudgeAction {
                    problem: action.instruction,
                    message: format!("The agent failed to run the tool: {}", error),
                    audit_trail,
                })
            }
            Err(AgentFailure { kind, .. }) => Err(FlowError::Agent(kind)),
        }
    }

    async fn handle_judge_action(
        &mut self,
        problem: &str,
        output: &str,
        audit_trail: &str,
    ) -> Result<State, FlowError> {
        let prompt = self.prompts.render(
            Template::JudgeAction,
            &[("problem", problem), ("output", output), ("auditTrail", audit_trail)],
        )?;
        let reply = self.judge(prompt).await?;
        self.sink.push(reply.as_str()).await?;
        self.history.append(Message::assistant(reply));
        Ok(State::Next)
    }

    async fn handle_judge_thought(&mut self, thought: String) -> Result<State, FlowError> {
        let prompt = self.prompts.render(
            Template::JudgeThought,
            &[("problem", self.problem.as_str()), ("think", thought.as_str())],
        )?;
        let reply = self.judge(prompt).await?;
        self.sink.push(reply.as_str()).await?;
        self.history.append(Message::assistant(reply.as_str()));
        Ok(State::ThoughtDecider {
            thought,
            judge_message: reply,
        })
    }

    async fn handle_thought_decider(
        &mut self,
        thought: &str,
        judge_message: &str,
    ) -> Result<State, FlowError> {
        match decide(thought, judge_message)? {
            Decision::Complete => Ok(State::Complete),
            Decision::Act(action) => Ok(State::Action(action)),
            Decision::Rethink => {
                let turn = self.turn_var();
                let bad = self.prompts.render(Template::BadCritique, &[("turn", turn.as_str())])?;
                let marker = self.prompts.render(Template::TurnMarker, &[("turn", turn.as_str())])?;

                let context = self.history.snapshot_with(Message::system(bad));
                let reply = self.think(context).await?;
                self.sink.push(reply.as_str()).await?;
                self.history
                    .extend([Message::system(marker), Message::assistant(reply.as_str())]);
                self.turn += 1;
                Ok(State::JudgeThought { message: reply })
            }
        }
    }
}
