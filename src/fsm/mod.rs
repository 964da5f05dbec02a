//! 思考 / 评审 / 行动状态机

pub mod decision;
pub mod machine;
pub mod state;

pub use decision::{decide, extract_json, field, parse_action, Decision};
pub use machine::{RunOutcome, StateMachine, Timeouts};
pub use state::{Action, State};
