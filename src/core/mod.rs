//! 核心层：错误类型、回合状态、编排器与路由

pub mod error;
pub mod orchestrator;
pub mod state;

pub use error::AgentError;
pub use orchestrator::Orchestrator;
pub use state::{Intent, Message, Role, TurnState};
