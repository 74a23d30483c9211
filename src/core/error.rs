//! 编排过程中的错误类型
//!
//! 仅供节点内部使用：所有失败都在产生它的节点被吸收（分类失败回退默认意图、
//! 生成失败写 error 字段、适配器失败转失败 StepResult、合成失败替换为道歉
//! 文案），run_turn 自身不会向上抛错。

use thiserror::Error;

/// 节点内部可能出现的错误（LLM、解析、配置、适配器）
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("LLM error: {0}")]
    LlmError(String),

    #[error("JSON parse error: {0}")]
    JsonParseError(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Adapter error: {0}")]
    AdapterError(String),

    #[error("No app connection available")]
    MissingApp,
}
