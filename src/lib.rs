//! Culi - 越南中小企业 AI 会计助手编排核心
//!
//! 模块划分：
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 错误类型、回合状态（TurnState）、编排器与路由
//! - **llm**: LLM 客户端抽象与实现（OpenAI 兼容 / Mock）、按任务选模型
//! - **graph**: 编排节点（意图分类、上下文、读取、Web 检索、计划生成 / 审批 / 执行、回答合成）
//! - **apps**: 外部应用适配器层（契约类型、注册表、KiotViet、Unknown 回退）
//! - **observability**: tracing 初始化
//!
//! 编排核心一次只处理一个对话回合：认证、持久化与 HTTP 路由由外部协作方负责，
//! 本 crate 只接收已构建好的 TurnState 并返回带最终回答的终态。

pub mod apps;
pub mod config;
pub mod core;
pub mod graph;
pub mod llm;
pub mod observability;

pub use crate::apps::{AdapterRegistry, AppAdapter, ConnectedAppConfig, Plan, PlanStep, StepResult};
pub use crate::core::{AgentError, Intent, Message, Orchestrator, Role, TurnState};
pub use crate::llm::{ChatOptions, LlmClient, MockLlmClient, OpenAiClient};
