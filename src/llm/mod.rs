//! LLM 层：客户端抽象与实现（OpenAI 兼容 / Mock）以及按任务选模型的路由

pub mod mock;
pub mod openai;
pub mod router;
pub mod traits;

pub use mock::MockLlmClient;
pub use openai::OpenAiClient;
pub use router::{model_for_task, LlmTask};
pub use traits::{ChatOptions, LlmClient};
