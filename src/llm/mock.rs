//! Mock LLM 客户端（用于测试，无需 API）
//!
//! 按脚本顺序吐回复，并记录每次调用收到的消息，便于断言提示词内容。

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::core::state::Message;
use crate::llm::traits::{ChatOptions, LlmClient};

/// Mock 客户端：预置回复队列，耗尽后返回缺省回复
#[derive(Debug, Default)]
pub struct MockLlmClient {
    scripted: Mutex<VecDeque<Result<String, String>>>,
    requests: Mutex<Vec<Vec<Message>>>,
}

impl MockLlmClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一条成功回复
    pub fn push_response(&self, content: impl Into<String>) {
        self.scripted
            .lock()
            .unwrap()
            .push_back(Ok(content.into()));
    }

    /// 追加一条失败回复
    pub fn push_error(&self, message: impl Into<String>) {
        self.scripted
            .lock()
            .unwrap()
            .push_back(Err(message.into()));
    }

    /// 已收到的全部请求（每次调用的消息列表）
    pub fn requests(&self) -> Vec<Vec<Message>> {
        self.requests.lock().unwrap().clone()
    }

    /// 调用次数
    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, messages: &[Message], _opts: &ChatOptions) -> Result<String, String> {
        self.requests.lock().unwrap().push(messages.to_vec());
        self.scripted
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok("(mock reply)".to_string()))
    }
}
