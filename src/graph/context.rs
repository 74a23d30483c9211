//! 会话上下文节点
//!
//! 取最近 N 条历史消息拼成 `role: content` 行作为 chat_context；无历史时用
//! 固定占位文本。纯函数，无失败路径。

use tracing::debug;

use crate::config::AppConfig;
use crate::core::state::TurnState;

/// 聚合会话上下文并写回 TurnState
pub fn assemble_context(cfg: &AppConfig, state: &mut TurnState) {
    if state.messages.is_empty() {
        state.chat_context = "No previous conversation.".to_string();
    } else {
        let start = state
            .messages
            .len()
            .saturating_sub(cfg.app.chat_history_length);
        state.chat_context = state.messages[start..]
            .iter()
            .map(|m| format!("{}: {}", m.role.as_str(), m.content))
            .collect::<Vec<_>>()
            .join("\n");
    }
    // kb_context 由 Web 检索路径填充，其余路径保持为空
    state.kb_context = String::new();

    debug!(
        messages = state.messages.len(),
        intent = state.intent.as_str(),
        "context gathered"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::Message;

    #[test]
    fn empty_history_uses_placeholder() {
        let cfg = AppConfig::default();
        let mut state = TurnState::new("u1", "w1", "c1", "hi", vec![], None);
        assemble_context(&cfg, &mut state);
        assert_eq!(state.chat_context, "No previous conversation.");
        assert!(state.kb_context.is_empty());
    }

    #[test]
    fn history_is_bounded_and_chronological() {
        let mut cfg = AppConfig::default();
        cfg.app.chat_history_length = 2;
        let messages = vec![
            Message::user("một"),
            Message::assistant("hai"),
            Message::user("ba"),
        ];
        let mut state = TurnState::new("u1", "w1", "c1", "hi", messages, None);
        assemble_context(&cfg, &mut state);
        assert_eq!(state.chat_context, "assistant: hai\nuser: ba");
    }
}
