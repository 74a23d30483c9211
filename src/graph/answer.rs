//! 回答合成节点
//!
//! 把用户输入、会话上下文、检索结果、应用数据与执行结果折叠进最后一次模型
//! 调用。负载治理：长列表只留前 5 条并追加省略说明，序列化整体超过字符
//! 预算时按字符边界硬截断。模型失败时替换为固定格式的越南语致歉——本节点
//! 永不向上抛错，回合总有非空回复。

use serde_json::{Map, Value};
use tracing::{error, info};

use crate::config::AppConfig;
use crate::core::state::{Message, TurnState};
use crate::llm::{model_for_task, ChatOptions, LlmClient, LlmTask};

const TRUNCATION_MARKER: &str = "... (truncated)";

/// 列表字段超过上限时截到前 max_items 条并追加省略说明
pub(crate) fn limit_lists(data: &Map<String, Value>, max_items: usize) -> Map<String, Value> {
    data.iter()
        .map(|(key, value)| {
            let limited = match value {
                Value::Array(items) if items.len() > max_items => {
                    let omitted = items.len() - max_items;
                    let mut kept: Vec<Value> = items[..max_items].to_vec();
                    kept.push(Value::String(format!("... (and {omitted} more items)")));
                    Value::Array(kept)
                }
                other => other.clone(),
            };
            (key.clone(), limited)
        })
        .collect()
}

/// 超过字符预算时按字符边界截断并追加标记
pub(crate) fn truncate_payload(payload: String, max_chars: usize) -> String {
    match payload.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}{}", &payload[..idx], TRUNCATION_MARKER),
        None => payload,
    }
}

fn format_app_data(cfg: &AppConfig, state: &TurnState) -> String {
    if state.app_data.is_empty() {
        return "None".to_string();
    }
    let limited = limit_lists(&state.app_data, cfg.answer.max_list_items);
    let serialized =
        serde_json::to_string_pretty(&limited).unwrap_or_else(|_| "None".to_string());
    truncate_payload(serialized, cfg.answer.max_payload_chars)
}

fn format_optional<T: serde::Serialize>(value: Option<&T>) -> String {
    value
        .and_then(|v| serde_json::to_string_pretty(v).ok())
        .unwrap_or_else(|| "None".to_string())
}

fn build_prompt(cfg: &AppConfig, state: &TurnState) -> String {
    let app_data = format_app_data(cfg, state);
    let web_results = if state.web_results.is_empty() {
        "None".to_string()
    } else {
        format_optional(Some(&state.web_results))
    };
    let step_results = if state.step_results.is_empty() {
        "None".to_string()
    } else {
        format_optional(Some(&state.step_results))
    };
    let plan = format_optional(state.plan.as_ref());

    format!(
        "User question: {}\n\nConversation history:\n{}\n\nKnowledge base context:\n{}\n\nApp data:\n{}\n\nWeb search results:\n{}\n\nExecution plan:\n{}\n\nStep results:\n{}\n\nAnswer the user's question in Vietnamese, using the data above when relevant.",
        state.user_input,
        state.chat_context,
        state.kb_context,
        app_data,
        web_results,
        plan,
        step_results,
    )
}

/// 合成最终回答并写入 state.answer
pub async fn synthesize_answer(llm: &dyn LlmClient, cfg: &AppConfig, state: &mut TurnState) {
    let messages = vec![
        Message::system(
            "You are Culi, a helpful AI accounting assistant for Vietnamese small businesses. \
             Respond in Vietnamese.",
        ),
        Message::user(build_prompt(cfg, state)),
    ];

    let opts = ChatOptions::default()
        .with_temperature(cfg.llm.temperature)
        .with_max_tokens(cfg.llm.max_tokens_answer)
        .with_model(model_for_task(&cfg.llm, LlmTask::AnswerGeneration));

    match llm.complete(&messages, &opts).await {
        Ok(answer) => {
            info!("answer generated");
            state.answer = answer.trim().to_string();
        }
        Err(e) => {
            error!(error = %e, "answer generation failed");
            state.answer = format!("Xin lỗi, đã có lỗi khi tạo phản hồi: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockLlmClient;

    #[test]
    fn long_lists_keep_first_five_plus_note() {
        let mut data = Map::new();
        let invoices: Vec<Value> = (0..7).map(|i| serde_json::json!({"code": i})).collect();
        data.insert("invoices".to_string(), Value::Array(invoices));
        data.insert("total".to_string(), Value::from(7));

        let limited = limit_lists(&data, 5);
        let items = limited["invoices"].as_array().unwrap();
        assert_eq!(items.len(), 6);
        assert_eq!(
            items[5],
            Value::String("... (and 2 more items)".to_string())
        );
        assert_eq!(limited["total"], Value::from(7));
    }

    #[test]
    fn short_lists_are_untouched() {
        let mut data = Map::new();
        data.insert("branches".to_string(), serde_json::json!([1, 2, 3]));
        let limited = limit_lists(&data, 5);
        assert_eq!(limited["branches"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn payload_is_hard_truncated_on_char_boundary() {
        // 多字节字符也要安全截断
        let payload = "hóa đơn ".repeat(500);
        let truncated = truncate_payload(payload, 3000);
        assert!(truncated.ends_with(TRUNCATION_MARKER));
        assert_eq!(
            truncated.chars().count(),
            3000 + TRUNCATION_MARKER.chars().count()
        );
    }

    #[test]
    fn short_payload_is_untouched() {
        let payload = "ngắn".to_string();
        assert_eq!(truncate_payload(payload.clone(), 3000), payload);
    }

    #[tokio::test]
    async fn answer_prompt_carries_limited_app_data() {
        let mock = MockLlmClient::new();
        mock.push_response("Đây là 5 hóa đơn gần nhất của bạn.");
        let cfg = AppConfig::default();
        let mut state = TurnState::new("u1", "w1", "c1", "xem hóa đơn", vec![], None);
        let invoices: Vec<Value> = (0..7)
            .map(|i| serde_json::json!({"code": format!("HD{i:03}")}))
            .collect();
        state.app_data.insert("invoices".to_string(), Value::Array(invoices));

        synthesize_answer(&mock, &cfg, &mut state).await;
        assert_eq!(state.answer, "Đây là 5 hóa đơn gần nhất của bạn.");

        let prompt = &mock.requests()[0][1].content;
        assert!(prompt.contains("HD004"));
        assert!(!prompt.contains("HD005"));
        assert!(prompt.contains("... (and 2 more items)"));
    }

    #[tokio::test]
    async fn model_failure_yields_apology() {
        let mock = MockLlmClient::new();
        mock.push_error("timeout");
        let cfg = AppConfig::default();
        let mut state = TurnState::new("u1", "w1", "c1", "xin chào", vec![], None);

        synthesize_answer(&mock, &cfg, &mut state).await;
        assert_eq!(
            state.answer,
            "Xin lỗi, đã có lỗi khi tạo phản hồi: timeout"
        );
    }
}
