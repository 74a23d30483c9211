//! 意图分类节点
//!
//! 让模型把用户输入归入封闭意图集合 {general_qa, tax_qa, app_read, app_plan,
//! no_app}。任何模型失败或输出不合法都静默回退 general_qa（派生布尔全 false），
//! 绝不向调用方抛错；未连接应用却要读写数据时强制改写为 no_app。

use serde::Deserialize;
use tracing::{error, info, warn};

use crate::config::AppConfig;
use crate::core::error::AgentError;
use crate::core::state::{Intent, Message, TurnState};
use crate::graph::strip_code_fences;
use crate::llm::{model_for_task, ChatOptions, LlmClient, LlmTask};

#[derive(Debug, Deserialize)]
struct Classification {
    #[serde(default)]
    intent: Option<String>,
    #[serde(default)]
    #[allow(dead_code)]
    reasoning: Option<String>,
    #[serde(default)]
    needs_web: bool,
    #[serde(default)]
    needs_app: bool,
    #[serde(default)]
    needs_plan: bool,
}

fn build_prompt(cfg: &AppConfig, state: &TurnState) -> String {
    let history = if state.messages.is_empty() {
        "No previous conversation.".to_string()
    } else {
        let turns = cfg.app.intent_history_turns;
        let start = state.messages.len().saturating_sub(turns);
        state.messages[start..]
            .iter()
            .map(|m| format!("{}: {}", m.role.as_str(), m.content))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let app_context = match &state.connected_app {
        Some(app) => format!("App: {}, Category: {}", app.name, app.category.as_str()),
        None => "None".to_string(),
    };

    format!(
        "User input: {}\n\nRecent conversation:\n{}\n\nConnected app: {}\nApp available: {}\n\nReturn only valid JSON, no additional text.",
        state.user_input,
        history,
        app_context,
        state.connected_app.is_some(),
    )
}

/// 分类用户意图并写回 TurnState
pub async fn classify_intent(llm: &dyn LlmClient, cfg: &AppConfig, state: &mut TurnState) {
    let messages = vec![
        Message::system(
            "You are an intent classifier. Classify user intent into: general_qa, tax_qa, \
             app_read, app_plan, or no_app. Respond only with valid JSON containing: intent, \
             reasoning, needs_web, needs_app, needs_plan.",
        ),
        Message::user(build_prompt(cfg, state)),
    ];

    let opts = ChatOptions::default()
        .with_temperature(0.1)
        .with_max_tokens(cfg.llm.max_tokens)
        .with_model(model_for_task(&cfg.llm, LlmTask::IntentRouting));

    let classification: Result<Classification, AgentError> =
        match llm.complete(&messages, &opts).await {
            Ok(content) => serde_json::from_str(strip_code_fences(&content))
                .map_err(|e| AgentError::JsonParseError(e.to_string())),
            Err(e) => Err(AgentError::LlmError(e)),
        };

    match classification {
        Ok(c) => {
            // 取值在封闭集合之外等同解析失败：回退 general_qa 且布尔全 false
            let Some(mut intent) = c.intent.as_deref().and_then(Intent::parse) else {
                warn!(raw = ?c.intent, "intent outside the closed set, defaulting to general_qa");
                state.intent = Intent::GeneralQa;
                state.needs_web = false;
                state.needs_app = false;
                state.needs_plan = false;
                return;
            };

            // 未连接应用却要读写数据：强制 no_app
            if state.connected_app.is_none()
                && matches!(intent, Intent::AppRead | Intent::AppPlan)
            {
                intent = Intent::NoApp;
            }

            state.intent = intent;
            state.needs_web = c.needs_web || intent == Intent::TaxQa;
            state.needs_app =
                c.needs_app || matches!(intent, Intent::AppRead | Intent::AppPlan);
            state.needs_plan = c.needs_plan || intent == Intent::AppPlan;

            info!(
                intent = intent.as_str(),
                needs_web = state.needs_web,
                needs_app = state.needs_app,
                needs_plan = state.needs_plan,
                "intent classified"
            );
        }
        Err(e) => {
            error!(error = %e, "intent classification failed, defaulting to general_qa");
            state.intent = Intent::GeneralQa;
            state.needs_web = false;
            state.needs_app = false;
            state.needs_plan = false;
        }
    }
}
