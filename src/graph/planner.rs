//! 计划生成节点
//!
//! 让模型产出 JSON 动作计划并做结构修复：缺 steps 补空列表、缺 description
//! 补占位文本、每步缺 id / action / params 各补缺省值。模型调用或解析失败时
//! 不重试，写 error 字段、计划留空，由路由把空计划当失败处理。

use serde_json::{Map, Value};
use tracing::{error, info};

use crate::apps::{Plan, PlanStep};
use crate::config::AppConfig;
use crate::core::error::AgentError;
use crate::core::state::{Message, TurnState};
use crate::graph::strip_code_fences;
use crate::llm::{model_for_task, ChatOptions, LlmClient, LlmTask};

const DEFAULT_DESCRIPTION: &str = "Execution plan";
const UNKNOWN_ACTION: &str = "UNKNOWN";

fn build_prompt(state: &TurnState) -> String {
    let (app_name, app_category) = match &state.connected_app {
        Some(app) => (app.name.as_str(), app.category.as_str()),
        None => ("Unknown", "UNKNOWN"),
    };

    let app_data = if state.app_data.is_empty() {
        "None".to_string()
    } else {
        serde_json::to_string_pretty(&state.app_data).unwrap_or_else(|_| "None".to_string())
    };

    format!(
        "User request: {}\n\nConversation context:\n{}\n\nTarget app: {} (category: {})\n\nExisting app data:\n{}\n\nGenerate an execution plan as JSON with fields: description (string) and steps (array of {{id, action, description, params}}).\n\nReturn only valid JSON, no additional text.",
        state.user_input, state.chat_context, app_name, app_category, app_data,
    )
}

/// 把模型输出修复成结构完整的 Plan；顶层或某一步不是对象时视为失败
fn repair_plan(value: Value) -> Result<Plan, AgentError> {
    let Value::Object(mut obj) = value else {
        return Err(AgentError::JsonParseError(
            "plan is not a JSON object".to_string(),
        ));
    };

    let description = obj
        .get("description")
        .and_then(|v| v.as_str())
        .unwrap_or(DEFAULT_DESCRIPTION)
        .to_string();

    let raw_steps = match obj.remove("steps") {
        Some(Value::Array(steps)) => steps,
        Some(_) => {
            return Err(AgentError::JsonParseError(
                "steps is not an array".to_string(),
            ))
        }
        None => Vec::new(),
    };

    let mut steps = Vec::with_capacity(raw_steps.len());
    for (index, raw) in raw_steps.into_iter().enumerate() {
        let Value::Object(step) = raw else {
            return Err(AgentError::JsonParseError(format!(
                "step {index} is not a JSON object"
            )));
        };

        let id = step
            .get("id")
            .and_then(|v| v.as_i64())
            .unwrap_or(index as i64 + 1);
        let action = step
            .get("action")
            .and_then(|v| v.as_str())
            .unwrap_or(UNKNOWN_ACTION)
            .to_string();
        let description = step
            .get("description")
            .and_then(|v| v.as_str())
            .map(String::from);
        let params = match step.get("params") {
            Some(Value::Object(params)) => params.clone(),
            _ => Map::new(),
        };

        steps.push(PlanStep {
            id,
            action,
            description,
            params,
        });
    }

    Ok(Plan { description, steps })
}

/// 生成执行计划并初始化执行簿记
pub async fn generate_plan(llm: &dyn LlmClient, cfg: &AppConfig, state: &mut TurnState) {
    let messages = vec![
        Message::system(
            "You are a planning assistant. Generate a plan with generic actions \
             (CREATE_PRODUCT, CREATE_INVOICE, etc.). Return only valid JSON, no additional text.",
        ),
        Message::user(build_prompt(state)),
    ];

    let opts = ChatOptions::default()
        .with_temperature(0.3)
        .with_max_tokens(cfg.llm.max_tokens)
        .with_model(model_for_task(
            &cfg.llm,
            LlmTask::PlanGeneration {
                input_chars: state.user_input.chars().count(),
            },
        ));

    let plan: Result<Plan, AgentError> = match llm.complete(&messages, &opts).await {
        Ok(content) => serde_json::from_str::<Value>(strip_code_fences(&content))
            .map_err(|e| AgentError::JsonParseError(e.to_string()))
            .and_then(repair_plan),
        Err(e) => Err(AgentError::LlmError(e)),
    };

    match plan {
        Ok(plan) => {
            info!(steps = plan.steps.len(), "plan generated");
            state.plan = Some(plan);
            state.plan_approved = false;
            state.current_step_index = 0;
            state.step_results = Vec::new();
        }
        Err(e) => {
            error!(error = %e, "plan generation failed");
            state.error = Some(format!("Failed to generate plan: {e}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockLlmClient;

    fn plan_state(input: &str) -> TurnState {
        TurnState::new("u1", "w1", "c1", input, vec![], None)
    }

    #[tokio::test]
    async fn fenced_empty_plan_gets_defaults() {
        let mock = MockLlmClient::new();
        mock.push_response("```json\n{\"steps\": []}\n```");
        let cfg = AppConfig::default();
        let mut state = plan_state("tạo nhóm hàng mới");

        generate_plan(&mock, &cfg, &mut state).await;
        let plan = state.plan.expect("plan should be present");
        assert_eq!(plan.description, "Execution plan");
        assert!(plan.steps.is_empty());
        assert!(state.error.is_none());
        assert!(!state.plan_approved);
        assert_eq!(state.current_step_index, 0);
    }

    #[tokio::test]
    async fn missing_step_fields_are_repaired() {
        let mock = MockLlmClient::new();
        mock.push_response(
            r#"{"description": "Tạo sản phẩm", "steps": [{"action": "CREATE_CATEGORY"}, {"params": {"name": "Cà phê sữa"}}]}"#,
        );
        let cfg = AppConfig::default();
        let mut state = plan_state("tạo sản phẩm cà phê sữa");

        generate_plan(&mock, &cfg, &mut state).await;
        let plan = state.plan.expect("plan should be present");
        assert_eq!(plan.steps.len(), 2);
        assert_eq!(plan.steps[0].id, 1);
        assert_eq!(plan.steps[0].action, "CREATE_CATEGORY");
        assert!(plan.steps[0].params.is_empty());
        assert_eq!(plan.steps[1].id, 2);
        assert_eq!(plan.steps[1].action, "UNKNOWN");
        assert_eq!(plan.steps[1].params.get("name"), Some(&Value::from("Cà phê sữa")));
    }

    #[tokio::test]
    async fn malformed_json_sets_error_and_leaves_plan_empty() {
        let mock = MockLlmClient::new();
        mock.push_response("xin lỗi, tôi không thể lập kế hoạch");
        let cfg = AppConfig::default();
        let mut state = plan_state("tạo sản phẩm");

        generate_plan(&mock, &cfg, &mut state).await;
        assert!(state.plan.is_none());
        let error = state.error.expect("error should be set");
        assert!(error.starts_with("Failed to generate plan:"));
    }

    #[tokio::test]
    async fn llm_failure_sets_error() {
        let mock = MockLlmClient::new();
        mock.push_error("rate limited");
        let cfg = AppConfig::default();
        let mut state = plan_state("tạo sản phẩm");

        generate_plan(&mock, &cfg, &mut state).await;
        assert!(state.plan.is_none());
        assert_eq!(
            state.error.as_deref(),
            Some("Failed to generate plan: LLM error: rate limited")
        );
    }

    #[test]
    fn non_object_step_fails_repair() {
        let value = serde_json::json!({"steps": ["CREATE_PRODUCT"]});
        assert!(repair_plan(value).is_err());
    }
}
