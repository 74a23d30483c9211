//! 未分类应用的回退适配器
//!
//! 对任何读取意图都返回带 error 键与空 data 列表的映射，对任何步骤都返回
//! 失败结果，从不向真实系统发起调用。

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::warn;

use crate::apps::adapter::{AppAdapter, ConnectedAppConfig, PlanStep, ReadIntent, StepResult};

/// 未注册 / 未分类应用的占位适配器
pub struct UnknownAppAdapter;

#[async_trait]
impl AppAdapter for UnknownAppAdapter {
    fn app_id(&self) -> &'static str {
        "unknown"
    }

    fn supported_actions(&self) -> &'static [&'static str] {
        &[]
    }

    async fn read(&self, intent: &ReadIntent, config: &ConnectedAppConfig) -> Map<String, Value> {
        warn!(
            app_id = %config.app_id,
            kind = intent.kind.as_str(),
            "attempted to read from unknown app"
        );
        let mut out = Map::new();
        out.insert(
            "error".to_string(),
            Value::String(format!(
                "App '{}' ({}) is not yet fully supported. Only read operations may be available.",
                config.name, config.app_id
            )),
        );
        out.insert("data".to_string(), Value::Array(Vec::new()));
        out
    }

    async fn execute_step(&self, step: &PlanStep, config: &ConnectedAppConfig) -> StepResult {
        warn!(
            app_id = %config.app_id,
            action = %step.action,
            "attempted to execute step on unknown app"
        );
        StepResult::failed(
            step.id,
            step.action.clone(),
            format!(
                "App '{}' ({}) does not support execution operations. \
                 Please use a supported app or configure the app properly.",
                config.name, config.app_id
            ),
        )
    }
}
