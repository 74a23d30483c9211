//! 按任务选模型
//!
//! 意图识别 / 计划生成 / 回答合成可各配一个模型；计划任务在输入超过阈值时
//! 升级到 model_plan_complex。未配置的任务回落到 llm.model。

use tracing::debug;

use crate::config::LlmSection;

/// 复杂计划的输入长度阈值（字符）
const COMPLEX_PLAN_THRESHOLD: usize = 500;

/// 一次 LLM 调用所属的任务类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmTask {
    /// 意图识别
    IntentRouting,
    /// 计划生成；携带用户输入长度用于复杂度升级
    PlanGeneration { input_chars: usize },
    /// 回答合成
    AnswerGeneration,
}

/// 为任务选择模型名；任务专属模型未配置时回落到缺省模型
pub fn model_for_task(section: &LlmSection, task: LlmTask) -> String {
    let candidate = match task {
        LlmTask::IntentRouting => section.model_intent.clone(),
        LlmTask::PlanGeneration { input_chars } => {
            if input_chars > COMPLEX_PLAN_THRESHOLD {
                section
                    .model_plan_complex
                    .clone()
                    .or_else(|| section.model_plan.clone())
            } else {
                section.model_plan.clone()
            }
        }
        LlmTask::AnswerGeneration => section.model_answer.clone(),
    };

    let model = candidate.unwrap_or_else(|| section.model.clone());
    debug!(?task, %model, "selected model for task");
    model
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section() -> LlmSection {
        LlmSection {
            model: "default-model".to_string(),
            model_intent: Some("intent-model".to_string()),
            model_plan: Some("plan-model".to_string()),
            model_plan_complex: Some("plan-complex-model".to_string()),
            model_answer: None,
            ..LlmSection::default()
        }
    }

    #[test]
    fn intent_uses_dedicated_model() {
        assert_eq!(
            model_for_task(&section(), LlmTask::IntentRouting),
            "intent-model"
        );
    }

    #[test]
    fn long_input_upgrades_plan_model() {
        assert_eq!(
            model_for_task(&section(), LlmTask::PlanGeneration { input_chars: 120 }),
            "plan-model"
        );
        assert_eq!(
            model_for_task(&section(), LlmTask::PlanGeneration { input_chars: 800 }),
            "plan-complex-model"
        );
    }

    #[test]
    fn unset_task_model_falls_back_to_default() {
        assert_eq!(
            model_for_task(&section(), LlmTask::AnswerGeneration),
            "default-model"
        );
    }

    #[test]
    fn complex_upgrade_falls_back_to_plan_model_when_unset() {
        let mut section = section();
        section.model_plan_complex = None;
        assert_eq!(
            model_for_task(&section, LlmTask::PlanGeneration { input_chars: 800 }),
            "plan-model"
        );
    }
}
