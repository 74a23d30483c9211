//! 编排器：按意图驱动节点的确定性状态机
//!
//! 一次 run_turn 处理一个对话回合：分类 → (上下文 →) {读取 | 计划 → 审批 →
//! 执行循环} → 回答合成 → 终态。路由全部是状态的纯函数；节点各自消化失败，
//! run_turn 永远返回带非空 answer 的终态。

use std::sync::Arc;

use tracing::{info, warn};

use crate::apps::AdapterRegistry;
use crate::config::AppConfig;
use crate::core::state::{Intent, TurnState};
use crate::graph::{answer, approval, context, executor, intent, planner, read, web_search};
use crate::llm::LlmClient;

/// 意图分类之后的去向
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IntentRoute {
    /// 先聚合会话上下文（general_qa / app_read / app_plan）
    Context,
    /// 直接 Web 检索（tax_qa）
    WebSearch,
    /// 直接合成回答（no_app）
    Answer,
}

/// 上下文聚合之后的去向
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PostContextRoute {
    Answer,
    AppRead,
    AppPlan,
}

/// 审批之后的去向
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApprovalRoute {
    Execute,
    Cancel,
}

pub fn route_intent(state: &TurnState) -> IntentRoute {
    match state.intent {
        Intent::GeneralQa | Intent::AppRead | Intent::AppPlan => IntentRoute::Context,
        Intent::TaxQa => IntentRoute::WebSearch,
        Intent::NoApp => IntentRoute::Answer,
    }
}

pub fn route_after_context(state: &TurnState) -> PostContextRoute {
    match state.intent {
        Intent::AppRead => PostContextRoute::AppRead,
        Intent::AppPlan => PostContextRoute::AppPlan,
        _ => PostContextRoute::Answer,
    }
}

pub fn route_plan_approval(state: &TurnState) -> ApprovalRoute {
    if state.plan_approved {
        ApprovalRoute::Execute
    } else {
        ApprovalRoute::Cancel
    }
}

/// 编排器：持有 LLM 客户端、适配器注册表与配置，独占驱动每个回合
pub struct Orchestrator {
    llm: Arc<dyn LlmClient>,
    adapters: Arc<AdapterRegistry>,
    cfg: AppConfig,
}

impl Orchestrator {
    pub fn new(llm: Arc<dyn LlmClient>, adapters: Arc<AdapterRegistry>, cfg: AppConfig) -> Self {
        Self {
            llm,
            adapters,
            cfg,
        }
    }

    /// 处理一个对话回合，返回带最终回答的终态
    pub async fn run_turn(&self, mut state: TurnState) -> TurnState {
        intent::classify_intent(self.llm.as_ref(), &self.cfg, &mut state).await;

        match route_intent(&state) {
            IntentRoute::Answer => {
                // 没有可用应用：直接向用户解释，不碰适配器与计划
                answer::synthesize_answer(self.llm.as_ref(), &self.cfg, &mut state).await;
            }
            IntentRoute::WebSearch => {
                web_search::search_web(&self.cfg.search, &mut state).await;
                answer::synthesize_answer(self.llm.as_ref(), &self.cfg, &mut state).await;
            }
            IntentRoute::Context => {
                context::assemble_context(&self.cfg, &mut state);
                match route_after_context(&state) {
                    PostContextRoute::Answer => {
                        answer::synthesize_answer(self.llm.as_ref(), &self.cfg, &mut state).await;
                    }
                    PostContextRoute::AppRead => {
                        read::read_app_data(self.adapters.as_ref(), &mut state).await;
                        answer::synthesize_answer(self.llm.as_ref(), &self.cfg, &mut state).await;
                    }
                    PostContextRoute::AppPlan => {
                        self.run_plan_path(&mut state).await;
                    }
                }
            }
        }

        info!(
            intent = state.intent.as_str(),
            steps = state.step_results.len(),
            has_error = state.error.is_some(),
            "turn completed"
        );
        state
    }

    async fn run_plan_path(&self, state: &mut TurnState) {
        planner::generate_plan(self.llm.as_ref(), &self.cfg, state).await;

        // 计划缺席等同生成失败：直接合成（致歉式）回答
        if state.plan.is_none() {
            warn!("plan generation failed, routing to answer");
            answer::synthesize_answer(self.llm.as_ref(), &self.cfg, state).await;
            return;
        }

        approval::present_plan(self.cfg.plan.auto_approve, state);
        match route_plan_approval(state) {
            ApprovalRoute::Execute => {
                executor::execute_plan(self.adapters.as_ref(), state).await;
                answer::synthesize_answer(self.llm.as_ref(), &self.cfg, state).await;
            }
            ApprovalRoute::Cancel => {
                // 取消路径：渲染好的计划摘要就是最终回复
                info!("plan not approved, returning rendered summary");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with_intent(intent: Intent) -> TurnState {
        let mut state = TurnState::new("u1", "w1", "c1", "xin chào", vec![], None);
        state.intent = intent;
        state
    }

    #[test]
    fn intent_routing_matches_flow() {
        assert_eq!(
            route_intent(&state_with_intent(Intent::GeneralQa)),
            IntentRoute::Context
        );
        assert_eq!(
            route_intent(&state_with_intent(Intent::TaxQa)),
            IntentRoute::WebSearch
        );
        assert_eq!(
            route_intent(&state_with_intent(Intent::AppRead)),
            IntentRoute::Context
        );
        assert_eq!(
            route_intent(&state_with_intent(Intent::AppPlan)),
            IntentRoute::Context
        );
        assert_eq!(
            route_intent(&state_with_intent(Intent::NoApp)),
            IntentRoute::Answer
        );
    }

    #[test]
    fn post_context_routing_matches_flow() {
        assert_eq!(
            route_after_context(&state_with_intent(Intent::GeneralQa)),
            PostContextRoute::Answer
        );
        assert_eq!(
            route_after_context(&state_with_intent(Intent::AppRead)),
            PostContextRoute::AppRead
        );
        assert_eq!(
            route_after_context(&state_with_intent(Intent::AppPlan)),
            PostContextRoute::AppPlan
        );
        // 其余意图兜底到回答
        assert_eq!(
            route_after_context(&state_with_intent(Intent::TaxQa)),
            PostContextRoute::Answer
        );
    }

    #[test]
    fn approval_routing_follows_flag() {
        let mut state = state_with_intent(Intent::AppPlan);
        assert_eq!(route_plan_approval(&state), ApprovalRoute::Cancel);
        state.plan_approved = true;
        assert_eq!(route_plan_approval(&state), ApprovalRoute::Execute);
    }
}
