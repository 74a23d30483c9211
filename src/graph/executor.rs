//! 计划执行节点
//!
//! 单步推进：每次调用执行 steps[cursor] 一步，追加一条 StepResult，游标
//! 无条件 +1——失败也继续，后续步骤照常尝试（尽力而为，不是事务语义）。
//! 游标越界时写完成消息并不再动任何簿记。

use tracing::{info, warn};

use crate::apps::{AdapterRegistry, StepResult};
use crate::core::state::TurnState;

/// 所有步骤执行完毕后的固定回复
pub const COMPLETION_MESSAGE: &str = "Tất cả các bước đã được thực thi thành công.";

/// 计划是否已执行完（无计划视为已完成）
pub fn execution_finished(state: &TurnState) -> bool {
    match &state.plan {
        Some(plan) => state.current_step_index >= plan.steps.len(),
        None => true,
    }
}

/// 执行当前游标指向的一步；游标越界时只写完成消息
pub async fn execute_next_step(registry: &AdapterRegistry, state: &mut TurnState) {
    let Some(plan) = state.plan.clone() else {
        return;
    };

    if state.current_step_index >= plan.steps.len() {
        state.answer = COMPLETION_MESSAGE.to_string();
        return;
    }

    let step = &plan.steps[state.current_step_index];

    // 应用缺席时该步记失败并照常推进游标，保证循环收敛
    let Some(app) = state.connected_app.clone() else {
        warn!("no connected app available for plan execution");
        state.error = Some("No app connection available".to_string());
        state.step_results.push(StepResult::failed(
            step.id,
            step.action.clone(),
            "No app connection available",
        ));
        state.current_step_index += 1;
        return;
    };

    info!(
        step = state.current_step_index + 1,
        total = plan.steps.len(),
        action = %step.action,
        "executing plan step"
    );

    let adapter = registry.get(&app.app_id);
    let result = adapter.execute_step(step, &app).await;
    info!(
        step = state.current_step_index + 1,
        status = ?result.status,
        "plan step completed"
    );

    state.step_results.push(result);
    state.current_step_index += 1;
}

/// 顺序执行整个计划直至耗尽，再进入一次以写完成消息
pub async fn execute_plan(registry: &AdapterRegistry, state: &mut TurnState) {
    while !execution_finished(state) {
        execute_next_step(registry, state).await;
    }
    execute_next_step(registry, state).await;
}
