//! 计划审批节点
//!
//! 把计划渲染成越南语摘要写进 answer（作为中间可见消息），再按策略决定
//! 审批结果：auto_approve 为 true 时直接通过；为 false 时置 false，等外部
//! 决策通道（当前版本没有暂停 / 恢复机制，路由会走取消路径）。

use tracing::info;

use crate::apps::Plan;
use crate::core::state::TurnState;

/// 渲染计划的越南语摘要（描述 + 编号步骤）
pub fn render_plan_summary(plan: &Plan) -> String {
    let mut presentation = format!(
        "\n**Kế hoạch thực thi:**\n\n{}\n\n**Các bước thực hiện ({} bước):**\n",
        plan.description,
        plan.steps.len(),
    );
    for (i, step) in plan.steps.iter().enumerate() {
        presentation.push_str(&format!(
            "\n{}. **{}** - {}",
            i + 1,
            step.action,
            step.description.as_deref().unwrap_or("No description"),
        ));
    }
    presentation
}

/// 呈现计划并按策略写入审批标志
pub fn present_plan(auto_approve: bool, state: &mut TurnState) {
    let Some(plan) = &state.plan else {
        return;
    };

    state.answer = render_plan_summary(plan);
    state.plan_approved = auto_approve;

    if auto_approve {
        info!(steps = plan.steps.len(), "plan auto-approved");
    } else {
        info!(
            steps = plan.steps.len(),
            "plan requires manual approval, cancelling this turn"
        );
    }
}
