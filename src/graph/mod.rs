//! 编排图节点
//!
//! 每个节点是一个接收 `&mut TurnState` 的函数，由 Orchestrator 按路由顺序驱动；
//! 节点内部消化自身错误，不向上抛（见 core::orchestrator 的路由约定）。

pub mod answer;
pub mod approval;
pub mod context;
pub mod executor;
pub mod intent;
pub mod planner;
pub mod read;
pub mod web_search;

/// 去掉模型回复外层的 Markdown 代码围栏（含可选的 json 语言标记）
pub(crate) fn strip_code_fences(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.trim_start();
    match rest.find("```") {
        Some(idx) => rest[..idx].trim(),
        None => rest.trim(),
    }
}
