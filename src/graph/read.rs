//! 应用读取节点
//!
//! 两段式：先用双语（越南语 / 英语）关键词把原始输入映射到封闭的读取种类，
//! 再按 app_id 找适配器派发。适配器的 read 永不向上抛错，失败以 error 键
//! 体现在返回映射里。

use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::apps::{AdapterRegistry, ReadIntent, ReadKind};
use crate::core::state::TurnState;

/// 关键词启发式：检测用户想看哪类数据；没有命中时缺省列商品（小页）
pub fn detect_read_intent(user_input: &str) -> ReadIntent {
    let lower = user_input.to_lowercase();
    let hit = |keywords: &[&str]| keywords.iter().any(|k| lower.contains(k));

    if hit(&["hóa đơn", "invoice"]) {
        ReadIntent::with_page_size(ReadKind::ListInvoices, 20)
    } else if hit(&["đơn hàng", "order"]) {
        ReadIntent::with_page_size(ReadKind::ListOrders, 20)
    } else if hit(&["sản phẩm", "hàng hóa", "product"]) {
        ReadIntent::with_page_size(ReadKind::ListProducts, 20)
    } else if hit(&["khách hàng", "customer"]) {
        ReadIntent::with_page_size(ReadKind::ListCustomers, 20)
    } else if hit(&["nhóm hàng", "danh mục", "category"]) {
        ReadIntent::with_page_size(ReadKind::ListCategories, 100)
    } else if hit(&["chi nhánh", "branch"]) {
        ReadIntent::new(ReadKind::ListBranches)
    } else if hit(&["doanh thu", "revenue", "thống kê"]) {
        // 营收从单据列表汇总
        ReadIntent::with_page_size(ReadKind::SummaryRevenue, 100)
    } else {
        ReadIntent::with_page_size(ReadKind::ListProducts, 10)
    }
}

/// 读取应用数据并写入 state.app_data
pub async fn read_app_data(registry: &AdapterRegistry, state: &mut TurnState) {
    let Some(app) = state.connected_app.clone() else {
        warn!("no connected app available for read");
        let mut out = Map::new();
        out.insert(
            "error".to_string(),
            Value::String("No app connection configured".to_string()),
        );
        state.app_data = out;
        return;
    };

    let intent = detect_read_intent(&state.user_input);
    info!(
        kind = intent.kind.as_str(),
        app_id = %app.app_id,
        "detected read intent"
    );

    let adapter = registry.get(&app.app_id);
    state.app_data = adapter.read(&intent, &app).await;
    info!(
        kind = intent.kind.as_str(),
        keys = ?state.app_data.keys().collect::<Vec<_>>(),
        "app read completed"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vietnamese_keywords_map_to_kinds() {
        assert_eq!(
            detect_read_intent("cho tôi xem hóa đơn tuần này").kind,
            ReadKind::ListInvoices
        );
        assert_eq!(
            detect_read_intent("danh sách đơn hàng").kind,
            ReadKind::ListOrders
        );
        assert_eq!(
            detect_read_intent("khách hàng mới").kind,
            ReadKind::ListCustomers
        );
        assert_eq!(
            detect_read_intent("các chi nhánh").kind,
            ReadKind::ListBranches
        );
        assert_eq!(
            detect_read_intent("thống kê doanh thu tháng 5").kind,
            ReadKind::SummaryRevenue
        );
    }

    #[test]
    fn english_keywords_also_match() {
        assert_eq!(detect_read_intent("show invoices").kind, ReadKind::ListInvoices);
        assert_eq!(detect_read_intent("list category tree").kind, ReadKind::ListCategories);
    }

    #[test]
    fn default_page_sizes_follow_kind() {
        let invoices = detect_read_intent("xem hóa đơn");
        assert_eq!(invoices.params.get("page_size"), Some(&Value::from(20)));

        let categories = detect_read_intent("xem danh mục");
        assert_eq!(categories.params.get("page_size"), Some(&Value::from(100)));

        let branches = detect_read_intent("xem chi nhánh");
        assert!(branches.params.is_empty());
    }

    #[test]
    fn unmatched_text_defaults_to_small_product_list() {
        let intent = detect_read_intent("cho tôi xem gì đó");
        assert_eq!(intent.kind, ReadKind::ListProducts);
        assert_eq!(intent.params.get("page_size"), Some(&Value::from(10)));
    }

    #[tokio::test]
    async fn missing_app_writes_error_mapping() {
        let registry = AdapterRegistry::with_builtin();
        let mut state = TurnState::new("u1", "w1", "c1", "xem hóa đơn", vec![], None);
        read_app_data(&registry, &mut state).await;
        assert_eq!(
            state.app_data.get("error"),
            Some(&Value::String("No app connection configured".to_string()))
        );
    }
}
