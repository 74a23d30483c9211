//! KiotViet 响应到内部结果映射的归一化
//!
//! 列表响应统一为 {<实体复数>, total, page_size, ...}；营收汇总在单据列表上
//! 累加 total / totalPayment 得出。

use serde_json::{Map, Value};

fn array(raw: &Value, key: &str) -> Value {
    raw.get(key).cloned().unwrap_or_else(|| Value::Array(Vec::new()))
}

fn number(raw: &Value, key: &str) -> Value {
    raw.get(key).cloned().unwrap_or_else(|| Value::from(0))
}

/// 单据列表
pub fn map_invoice_list(raw: &Value) -> Map<String, Value> {
    let mut out = Map::new();
    out.insert("invoices".to_string(), array(raw, "data"));
    out.insert("total".to_string(), number(raw, "total"));
    out.insert("page_size".to_string(), number(raw, "pageSize"));
    out.insert("removed_ids".to_string(), array(raw, "removedIds"));
    out.insert(
        "timestamp".to_string(),
        raw.get("timestamp").cloned().unwrap_or(Value::Null),
    );
    out
}

/// 订单列表
pub fn map_order_list(raw: &Value) -> Map<String, Value> {
    let mut out = Map::new();
    out.insert("orders".to_string(), array(raw, "data"));
    out.insert("total".to_string(), number(raw, "total"));
    out.insert("page_size".to_string(), number(raw, "pageSize"));
    out
}

/// 商品列表
pub fn map_product_list(raw: &Value) -> Map<String, Value> {
    let mut out = Map::new();
    out.insert("products".to_string(), array(raw, "data"));
    out.insert("total".to_string(), number(raw, "total"));
    out.insert("page_size".to_string(), number(raw, "pageSize"));
    out.insert("removed_ids".to_string(), array(raw, "removeId"));
    out
}

/// 客户列表
pub fn map_customer_list(raw: &Value) -> Map<String, Value> {
    let mut out = Map::new();
    out.insert("customers".to_string(), array(raw, "data"));
    out.insert("total".to_string(), number(raw, "total"));
    out.insert("page_size".to_string(), number(raw, "pageSize"));
    out
}

/// 商品分类列表
pub fn map_category_list(raw: &Value) -> Map<String, Value> {
    let mut out = Map::new();
    out.insert("categories".to_string(), array(raw, "data"));
    out.insert("total".to_string(), number(raw, "total"));
    out.insert("page_size".to_string(), number(raw, "pageSize"));
    out.insert("removed_ids".to_string(), array(raw, "removedIds"));
    out.insert(
        "timestamp".to_string(),
        raw.get("timestamp").cloned().unwrap_or(Value::Null),
    );
    out
}

/// 门店（分支）列表
pub fn map_branch_list(raw: &Value) -> Map<String, Value> {
    let mut out = Map::new();
    out.insert("branches".to_string(), array(raw, "data"));
    out
}

/// 营收汇总：在单据列表上累加总额与已付金额
pub fn map_summary_revenue(raw: &Value) -> Map<String, Value> {
    let invoices = raw
        .get("data")
        .and_then(|v| v.as_array())
        .cloned()
        .unwrap_or_default();

    let sum_field = |field: &str| -> f64 {
        invoices
            .iter()
            .map(|inv| inv.get(field).and_then(|v| v.as_f64()).unwrap_or(0.0))
            .sum()
    };

    let revenue = sum_field("total");
    let paid = sum_field("totalPayment");

    let mut out = Map::new();
    out.insert("revenue".to_string(), Value::from(revenue));
    out.insert("paid".to_string(), Value::from(paid));
    out.insert("outstanding".to_string(), Value::from(revenue - paid));
    out.insert("count".to_string(), Value::from(invoices.len()));
    out.insert("invoices".to_string(), Value::Array(invoices));
    out
}
