//! KiotViet 适配器：读取派发与步骤执行
//!
//! 每次调用都从 ConnectedAppConfig 重建客户端（无连接级可变状态）；
//! 不支持的动作直接返回失败结果，不发起任何外部调用。

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::{error, info};

use crate::apps::adapter::{
    AppAdapter, ConnectedAppConfig, PlanStep, ReadIntent, ReadKind, StepResult,
};
use crate::apps::kiotviet::client::{KiotVietClient, KiotVietError};
use crate::apps::kiotviet::config::KiotVietConfig;
use crate::apps::kiotviet::mappers;

/// 注册时声明的能力集合
const SUPPORTED_ACTIONS: &[&str] = &[
    "CREATE_PRODUCT",
    "UPDATE_PRODUCT",
    "DELETE_PRODUCT",
    "CREATE_CATEGORY",
    "UPDATE_CATEGORY",
    "DELETE_CATEGORY",
    "CREATE_CUSTOMER",
    "UPDATE_CUSTOMER",
    "DELETE_CUSTOMER",
    "CREATE_ORDER",
    "UPDATE_ORDER",
    "DELETE_ORDER",
    "CREATE_INVOICE",
    "UPDATE_INVOICE",
    "DELETE_INVOICE",
];

/// KiotViet POS 适配器
pub struct KiotVietAdapter;

impl KiotVietAdapter {
    pub fn new() -> Self {
        Self
    }

    async fn read_inner(
        &self,
        intent: &ReadIntent,
        config: &ConnectedAppConfig,
    ) -> Result<Map<String, Value>, KiotVietError> {
        let client = KiotVietClient::new(KiotVietConfig::from_connected_app(config)?);

        let mapped = match intent.kind {
            ReadKind::ListInvoices => mappers::map_invoice_list(&client.list_invoices(&intent.params).await?),
            ReadKind::ListOrders => mappers::map_order_list(&client.list_orders(&intent.params).await?),
            ReadKind::ListProducts => mappers::map_product_list(&client.list_products(&intent.params).await?),
            ReadKind::ListCustomers => mappers::map_customer_list(&client.list_customers(&intent.params).await?),
            ReadKind::ListCategories => mappers::map_category_list(&client.list_categories(&intent.params).await?),
            ReadKind::ListBranches => mappers::map_branch_list(&client.list_branches().await?),
            ReadKind::SummaryRevenue => mappers::map_summary_revenue(&client.list_invoices(&intent.params).await?),
        };
        Ok(mapped)
    }

    async fn execute_inner(
        &self,
        step: &PlanStep,
        client: &KiotVietClient,
    ) -> Result<Value, KiotVietError> {
        let params = &step.params;
        match step.action.as_str() {
            "CREATE_PRODUCT" => client.create("/products", &Value::Object(params.clone())).await,
            "UPDATE_PRODUCT" => {
                let id = id_param(params, "product_id")?;
                client.update(&format!("/products/{id}"), &body_without(params, "product_id")).await
            }
            "DELETE_PRODUCT" => {
                let id = id_param(params, "product_id")?;
                client.delete(&format!("/products/{id}")).await
            }
            "CREATE_CATEGORY" => {
                let body = category_body(params)?;
                client.create("/categories", &body).await
            }
            "UPDATE_CATEGORY" => {
                let id = id_param(params, "category_id")?;
                let body = category_body(params)?;
                client.update(&format!("/categories/{id}"), &body).await
            }
            "DELETE_CATEGORY" => {
                let id = id_param(params, "category_id")?;
                client.delete(&format!("/categories/{id}")).await
            }
            "CREATE_CUSTOMER" => client.create("/customers", &Value::Object(params.clone())).await,
            "UPDATE_CUSTOMER" => {
                let id = id_param(params, "customer_id")?;
                client.update(&format!("/customers/{id}"), &body_without(params, "customer_id")).await
            }
            "DELETE_CUSTOMER" => {
                let id = id_param(params, "customer_id")?;
                client.delete(&format!("/customers/{id}")).await
            }
            "CREATE_ORDER" => client.create("/orders", &Value::Object(params.clone())).await,
            "UPDATE_ORDER" => {
                let id = id_param(params, "order_id")?;
                client.update(&format!("/orders/{id}"), &body_without(params, "order_id")).await
            }
            "DELETE_ORDER" => {
                let id = id_param(params, "order_id")?;
                client.delete(&format!("/orders/{id}")).await
            }
            "CREATE_INVOICE" => client.create("/invoices", &Value::Object(params.clone())).await,
            "UPDATE_INVOICE" => {
                let id = id_param(params, "invoice_id")?;
                client.update(&format!("/invoices/{id}"), &body_without(params, "invoice_id")).await
            }
            "DELETE_INVOICE" => {
                let id = id_param(params, "invoice_id")?;
                client.delete(&format!("/invoices/{id}")).await
            }
            // supports_action 已在入口拦截，此处兜底
            other => Err(KiotVietError::Params(format!("unsupported action: {other}"))),
        }
    }
}

impl Default for KiotVietAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AppAdapter for KiotVietAdapter {
    fn app_id(&self) -> &'static str {
        "kiotviet"
    }

    fn supported_actions(&self) -> &'static [&'static str] {
        SUPPORTED_ACTIONS
    }

    async fn read(&self, intent: &ReadIntent, config: &ConnectedAppConfig) -> Map<String, Value> {
        match self.read_inner(intent, config).await {
            Ok(data) => {
                info!(kind = intent.kind.as_str(), "KiotViet read completed");
                data
            }
            Err(e) => {
                error!(kind = intent.kind.as_str(), error = %e, "KiotViet read failed");
                let mut out = Map::new();
                out.insert("error".to_string(), Value::String(e.to_string()));
                out.insert("data".to_string(), Value::Array(Vec::new()));
                out
            }
        }
    }

    async fn execute_step(&self, step: &PlanStep, config: &ConnectedAppConfig) -> StepResult {
        if !self.supports_action(&step.action) {
            return StepResult::failed(
                step.id,
                step.action.clone(),
                format!("Action {} is not supported by KiotViet adapter", step.action),
            );
        }

        let client = match KiotVietConfig::from_connected_app(config) {
            Ok(cfg) => KiotVietClient::new(cfg),
            Err(e) => return StepResult::failed(step.id, step.action.clone(), e.to_string()),
        };

        match self.execute_inner(step, &client).await {
            Ok(raw) => {
                let message = raw
                    .get("message")
                    .and_then(|v| v.as_str())
                    .unwrap_or("OK")
                    .to_string();
                // 有 data 键时取其内容，否则整个响应作为 raw
                let data = raw.get("data").cloned().unwrap_or(raw);
                let raw_map = match data {
                    Value::Object(map) => map,
                    other => {
                        let mut map = Map::new();
                        map.insert("result".to_string(), other);
                        map
                    }
                };
                StepResult::success(step.id, step.action.clone(), message, raw_map)
            }
            Err(e) => {
                error!(action = %step.action, error = %e, "KiotViet step execution failed");
                StepResult::failed(step.id, step.action.clone(), e.to_string())
            }
        }
    }
}

/// 从参数中取整数 id
fn id_param(params: &Map<String, Value>, key: &'static str) -> Result<i64, KiotVietError> {
    params
        .get(key)
        .and_then(|v| v.as_i64())
        .ok_or_else(|| KiotVietError::Params(format!("{key} is required")))
}

/// 去掉 id 键后的请求体（其余参数原样作为 body）
fn body_without(params: &Map<String, Value>, key: &str) -> Value {
    let mut body = params.clone();
    body.remove(key);
    Value::Object(body)
}

/// 分类动作的请求体：categoryName 必填，parentId 可选
fn category_body(params: &Map<String, Value>) -> Result<Value, KiotVietError> {
    let name = params
        .get("category_name")
        .and_then(|v| v.as_str())
        .ok_or_else(|| KiotVietError::Params("category_name is required".to_string()))?;
    let mut body = Map::new();
    body.insert("categoryName".to_string(), Value::from(name));
    if let Some(parent) = params.get("parent_id").and_then(|v| v.as_i64()) {
        body.insert("parentId".to_string(), Value::from(parent));
    }
    Ok(Value::Object(body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apps::adapter::StepStatus;

    fn config_without_credentials() -> ConnectedAppConfig {
        serde_json::from_value(serde_json::json!({
            "app_id": "kiotviet",
            "name": "KiotViet",
            "category": "POS_SIMPLE",
            "connection_method": "api",
            "credentials": {},
        }))
        .unwrap()
    }

    #[test]
    fn declares_fifteen_actions() {
        let adapter = KiotVietAdapter::new();
        assert_eq!(adapter.supported_actions().len(), 15);
        assert!(adapter.supports_action("CREATE_INVOICE"));
        assert!(adapter.supports_action("DELETE_CATEGORY"));
        assert!(!adapter.supports_action("SEND_EMAIL"));
    }

    #[tokio::test]
    async fn unsupported_action_fails_without_calling_out() {
        let adapter = KiotVietAdapter::new();
        let step = PlanStep {
            id: 7,
            action: "SEND_EMAIL".to_string(),
            description: None,
            params: Map::new(),
        };
        // 凭证为空：若适配器试图建客户端就会报 MissingCredential 而非 not supported
        let result = adapter.execute_step(&step, &config_without_credentials()).await;
        assert_eq!(result.status, StepStatus::Failed);
        assert!(result.message.contains("not supported"));
    }

    #[tokio::test]
    async fn missing_credentials_fail_before_any_request() {
        let adapter = KiotVietAdapter::new();
        let step = PlanStep {
            id: 1,
            action: "CREATE_PRODUCT".to_string(),
            description: None,
            params: Map::new(),
        };
        let result = adapter.execute_step(&step, &config_without_credentials()).await;
        assert_eq!(result.status, StepStatus::Failed);
        assert!(result.message.contains("credentials"));
    }

    #[tokio::test]
    async fn read_with_missing_credentials_returns_error_mapping() {
        let adapter = KiotVietAdapter::new();
        let data = adapter
            .read(
                &ReadIntent::new(ReadKind::ListInvoices),
                &config_without_credentials(),
            )
            .await;
        assert!(data.contains_key("error"));
        assert_eq!(data.get("data"), Some(&serde_json::json!([])));
    }

    #[test]
    fn category_body_requires_name() {
        let mut params = Map::new();
        params.insert("parent_id".to_string(), Value::from(5));
        assert!(category_body(&params).is_err());

        params.insert("category_name".to_string(), Value::from("Đồ uống"));
        let body = category_body(&params).unwrap();
        assert_eq!(body["categoryName"], "Đồ uống");
        assert_eq!(body["parentId"], 5);
    }
}
