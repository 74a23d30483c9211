//! KiotViet Public API 客户端
//!
//! OAuth2 client_credentials 取 token 并在实例内缓存（过期前 60 秒视为失效，
//! 缺省有效期 24 小时）；请求带 Retailer 与 Bearer 头。实例随适配器调用即建即弃，
//! 不跨回合持有连接状态。

use chrono::{DateTime, Duration, Utc};
use serde_json::{Map, Value};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;

use crate::apps::kiotviet::config::KiotVietConfig;

/// 客户端内部错误；适配器在边界处转成 error 映射或 failed StepResult
#[derive(Error, Debug)]
pub enum KiotVietError {
    #[error("KiotViet requires {0} in credentials")]
    MissingCredential(&'static str),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("KiotViet API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("token response missing access_token")]
    Token,

    #[error("invalid step params: {0}")]
    Params(String),
}

struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

/// KiotViet Public API 客户端
pub struct KiotVietClient {
    http: reqwest::Client,
    cfg: KiotVietConfig,
    token: Mutex<Option<CachedToken>>,
}

impl KiotVietClient {
    pub fn new(cfg: KiotVietConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            cfg,
            token: Mutex::new(None),
        }
    }

    /// 确保持有有效 token，过期（或临近过期）时重新获取
    async fn ensure_token(&self) -> Result<String, KiotVietError> {
        let mut guard = self.token.lock().await;
        if let Some(cached) = guard.as_ref() {
            if Utc::now() < cached.expires_at {
                return Ok(cached.access_token.clone());
            }
        }

        let response = self
            .http
            .post(&self.cfg.token_url)
            .form(&[
                ("scopes", "PublicApi.Access"),
                ("grant_type", "client_credentials"),
                ("client_id", self.cfg.client_id.as_str()),
                ("client_secret", self.cfg.client_secret.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(KiotVietError::Api {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let body: Value = response.json().await?;
        let access_token = body
            .get("access_token")
            .and_then(|v| v.as_str())
            .ok_or(KiotVietError::Token)?
            .to_string();
        let expires_in = body
            .get("expires_in")
            .and_then(|v| v.as_i64())
            .unwrap_or(86_400);

        // 提前 60 秒视为过期
        let expires_at = Utc::now() + Duration::seconds(expires_in - 60);
        debug!(%expires_at, "refreshed KiotViet access token");
        *guard = Some(CachedToken {
            access_token: access_token.clone(),
            expires_at,
        });
        Ok(access_token)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.cfg.base_url, path)
    }

    async fn check(response: reqwest::Response) -> Result<Value, KiotVietError> {
        let status = response.status();
        if !status.is_success() {
            return Err(KiotVietError::Api {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }
        let text = response.text().await?;
        if text.is_empty() {
            // DELETE 成功时可能返回空响应体
            return Ok(serde_json::json!({"message": "success"}));
        }
        serde_json::from_str(&text).map_err(|_| KiotVietError::Api {
            status: status.as_u16(),
            body: text,
        })
    }

    async fn get(&self, path: &str, query: &[(String, String)]) -> Result<Value, KiotVietError> {
        let token = self.ensure_token().await?;
        let response = self
            .http
            .get(self.url(path))
            .header("Retailer", &self.cfg.retailer)
            .bearer_auth(token)
            .query(query)
            .send()
            .await?;
        Self::check(response).await
    }

    /// POST 创建
    pub async fn create(&self, path: &str, body: &Value) -> Result<Value, KiotVietError> {
        let token = self.ensure_token().await?;
        let response = self
            .http
            .post(self.url(path))
            .header("Retailer", &self.cfg.retailer)
            .bearer_auth(token)
            .json(body)
            .send()
            .await?;
        Self::check(response).await
    }

    /// PUT 更新
    pub async fn update(&self, path: &str, body: &Value) -> Result<Value, KiotVietError> {
        let token = self.ensure_token().await?;
        let response = self
            .http
            .put(self.url(path))
            .header("Retailer", &self.cfg.retailer)
            .bearer_auth(token)
            .json(body)
            .send()
            .await?;
        Self::check(response).await
    }

    /// DELETE 删除
    pub async fn delete(&self, path: &str) -> Result<Value, KiotVietError> {
        let token = self.ensure_token().await?;
        let response = self
            .http
            .delete(self.url(path))
            .header("Retailer", &self.cfg.retailer)
            .bearer_auth(token)
            .send()
            .await?;
        Self::check(response).await
    }

    // ---------- 列表读取 ----------

    pub async fn list_invoices(&self, params: &Map<String, Value>) -> Result<Value, KiotVietError> {
        self.get("/invoices", &query_from_params(params)).await
    }

    pub async fn list_orders(&self, params: &Map<String, Value>) -> Result<Value, KiotVietError> {
        self.get("/orders", &query_from_params(params)).await
    }

    pub async fn list_products(&self, params: &Map<String, Value>) -> Result<Value, KiotVietError> {
        self.get("/products", &query_from_params(params)).await
    }

    pub async fn list_customers(&self, params: &Map<String, Value>) -> Result<Value, KiotVietError> {
        self.get("/customers", &query_from_params(params)).await
    }

    pub async fn list_categories(
        &self,
        params: &Map<String, Value>,
    ) -> Result<Value, KiotVietError> {
        let mut query = query_from_params(params);
        query.push(("hierarchicalData".to_string(), "true".to_string()));
        self.get("/categories", &query).await
    }

    pub async fn list_branches(&self) -> Result<Value, KiotVietError> {
        self.get("/branches", &[]).await
    }
}

/// 把读取意图参数转成查询串：常用 snake_case 键映射为 KiotViet 的 camelCase，
/// 其余键原样透传
pub(crate) fn query_from_params(params: &Map<String, Value>) -> Vec<(String, String)> {
    params
        .iter()
        .filter_map(|(key, value)| {
            let key = match key.as_str() {
                "page_size" => "pageSize",
                "current_item" => "currentItem",
                "order_by" => "orderBy",
                "order_direction" => "orderDirection",
                "from_date" => "fromDate",
                "to_date" => "toDate",
                "include_payment" => "includePayment",
                other => other,
            };
            let value = match value {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                _ => return None,
            };
            Some((key.to_string(), value))
        })
        .collect()
}
