//! 适配器契约：trait 与数据类型
//!
//! read / execute_step 的签名是不可失败的：适配器内部的任何错误都必须在
//! 边界内转成带 error 键的结果映射或 failed StepResult，不得向调用方抛出。
//! 每个适配器在注册时以 supported_actions 显式声明能力集合；
//! supports_action 为 false 的动作一律返回失败且不得触碰外部系统。

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 应用类别
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AppCategory {
    /// KiotViet、Misa eShop、Sapo 等简单 POS
    #[serde(rename = "POS_SIMPLE")]
    PosSimple,
    /// MISA、Fast、Bravo 等会计软件
    #[serde(rename = "ACCOUNTING")]
    Accounting,
    #[serde(rename = "UNKNOWN")]
    Unknown,
}

impl AppCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppCategory::PosSimple => "POS_SIMPLE",
            AppCategory::Accounting => "ACCOUNTING",
            AppCategory::Unknown => "UNKNOWN",
        }
    }
}

/// 连接方式
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionMethod {
    /// 直连 API
    Api,
    /// Model Context Protocol 服务器
    Mcp,
}

/// 已连接应用的配置（每回合从持久化存储重建，凭证已解密，不可变）
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConnectedAppConfig {
    /// "kiotviet"、"misa_eshop" 等
    pub app_id: String,
    /// 展示名："KiotViet"、"Misa eShop"
    pub name: String,
    pub category: AppCategory,
    pub connection_method: ConnectionMethod,
    /// OAuth 凭证、API Key 等
    pub credentials: Map<String, Value>,
    /// 附加配置
    #[serde(default)]
    pub extra: Map<String, Value>,
}

/// 读取种类（封闭集合）
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReadKind {
    #[serde(rename = "LIST_INVOICES")]
    ListInvoices,
    #[serde(rename = "LIST_ORDERS")]
    ListOrders,
    #[serde(rename = "LIST_PRODUCTS")]
    ListProducts,
    #[serde(rename = "LIST_CUSTOMERS")]
    ListCustomers,
    #[serde(rename = "LIST_CATEGORIES")]
    ListCategories,
    #[serde(rename = "LIST_BRANCHES")]
    ListBranches,
    #[serde(rename = "SUMMARY_REVENUE")]
    SummaryRevenue,
}

impl ReadKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReadKind::ListInvoices => "LIST_INVOICES",
            ReadKind::ListOrders => "LIST_ORDERS",
            ReadKind::ListProducts => "LIST_PRODUCTS",
            ReadKind::ListCustomers => "LIST_CUSTOMERS",
            ReadKind::ListCategories => "LIST_CATEGORIES",
            ReadKind::ListBranches => "LIST_BRANCHES",
            ReadKind::SummaryRevenue => "SUMMARY_REVENUE",
        }
    }
}

/// 读取意图：种类 + 参数（键随种类变化，如 page_size）
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReadIntent {
    pub kind: ReadKind,
    #[serde(default)]
    pub params: Map<String, Value>,
}

impl ReadIntent {
    pub fn new(kind: ReadKind) -> Self {
        Self {
            kind,
            params: Map::new(),
        }
    }

    pub fn with_page_size(kind: ReadKind, page_size: u64) -> Self {
        let mut params = Map::new();
        params.insert("page_size".to_string(), Value::from(page_size));
        Self { kind, params }
    }
}

/// 执行计划（描述 + 有序步骤）
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Plan {
    pub description: String,
    pub steps: Vec<PlanStep>,
}

/// 计划中的一步；action 词汇表对每个适配器开放扩展
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlanStep {
    /// 计划内唯一（生成器修复后为 index+1，不保证连续）
    pub id: i64,
    /// "CREATE_PRODUCT"、"CREATE_INVOICE" 等
    pub action: String,
    /// LLM 给出的步骤说明（可缺席）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub params: Map<String, Value>,
}

/// 步骤状态
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Success,
    Failed,
}

/// 一步执行的结果，成功失败都保留
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StepResult {
    pub step_id: i64,
    pub action: String,
    pub status: StepStatus,
    /// 成功或失败的人类可读说明
    pub message: String,
    /// 应用 API 的原始响应，失败时为空映射
    #[serde(default)]
    pub raw: Map<String, Value>,
}

impl StepResult {
    /// 构造成功结果
    pub fn success(
        step_id: i64,
        action: impl Into<String>,
        message: impl Into<String>,
        raw: Map<String, Value>,
    ) -> Self {
        Self {
            step_id,
            action: action.into(),
            status: StepStatus::Success,
            message: message.into(),
            raw,
        }
    }

    /// 构造失败结果（raw 为空映射）
    pub fn failed(step_id: i64, action: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            step_id,
            action: action.into(),
            status: StepStatus::Failed,
            message: message.into(),
            raw: Map::new(),
        }
    }
}

/// 应用适配器：每次调用都拿到新鲜的配置，不持有连接级可变状态
#[async_trait]
pub trait AppAdapter: Send + Sync {
    /// 注册表键，如 "kiotviet"
    fn app_id(&self) -> &'static str;

    /// 注册时声明的能力集合
    fn supported_actions(&self) -> &'static [&'static str];

    fn supports_action(&self, action: &str) -> bool {
        self.supported_actions().contains(&action)
    }

    /// 按读取意图取数；内部失败转成 {"error": ..., "data": []}
    async fn read(&self, intent: &ReadIntent, config: &ConnectedAppConfig) -> Map<String, Value>;

    /// 执行一个计划步骤；内部失败转成 failed StepResult
    async fn execute_step(&self, step: &PlanStep, config: &ConnectedAppConfig) -> StepResult;
}
