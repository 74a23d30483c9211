//! 回合状态：贯穿一次编排调用的可变状态对象
//!
//! 每个对话回合创建一个 TurnState，由 Orchestrator 独占驱动，回合结束后
//! 终态字段（answer / plan / step_results）交由外部协作方持久化。
//! 所有「可能缺席」的字段用真正的 Option 建模，而非字典缺键语义。

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::apps::{ConnectedAppConfig, Plan, StepResult};

/// 消息角色
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// 一条对话消息（OpenAI 格式的 role + content）
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// 用户意图（封闭集合）
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// 普通问答，无需外部应用
    GeneralQa,
    /// 税务 / 会计制度问答，需要 Web 检索
    TaxQa,
    /// 查看报表 / 营收 / 单据，需要从应用读取
    AppRead,
    /// 建档 / 修改数据，需要生成计划并写入应用
    AppPlan,
    /// 未配置应用却要求查看数据
    NoApp,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::GeneralQa => "general_qa",
            Intent::TaxQa => "tax_qa",
            Intent::AppRead => "app_read",
            Intent::AppPlan => "app_plan",
            Intent::NoApp => "no_app",
        }
    }

    /// 仅接受封闭集合内的取值，其余返回 None（分类节点据此回退 general_qa）
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "general_qa" => Some(Intent::GeneralQa),
            "tax_qa" => Some(Intent::TaxQa),
            "app_read" => Some(Intent::AppRead),
            "app_plan" => Some(Intent::AppPlan),
            "no_app" => Some(Intent::NoApp),
            _ => None,
        }
    }
}

/// 贯穿编排图的回合状态
#[derive(Clone, Debug)]
pub struct TurnState {
    // 技术上下文
    pub user_id: String,
    pub workspace_id: String,
    pub conversation_id: String,

    // 前端输入
    pub user_input: String,
    /// 历史消息，插入序即时间序，加载后不再修改
    pub messages: Vec<Message>,

    /// 当前 workspace 连接的外部应用；None 表示本回合没有可用应用
    pub connected_app: Option<ConnectedAppConfig>,

    // 意图分类输出
    pub intent: Intent,
    pub needs_web: bool,
    pub needs_app: bool,
    pub needs_plan: bool,

    // 累积上下文
    pub chat_context: String,
    pub kb_context: String,

    /// Web 检索结果（tax_qa 路径）
    pub web_results: Vec<Value>,

    /// 应用读取结果（键随读取种类变化）
    pub app_data: Map<String, Value>,

    // 计划与执行簿记
    pub plan: Option<Plan>,
    pub plan_approved: bool,
    /// 指向计划步骤的零基游标
    pub current_step_index: usize,
    /// 每执行一步追加一条，只追加、不重排、不删除
    pub step_results: Vec<StepResult>,

    // 终态输出
    pub answer: String,
    pub error: Option<String>,
}

impl TurnState {
    /// 构建回合初始状态（历史与应用配置由外部协作方提供，凭证已解密）
    pub fn new(
        user_id: impl Into<String>,
        workspace_id: impl Into<String>,
        conversation_id: impl Into<String>,
        user_input: impl Into<String>,
        messages: Vec<Message>,
        connected_app: Option<ConnectedAppConfig>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            workspace_id: workspace_id.into(),
            conversation_id: conversation_id.into(),
            user_input: user_input.into(),
            messages,
            connected_app,
            intent: Intent::GeneralQa,
            needs_web: false,
            needs_app: false,
            needs_plan: false,
            chat_context: String::new(),
            kb_context: String::new(),
            web_results: Vec::new(),
            app_data: Map::new(),
            plan: None,
            plan_approved: false,
            current_step_index: 0,
            step_results: Vec::new(),
            answer: String::new(),
            error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intent_parse_accepts_only_closed_set() {
        assert_eq!(Intent::parse("app_read"), Some(Intent::AppRead));
        assert_eq!(Intent::parse("no_app"), Some(Intent::NoApp));
        assert_eq!(Intent::parse("web_research"), None);
        assert_eq!(Intent::parse(""), None);
    }

    #[test]
    fn intent_serde_uses_snake_case() {
        let json = serde_json::to_string(&Intent::TaxQa).unwrap();
        assert_eq!(json, "\"tax_qa\"");
        let back: Intent = serde_json::from_str("\"app_plan\"").unwrap();
        assert_eq!(back, Intent::AppPlan);
    }

    #[test]
    fn new_state_starts_clean() {
        let state = TurnState::new("u1", "w1", "c1", "xin chào", vec![], None);
        assert_eq!(state.intent, Intent::GeneralQa);
        assert!(!state.plan_approved);
        assert_eq!(state.current_step_index, 0);
        assert!(state.step_results.is_empty());
        assert!(state.answer.is_empty());
        assert!(state.error.is_none());
    }
}
