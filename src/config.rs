//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `CULI__*` 覆盖（双下划线表示嵌套，如 `CULI__LLM__MODEL=...`）。

use std::path::PathBuf;

use serde::Deserialize;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub app: AppSection,
    pub plan: PlanSection,
    pub llm: LlmSection,
    pub answer: AnswerSection,
    pub search: SearchSection,
}

/// [app] 段：应用名与历史轮数
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppSection {
    pub name: Option<String>,
    /// 回答上下文保留的历史消息条数
    pub chat_history_length: usize,
    /// 意图分类时带入的最近消息条数
    pub intent_history_turns: usize,
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            name: None,
            chat_history_length: 10,
            intent_history_turns: 5,
        }
    }
}

/// [plan] 段：计划审批策略
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlanSection {
    /// true 时计划自动通过审批；false 时等待外部决策（当前版本直接走取消路径）
    pub auto_approve: bool,
}

impl Default for PlanSection {
    fn default() -> Self {
        Self { auto_approve: true }
    }
}

/// [llm] 段：OpenAI 兼容端点与按任务的模型选择
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    /// OpenAI 兼容端点，默认 OpenRouter
    pub base_url: String,
    /// API Key；为空时从 OPENROUTER_API_KEY / OPENAI_API_KEY 环境变量取
    pub api_key: Option<String>,
    /// 默认模型
    pub model: String,
    /// 意图分类模型（缺省回退到 model）
    pub model_intent: Option<String>,
    /// 计划生成模型
    pub model_plan: Option<String>,
    /// 复杂输入（超长请求）的计划生成模型
    pub model_plan_complex: Option<String>,
    /// 回答合成模型
    pub model_answer: Option<String>,
    pub temperature: f32,
    /// 常规调用 token 上限
    pub max_tokens: u32,
    /// 回答合成的 token 上限
    pub max_tokens_answer: u32,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            base_url: "https://openrouter.ai/api/v1".to_string(),
            api_key: None,
            model: "openai/gpt-4-turbo-preview".to_string(),
            model_intent: None,
            model_plan: None,
            model_plan_complex: None,
            model_answer: None,
            temperature: 0.7,
            max_tokens: 250,
            max_tokens_answer: 1024,
        }
    }
}

/// [answer] 段：回答合成时的负载治理
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnswerSection {
    /// 单个列表字段保留的最大条目数
    pub max_list_items: usize,
    /// 序列化负载的最大字符数（超过则截断并追加标记）
    pub max_payload_chars: usize,
}

impl Default for AnswerSection {
    fn default() -> Self {
        Self {
            max_list_items: 5,
            max_payload_chars: 3000,
        }
    }
}

/// [search] 段：Google Custom Search（tax_qa Web 检索）
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchSection {
    pub api_key: String,
    pub cx: String,
    /// 单次检索结果数（API 单页上限 10）
    pub num_results: usize,
    pub timeout_secs: u64,
}

impl Default for SearchSection {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            cx: String::new(),
            num_results: 10,
            timeout_secs: 30,
        }
    }
}

/// 从 config 目录加载配置，环境变量 CULI__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 CULI__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("CULI")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}
