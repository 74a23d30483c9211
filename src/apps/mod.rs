//! 外部应用适配器层
//!
//! 适配器把通用的「读取 / 执行步骤」操作翻译成对某个具体业务系统
//! （POS、会计软件）的调用；注册表按 app_id 派发，未注册时回退 Unknown 适配器。

pub mod adapter;
pub mod kiotviet;
pub mod registry;
pub mod unknown;

pub use adapter::{
    AppAdapter, AppCategory, ConnectedAppConfig, ConnectionMethod, Plan, PlanStep, ReadIntent,
    ReadKind, StepResult, StepStatus,
};
pub use kiotviet::KiotVietAdapter;
pub use registry::AdapterRegistry;
pub use unknown::UnknownAppAdapter;
