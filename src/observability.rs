//! 可观测性
//!
//! tracing 初始化：RUST_LOG 可覆盖过滤规则，缺省全局 info。编排核心本身
//! 不初始化日志，由嵌入方（HTTP 层等外部协作方）在进程启动时调用一次。

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,culi=debug"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .init();
}
