//! 适配器注册表
//!
//! 进程启动时一次性注册（write-once），之后通过 Arc 共享只读访问，查不到的
//! app_id 回退到 UnknownAppAdapter。

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, warn};

use crate::apps::adapter::AppAdapter;
use crate::apps::kiotviet::KiotVietAdapter;
use crate::apps::unknown::UnknownAppAdapter;

/// 按 app_id 派发适配器的注册表
pub struct AdapterRegistry {
    adapters: HashMap<&'static str, Arc<dyn AppAdapter>>,
    fallback: Arc<dyn AppAdapter>,
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl AdapterRegistry {
    /// 空注册表（仅含 Unknown 回退）
    pub fn new() -> Self {
        Self {
            adapters: HashMap::new(),
            fallback: Arc::new(UnknownAppAdapter),
        }
    }

    /// 注册所有内建适配器
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(KiotVietAdapter::new());
        registry
    }

    pub fn register(&mut self, adapter: impl AppAdapter + 'static) {
        let app_id = adapter.app_id();
        self.adapters.insert(app_id, Arc::new(adapter));
        info!(%app_id, "registered app adapter");
    }

    /// 查找适配器；未注册时回退 Unknown
    pub fn get(&self, app_id: &str) -> Arc<dyn AppAdapter> {
        match self.adapters.get(app_id) {
            Some(adapter) => adapter.clone(),
            None => {
                warn!(%app_id, "adapter not found, using UnknownAppAdapter");
                self.fallback.clone()
            }
        }
    }

    pub fn registered_ids(&self) -> Vec<&'static str> {
        self.adapters.keys().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apps::adapter::ReadKind;
    use crate::apps::{ConnectedAppConfig, ReadIntent};
    use serde_json::Map;

    fn app_config(app_id: &str) -> ConnectedAppConfig {
        serde_json::from_value(serde_json::json!({
            "app_id": app_id,
            "name": "Some Shop App",
            "category": "UNKNOWN",
            "connection_method": "api",
            "credentials": Map::new(),
        }))
        .unwrap()
    }

    #[test]
    fn builtin_registry_knows_kiotviet() {
        let registry = AdapterRegistry::with_builtin();
        assert!(registry.registered_ids().contains(&"kiotviet"));
        assert_eq!(registry.get("kiotviet").app_id(), "kiotviet");
    }

    #[tokio::test]
    async fn unregistered_id_falls_back_to_unknown() {
        let registry = AdapterRegistry::with_builtin();
        let adapter = registry.get("sapo");
        assert_eq!(adapter.app_id(), "unknown");

        let data = adapter
            .read(&ReadIntent::new(ReadKind::ListProducts), &app_config("sapo"))
            .await;
        assert!(data.contains_key("error"));
    }
}
