//! KiotViet 连接配置
//!
//! 从 ConnectedAppConfig.credentials 提取必需凭证（client_id / client_secret /
//! retailer），base_url 与 token_url 可覆盖、缺省用官方端点。

use crate::apps::adapter::ConnectedAppConfig;
use crate::apps::kiotviet::client::KiotVietError;

pub const DEFAULT_BASE_URL: &str = "https://public.kiotapi.com";
pub const DEFAULT_TOKEN_URL: &str = "https://id.kiotviet.vn/connect/token";

/// KiotViet 专属配置
#[derive(Clone, Debug)]
pub struct KiotVietConfig {
    pub base_url: String,
    pub token_url: String,
    pub client_id: String,
    pub client_secret: String,
    /// 商铺名（tên gian hàng），作为 Retailer 请求头
    pub retailer: String,
}

impl KiotVietConfig {
    /// 从通用应用配置构建；缺少必需凭证时报 MissingCredential
    pub fn from_connected_app(config: &ConnectedAppConfig) -> Result<Self, KiotVietError> {
        let cred_str = |key: &'static str| -> Result<String, KiotVietError> {
            config
                .credentials
                .get(key)
                .and_then(|v| v.as_str())
                .filter(|s| !s.is_empty())
                .map(String::from)
                .ok_or(KiotVietError::MissingCredential(key))
        };

        let override_str = |key: &str, default: &str| -> String {
            config
                .credentials
                .get(key)
                .and_then(|v| v.as_str())
                .filter(|s| !s.is_empty())
                .map(String::from)
                .unwrap_or_else(|| default.to_string())
        };

        Ok(Self {
            base_url: override_str("base_url", DEFAULT_BASE_URL),
            token_url: override_str("token_url", DEFAULT_TOKEN_URL),
            client_id: cred_str("client_id")?,
            client_secret: cred_str("client_secret")?,
            retailer: cred_str("retailer")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connected_app(credentials: serde_json::Value) -> ConnectedAppConfig {
        serde_json::from_value(serde_json::json!({
            "app_id": "kiotviet",
            "name": "KiotViet",
            "category": "POS_SIMPLE",
            "connection_method": "api",
            "credentials": credentials,
        }))
        .unwrap()
    }

    #[test]
    fn builds_from_full_credentials() {
        let cfg = KiotVietConfig::from_connected_app(&connected_app(serde_json::json!({
            "client_id": "cid",
            "client_secret": "secret",
            "retailer": "tap-hoa-an-nhien",
        })))
        .unwrap();
        assert_eq!(cfg.base_url, DEFAULT_BASE_URL);
        assert_eq!(cfg.token_url, DEFAULT_TOKEN_URL);
        assert_eq!(cfg.retailer, "tap-hoa-an-nhien");
    }

    #[test]
    fn missing_retailer_is_rejected() {
        let err = KiotVietConfig::from_connected_app(&connected_app(serde_json::json!({
            "client_id": "cid",
            "client_secret": "secret",
        })))
        .unwrap_err();
        assert!(err.to_string().contains("retailer"));
    }

    #[test]
    fn url_overrides_are_honored() {
        let cfg = KiotVietConfig::from_connected_app(&connected_app(serde_json::json!({
            "client_id": "cid",
            "client_secret": "secret",
            "retailer": "shop",
            "base_url": "https://sandbox.kiotapi.com",
        })))
        .unwrap();
        assert_eq!(cfg.base_url, "https://sandbox.kiotapi.com");
    }
}
