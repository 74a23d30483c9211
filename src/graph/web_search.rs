//! Web 检索节点（税务 / 会计制度问答）
//!
//! 走 Google Custom Search API；未配置 key 时直接空结果，检索失败时把错误
//! 写进 kb_context，两种情况都不中断回合。

use serde_json::Value;
use tracing::{error, info, warn};

use crate::config::SearchSection;
use crate::core::state::TurnState;

const SEARCH_ENDPOINT: &str = "https://www.googleapis.com/customsearch/v1";

async fn search(section: &SearchSection, query: &str) -> Result<Vec<Value>, String> {
    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(section.timeout_secs))
        .build()
        .map_err(|e| e.to_string())?;

    let num = section.num_results.min(10).to_string();
    let response = client
        .get(SEARCH_ENDPOINT)
        .query(&[
            ("key", section.api_key.as_str()),
            ("cx", section.cx.as_str()),
            ("q", query),
            ("num", num.as_str()),
        ])
        .send()
        .await
        .map_err(|e| e.to_string())?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(format!("search API error ({status}): {body}"));
    }

    let data: Value = response.json().await.map_err(|e| e.to_string())?;
    let results = data
        .get("items")
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .map(|item| {
                    serde_json::json!({
                        "title": item.get("title").and_then(|v| v.as_str()).unwrap_or(""),
                        "link": item.get("link").and_then(|v| v.as_str()).unwrap_or(""),
                        "snippet": item.get("snippet").and_then(|v| v.as_str()).unwrap_or(""),
                    })
                })
                .collect()
        })
        .unwrap_or_default();
    Ok(results)
}

/// 把检索结果前 5 条拼成 kb_context
fn build_kb_context(results: &[Value]) -> String {
    let parts: Vec<String> = results
        .iter()
        .take(5)
        .map(|r| {
            let title = r.get("title").and_then(|v| v.as_str()).unwrap_or("");
            let link = r.get("link").and_then(|v| v.as_str()).unwrap_or("");
            let snippet = r.get("snippet").and_then(|v| v.as_str()).unwrap_or("");
            format!("**{title}** ({link}): {snippet}")
        })
        .collect();
    parts.join("\n\n---\n\n")
}

/// 检索 Web 并填充 state.web_results / state.kb_context
pub async fn search_web(section: &SearchSection, state: &mut TurnState) {
    if section.api_key.is_empty() || section.cx.is_empty() {
        warn!("Google Search API not configured, returning empty results");
        state.web_results = Vec::new();
        state.kb_context = "No web search results found.".to_string();
        return;
    }

    let query = format!("{} {}", state.user_input, state.chat_context)
        .trim()
        .to_string();

    match search(section, &query).await {
        Ok(results) => {
            info!(count = results.len(), "web search completed");
            if results.is_empty() {
                state.kb_context = "No web search results found.".to_string();
            } else {
                state.kb_context = build_kb_context(&results);
            }
            state.web_results = results;
        }
        Err(e) => {
            error!(error = %e, "web search failed");
            state.web_results = Vec::new();
            state.kb_context = format!("Error during web search: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unconfigured_search_yields_empty_results() {
        let section = SearchSection::default();
        let mut state = TurnState::new("u1", "w1", "c1", "thuế GTGT", vec![], None);
        search_web(&section, &mut state).await;
        assert!(state.web_results.is_empty());
        assert_eq!(state.kb_context, "No web search results found.");
    }

    #[test]
    fn kb_context_uses_top_five_results() {
        let results: Vec<Value> = (0..7)
            .map(|i| {
                serde_json::json!({
                    "title": format!("Kết quả {i}"),
                    "link": format!("https://example.vn/{i}"),
                    "snippet": "trích đoạn",
                })
            })
            .collect();
        let ctx = build_kb_context(&results);
        assert_eq!(ctx.matches("---").count(), 4);
        assert!(ctx.contains("**Kết quả 0** (https://example.vn/0): trích đoạn"));
        assert!(!ctx.contains("Kết quả 5"));
    }
}
