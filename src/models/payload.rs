//! 标记负载的类型化视图
//!
//! 三种标记各自对应一个已知字段的记录类型，未知键被忽略，
//! 而不是携带自由形态的字典到处传递。会话状态本身仍以 JSON
//! 对象做浅合并（见 [`crate::models::session`]），这里的类型
//! 只服务于读取：历史压缩和记忆策略按字段取值。

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::session::SessionState;

/// NFT 列表项（会话数据 nft_list 的元素）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NftEntry {
    pub id: String,
    pub name: String,
    pub collection: String,
    pub price_eth: Option<f64>,
    pub last_sale_eth: Option<f64>,
    pub owner: String,
    pub status: String,
    pub rarity_rank: Option<i64>,
}

/// 收藏集列表项（会话数据 collection_list 的元素）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionEntry {
    pub name: String,
    pub nft_count: u64,
}

/// NFT 详情（会话数据 detail_summary）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NftDetail {
    pub id: String,
    pub name: String,
    pub collection: String,
    pub price_eth: Option<f64>,
    pub last_sale_eth: Option<f64>,
    pub status: String,
    pub owner: String,
    pub blockchain: String,
    pub rarity_rank: Option<i64>,
    pub description: String,
    pub attributes: Vec<String>,
}

/// 最近一次列表查询的参数（分页提示用）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListParams {
    pub limit: Option<u64>,
    pub skip: Option<u64>,
    pub sort_by: Option<String>,
    pub order: Option<String>,
    pub collection: Option<String>,
    pub search: Option<String>,
    pub status: Option<String>,
    pub min_price_eth: Option<f64>,
    pub max_price_eth: Option<f64>,
}

/// SESSION_DATA 标记的类型化负载
///
/// 条目级容错：列表中无法解析的元素被单独丢弃，不影响其余条目。
#[derive(Debug, Clone, Default)]
pub struct SessionDataPayload {
    pub nft_list: Vec<NftEntry>,
    pub collection_list: Vec<CollectionEntry>,
    pub detail_summary: Option<NftDetail>,
    pub last_detail_id: Option<String>,
    pub last_list_params: Option<ListParams>,
}

impl SessionDataPayload {
    /// 从合并后的会话数据对象构建类型化视图
    pub fn from_state(state: &SessionState) -> Self {
        Self {
            nft_list: lenient_vec(state.get("nft_list")),
            collection_list: lenient_vec(state.get("collection_list")),
            detail_summary: state
                .get("detail_summary")
                .and_then(|v| serde_json::from_value(v.clone()).ok()),
            last_detail_id: state.get("last_detail_id").and_then(value_as_string),
            last_list_params: state
                .get("last_list_params")
                .and_then(|v| serde_json::from_value(v.clone()).ok()),
        }
    }
}

/// STORE_PERSONAL 指令的类型化负载
#[derive(Debug, Clone, Default)]
pub struct PersonalDirective {
    pub display_name: Option<String>,
    pub timezone: Option<String>,
    pub language: Option<String>,
}

impl PersonalDirective {
    pub fn from_map(map: &SessionState) -> Self {
        Self {
            display_name: map.get("display_name").and_then(value_as_string),
            timezone: map.get("timezone").and_then(value_as_string),
            language: map.get("language").and_then(value_as_string),
        }
    }
}

/// STORE_PREFERENCE 指令的类型化负载
///
/// 取值为原始字符串，合法性校验在记忆策略中针对各维度的枚举做。
#[derive(Debug, Clone, Default)]
pub struct PreferenceDirective {
    pub preferred_view: Option<String>,
    pub detail_level: Option<String>,
    pub response_format: Option<String>,
    pub style_preference: Option<String>,
    pub primary_intent: Option<String>,
    pub interest_collections: Option<String>,
    pub price_range_interest: Option<String>,
}

impl PreferenceDirective {
    pub fn from_map(map: &SessionState) -> Self {
        Self {
            preferred_view: map.get("preferred_view").and_then(value_as_string),
            detail_level: map.get("detail_level").and_then(value_as_string),
            response_format: map.get("response_format").and_then(value_as_string),
            style_preference: map.get("style_preference").and_then(value_as_string),
            primary_intent: map.get("primary_intent").and_then(value_as_string),
            interest_collections: map.get("interest_collections").and_then(value_as_string),
            price_range_interest: map.get("price_range_interest").and_then(value_as_string),
        }
    }
}

/// 列表字段的条目级宽松解析
fn lenient_vec<T: serde::de::DeserializeOwned>(value: Option<&Value>) -> Vec<T> {
    value
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|item| serde_json::from_value(item.clone()).ok())
                .collect()
        })
        .unwrap_or_default()
}

/// 字符串或数字取值转为非空字符串，其余形态视为缺失
fn value_as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn state_from(value: Value) -> SessionState {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_session_payload_ignores_unknown_keys() {
        let state = state_from(json!({
            "nft_list": [{"id": "nft-1", "name": "Foo", "mystery": 1}],
            "something_else": {"a": 1}
        }));
        let payload = SessionDataPayload::from_state(&state);
        assert_eq!(payload.nft_list.len(), 1);
        assert_eq!(payload.nft_list[0].id, "nft-1");
        assert!(payload.collection_list.is_empty());
    }

    #[test]
    fn test_malformed_list_entries_are_dropped_individually() {
        let state = state_from(json!({
            "nft_list": [{"id": "nft-1"}, "not an object", {"id": "nft-2"}]
        }));
        let payload = SessionDataPayload::from_state(&state);
        assert_eq!(payload.nft_list.len(), 2);
        assert_eq!(payload.nft_list[1].id, "nft-2");
    }

    #[test]
    fn test_personal_directive_string_coercion() {
        let map = state_from(json!({
            "display_name": "Alex",
            "timezone": 8,
            "language": "",
            "unknown": "x"
        }));
        let directive = PersonalDirective::from_map(&map);
        assert_eq!(directive.display_name.as_deref(), Some("Alex"));
        assert_eq!(directive.timezone.as_deref(), Some("8"));
        assert_eq!(directive.language, None);
    }

    #[test]
    fn test_preference_directive_fields() {
        let map = state_from(json!({"preferred_view": "table", "detail_level": "full"}));
        let directive = PreferenceDirective::from_map(&map);
        assert_eq!(directive.preferred_view.as_deref(), Some("table"));
        assert_eq!(directive.detail_level.as_deref(), Some("full"));
        assert_eq!(directive.primary_intent, None);
    }
}
