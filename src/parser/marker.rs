//! 标记语法与提取器
//!
//! 手写扫描器：定位开标记，再找对应的闭标记或文末。相比回溯式的
//! 模式匹配，孤儿标记和负载内嵌字面标记的处理是显式分支，可以
//! 逐一测试。标记名大小写不敏感，负载必须是 JSON 对象。

use serde_json::Value;
use tracing::debug;

use crate::models::session::SessionState;

/// 标记种类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    /// 会话数据: [SESSION_DATA]{...}[/SESSION_DATA]
    SessionData,
    /// 个人信息指令: [STORE_PERSONAL]{...}[/STORE_PERSONAL]
    StorePersonal,
    /// 偏好指令: [STORE_PREFERENCE]{...}[/STORE_PREFERENCE]
    StorePreference,
}

impl MarkerKind {
    /// 管道中固定的处理顺序：会话数据、个人信息、偏好
    pub const ALL: [MarkerKind; 3] = [
        MarkerKind::SessionData,
        MarkerKind::StorePersonal,
        MarkerKind::StorePreference,
    ];

    /// 开标记
    pub fn open_tag(&self) -> &'static str {
        match self {
            MarkerKind::SessionData => "[SESSION_DATA]",
            MarkerKind::StorePersonal => "[STORE_PERSONAL]",
            MarkerKind::StorePreference => "[STORE_PREFERENCE]",
        }
    }

    /// 闭标记
    pub fn close_tag(&self) -> &'static str {
        match self {
            MarkerKind::SessionData => "[/SESSION_DATA]",
            MarkerKind::StorePersonal => "[/STORE_PERSONAL]",
            MarkerKind::StorePreference => "[/STORE_PREFERENCE]",
        }
    }
}

/// 提取某一种标记的全部负载并剥离标记
///
/// 按文档顺序遍历所有闭合标记对，逐个尝试 JSON 解码：解码失败的
/// 单次出现被丢弃（记日志继续），成功的对象浅合并进累加器，后出现
/// 的键覆盖先出现的。剥离阶段移除所有闭合对，再把无闭标记的孤儿
/// 开标记剥到文末。除返回值外无任何副作用。
pub fn extract_and_strip(raw: &str, kind: MarkerKind) -> (SessionState, String) {
    let open = kind.open_tag();
    let close = kind.close_tag();

    let mut merged = SessionState::new();
    let mut cursor = 0;
    while let Some(start) = find_tag_ci(raw, open, cursor) {
        let payload_start = start + open.len();
        let Some(end) = find_tag_ci(raw, close, payload_start) else {
            // 孤儿开标记：没有可提取的闭合负载，交给剥离阶段处理
            break;
        };
        let payload = raw[payload_start..end].trim();
        match serde_json::from_str::<Value>(payload) {
            Ok(Value::Object(object)) => {
                for (key, value) in object {
                    merged.insert(key, value);
                }
            }
            Ok(_) => {
                debug!(kind = ?kind, "标记负载不是 JSON 对象，丢弃该次出现");
            }
            Err(e) => {
                debug!(kind = ?kind, error = %e, "标记负载 JSON 解码失败，丢弃该次出现");
            }
        }
        cursor = end + close.len();
    }

    (merged, strip_marker(raw, kind))
}

/// 剥离某一种标记：先循环移除闭合对，再截断孤儿开标记
pub(crate) fn strip_marker(text: &str, kind: MarkerKind) -> String {
    let mut out = strip_closed_pairs(text, kind);
    if let Some(start) = find_tag_ci(&out, kind.open_tag(), 0) {
        out.truncate(start);
    }
    out.trim().to_string()
}

/// 循环移除所有 open..close 闭合对，直到一轮扫描没有发现新的匹配
///
/// 负载文本里可能嵌有字面的标记字符串，一轮替换后会暴露新的配对，
/// 因此必须迭代至收敛。
pub(crate) fn strip_closed_pairs(text: &str, kind: MarkerKind) -> String {
    let open = kind.open_tag();
    let close = kind.close_tag();

    let mut out = text.to_string();
    loop {
        let mut next = String::with_capacity(out.len());
        let mut cursor = 0;
        let mut removed = false;
        while let Some(start) = find_tag_ci(&out, open, cursor) {
            let Some(end) = find_tag_ci(&out, close, start + open.len()) else {
                break;
            };
            next.push_str(&out[cursor..start]);
            cursor = end + close.len();
            removed = true;
        }
        next.push_str(&out[cursor..]);
        out = next;
        if !removed {
            return out;
        }
    }
}

/// 在 `from` 之后查找标记（ASCII 大小写不敏感），返回字节偏移
///
/// 标记是纯 ASCII，匹配位置必然落在字符边界上。
pub(crate) fn find_tag_ci(haystack: &str, tag: &str, from: usize) -> Option<usize> {
    let haystack = haystack.as_bytes();
    let tag = tag.as_bytes();
    if tag.is_empty() || haystack.len() < from + tag.len() {
        return None;
    }
    (from..=haystack.len() - tag.len())
        .find(|&i| haystack[i..i + tag.len()].eq_ignore_ascii_case(tag))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_well_formed_payload() {
        let raw = r#"before [SESSION_DATA]{"nft_list": [{"id": "nft-1"}]}[/SESSION_DATA] after"#;
        let (payload, stripped) = extract_and_strip(raw, MarkerKind::SessionData);
        assert_eq!(payload.get("nft_list"), Some(&json!([{"id": "nft-1"}])));
        assert_eq!(stripped, "before  after");
        assert!(!stripped.contains("SESSION_DATA"));
    }

    #[test]
    fn test_later_occurrence_wins_on_key_collision() {
        let raw = concat!(
            r#"[STORE_PREFERENCE]{"a":1}[/STORE_PREFERENCE] middle "#,
            r#"[STORE_PREFERENCE]{"a":2}[/STORE_PREFERENCE]"#
        );
        let (payload, stripped) = extract_and_strip(raw, MarkerKind::StorePreference);
        assert_eq!(payload.get("a"), Some(&json!(2)));
        assert_eq!(stripped, "middle");
    }

    #[test]
    fn test_payloads_merge_across_occurrences() {
        let raw = concat!(
            r#"[SESSION_DATA]{"a":1}[/SESSION_DATA]"#,
            r#"[SESSION_DATA]{"b":2}[/SESSION_DATA]"#
        );
        let (payload, _) = extract_and_strip(raw, MarkerKind::SessionData);
        assert_eq!(payload.get("a"), Some(&json!(1)));
        assert_eq!(payload.get("b"), Some(&json!(2)));
    }

    #[test]
    fn test_unclosed_malformed_marker_is_stripped_to_end() {
        let raw = "hello [SESSION_DATA]{bad json";
        let (payload, stripped) = extract_and_strip(raw, MarkerKind::SessionData);
        assert!(payload.is_empty());
        assert_eq!(stripped, "hello");
    }

    #[test]
    fn test_malformed_payload_skipped_without_failing_turn() {
        let raw = concat!(
            r#"[SESSION_DATA]{not json}[/SESSION_DATA] text "#,
            r#"[SESSION_DATA]{"ok":true}[/SESSION_DATA]"#
        );
        let (payload, stripped) = extract_and_strip(raw, MarkerKind::SessionData);
        assert_eq!(payload.get("ok"), Some(&json!(true)));
        assert_eq!(stripped, "text");
    }

    #[test]
    fn test_non_object_payload_is_discarded() {
        let raw = r#"[SESSION_DATA][1, 2, 3][/SESSION_DATA] rest"#;
        let (payload, stripped) = extract_and_strip(raw, MarkerKind::SessionData);
        assert!(payload.is_empty());
        assert_eq!(stripped, "rest");
    }

    #[test]
    fn test_tags_are_case_insensitive() {
        let raw = r#"x [session_data]{"k":"v"}[/Session_Data] y"#;
        let (payload, stripped) = extract_and_strip(raw, MarkerKind::SessionData);
        assert_eq!(payload.get("k"), Some(&json!("v")));
        assert_eq!(stripped, "x  y");
    }

    #[test]
    fn test_literal_tag_inside_payload_converges() {
        // 负载里嵌着字面闭标记：首轮移除到最近闭标记，残余在后续轮次收敛
        let raw = "a [SESSION_DATA]{\"t\":\"[/SESSION_DATA]\"}[/SESSION_DATA] b";
        let stripped = strip_marker(raw, MarkerKind::SessionData);
        assert!(!stripped.contains("[SESSION_DATA]"));
    }

    #[test]
    fn test_extractor_does_not_touch_other_kinds() {
        let raw = r#"[STORE_PERSONAL]{"display_name":"Alex"}[/STORE_PERSONAL]"#;
        let (payload, stripped) = extract_and_strip(raw, MarkerKind::SessionData);
        assert!(payload.is_empty());
        assert_eq!(stripped, raw);
    }

    #[test]
    fn test_find_tag_ci_offsets() {
        assert_eq!(find_tag_ci("ab[X]cd", "[x]", 0), Some(2));
        assert_eq!(find_tag_ci("ab[X]cd", "[x]", 3), None);
        assert_eq!(find_tag_ci("short", "[SESSION_DATA]", 0), None);
    }
}
