//! 历史压缩服务
//!
//! 助手响应入库前把组件块的不透明主体替换为从会话数据派生的
//! 紧凑文本摘要，存储形态是 [`StoredBlock`] 的 JSON 数组。
//! 同一轮内相同类型的组件摘要只消费一次，后续同类块得到空摘
//! 要，避免同一份大摘要在一条记录里重复出现。

use crate::error::Result;
use crate::models::chat::ContentBlock;
use crate::models::message::StoredBlock;
use crate::models::payload::{CollectionEntry, NftDetail, NftEntry, SessionDataPayload};

/// 列表摘要最多保留的条目数
const LIST_ENTRY_LIMIT: usize = 20;

/// 历史压缩器
pub struct HistoryCompactor;

impl HistoryCompactor {
    /// 把内容块序列压缩为可入库的 JSON 数组文本
    ///
    /// 同样的（块，负载）输入总是产出同样的结果，无副作用。
    pub fn build_storage_json(
        blocks: &[ContentBlock],
        payload: &SessionDataPayload,
    ) -> Result<String> {
        let mut nft_used = false;
        let mut collection_used = false;
        let mut detail_used = false;

        let mut stored = Vec::with_capacity(blocks.len());
        for block in blocks {
            match block {
                ContentBlock::Text { markdown } => {
                    stored.push(StoredBlock {
                        markdown: markdown.trim().to_string(),
                        component_data: String::new(),
                    });
                }
                ContentBlock::Component { template, .. } => {
                    let component_data = match template.to_lowercase().as_str() {
                        "grid" | "table" => {
                            let data = if nft_used {
                                String::new()
                            } else {
                                nft_list_summary(&payload.nft_list)
                            };
                            nft_used = true;
                            data
                        }
                        "collection_grid" | "collection_table" => {
                            let data = if collection_used {
                                String::new()
                            } else {
                                collection_list_summary(&payload.collection_list)
                            };
                            collection_used = true;
                            data
                        }
                        "details" => {
                            let data = if detail_used {
                                String::new()
                            } else {
                                detail_summary_text(
                                    payload.detail_summary.as_ref(),
                                    payload.last_detail_id.as_deref(),
                                )
                            };
                            detail_used = true;
                            data
                        }
                        _ => String::new(),
                    };
                    stored.push(StoredBlock {
                        markdown: String::new(),
                        component_data,
                    });
                }
            }
        }

        Ok(serde_json::to_string(&stored)?)
    }
}

fn opt_num<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".into())
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

fn nft_line(n: &NftEntry) -> String {
    format!(
        "{} {} ({}) price_eth={} last_sale_eth={} owner={} status={} rarity_rank={}",
        n.id,
        n.name,
        n.collection,
        opt_num(n.price_eth),
        opt_num(n.last_sale_eth),
        truncate_chars(&n.owner, 16),
        n.status,
        opt_num(n.rarity_rank),
    )
}

fn nft_list_summary(nft_list: &[NftEntry]) -> String {
    if nft_list.is_empty() {
        return "[Shown: NFT list]".to_string();
    }
    let parts: Vec<String> = nft_list.iter().take(LIST_ENTRY_LIMIT).map(nft_line).collect();
    let mut line = parts.join("; ");
    if nft_list.len() > LIST_ENTRY_LIMIT {
        line.push_str(&format!(" ... and {} more", nft_list.len() - LIST_ENTRY_LIMIT));
    }
    line
}

fn collection_list_summary(collection_list: &[CollectionEntry]) -> String {
    if collection_list.is_empty() {
        return "[Shown: collection list]".to_string();
    }
    let parts: Vec<String> = collection_list
        .iter()
        .take(LIST_ENTRY_LIMIT)
        .map(|c| format!("{} nft_count={}", c.name, c.nft_count))
        .collect();
    let mut line = parts.join("; ");
    if collection_list.len() > LIST_ENTRY_LIMIT {
        line.push_str(&format!(
            " ... and {} more",
            collection_list.len() - LIST_ENTRY_LIMIT
        ));
    }
    line
}

fn detail_summary_text(detail: Option<&NftDetail>, last_detail_id: Option<&str>) -> String {
    let Some(d) = detail else {
        return match last_detail_id {
            Some(id) => format!("[details for {id}]"),
            None => "[Shown: NFT details]".to_string(),
        };
    };
    let mut lines = vec![
        format!("id={} name={} collection={}", d.id, d.name, d.collection),
        format!(
            "price_eth={} last_sale_eth={} status={}",
            opt_num(d.price_eth),
            opt_num(d.last_sale_eth),
            d.status
        ),
        format!(
            "owner={} blockchain={} rarity_rank={}",
            d.owner,
            d.blockchain,
            opt_num(d.rarity_rank)
        ),
        format!("description: {}", truncate_chars(&d.description, 200)),
    ];
    if !d.attributes.is_empty() {
        lines.push(format!("attributes: {}", d.attributes.join(", ")));
    }
    lines.join(" | ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nft(id: &str, name: &str) -> NftEntry {
        NftEntry {
            id: id.into(),
            name: name.into(),
            collection: "Crypto Kings".into(),
            price_eth: Some(1.5),
            ..NftEntry::default()
        }
    }

    fn decode(json: &str) -> Vec<StoredBlock> {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_text_blocks_stored_verbatim_trimmed() {
        let blocks = vec![ContentBlock::text("  hello  ")];
        let json =
            HistoryCompactor::build_storage_json(&blocks, &SessionDataPayload::default()).unwrap();
        let stored = decode(&json);
        assert_eq!(stored[0].markdown, "hello");
        assert!(stored[0].component_data.is_empty());
    }

    #[test]
    fn test_component_body_replaced_by_summary() {
        let blocks = vec![ContentBlock::component("grid", "<div>huge</div>")];
        let payload = SessionDataPayload {
            nft_list: vec![nft("nft-1", "Foo")],
            ..SessionDataPayload::default()
        };
        let json = HistoryCompactor::build_storage_json(&blocks, &payload).unwrap();
        let stored = decode(&json);
        assert!(stored[0].markdown.is_empty());
        assert!(stored[0].component_data.contains("nft-1"));
        assert!(stored[0].component_data.contains("Foo"));
        assert!(!stored[0].component_data.contains("<div>"));
    }

    #[test]
    fn test_same_type_summary_consumed_once() {
        let blocks = vec![
            ContentBlock::component("grid", "a"),
            ContentBlock::component("table", "b"),
        ];
        let payload = SessionDataPayload {
            nft_list: vec![nft("nft-1", "Foo")],
            ..SessionDataPayload::default()
        };
        let json = HistoryCompactor::build_storage_json(&blocks, &payload).unwrap();
        let stored = decode(&json);
        assert!(stored[0].component_data.contains("nft-1"));
        assert!(stored[1].component_data.is_empty());
    }

    #[test]
    fn test_truncation_suffix_past_entry_limit() {
        let nft_list: Vec<NftEntry> = (0..25).map(|i| nft(&format!("nft-{i}"), "X")).collect();
        let payload = SessionDataPayload {
            nft_list,
            ..SessionDataPayload::default()
        };
        let blocks = vec![ContentBlock::component("grid", "body")];
        let json = HistoryCompactor::build_storage_json(&blocks, &payload).unwrap();
        let stored = decode(&json);
        assert!(stored[0].component_data.contains("... and 5 more"));
        assert!(!stored[0].component_data.contains("nft-20 "));
    }

    #[test]
    fn test_missing_payload_yields_placeholder() {
        let blocks = vec![ContentBlock::component("details", "body")];
        let json =
            HistoryCompactor::build_storage_json(&blocks, &SessionDataPayload::default()).unwrap();
        let stored = decode(&json);
        assert_eq!(stored[0].component_data, "[Shown: NFT details]");
    }

    #[test]
    fn test_deterministic_output() {
        let blocks = vec![
            ContentBlock::text("intro"),
            ContentBlock::component("collection_grid", "body"),
        ];
        let payload = SessionDataPayload {
            collection_list: vec![CollectionEntry {
                name: "Crypto Kings".into(),
                nft_count: 7,
            }],
            ..SessionDataPayload::default()
        };
        let a = HistoryCompactor::build_storage_json(&blocks, &payload).unwrap();
        let b = HistoryCompactor::build_storage_json(&blocks, &payload).unwrap();
        assert_eq!(a, b);
        assert!(a.contains("Crypto Kings nft_count=7"));
    }
}
