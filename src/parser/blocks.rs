//! 内容块解析器
//!
//! 把已剥离状态标记的文本按组件块分界拆成有序的内容块序列。
//! 组件块语法与状态标记不同：开标记携带类型标签
//! `<!--HTML_COMPONENT::grid-->`，闭标记 `::END_HTML-->`，
//! 中间是本层不解释的组件体。

use crate::models::chat::ContentBlock;

/// 组件块开标记前缀（后接类型标签和 `-->`）
pub const COMPONENT_START: &str = "<!--HTML_COMPONENT::";

/// 组件块闭标记
pub const COMPONENT_END: &str = "::END_HTML-->";

/// 把文本拆分为有序内容块
///
/// 从左到右扫描：每个闭合的组件区间成为一个组件块（类型标签 +
/// 原样捕获的组件体），区间之间/之前/之后的文本成为去除首尾空白
/// 的文本块（修剪后为空的被丢弃）。没有组件区间时整个输入作为
/// 单个文本块；输入本身为空白时返回空序列。未闭合的组件开标记
/// 不做特殊处理，随其后的文本落入文本块（历史压缩层保证不会把
/// 原始组件体持久化）。
pub fn parse_blocks(raw: &str) -> Vec<ContentBlock> {
    let mut blocks = Vec::new();
    let mut last_end = 0;
    let mut cursor = 0;

    while let Some(found) = raw[cursor..].find(COMPONENT_START) {
        let start = cursor + found;
        let tag_start = start + COMPONENT_START.len();
        let tag_len = raw[tag_start..]
            .bytes()
            .take_while(|b| b.is_ascii_alphanumeric() || *b == b'_')
            .count();
        let tag_end = tag_start + tag_len;
        if tag_len == 0 || !raw[tag_end..].starts_with("-->") {
            // 开标记后没有合法的类型标签，按普通文本对待
            cursor = tag_start;
            continue;
        }
        let body_start = tag_end + "-->".len();
        let Some(found_end) = raw[body_start..].find(COMPONENT_END) else {
            break;
        };
        let body_end = body_start + found_end;

        let before = raw[last_end..start].trim();
        if !before.is_empty() {
            blocks.push(ContentBlock::text(before));
        }
        blocks.push(ContentBlock::component(
            &raw[tag_start..tag_end],
            raw[body_start..body_end].trim(),
        ));

        last_end = body_end + COMPONENT_END.len();
        cursor = last_end;
    }

    let remaining = raw[last_end..].trim();
    if !remaining.is_empty() {
        blocks.push(ContentBlock::text(remaining));
    }

    blocks
}

/// 把组件体包装为带标记的文本（渲染协作方使用的逆操作）
pub fn wrap_component(body: &str, template: &str) -> String {
    format!("{COMPONENT_START}{template}-->\n{body}\n{COMPONENT_END}")
}
