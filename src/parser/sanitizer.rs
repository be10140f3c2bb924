//! 面向用户的文本净化
//!
//! 任何将要展示给用户的文本都经过这里，保证三种标记的任何残余
//! （闭合对、孤儿开标记、落单的裸标记行）都不会泄露。净化是
//! 幂等的：净化两次与净化一次结果相同。管道中调用两次——整体
//! 回复一次，块拆分后对每个文本块再来一次，因为拆分可能把
//! 组件边界附近的半剥离残片重新暴露出来。

use crate::parser::marker::{find_tag_ci, strip_closed_pairs, MarkerKind};

/// 移除所有标记残余，返回可安全展示给用户的文本
pub fn sanitize_for_user(text: &str) -> String {
    if text.trim().is_empty() {
        return text.to_string();
    }

    let mut out = text.to_string();

    // 闭合对：循环替换至收敛（负载内的字面标记可能在一轮后暴露新配对）
    for kind in MarkerKind::ALL {
        out = strip_closed_pairs(&out, kind);
    }

    // 孤儿开标记：从开标记剥到文末
    for kind in MarkerKind::ALL {
        if let Some(start) = find_tag_ci(&out, kind.open_tag(), 0) {
            out.truncate(start);
        }
    }

    // 裸标记行：整行移除而不是子串替换，避免句中留下空洞
    let lines: Vec<&str> = out
        .lines()
        .filter(|line| !is_bare_tag_line(line))
        .collect();
    lines.join("\n").trim().to_string()
}

/// 一行去除空白后是否恰好是某个裸的开/闭标记
fn is_bare_tag_line(line: &str) -> bool {
    let trimmed = line.trim();
    MarkerKind::ALL.iter().any(|kind| {
        trimmed.eq_ignore_ascii_case(kind.open_tag()) || trimmed.eq_ignore_ascii_case(kind.close_tag())
    })
}
