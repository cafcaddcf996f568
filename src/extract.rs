//! 多路径字段提取
//!
//! 上游响应结构没有文档且多次变更，这里按顺序尝试一组点分路径，
//! 返回第一个命中的非空字符串；全部落空时退化为整个响应的序列化文本。

use serde_json::Value;

/// 查找回答文本的候选路径（按优先级排列）
pub const ANSWER_PATHS: &[&str] = &[
    "data.answer",
    "data.queryResult.text",
    "data.queryResult.fulfillment.answer",
    "data.queryResult.fulfillment.text",
    "answer",
    "text",
];

/// 提取结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extracted {
    /// 某条路径命中
    Found { path: &'static str, text: String },
    /// 没有路径命中，携带序列化后的完整响应
    Fallback(String),
}

impl Extracted {
    pub fn text(&self) -> &str {
        match self {
            Extracted::Found { text, .. } => text,
            Extracted::Fallback(raw) => raw,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Extracted::Fallback(_))
    }
}

/// 沿单条点分路径取字符串
///
/// 路径上的每一个中间值（包括根）都必须是 JSON 对象，
/// 最终值必须是去掉空白后仍非空的字符串，否则返回 `None`。
pub fn lookup_str<'a>(value: &'a Value, path: &str) -> Option<&'a str> {
    let mut current = value;
    for segment in path.split('.') {
        current = current.as_object()?.get(segment)?;
    }

    current.as_str().filter(|s| !s.trim().is_empty())
}

/// 按顺序尝试每条路径，返回第一个命中的 (路径, 文本)
pub fn first_match<'a>(
    value: &'a Value,
    paths: &[&'static str],
) -> Option<(&'static str, &'a str)> {
    paths
        .iter()
        .find_map(|path| lookup_str(value, path).map(|text| (*path, text)))
}

/// 提取回答文本，全部落空时退化为序列化文本
pub fn extract_or_dump(value: &Value, paths: &[&'static str]) -> Extracted {
    match first_match(value, paths) {
        Some((path, text)) => Extracted::Found {
            path,
            text: text.trim().to_string(),
        },
        None => Extracted::Fallback(value.to_string()),
    }
}

/// 使用默认候选路径提取回答文本
pub fn extract_answer(value: &Value) -> Extracted {
    extract_or_dump(value, ANSWER_PATHS)
}
