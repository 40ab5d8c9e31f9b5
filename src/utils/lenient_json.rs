//! 宽松 JSON 提取
//!
//! 从自由文本中截取第一个 `{` 到最后一个 `}` 之间的内容解析为字符串映射。
//! 首次解析失败时去掉行注释与尾随逗号后重试。

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static EMBEDDED_OBJECT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{[\s\S]*\}").unwrap());

// 依次匹配：字符串字面量（原样保留）、行注释、尾随逗号
static LENIENT_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""(?:[^"\\]|\\.)*"|//[^\n]*|,(\s*[}\]])"#).unwrap()
});

/// 去除行注释与尾随逗号，字符串内部不受影响
pub fn sanitize(candidate: &str) -> String {
    LENIENT_TOKEN
        .replace_all(candidate, |caps: &Captures| {
            let token = &caps[0];
            if token.starts_with('"') {
                token.to_string()
            } else if token.starts_with("//") {
                String::new()
            } else {
                caps.get(1).map_or("", |m| m.as_str()).to_string()
            }
        })
        .into_owned()
}

/// 提取文本中内嵌的 `{ "key": "value" }` 映射
pub fn extract_embedded_map(text: &str) -> Option<BTreeMap<String, String>> {
    let candidate = EMBEDDED_OBJECT.find(text)?.as_str();

    match serde_json::from_str::<BTreeMap<String, String>>(candidate) {
        Ok(map) => return Some(map),
        Err(e) => tracing::debug!(error = %e, "Strict parse of embedded map failed, retrying leniently"),
    }

    match serde_json::from_str::<BTreeMap<String, String>>(&sanitize(candidate)) {
        Ok(map) => Some(map),
        Err(e) => {
            tracing::warn!(error = %e, "Could not parse alias map from free text");
            None
        }
    }
}
