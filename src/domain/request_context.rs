//! 请求上下文
//!
//! 上游提取结果、只读请求上下文、按请求传递的解析缓存三者分离，
//! 避免跨请求的隐式状态修改。

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::alias_map::AliasMap;

static EMBEDDED_ADDRESS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(0x[a-fA-F0-9]{40})").expect("static regex"));

/// 上游提取服务返回的原始字段（全部不可信）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedFields {
    #[serde(default)]
    pub from_address: Option<String>,
    #[serde(default)]
    pub to_address: Option<String>,
    #[serde(default)]
    pub amount: Option<String>,
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub goal: Option<String>,
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    /// 原始消息文本
    #[serde(default)]
    pub text: Option<String>,
}

impl ExtractedFields {
    /// 从 JSON 对象解析
    pub fn from_json(value: serde_json::Value) -> serde_json::Result<Self> {
        serde_json::from_value(value)
    }

    /// address 为空时，采用消息文本中第一个 0x + 40 位十六进制地址
    pub fn with_address_from_text(mut self) -> Self {
        if non_blank(self.address.as_deref()).is_some() {
            return self;
        }
        if let Some(text) = self.text.as_deref() {
            if let Some(found) = EMBEDDED_ADDRESS.captures(text).and_then(|c| c.get(1)) {
                tracing::debug!(address = %found.as_str(), "Parsed address from message text");
                self.address = Some(found.as_str().to_string());
            }
        }
        self
    }
}

/// 只读请求上下文
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    /// 当前对话选定的分类
    pub category: Option<String>,
    /// 之前解析过的目标地址
    pub target_address: Option<String>,
    /// 对话状态携带的别名映射
    pub aliases: Option<AliasMap>,
    /// 可能内嵌 JSON 映射的自由文本（例如子账户 provider 输出）
    pub providers_text: Option<String>,
    /// 代理名称，用于展示
    pub agent_name: Option<String>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_target_address(mut self, address: impl Into<String>) -> Self {
        self.target_address = Some(address.into());
        self
    }

    pub fn with_aliases(mut self, aliases: AliasMap) -> Self {
        self.aliases = Some(aliases);
        self
    }

    pub fn with_providers_text(mut self, text: impl Into<String>) -> Self {
        self.providers_text = Some(text.into());
        self
    }

    pub fn with_agent_name(mut self, name: impl Into<String>) -> Self {
        self.agent_name = Some(name.into());
        self
    }
}

/// 请求级解析缓存（显式传递，不跨请求共享）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionCache {
    pub alias_map: Option<AliasMap>,
    /// 分类 → 目标金额
    pub goals: BTreeMap<String, String>,
}

impl ResolutionCache {
    pub fn new() -> Self {
        Self::default()
    }
}

/// 去空白后非空则返回
pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
