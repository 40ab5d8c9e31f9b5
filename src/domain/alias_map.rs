//! 别名映射
//!
//! 分类/别名 → 地址 的只读视图，按请求构建，权威来源始终是注册表。

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{domain::category::normalize_category, utils::address_validator::AddressValidator};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AliasMap {
    entries: BTreeMap<String, String>,
}

impl AliasMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// 插入条目：键标准化为小写，地址去空白
    pub fn insert(&mut self, alias: &str, address: &str) {
        self.entries
            .insert(normalize_category(alias), address.trim().to_string());
    }

    pub fn get(&self, alias: &str) -> Option<&str> {
        self.entries
            .get(&normalize_category(alias))
            .map(String::as_str)
    }

    /// 按地址反查别名（大小写不敏感）
    pub fn alias_for(&self, address: &str) -> Option<&str> {
        let needle = address.trim();
        self.entries
            .iter()
            .find(|(_, candidate)| candidate.eq_ignore_ascii_case(needle))
            .map(|(alias, _)| alias.as_str())
    }

    /// 非空且每个地址都是 0x 前缀
    pub fn is_well_formed(&self) -> bool {
        !self.entries.is_empty()
            && self
                .entries
                .iter()
                .all(|(alias, address)| !alias.is_empty() && AddressValidator::has_prefix(address))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(alias, address)| (alias.as_str(), address.as_str()))
    }

    pub fn into_inner(self) -> BTreeMap<String, String> {
        self.entries
    }
}

impl<K, V> FromIterator<(K, V)> for AliasMap
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = AliasMap::new();
        for (alias, address) in iter {
            map.insert(alias.as_ref(), address.as_ref());
        }
        map
    }
}

impl From<BTreeMap<String, String>> for AliasMap {
    fn from(entries: BTreeMap<String, String>) -> Self {
        entries.into_iter().collect()
    }
}
