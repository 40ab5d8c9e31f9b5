//! 分类索引表
//!
//! 预定义分类名 → 派生索引 的静态映射。
//! 查询不做大小写标准化，调用方需先调用 `normalize_category`。

use std::{collections::BTreeMap, fmt};

use once_cell::sync::Lazy;

use crate::error::{Result, SubaccountError};

/// 非硬化派生索引上限（含）
pub const MAX_NON_HARDENED_INDEX: u32 = 0x7FFF_FFFF;

/// 默认预定义分类
const STANDARD_CATEGORIES: &[(&str, u32)] = &[
    ("savings", 0),
    ("travel", 1),
    ("mortgage", 2),
    ("emergency", 3),
    ("education", 4),
];

static STANDARD_TABLE: Lazy<CategoryIndexTable> = Lazy::new(|| CategoryIndexTable {
    entries: STANDARD_CATEGORIES
        .iter()
        .map(|(name, index)| (name.to_string(), DerivationIndex(*index)))
        .collect(),
});

/// 派生索引（仅非硬化范围 0..2^31）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DerivationIndex(u32);

impl DerivationIndex {
    pub fn new(index: u32) -> Result<Self> {
        if index > MAX_NON_HARDENED_INDEX {
            return Err(SubaccountError::Derivation(format!(
                "index {} is outside the non-hardened range 0..={}",
                index, MAX_NON_HARDENED_INDEX
            )));
        }
        Ok(Self(index))
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

impl TryFrom<i64> for DerivationIndex {
    type Error = SubaccountError;

    fn try_from(index: i64) -> Result<Self> {
        if index < 0 {
            return Err(SubaccountError::Derivation(format!(
                "negative index {} is not allowed",
                index
            )));
        }
        let index = u32::try_from(index).map_err(|_| {
            SubaccountError::Derivation(format!("index {} does not fit in 32 bits", index))
        })?;
        Self::new(index)
    }
}

impl fmt::Display for DerivationIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 分类名标准化：去空白 + 小写
pub fn normalize_category(category: &str) -> String {
    category.trim().to_lowercase()
}

/// 分类索引表
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryIndexTable {
    entries: BTreeMap<String, DerivationIndex>,
}

impl CategoryIndexTable {
    /// 默认分类表（进程内共享）
    pub fn standard() -> &'static CategoryIndexTable {
        &STANDARD_TABLE
    }

    /// 从自定义条目构建，校验名称与索引的唯一性
    pub fn from_entries<I, S>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, u32)>,
        S: Into<String>,
    {
        let mut table = BTreeMap::new();
        let mut seen = std::collections::HashSet::new();

        for (name, index) in entries {
            let name = normalize_category(&name.into());
            if name.is_empty() {
                return Err(SubaccountError::MissingField("category".into()));
            }
            let index = DerivationIndex::new(index)?;
            if !seen.insert(index) {
                return Err(SubaccountError::Derivation(format!(
                    "index {} assigned to more than one category",
                    index
                )));
            }
            if table.insert(name.clone(), index).is_some() {
                return Err(SubaccountError::Derivation(format!(
                    "category '{}' listed twice",
                    name
                )));
            }
        }

        Ok(Self { entries: table })
    }

    /// 查询分类索引；未知分类返回 None
    pub fn index_of(&self, category: &str) -> Option<DerivationIndex> {
        self.entries.get(category).copied()
    }

    pub fn contains(&self, category: &str) -> bool {
        self.entries.contains_key(category)
    }

    /// 预定义索引最大值（空表为 None）
    pub fn max_index(&self) -> Option<DerivationIndex> {
        self.entries.values().copied().max()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, DerivationIndex)> {
        self.entries.iter().map(|(name, index)| (name.as_str(), *index))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for CategoryIndexTable {
    fn default() -> Self {
        Self::standard().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_table_indices_are_unique() {
        let table = CategoryIndexTable::standard();
        let mut indices: Vec<u32> = table.iter().map(|(_, i)| i.value()).collect();
        indices.sort_unstable();
        indices.dedup();
        assert_eq!(indices.len(), table.len());
        assert_eq!(table.index_of("savings").map(|i| i.value()), Some(0));
    }

    #[test]
    fn test_lookup_does_not_normalize() {
        let table = CategoryIndexTable::standard();
        assert!(table.index_of("Savings").is_none());
        assert!(table.index_of(&normalize_category("  Savings ")).is_some());
    }

    #[test]
    fn test_from_entries_rejects_duplicate_index() {
        let result = CategoryIndexTable::from_entries([("savings", 0), ("travel", 0)]);
        assert!(matches!(result, Err(SubaccountError::Derivation(_))));
    }

    #[test]
    fn test_derivation_index_range() {
        assert!(DerivationIndex::new(MAX_NON_HARDENED_INDEX).is_ok());
        assert!(DerivationIndex::new(MAX_NON_HARDENED_INDEX + 1).is_err());
        assert!(DerivationIndex::try_from(-1i64).is_err());
        assert_eq!(DerivationIndex::try_from(7i64).unwrap().value(), 7);
    }

    #[test]
    fn test_max_index() {
        let table = CategoryIndexTable::from_entries([("savings", 0), ("travel", 1)]).unwrap();
        assert_eq!(table.max_index().map(|i| i.value()), Some(1));

        let empty = CategoryIndexTable::from_entries(Vec::<(String, u32)>::new()).unwrap();
        assert!(empty.max_index().is_none());
    }
}
