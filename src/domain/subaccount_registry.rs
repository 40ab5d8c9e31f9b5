//! 子账户注册表
//!
//! 一个 xpub 对应一个注册表实例：构造时预派生全部预定义分类，
//! 之后按需为新分类分配索引。注册表是 分类 → 地址 的唯一权威来源。

use std::{
    collections::BTreeMap,
    sync::{Arc, RwLock},
};

use serde::{Deserialize, Serialize};

use crate::{
    domain::{
        category::{normalize_category, CategoryIndexTable, DerivationIndex},
        derivation::{default_strategy, DerivationStrategy, ExtendedPublicKey},
    },
    error::{Result, SubaccountError},
};

/// 子账户（分类, 索引, 地址）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subaccount {
    pub category: String,
    pub index: u32,
    pub address: String,
    /// 是否来自预定义分类表
    pub predefined: bool,
}

pub struct SubaccountRegistry {
    xpub: ExtendedPublicKey,
    table: Arc<CategoryIndexTable>,
    strategy: Arc<dyn DerivationStrategy>,
    // 写锁覆盖 读取-分配-插入 全过程
    catalog: RwLock<BTreeMap<String, Subaccount>>,
}

impl SubaccountRegistry {
    /// 使用默认分类表与 secp256k1 策略构造
    pub fn new(xpub: &str) -> Result<Self> {
        Self::with_strategy(
            xpub,
            Arc::new(CategoryIndexTable::standard().clone()),
            default_strategy(),
        )
    }

    pub fn with_table(xpub: &str, table: Arc<CategoryIndexTable>) -> Result<Self> {
        Self::with_strategy(xpub, table, default_strategy())
    }

    /// 构造注册表
    ///
    /// xpub 无法解析时直接失败；单个预定义分类派生失败只记录告警并跳过。
    pub fn with_strategy(
        xpub: &str,
        table: Arc<CategoryIndexTable>,
        strategy: Arc<dyn DerivationStrategy>,
    ) -> Result<Self> {
        let xpub = ExtendedPublicKey::parse(xpub)?;
        let mut catalog = BTreeMap::new();

        for (category, index) in table.iter() {
            match strategy.derive_address(&xpub, index) {
                Ok(address) => {
                    catalog.insert(
                        category.to_string(),
                        Subaccount {
                            category: category.to_string(),
                            index: index.value(),
                            address,
                            predefined: true,
                        },
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        xpub = %xpub,
                        category = %category,
                        index = index.value(),
                        error = %e,
                        "Error deriving address for predefined category, skipping"
                    );
                }
            }
        }

        tracing::debug!(
            xpub = %xpub,
            derived = catalog.len(),
            predefined = table.len(),
            "Subaccount registry initialized"
        );

        Ok(Self {
            xpub,
            table,
            strategy,
            catalog: RwLock::new(catalog),
        })
    }

    pub fn extended_key(&self) -> &ExtendedPublicKey {
        &self.xpub
    }

    pub fn table(&self) -> &CategoryIndexTable {
        &self.table
    }

    /// 查询已缓存的地址；未知分类返回 None
    pub fn get_subaccount(&self, category: &str) -> Option<String> {
        let normalized = normalize_category(category);
        self.read_catalog()
            .get(&normalized)
            .map(|entry| entry.address.clone())
    }

    /// 查询地址；未知分类返回 CategoryNotRecognized
    pub fn require_subaccount(&self, category: &str) -> Result<String> {
        self.get_subaccount(category)
            .ok_or_else(|| SubaccountError::CategoryNotRecognized(normalize_category(category)))
    }

    /// 全部 分类 → 地址（拷贝）
    pub fn get_all_subaccounts(&self) -> BTreeMap<String, String> {
        self.read_catalog()
            .iter()
            .map(|(category, entry)| (category.clone(), entry.address.clone()))
            .collect()
    }

    /// 全部子账户明细（按分类名排序）
    pub fn list_subaccounts(&self) -> Vec<Subaccount> {
        self.read_catalog().values().cloned().collect()
    }

    /// 已分配的全部索引
    pub fn allocated_indices(&self) -> Vec<u32> {
        let mut indices: Vec<u32> = self.read_catalog().values().map(|s| s.index).collect();
        indices.sort_unstable();
        indices
    }

    /// 创建子账户（幂等）
    ///
    /// 新索引 = 预定义最大索引 + 1 + 已存在的动态分类数量。
    /// 派生失败时不写入目录。
    pub fn create_subaccount(&self, category: &str) -> Result<String> {
        Ok(self.create_subaccount_entry(category)?.address)
    }

    /// 同 `create_subaccount`，返回完整条目
    pub fn create_subaccount_entry(&self, category: &str) -> Result<Subaccount> {
        let normalized = normalize_category(category);
        if normalized.is_empty() {
            return Err(SubaccountError::MissingField("category".into()));
        }

        let mut catalog = self
            .catalog
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(existing) = catalog.get(&normalized) {
            return Ok(existing.clone());
        }

        // 预定义分类在初始化时派生失败的情况：按表内索引重试，不占用动态索引
        let (index, predefined) = match self.table.index_of(&normalized) {
            Some(index) => (index, true),
            None => (self.next_dynamic_index(&catalog)?, false),
        };

        let address = self.strategy.derive_address(&self.xpub, index)?;
        let entry = Subaccount {
            category: normalized.clone(),
            index: index.value(),
            address,
            predefined,
        };
        catalog.insert(normalized, entry.clone());

        tracing::info!(
            xpub = %self.xpub,
            category = %entry.category,
            index = entry.index,
            address = %entry.address,
            "Subaccount created"
        );
        Ok(entry)
    }

    fn next_dynamic_index(&self, catalog: &BTreeMap<String, Subaccount>) -> Result<DerivationIndex> {
        let base = self
            .table
            .max_index()
            .map(|max| u64::from(max.value()) + 1)
            .unwrap_or(0);
        let dynamic_count = catalog
            .keys()
            .filter(|category| !self.table.contains(category))
            .count() as u64;

        let next = base + dynamic_count;
        let next = u32::try_from(next).map_err(|_| {
            SubaccountError::Derivation(format!("index {} does not fit in 32 bits", next))
        })?;
        DerivationIndex::new(next)
    }

    fn read_catalog(&self) -> std::sync::RwLockReadGuard<'_, BTreeMap<String, Subaccount>> {
        self.catalog
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl std::fmt::Debug for SubaccountRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubaccountRegistry")
            .field("xpub", &self.xpub)
            .field("subaccounts", &self.read_catalog().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_XPUB: &str = "xpub661MyMwAqRbcFtXgS5sYJABqqG9YLmC4Q1Rdap9gSE8NqtwybGhePY2gZ29ESFjqJoCu1Rupje8YtGqsefD265TMg7usUDFdp6W1EGMcet8";

    /// 指定索引派生必然失败的策略
    struct FailingAt(u32);

    impl DerivationStrategy for FailingAt {
        fn derive_address(
            &self,
            xpub: &ExtendedPublicKey,
            index: DerivationIndex,
        ) -> Result<String> {
            if index.value() == self.0 {
                return Err(SubaccountError::Derivation("simulated failure".into()));
            }
            crate::domain::derivation::Secp256k1XpubStrategy.derive_address(xpub, index)
        }

        fn validate_address(&self, _address: &str) -> bool {
            true
        }
    }

    fn two_category_table() -> Arc<CategoryIndexTable> {
        Arc::new(CategoryIndexTable::from_entries([("savings", 0), ("travel", 1)]).unwrap())
    }

    #[test]
    fn test_predefined_categories_derived_eagerly() {
        let registry = SubaccountRegistry::new(TEST_XPUB).unwrap();
        let all = registry.get_all_subaccounts();
        assert_eq!(all.len(), CategoryIndexTable::standard().len());
        assert_eq!(
            all.get("savings").map(String::as_str),
            Some("0xAEfbb50942817d8270Bb9bD922aA5ca9cb06cDBf")
        );
    }

    #[test]
    fn test_get_subaccount_normalizes() {
        let registry = SubaccountRegistry::new(TEST_XPUB).unwrap();
        assert_eq!(
            registry.get_subaccount("TRAVEL"),
            Some("0x84f549a5bE894F8faeB744952d2669FB55366798".to_string())
        );
        assert!(registry.get_subaccount("yacht").is_none());
        assert!(matches!(
            registry.require_subaccount("yacht"),
            Err(SubaccountError::CategoryNotRecognized(_))
        ));
    }

    #[test]
    fn test_returned_map_is_a_copy() {
        let registry = SubaccountRegistry::new(TEST_XPUB).unwrap();
        let mut copy = registry.get_all_subaccounts();
        copy.insert("savings".into(), "0xdead".into());
        copy.remove("travel");
        assert_ne!(registry.get_subaccount("savings").as_deref(), Some("0xdead"));
        assert!(registry.get_subaccount("travel").is_some());
    }

    #[test]
    fn test_dynamic_index_allocation() {
        let registry = SubaccountRegistry::with_table(TEST_XPUB, two_category_table()).unwrap();

        let mortgage = registry.create_subaccount_entry("mortgage").unwrap();
        let retirement = registry.create_subaccount_entry("Retirement").unwrap();

        assert_eq!(mortgage.index, 2);
        assert_eq!(retirement.index, 3);
        assert_eq!(retirement.category, "retirement");
        assert_eq!(mortgage.address, "0xd814EEA2DEE461370a165a6C9aE5212fCFA26602");
        assert_eq!(retirement.address, "0xfc418AC7C0c1de47c03180Ee9E2576fdEF60C515");
    }

    #[test]
    fn test_create_is_idempotent() {
        let registry = SubaccountRegistry::with_table(TEST_XPUB, two_category_table()).unwrap();

        let first = registry.create_subaccount("mortgage").unwrap();
        let before = registry.list_subaccounts();
        let second = registry.create_subaccount("  MORTGAGE ").unwrap();

        assert_eq!(first, second);
        assert_eq!(before, registry.list_subaccounts());
        // 已存在的预定义分类直接返回
        assert_eq!(
            registry.create_subaccount("savings").unwrap(),
            registry.get_subaccount("savings").unwrap()
        );
    }

    #[test]
    fn test_partial_failure_on_init() {
        let registry = SubaccountRegistry::with_strategy(
            TEST_XPUB,
            two_category_table(),
            Arc::new(FailingAt(1)),
        )
        .unwrap();

        assert!(registry.get_subaccount("savings").is_some());
        assert!(registry.get_subaccount("travel").is_none());

        // 失败的预定义分类不会占用动态索引
        let entry = registry.create_subaccount_entry("mortgage").unwrap();
        assert_eq!(entry.index, 2);
    }

    #[test]
    fn test_failed_creation_is_not_recorded() {
        let registry = SubaccountRegistry::with_strategy(
            TEST_XPUB,
            two_category_table(),
            Arc::new(FailingAt(2)),
        )
        .unwrap();

        assert!(matches!(
            registry.create_subaccount("mortgage"),
            Err(SubaccountError::Derivation(_))
        ));
        assert!(registry.get_subaccount("mortgage").is_none());
    }

    #[test]
    fn test_invalid_xpub_fails_construction() {
        assert!(matches!(
            SubaccountRegistry::new("not-an-xpub"),
            Err(SubaccountError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_empty_category_rejected() {
        let registry = SubaccountRegistry::new(TEST_XPUB).unwrap();
        assert!(matches!(
            registry.create_subaccount("   "),
            Err(SubaccountError::MissingField(_))
        ));
    }
}
