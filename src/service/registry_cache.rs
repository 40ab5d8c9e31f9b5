//! 注册表缓存
//!
//! xpub → 注册表 的显式键控缓存。每个 xpub 只构造一次：
//! 并发的首次请求在同一个 OnceCell 上等待，观察到同一个实例。

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use once_cell::sync::OnceCell;

use crate::{
    domain::{
        category::CategoryIndexTable,
        derivation::{default_strategy, redact_xpub, DerivationStrategy},
        subaccount_registry::SubaccountRegistry,
    },
    error::{Result, SubaccountError},
};

type Slot = Arc<OnceCell<Arc<SubaccountRegistry>>>;

pub struct RegistryCache {
    table: Arc<CategoryIndexTable>,
    strategy: Arc<dyn DerivationStrategy>,
    slots: Mutex<HashMap<String, Slot>>,
}

impl RegistryCache {
    pub fn new() -> Self {
        Self::with_table(Arc::new(CategoryIndexTable::standard().clone()))
    }

    pub fn with_table(table: Arc<CategoryIndexTable>) -> Self {
        Self::with_strategy(table, default_strategy())
    }

    pub fn with_strategy(
        table: Arc<CategoryIndexTable>,
        strategy: Arc<dyn DerivationStrategy>,
    ) -> Self {
        Self {
            table,
            strategy,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// 获取或构造 xpub 对应的注册表
    ///
    /// 构造失败（xpub 非法）不会写入缓存，下次调用会重试。
    pub fn get_or_init(&self, xpub: &str) -> Result<Arc<SubaccountRegistry>> {
        let key = xpub.trim();
        if key.is_empty() {
            return Err(SubaccountError::InvalidKey("extended key is empty".into()));
        }

        // 只在取槽位时持有 map 锁，派生在锁外进行
        let slot = {
            let mut slots = self
                .slots
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            slots.entry(key.to_string()).or_default().clone()
        };

        slot.get_or_try_init(|| {
            tracing::debug!(xpub = %redact_xpub(key), "Constructing subaccount registry");
            SubaccountRegistry::with_strategy(key, self.table.clone(), self.strategy.clone())
                .map(Arc::new)
        })
        .cloned()
    }

    /// 已构造的注册表（不触发构造）
    pub fn get(&self, xpub: &str) -> Option<Arc<SubaccountRegistry>> {
        let slots = self
            .slots
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        slots.get(xpub.trim()).and_then(|slot| slot.get().cloned())
    }

    /// 已构造的注册表数量
    pub fn len(&self) -> usize {
        let slots = self
            .slots
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        slots.values().filter(|slot| slot.get().is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for RegistryCache {
    fn default() -> Self {
        Self::new()
    }
}
