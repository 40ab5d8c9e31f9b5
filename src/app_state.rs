use std::sync::Arc;

use crate::{
    config::Config,
    error::Result,
    service::{
        address_resolver::AddressResolver,
        blockchain_client::{BalanceSource, JsonRpcBalanceClient},
        registry_cache::RegistryCache,
        transaction_builder::TransactionParameterBuilder,
    },
};

/// 应用状态
/// 包含所有共享资源
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// xpub → 注册表（每个 xpub 只构造一次）
    pub registries: Arc<RegistryCache>,
    pub resolver: Arc<AddressResolver>,
    pub tx_builder: Arc<TransactionParameterBuilder>,
    pub balance_source: Arc<dyn BalanceSource>,
}

impl AppState {
    /// 创建新的应用状态，余额查询走配置中的 JSON-RPC 节点
    pub fn new(config: Arc<Config>) -> Result<Self> {
        let balance_source = Arc::new(JsonRpcBalanceClient::new(&config.rpc)?);
        Ok(Self::with_balance_source(config, balance_source))
    }

    /// 使用指定的余额数据源
    pub fn with_balance_source(config: Arc<Config>, balance_source: Arc<dyn BalanceSource>) -> Self {
        let registries = Arc::new(RegistryCache::new());
        let wallet = Arc::new(config.wallet.clone());

        let resolver = Arc::new(AddressResolver::new(wallet.clone(), registries.clone()));
        let tx_builder = Arc::new(TransactionParameterBuilder::new(wallet, registries.clone()));

        Self {
            config,
            registries,
            resolver,
            tx_builder,
            balance_source,
        }
    }
}
