//! 测试辅助模块
//! 提供测试常量、配置与桩余额数据源

#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use subvault::{
    app_state::AppState,
    config::{Config, LoggingConfig, RpcConfig, WalletConfig},
    error::{Result, SubaccountError},
    service::{BalanceSnapshot, BalanceSource, TransferRecord, WalletActions},
};

/// BIP32 测试向量 1 的主扩展公钥
pub const TEST_XPUB: &str = "xpub661MyMwAqRbcFtXgS5sYJABqqG9YLmC4Q1Rdap9gSE8NqtwybGhePY2gZ29ESFjqJoCu1Rupje8YtGqsefD265TMg7usUDFdp6W1EGMcet8";

/// TEST_XPUB 的子地址 0..=5（EIP-55）
pub const GOLDEN_ADDRESSES: [&str; 6] = [
    "0xAEfbb50942817d8270Bb9bD922aA5ca9cb06cDBf",
    "0x84f549a5bE894F8faeB744952d2669FB55366798",
    "0xd814EEA2DEE461370a165a6C9aE5212fCFA26602",
    "0xfc418AC7C0c1de47c03180Ee9E2576fdEF60C515",
    "0x701FCe4c7A6Af8865F0a8109c40C8c751df30e50",
    "0x8601E7EF2c7CB734297AE78D4a92EB61fe61C6C2",
];

pub const DEFAULT_ADDRESS: &str = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";
pub const RECIPIENT: &str = "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359";

/// 不依赖环境变量的测试配置
pub fn test_config(xpub: Option<&str>, default_address: Option<&str>) -> Config {
    Config {
        wallet: WalletConfig::new(xpub, default_address),
        rpc: RpcConfig {
            url: "http://127.0.0.1:1".into(),
            timeout_secs: 1,
        },
        logging: LoggingConfig {
            level: "debug".into(),
            format: "text".into(),
        },
    }
}

/// 内存余额数据源：未登记的地址返回 RPC 错误
#[derive(Default)]
pub struct StubBalanceSource {
    balances: Mutex<HashMap<String, (u128, Vec<TransferRecord>)>>,
}

impl StubBalanceSource {
    pub fn with_balance(
        self,
        address: &str,
        balance_wei: u128,
        transfers: Vec<TransferRecord>,
    ) -> Self {
        self.balances
            .lock()
            .unwrap()
            .insert(address.to_lowercase(), (balance_wei, transfers));
        self
    }
}

#[async_trait]
impl BalanceSource for StubBalanceSource {
    async fn fetch(&self, address: &str) -> Result<BalanceSnapshot> {
        let (balance_wei, transfers) = self
            .balances
            .lock()
            .unwrap()
            .get(&address.to_lowercase())
            .cloned()
            .ok_or_else(|| SubaccountError::Rpc(format!("unknown address {}", address)))?;
        Ok(BalanceSnapshot {
            address: address.to_string(),
            balance_wei,
            transfers,
        })
    }
}

/// 创建测试动作入口
pub fn create_test_actions(
    xpub: Option<&str>,
    default_address: Option<&str>,
    source: StubBalanceSource,
) -> WalletActions {
    let state = AppState::with_balance_source(
        Arc::new(test_config(xpub, default_address)),
        Arc::new(source),
    );
    WalletActions::new(Arc::new(state))
}
