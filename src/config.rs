//! 配置管理模块
//! 支持从环境变量和配置文件加载配置

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::{domain::derivation::ExtendedPublicKey, utils::address_validator::AddressValidator};

/// 应用配置结构体
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub wallet: WalletConfig,
    #[serde(default)]
    pub rpc: RpcConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// 钱包配置（只读）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletConfig {
    /// 扩展公钥 (EVM_PUBLIC_XPUB)
    #[serde(default)]
    pub extended_public_key: Option<String>,
    /// 默认地址 (EVM_PUBLIC_ADDRESS)
    #[serde(default)]
    pub default_address: Option<String>,
}

/// 余额查询RPC配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcConfig {
    pub url: String,
    pub timeout_secs: u64,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String, // "json" or "text"
}

impl WalletConfig {
    pub fn new(extended_public_key: Option<&str>, default_address: Option<&str>) -> Self {
        Self {
            extended_public_key: extended_public_key.map(str::to_string),
            default_address: default_address.map(str::to_string),
        }
    }

    /// 已配置且非空的 xpub
    pub fn xpub(&self) -> Option<&str> {
        self.extended_public_key
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }

    /// 默认地址：仅当带链地址前缀时返回（已去空白）
    pub fn valid_default_address(&self) -> Option<&str> {
        self.default_address
            .as_deref()
            .map(str::trim)
            .filter(|v| AddressValidator::has_prefix(v))
    }
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            extended_public_key: std::env::var("EVM_PUBLIC_XPUB").ok(),
            default_address: std::env::var("EVM_PUBLIC_ADDRESS").ok(),
        }
    }
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            url: std::env::var("EVM_RPC_URL")
                .unwrap_or_else(|_| "https://ethereum-sepolia-rpc.publicnode.com".into()),
            timeout_secs: std::env::var("RPC_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            format: std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".into()),
        }
    }
}

impl Config {
    /// 从环境变量加载配置
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            wallet: WalletConfig::default(),
            rpc: RpcConfig::default(),
            logging: LoggingConfig::default(),
        })
    }

    /// 从配置文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        let config: Config =
            toml::from_str(&content).with_context(|| "Failed to parse config file as TOML")?;

        Ok(config)
    }

    /// 从环境变量和配置文件合并加载（配置文件优先级更高）
    pub fn from_env_and_file<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        let mut config = Self::from_env()?;

        if let Some(path) = path {
            if path.as_ref().exists() {
                config = Self::from_file(path)?;
            }
        }

        Ok(config)
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<()> {
        if let Some(xpub) = self.wallet.xpub() {
            ExtendedPublicKey::parse(xpub).context("EVM_PUBLIC_XPUB is not a valid extended public key")?;
        }

        if let Some(address) = self.wallet.default_address.as_deref() {
            if !AddressValidator::is_valid_evm_address(address) {
                anyhow::bail!("EVM_PUBLIC_ADDRESS must be a 0x-prefixed 20-byte hex address");
            }
        }

        if !self.rpc.url.starts_with("http://") && !self.rpc.url.starts_with("https://") {
            anyhow::bail!("EVM_RPC_URL must start with http:// or https://");
        }

        // 验证日志级别
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            anyhow::bail!("LOG_LEVEL must be one of: {:?}", valid_levels);
        }

        // 验证日志格式
        if self.logging.format != "json" && self.logging.format != "text" {
            anyhow::bail!("LOG_FORMAT must be 'json' or 'text'");
        }

        Ok(())
    }
}
