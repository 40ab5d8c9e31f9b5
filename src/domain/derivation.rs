//! 地址派生策略
//!
//! 仅支持从扩展公钥（xpub 或 tpub）做单层、非硬化的子密钥派生。
//! 后端不持有任何私钥材料，硬化路径不可达。

use std::{fmt, str::FromStr, sync::Arc};

use coins_bip32::{
    enc::{MainnetEncoder, TestnetEncoder, XKeyEncoder},
    xkeys::{Parent, XPub},
};
use k256::ecdsa::VerifyingKey;
use sha3::{Digest, Keccak256};

use crate::{
    domain::category::{normalize_category, CategoryIndexTable, DerivationIndex},
    error::{Result, SubaccountError},
    utils::address_validator::{to_checksum_address, AddressValidator},
};

/// BIP32 序列化长度（不含 4 字节校验和）
const SERIALIZED_XKEY_LEN: usize = 78;

const XPUB_VERSION: u32 = 0x0488_B21E;
const TPUB_VERSION: u32 = 0x0435_87CF;
const XPRV_VERSION: u32 = 0x0488_ADE4;
const TPRV_VERSION: u32 = 0x0435_8394;

/// 扩展公钥
///
/// 原始字符串只用于缓存键；日志与 Debug 输出一律脱敏。
#[derive(Clone)]
pub struct ExtendedPublicKey {
    raw: String,
    xpub: XPub,
}

impl ExtendedPublicKey {
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(SubaccountError::InvalidKey("extended key is empty".into()));
        }
        let payload = bs58::decode(trimmed)
            .with_check(None)
            .into_vec()
            .map_err(|e| SubaccountError::InvalidKey(format!("not a base58check string: {}", e)))?;
        if payload.len() != SERIALIZED_XKEY_LEN {
            return Err(SubaccountError::InvalidKey(format!(
                "expected {} serialized bytes, got {}",
                SERIALIZED_XKEY_LEN,
                payload.len()
            )));
        }

        // 版本字节决定网络；派生结果与网络无关
        let version = u32::from_be_bytes([payload[0], payload[1], payload[2], payload[3]]);
        let xpub = match version {
            XPUB_VERSION => MainnetEncoder::read_xpub(&mut &payload[..]),
            TPUB_VERSION => TestnetEncoder::read_xpub(&mut &payload[..]),
            XPRV_VERSION | TPRV_VERSION => {
                return Err(SubaccountError::InvalidKey(
                    "private extended keys are not accepted, provide the xpub/tpub".into(),
                ))
            }
            other => {
                return Err(SubaccountError::InvalidKey(format!(
                    "unsupported version bytes 0x{:08x}, expected xpub or tpub",
                    other
                )))
            }
        }
        .map_err(|e| SubaccountError::InvalidKey(e.to_string()))?;

        Ok(Self {
            raw: trimmed.to_string(),
            xpub,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// 脱敏形式，例如 `xpub661My…cet8`
    pub fn redacted(&self) -> String {
        redact_xpub(&self.raw)
    }
}

impl FromStr for ExtendedPublicKey {
    type Err = SubaccountError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl PartialEq for ExtendedPublicKey {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for ExtendedPublicKey {}

impl fmt::Debug for ExtendedPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ExtendedPublicKey")
            .field(&self.redacted())
            .finish()
    }
}

impl fmt::Display for ExtendedPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.redacted())
    }
}

/// xpub 脱敏：保留前 9 位与后 4 位
pub fn redact_xpub(raw: &str) -> String {
    let chars: Vec<char> = raw.trim().chars().collect();
    if chars.len() <= 13 {
        return "***".to_string();
    }
    let head: String = chars[..9].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}…{}", head, tail)
}

/// 地址派生策略 trait
pub trait DerivationStrategy: Send + Sync {
    /// 派生 `xpub/index` 的地址
    fn derive_address(&self, xpub: &ExtendedPublicKey, index: DerivationIndex) -> Result<String>;

    /// 验证地址格式
    fn validate_address(&self, address: &str) -> bool;
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Secp256k1 策略 (ETH 及 EVM 兼容链)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy, Default)]
pub struct Secp256k1XpubStrategy;

impl DerivationStrategy for Secp256k1XpubStrategy {
    fn derive_address(&self, xpub: &ExtendedPublicKey, index: DerivationIndex) -> Result<String> {
        // DerivationIndex 已保证非硬化范围
        let child = xpub
            .xpub
            .derive_child(index.value())
            .map_err(|e| SubaccountError::Derivation(format!("child {}: {}", index, e)))?;

        let verifying_key: &VerifyingKey = child.as_ref();
        let public_key_bytes = verifying_key.to_encoded_point(false); // 未压缩格式
        let public_key_slice = &public_key_bytes.as_bytes()[1..]; // 去掉 0x04 前缀

        // Keccak256 哈希，取后 20 字节
        let hash = Keccak256::digest(public_key_slice);
        let address = to_checksum_address(&hex::encode(&hash[12..]));

        tracing::debug!(xpub = %xpub, index = index.value(), address = %address, "Derived child address");
        Ok(address)
    }

    fn validate_address(&self, address: &str) -> bool {
        AddressValidator::is_valid_evm_address(address)
    }
}

/// 默认派生策略
pub fn default_strategy() -> Arc<dyn DerivationStrategy> {
    Arc::new(Secp256k1XpubStrategy)
}

/// 解析 xpub 并派生 index 处的地址
pub fn derive_address(xpub: &str, index: DerivationIndex) -> Result<String> {
    let key = ExtendedPublicKey::parse(xpub)?;
    Secp256k1XpubStrategy.derive_address(&key, index)
}

/// 按预定义分类派生地址；未知分类返回 CategoryNotRecognized
pub fn derive_address_for_category(
    xpub: &str,
    category: &str,
    table: &CategoryIndexTable,
) -> Result<String> {
    let normalized = normalize_category(category);
    let index = table
        .index_of(&normalized)
        .ok_or_else(|| SubaccountError::CategoryNotRecognized(category.trim().to_string()))?;
    derive_address(xpub, index)
}
