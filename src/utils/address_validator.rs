//! 地址验证模块
//!
//! 统一的 EVM 地址规范化、格式校验与 EIP-55 校验和

use sha3::{Digest, Keccak256};

/// 链地址前缀
pub const ADDRESS_PREFIX: &str = "0x";

/// 地址验证器
pub struct AddressValidator;

impl AddressValidator {
    /// 是否带链地址前缀（仅用于宽松的回退判断）
    pub fn has_prefix(address: &str) -> bool {
        address.trim().starts_with(ADDRESS_PREFIX)
    }

    /// 验证EVM地址（支持EIP-55 Checksum）
    pub fn is_valid_evm_address(address: &str) -> bool {
        let address = address.trim();

        // 1. 基本格式检查
        if !address.starts_with(ADDRESS_PREFIX) || address.len() != 42 {
            return false;
        }

        // 2. 验证hex字符
        let hex_part = &address[2..];
        if !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
            return false;
        }

        // 3. 混合大小写时校验 EIP-55；全小写/全大写放行
        let has_upper = hex_part.chars().any(|c| c.is_ascii_uppercase());
        let has_lower = hex_part.chars().any(|c| c.is_ascii_lowercase());
        if has_upper && has_lower {
            return to_checksum_address(hex_part) == address;
        }

        true
    }

    /// 地址规范化：去空白
    pub fn normalize(address: &str) -> String {
        address.trim().to_string()
    }
}

/// EIP-55 校验和编码
/// https://eips.ethereum.org/EIPS/eip-55
///
/// 输入为 40 位十六进制（可带 0x），输出带 0x 前缀
pub fn to_checksum_address(address: &str) -> String {
    let addr_lower = address
        .trim()
        .trim_start_matches(ADDRESS_PREFIX)
        .to_lowercase();
    let hash = Keccak256::digest(addr_lower.as_bytes());

    let mut checksummed = String::with_capacity(42);
    checksummed.push_str(ADDRESS_PREFIX);
    for (i, ch) in addr_lower.chars().enumerate() {
        if ch.is_ascii_alphabetic() {
            let hash_byte = hash[i / 2];
            let hash_nibble = if i % 2 == 0 {
                hash_byte >> 4
            } else {
                hash_byte & 0x0f
            };
            if hash_nibble >= 8 {
                checksummed.push(ch.to_ascii_uppercase());
                continue;
            }
        }
        checksummed.push(ch);
    }
    checksummed
}
