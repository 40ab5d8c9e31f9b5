//! 金额换算
//!
//! 人类可读的 ETH 金额（十进制字符串）↔ wei（最小单位整数）

use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::{prelude::ToPrimitive, Decimal};

use crate::error::{Result, SubaccountError};

/// ETH 精度
pub const ETHER_DECIMALS: u32 = 18;

/// 未指定金额时的默认值
pub const DEFAULT_AMOUNT: &str = "1";

const WEI_PER_ETHER: u128 = 1_000_000_000_000_000_000;
const WEI_PER_ETHER_U64: u64 = 1_000_000_000_000_000_000;

static PLAIN_DECIMAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+\.?\d*|\.\d+)$").expect("static regex"));

/// 规范化金额字符串：去空白、空值取默认、逗号小数点转为点
pub fn normalize_amount(raw: Option<&str>) -> String {
    match raw.map(str::trim).filter(|v| !v.is_empty()) {
        Some(value) => value.replace(',', "."),
        None => DEFAULT_AMOUNT.to_string(),
    }
}

/// 将 ETH 金额解析为 wei
///
/// 只接受纯十进制写法（`1`、`0.5`、`.5`、`1.`）；科学计数法、下划线、正负号一律拒绝。
/// 上限为 u128 可表示的 wei。
pub fn parse_ether_to_wei(amount: &str) -> Result<u128> {
    let amount = amount.trim();
    if amount.starts_with('-') {
        return Err(SubaccountError::InvalidAmount(format!(
            "'{}' is negative",
            amount
        )));
    }
    if !PLAIN_DECIMAL.is_match(amount) {
        return Err(SubaccountError::InvalidAmount(format!(
            "'{}' is not a plain decimal number",
            amount
        )));
    }

    let fraction_digits = amount
        .split_once('.')
        .map(|(_, fraction)| fraction.trim_end_matches('0').len())
        .unwrap_or(0);
    if fraction_digits > ETHER_DECIMALS as usize {
        return Err(SubaccountError::InvalidAmount(format!(
            "'{}' has more than {} decimal places",
            amount, ETHER_DECIMALS
        )));
    }

    let too_large = || SubaccountError::InvalidAmount(format!("'{}' is too large", amount));
    let canonical = format!("0{}", amount.trim_end_matches('.'));
    let value = Decimal::from_str(&canonical).map_err(|_| too_large())?;

    // 整数部分与小数部分分别换算，避免 Decimal 乘法溢出
    let whole = value.trunc().to_u128().ok_or_else(too_large)?;
    let fraction = (value.fract() * Decimal::from(WEI_PER_ETHER_U64))
        .trunc()
        .to_u128()
        .ok_or_else(too_large)?;

    whole
        .checked_mul(WEI_PER_ETHER)
        .and_then(|wei| wei.checked_add(fraction))
        .ok_or_else(too_large)
}

/// wei → 0x 十六进制
pub fn wei_to_hex(wei: u128) -> String {
    format!("0x{:x}", wei)
}

/// wei → ETH 字符串（去掉多余的尾随 0）
pub fn format_wei_as_ether(wei: u128) -> String {
    let whole = wei / WEI_PER_ETHER;
    let fraction = wei % WEI_PER_ETHER;
    if fraction == 0 {
        return whole.to_string();
    }
    let fraction = format!("{:018}", fraction);
    format!("{}.{}", whole, fraction.trim_end_matches('0'))
}
