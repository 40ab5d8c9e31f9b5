//! 未签名交易参数构建器
//!
//! 校验并补全上游提取的原始参数：
//! - toAddress 必填
//! - fromAddress 依次取 分类派生地址 / 原始参数 / 配置默认地址
//! - 金额（十进制 ETH）换算为 0x 十六进制 wei
//!
//! 只产出参数，不签名、不广播。

use std::sync::Arc;

use crate::{
    config::WalletConfig,
    domain::{
        request_context::{non_blank, ExtractedFields, RequestContext},
        transaction::TransactionParameters,
    },
    error::{Result, SubaccountError},
    service::registry_cache::RegistryCache,
    utils::{
        address_validator::AddressValidator,
        amount::{normalize_amount, parse_ether_to_wei, wei_to_hex},
    },
};

pub struct TransactionParameterBuilder {
    config: Arc<WalletConfig>,
    registries: Arc<RegistryCache>,
}

impl TransactionParameterBuilder {
    pub fn new(config: Arc<WalletConfig>, registries: Arc<RegistryCache>) -> Self {
        Self { config, registries }
    }

    /// 构建交易参数；任何一步失败都不产出结果
    pub fn build(&self, raw: &ExtractedFields, ctx: &RequestContext) -> Result<TransactionParameters> {
        let to = non_blank(raw.to_address.as_deref())
            .ok_or_else(|| SubaccountError::MissingField("toAddress".into()))?
            .to_string();
        if !AddressValidator::is_valid_evm_address(&to) {
            tracing::warn!(to = %to, "Recipient is not a well-formed EVM address");
        }

        let from = self.resolve_from_address(raw, ctx)?;
        let data = Self::validate_calldata(raw.data.as_deref())?;

        let amount = normalize_amount(raw.amount.as_deref());
        let wei = parse_ether_to_wei(&amount)?;
        let value = wei_to_hex(wei);

        tracing::debug!(
            from = %from,
            to = %to,
            amount = %amount,
            value = %value,
            has_data = data.is_some(),
            "Built unsigned transaction parameters"
        );

        Ok(TransactionParameters {
            from,
            to,
            value,
            data,
        })
    }

    fn resolve_from_address(&self, raw: &ExtractedFields, ctx: &RequestContext) -> Result<String> {
        if let Some(category) = non_blank(ctx.category.as_deref()) {
            match self.derive_for_category(category) {
                Ok(address) => {
                    tracing::debug!(category = %category, address = %address, "Using category subaccount as sender");
                    return Ok(address);
                }
                Err(e) => {
                    tracing::warn!(
                        category = %category,
                        error = %e,
                        "Category derivation failed, falling back to default address"
                    );
                    return self.default_from_address();
                }
            }
        }

        if let Some(from) = non_blank(raw.from_address.as_deref()) {
            if AddressValidator::has_prefix(from) {
                return Ok(from.to_string());
            }
            tracing::warn!(from = %from, "Ignoring malformed fromAddress");
        }

        self.default_from_address()
    }

    fn derive_for_category(&self, category: &str) -> Result<String> {
        let xpub = self
            .config
            .xpub()
            .ok_or_else(|| SubaccountError::InvalidKey("EVM_PUBLIC_XPUB is not configured".into()))?;
        self.registries.get_or_init(xpub)?.require_subaccount(category)
    }

    fn default_from_address(&self) -> Result<String> {
        self.config
            .valid_default_address()
            .map(str::to_string)
            .ok_or_else(|| {
                SubaccountError::UnresolvedAddress(
                    "no sender address: set EVM_PUBLIC_ADDRESS or select a subaccount".into(),
                )
            })
    }

    /// data 必须是 0x 开头的偶数长度十六进制
    fn validate_calldata(data: Option<&str>) -> Result<Option<String>> {
        let Some(data) = non_blank(data) else {
            return Ok(None);
        };
        let payload = data
            .strip_prefix("0x")
            .ok_or_else(|| SubaccountError::InvalidCalldata(format!("'{}' is missing the 0x prefix", data)))?;
        hex::decode(payload)
            .map_err(|e| SubaccountError::InvalidCalldata(format!("'{}': {}", data, e)))?;
        Ok(Some(data.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_XPUB: &str = "xpub661MyMwAqRbcFtXgS5sYJABqqG9YLmC4Q1Rdap9gSE8NqtwybGhePY2gZ29ESFjqJoCu1Rupje8YtGqsefD265TMg7usUDFdp6W1EGMcet8";
    const DEFAULT: &str = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";
    const RECIPIENT: &str = "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359";

    fn builder(xpub: Option<&str>, default: Option<&str>) -> TransactionParameterBuilder {
        TransactionParameterBuilder::new(
            Arc::new(WalletConfig::new(xpub, default)),
            Arc::new(RegistryCache::new()),
        )
    }

    fn raw(to: &str, amount: Option<&str>) -> ExtractedFields {
        ExtractedFields {
            to_address: Some(to.into()),
            amount: amount.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_missing_recipient() {
        let b = builder(None, Some(DEFAULT));
        for to in [None, Some(""), Some("   ")] {
            let fields = ExtractedFields {
                to_address: to.map(str::to_string),
                ..Default::default()
            };
            assert_eq!(
                b.build(&fields, &RequestContext::new()).unwrap_err(),
                SubaccountError::MissingField("toAddress".into())
            );
        }
    }

    #[test]
    fn test_comma_amount_and_default_sender() {
        let b = builder(None, Some(DEFAULT));
        let params = b
            .build(&raw(RECIPIENT, Some("0,0001")), &RequestContext::new())
            .unwrap();
        assert_eq!(params.from, DEFAULT);
        assert_eq!(params.to, RECIPIENT);
        assert_eq!(params.value, "0x5af3107a4000");
        assert!(params.data.is_none());
    }

    #[test]
    fn test_default_amount_is_one_ether() {
        let b = builder(None, Some(DEFAULT));
        let params = b.build(&raw(RECIPIENT, None), &RequestContext::new()).unwrap();
        assert_eq!(params.value, "0xde0b6b3a7640000");
    }

    #[test]
    fn test_invalid_amounts() {
        let b = builder(None, Some(DEFAULT));
        for amount in ["abc", "-1", "1.2.3"] {
            assert!(matches!(
                b.build(&raw(RECIPIENT, Some(amount)), &RequestContext::new()),
                Err(SubaccountError::InvalidAmount(_))
            ));
        }
    }

    #[test]
    fn test_category_sender_wins() {
        let b = builder(Some(TEST_XPUB), Some(DEFAULT));
        let mut fields = raw(RECIPIENT, Some("1.5"));
        fields.from_address = Some(DEFAULT.into());
        let ctx = RequestContext::new().with_category("Travel");
        let params = b.build(&fields, &ctx).unwrap();
        assert_eq!(params.from, "0x84f549a5bE894F8faeB744952d2669FB55366798");
        assert_eq!(params.value, "0x14d1120d7b160000");
    }

    #[test]
    fn test_unknown_category_falls_back_to_default() {
        let b = builder(Some(TEST_XPUB), Some(DEFAULT));
        let ctx = RequestContext::new().with_category("yacht");
        let params = b.build(&raw(RECIPIENT, None), &ctx).unwrap();
        assert_eq!(params.from, DEFAULT);
    }

    #[test]
    fn test_raw_sender_used_when_well_formed() {
        let b = builder(None, Some(DEFAULT));
        let mut fields = raw(RECIPIENT, None);
        fields.from_address = Some(format!(" {} ", RECIPIENT));
        assert_eq!(b.build(&fields, &RequestContext::new()).unwrap().from, RECIPIENT);

        fields.from_address = Some("my wallet".into());
        assert_eq!(b.build(&fields, &RequestContext::new()).unwrap().from, DEFAULT);
    }

    #[test]
    fn test_no_sender_is_an_error() {
        let b = builder(None, None);
        assert!(matches!(
            b.build(&raw(RECIPIENT, None), &RequestContext::new()),
            Err(SubaccountError::UnresolvedAddress(_))
        ));
    }

    #[test]
    fn test_calldata_validation() {
        let b = builder(None, Some(DEFAULT));
        let mut fields = raw(RECIPIENT, Some("0"));
        fields.data = Some("0xa9059cbb".into());
        let params = b.build(&fields, &RequestContext::new()).unwrap();
        assert_eq!(params.data.as_deref(), Some("0xa9059cbb"));
        assert_eq!(params.value, "0x0");

        for bad in ["a9059cbb", "0xzz", "0xabc"] {
            fields.data = Some(bad.into());
            assert!(matches!(
                b.build(&fields, &RequestContext::new()),
                Err(SubaccountError::InvalidCalldata(_))
            ));
        }
    }
}
