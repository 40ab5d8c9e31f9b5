//! 未签名交易参数构建集成测试

mod common;

use std::sync::Arc;

use common::{DEFAULT_ADDRESS, GOLDEN_ADDRESSES, RECIPIENT, TEST_XPUB};
use subvault::{
    config::WalletConfig,
    domain::{ExtractedFields, RequestContext},
    error::SubaccountError,
    service::{RegistryCache, TransactionParameterBuilder},
};

fn builder(xpub: Option<&str>, default: Option<&str>) -> TransactionParameterBuilder {
    TransactionParameterBuilder::new(
        Arc::new(WalletConfig::new(xpub, default)),
        Arc::new(RegistryCache::new()),
    )
}

fn fields(to: Option<&str>, amount: Option<&str>) -> ExtractedFields {
    ExtractedFields {
        to_address: to.map(str::to_string),
        amount: amount.map(str::to_string),
        ..Default::default()
    }
}

#[test]
fn test_comma_amount_converted_to_hex_wei() {
    let b = builder(None, Some(DEFAULT_ADDRESS));
    let params = b
        .build(&fields(Some(RECIPIENT), Some("0,0001")), &RequestContext::new())
        .unwrap();
    assert_eq!(params.value, "0x5af3107a4000");
}

#[test]
fn test_empty_recipient_never_gets_placeholder() {
    let b = builder(Some(TEST_XPUB), Some(DEFAULT_ADDRESS));
    let err = b
        .build(&fields(Some(""), Some("1")), &RequestContext::new())
        .unwrap_err();
    assert_eq!(err, SubaccountError::MissingField("toAddress".into()));
    assert_eq!(err.code().as_str(), "missing_field");
}

#[test]
fn test_output_shape() {
    let b = builder(Some(TEST_XPUB), Some(DEFAULT_ADDRESS));
    let ctx = RequestContext::new().with_category("savings");
    let params = b
        .build(&fields(Some(&format!("  {}  ", RECIPIENT)), Some("1")), &ctx)
        .unwrap();

    let json = params.to_json();
    let object = json.as_object().unwrap();
    assert_eq!(object.len(), 3);
    assert_eq!(object["from"], GOLDEN_ADDRESSES[0]);
    assert_eq!(object["to"], RECIPIENT);
    assert_eq!(object["value"], "0xde0b6b3a7640000");
}

#[test]
fn test_dynamic_category_as_sender() {
    let registries = Arc::new(RegistryCache::new());
    let registry = registries.get_or_init(TEST_XPUB).unwrap();
    registry.create_subaccount("yacht").unwrap();

    let b = TransactionParameterBuilder::new(
        Arc::new(WalletConfig::new(Some(TEST_XPUB), Some(DEFAULT_ADDRESS))),
        registries,
    );
    let ctx = RequestContext::new().with_category("yacht");
    let params = b.build(&fields(Some(RECIPIENT), None), &ctx).unwrap();
    assert_eq!(params.from, GOLDEN_ADDRESSES[5]);
}

#[test]
fn test_category_without_xpub_uses_default() {
    let b = builder(None, Some(DEFAULT_ADDRESS));
    let ctx = RequestContext::new().with_category("savings");
    let params = b.build(&fields(Some(RECIPIENT), None), &ctx).unwrap();
    assert_eq!(params.from, DEFAULT_ADDRESS);
}

#[test]
fn test_bad_amounts_produce_no_parameters() {
    let b = builder(None, Some(DEFAULT_ADDRESS));
    for amount in ["ten", "-0.5", "0.0000000000000000001", "1e3", "1_000", "+1"] {
        let err = b
            .build(&fields(Some(RECIPIENT), Some(amount)), &RequestContext::new())
            .unwrap_err();
        assert_eq!(err.code().as_str(), "invalid_amount", "amount {}", amount);
    }
}
