//! 地址解析服务
//!
//! 按固定优先级从多个候选信号中解析出本次操作的地址：
//! 上游错误 > 字面地址 > 别名 > 已解析的目标地址 > 配置默认地址。

use std::sync::Arc;

use crate::{
    config::WalletConfig,
    domain::{
        alias_map::AliasMap,
        derivation::redact_xpub,
        request_context::{non_blank, ExtractedFields, RequestContext, ResolutionCache},
    },
    error::{Result, SubaccountError},
    service::registry_cache::RegistryCache,
    utils::lenient_json::extract_embedded_map,
};

pub struct AddressResolver {
    config: Arc<WalletConfig>,
    registries: Arc<RegistryCache>,
}

impl AddressResolver {
    pub fn new(config: Arc<WalletConfig>, registries: Arc<RegistryCache>) -> Self {
        Self { config, registries }
    }

    /// 解析地址（短路求值）
    pub fn resolve(
        &self,
        ctx: &RequestContext,
        content: &ExtractedFields,
        cache: &mut ResolutionCache,
    ) -> Result<String> {
        if let Some(message) = non_blank(content.error.as_deref()) {
            return Err(SubaccountError::Resolution(message.to_string()));
        }

        if let Some(address) = non_blank(content.address.as_deref()) {
            tracing::debug!(address = %address, "Resolved literal address");
            return Ok(address.to_string());
        }

        // 别名映射只在确实给出别名时才构建
        if let Some(alias) = non_blank(content.alias.as_deref()) {
            match self.alias_map(ctx, cache).and_then(|map| map.get(alias)) {
                Some(address) => {
                    tracing::debug!(alias = %alias, address = %address, "Resolved address from alias");
                    return Ok(address.to_string());
                }
                None => {
                    tracing::debug!(alias = %alias, "Alias not found, trying next source");
                }
            }
        }

        if let Some(target) = non_blank(ctx.target_address.as_deref()) {
            tracing::debug!(address = %target, "Resolved previously stored target address");
            return Ok(target.to_string());
        }

        self.config
            .valid_default_address()
            .map(str::to_string)
            .ok_or_else(|| {
                SubaccountError::UnresolvedAddress(
                    "no address, alias, target or valid default address available".into(),
                )
            })
    }

    /// 本次请求使用的别名映射
    ///
    /// 首次调用时构建并挂到缓存上，后续调用直接复用。
    pub fn alias_map<'c>(
        &self,
        ctx: &RequestContext,
        cache: &'c mut ResolutionCache,
    ) -> Option<&'c AliasMap> {
        if cache.alias_map.is_none() {
            cache.alias_map = self.build_alias_map(ctx);
        }
        cache.alias_map.as_ref()
    }

    /// 构建别名映射：第一个成功的来源胜出，不做合并
    pub fn build_alias_map(&self, ctx: &RequestContext) -> Option<AliasMap> {
        if let Some(aliases) = ctx.aliases.as_ref().filter(|a| a.is_well_formed()) {
            tracing::debug!(entries = aliases.len(), "Using alias map attached to context");
            return Some(aliases.clone());
        }

        if let Some(text) = non_blank(ctx.providers_text.as_deref()) {
            if let Some(map) = extract_embedded_map(text) {
                tracing::debug!(entries = map.len(), "Using alias map embedded in provider text");
                return Some(AliasMap::from(map));
            }
        }

        let xpub = self.config.xpub()?;
        match self.registries.get_or_init(xpub) {
            Ok(registry) => {
                let map = AliasMap::from(registry.get_all_subaccounts());
                tracing::debug!(entries = map.len(), "Using alias map built from subaccount registry");
                Some(map)
            }
            Err(e) => {
                tracing::warn!(
                    xpub = %redact_xpub(xpub),
                    error = %e,
                    "Failed to build alias map from subaccount registry"
                );
                None
            }
        }
    }
}
