//! 钱包对话动作
//!
//! 三个对话动作的统一入口：构建未签名交易、查询余额、管理子账户。
//! 每个动作接收上游提取字段、只读请求上下文与请求级缓存。

use std::sync::Arc;

use crate::{
    app_state::AppState,
    domain::{
        request_context::{ExtractedFields, RequestContext, ResolutionCache},
        subaccount_registry::SubaccountRegistry,
        transaction::TransactionParameters,
    },
    error::{Result, SubaccountError},
    service::{
        balance_presenter::{BalancePresenter, BalanceReport},
        subaccount_commands::{render_subaccount_provider, SubaccountCommand, SubaccountOutcome},
    },
};

#[derive(Clone)]
pub struct WalletActions {
    state: Arc<AppState>,
}

impl WalletActions {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    /// 构建未签名交易参数
    pub fn create_unsigned_tx(
        &self,
        fields: &ExtractedFields,
        ctx: &RequestContext,
    ) -> Result<TransactionParameters> {
        self.state.tx_builder.build(fields, ctx)
    }

    /// 解析地址并查询余额
    pub async fn see_balances(
        &self,
        fields: ExtractedFields,
        ctx: &RequestContext,
        cache: &mut ResolutionCache,
    ) -> Result<BalanceReport> {
        let fields = fields.with_address_from_text();
        let address = self.state.resolver.resolve(ctx, &fields, cache)?;

        let snapshot = self.state.balance_source.fetch(&address).await?;

        let aliases = self.state.resolver.alias_map(ctx, cache);
        let report = BalancePresenter::new(aliases).render(&snapshot);
        tracing::info!(address = %report.address, label = %report.label, "Balance fetched");
        Ok(report)
    }

    /// 执行子账户管理命令
    pub fn manage_subaccounts(
        &self,
        fields: &ExtractedFields,
        cache: &mut ResolutionCache,
    ) -> Result<SubaccountOutcome> {
        let command = SubaccountCommand::decode(fields)?;
        let registry = self.registry()?;
        command.execute(&registry, cache)
    }

    /// 子账户 provider 文本
    pub fn subaccount_provider(&self, ctx: &RequestContext) -> Result<String> {
        let registry = self.registry()?;
        render_subaccount_provider(ctx.agent_name.as_deref(), &registry)
    }

    /// 当前配置 xpub 对应的注册表
    pub fn registry(&self) -> Result<Arc<SubaccountRegistry>> {
        let xpub = self
            .state
            .config
            .wallet
            .xpub()
            .ok_or_else(|| SubaccountError::InvalidKey("EVM_PUBLIC_XPUB is not configured".into()))?;
        self.state.registries.get_or_init(xpub)
    }
}
