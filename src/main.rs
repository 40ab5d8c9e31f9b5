//! Subvault 主入口
//!
//! 打印当前 xpub 的子账户目录；带参数时查询该地址/别名的余额。

use std::sync::Arc;

use anyhow::{Context, Result};
use subvault::{
    app_state::AppState,
    config::Config,
    domain::{ExtractedFields, RequestContext, ResolutionCache},
    infrastructure::init_logging,
    service::WalletActions,
};

#[tokio::main]
async fn main() -> Result<()> {
    // 1. 加载环境变量
    dotenvy::dotenv().ok();

    // 2. 加载配置（CONFIG_PATH 可选）
    let config_path = std::env::var("CONFIG_PATH").ok();
    let config = Config::from_env_and_file(config_path.as_deref())?;

    // 3. 初始化日志
    init_logging(&config.logging)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    if let Err(e) = config.validate() {
        tracing::warn!(error = %e, "Configuration validation failed");
    }

    let state = Arc::new(AppState::new(Arc::new(config)).context("Failed to build app state")?);
    let actions = WalletActions::new(state);

    // 4. 子账户目录
    let registry = actions
        .registry()
        .context("EVM_PUBLIC_XPUB must be set to a valid extended public key")?;
    let catalog = serde_json::to_string_pretty(&registry.list_subaccounts())?;
    println!("{}", catalog);

    // 5. 可选：余额查询（参数为地址、别名或包含地址的文本）
    let query: Vec<String> = std::env::args().skip(1).collect();
    if !query.is_empty() {
        let text = query.join(" ");
        let fields = ExtractedFields {
            alias: Some(text.clone()),
            text: Some(text),
            ..Default::default()
        };

        let mut cache = ResolutionCache::new();
        match actions
            .see_balances(fields, &RequestContext::new(), &mut cache)
            .await
        {
            Ok(report) => println!("{}", report.text),
            Err(e) => {
                tracing::error!(code = e.code().as_str(), error = %e, "Balance query failed");
                eprintln!("{}", e.user_message());
            }
        }
    }

    Ok(())
}
