//! Subvault - HD 钱包虚拟子账户引擎
//!
//! 只持有扩展公钥：按分类派生子账户地址、解析操作地址、构建未签名交易参数

pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod service;
pub mod utils;

// 重新导出常用类型
pub use app_state::AppState;
pub use error::{ErrorCode, SubaccountError};

// 统一模块导出
pub mod prelude {
    pub use crate::{
        app_state::AppState,
        domain::{
            AliasMap, CategoryIndexTable, DerivationIndex, ExtractedFields, RequestContext,
            ResolutionCache, SubaccountRegistry, TransactionParameters,
        },
        error::{ErrorCode, Result, SubaccountError},
        service::{RegistryCache, WalletActions},
    };
}
