//! Domain 模块
//!
//! 分类索引、地址派生、子账户注册表与请求级数据模型

pub mod alias_map;
pub mod category;
pub mod derivation;
pub mod request_context;
pub mod subaccount_registry;
pub mod transaction;

// Re-exports
pub use alias_map::AliasMap;
pub use category::{normalize_category, CategoryIndexTable, DerivationIndex};
pub use derivation::{
    derive_address, derive_address_for_category, DerivationStrategy, ExtendedPublicKey,
    Secp256k1XpubStrategy,
};
pub use request_context::{ExtractedFields, RequestContext, ResolutionCache};
pub use subaccount_registry::{Subaccount, SubaccountRegistry};
pub use transaction::TransactionParameters;
