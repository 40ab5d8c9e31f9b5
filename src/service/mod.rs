pub mod address_resolver;
pub mod balance_presenter;
pub mod blockchain_client;
pub mod registry_cache;
pub mod subaccount_commands;
pub mod transaction_builder;
pub mod wallet_actions;

pub use address_resolver::AddressResolver;
pub use balance_presenter::{BalancePresenter, BalanceReport};
pub use blockchain_client::{BalanceSnapshot, BalanceSource, JsonRpcBalanceClient, TransferRecord};
pub use registry_cache::RegistryCache;
pub use subaccount_commands::{render_subaccount_provider, SubaccountCommand, SubaccountOutcome};
pub use transaction_builder::TransactionParameterBuilder;
pub use wallet_actions::WalletActions;
