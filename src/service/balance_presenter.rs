//! 余额展示
//!
//! 将余额快照渲染为面向用户的文本；别名映射中已知的地址显示为别名。

use serde::Serialize;

use crate::{
    domain::alias_map::AliasMap, service::blockchain_client::BalanceSnapshot,
    utils::amount::format_wei_as_ether,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BalanceReport {
    pub address: String,
    /// 别名或原地址
    pub label: String,
    pub balance_eth: String,
    /// 每笔转账一行
    pub lines: Vec<String>,
    pub text: String,
}

pub struct BalancePresenter<'a> {
    aliases: Option<&'a AliasMap>,
}

impl<'a> BalancePresenter<'a> {
    pub fn new(aliases: Option<&'a AliasMap>) -> Self {
        Self { aliases }
    }

    /// 别名（大小写不敏感匹配）或原地址
    pub fn display_address(&self, address: &str) -> String {
        self.aliases
            .and_then(|map| map.alias_for(address))
            .unwrap_or(address)
            .to_string()
    }

    pub fn render(&self, snapshot: &BalanceSnapshot) -> BalanceReport {
        let label = self.display_address(&snapshot.address);
        let balance_eth = format_wei_as_ether(snapshot.balance_wei);

        let lines: Vec<String> = snapshot
            .transfers
            .iter()
            .map(|t| {
                format!(
                    "- From {} to {} for {} ETH",
                    self.display_address(&t.from),
                    self.display_address(&t.to),
                    format_wei_as_ether(t.value_wei)
                )
            })
            .collect();

        let mut text = format!("Current balance of {} is {} ETH.", label, balance_eth);
        if lines.is_empty() {
            text.push_str("\nNo recent transfers found.");
        } else {
            text.push_str("\nRecent transfers:\n");
            text.push_str(&lines.join("\n"));
        }

        BalanceReport {
            address: snapshot.address.clone(),
            label,
            balance_eth,
            lines,
            text,
        }
    }
}
