// 余额查询客户端
// 通过 JSON-RPC eth_getBalance 获取地址余额，带超时与有限次重试

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{
    config::RpcConfig,
    error::{Result, SubaccountError},
};

const MAX_RETRIES: u32 = 3;
const RETRY_DELAY_MS: u64 = 500;

/// 一笔转账记录（金额单位 wei）
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRecord {
    pub from: String,
    pub to: String,
    pub value_wei: u128,
}

/// 余额快照
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceSnapshot {
    pub address: String,
    pub balance_wei: u128,
    /// 最近转账，数据源不提供时为空
    pub transfers: Vec<TransferRecord>,
}

/// 余额数据源
#[async_trait]
pub trait BalanceSource: Send + Sync {
    async fn fetch(&self, address: &str) -> Result<BalanceSnapshot>;
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Option<String>,
    #[serde(default)]
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

/// 单次调用失败的分类：传输层错误可重试，节点明确拒绝不重试
enum CallError {
    Transport(SubaccountError),
    Rejected(SubaccountError),
}

pub struct JsonRpcBalanceClient {
    http_client: reqwest::Client,
    rpc_url: String,
}

impl JsonRpcBalanceClient {
    pub fn new(config: &RpcConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.timeout_secs.min(10)))
            .build()?;

        Ok(Self {
            http_client,
            rpc_url: config.url.clone(),
        })
    }

    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }

    /// 查询余额（wei），传输失败时重试
    pub async fn get_balance(&self, address: &str) -> Result<u128> {
        let mut last_error = SubaccountError::Rpc("no attempt made".into());

        for attempt in 1..=MAX_RETRIES {
            match self.call_get_balance(address).await {
                Ok(balance) => return Ok(balance),
                Err(CallError::Rejected(e)) => return Err(e),
                Err(CallError::Transport(e)) => {
                    tracing::warn!(
                        attempt = attempt,
                        endpoint = %self.rpc_url,
                        address = %address,
                        error = %e,
                        "eth_getBalance failed"
                    );
                    last_error = e;
                    if attempt < MAX_RETRIES {
                        tokio::time::sleep(Duration::from_millis(RETRY_DELAY_MS * attempt as u64))
                            .await;
                    }
                }
            }
        }

        Err(last_error)
    }

    async fn call_get_balance(&self, address: &str) -> std::result::Result<u128, CallError> {
        let payload = serde_json::json!({
            "jsonrpc": "2.0",
            "method": "eth_getBalance",
            "params": [address, "latest"],
            "id": 1
        });

        let response = self
            .http_client
            .post(&self.rpc_url)
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| CallError::Transport(e.into()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CallError::Transport(e.into()))?;

        if !status.is_success() {
            return Err(CallError::Transport(SubaccountError::Rpc(format!(
                "RPC request failed with status {}: {}",
                status, body
            ))));
        }

        let parsed: JsonRpcResponse = serde_json::from_str(&body).map_err(|e| {
            CallError::Rejected(SubaccountError::Rpc(format!(
                "Failed to parse JSON response: {}",
                e
            )))
        })?;

        // 检查 JSON-RPC 错误
        if let Some(error) = parsed.error {
            return Err(CallError::Rejected(SubaccountError::Rpc(format!(
                "RPC error {}: {}",
                error.code, error.message
            ))));
        }

        let result = parsed.result.ok_or_else(|| {
            CallError::Rejected(SubaccountError::Rpc(
                "Missing result field in RPC response".into(),
            ))
        })?;

        parse_hex_quantity(&result).map_err(CallError::Rejected)
    }
}

#[async_trait]
impl BalanceSource for JsonRpcBalanceClient {
    async fn fetch(&self, address: &str) -> Result<BalanceSnapshot> {
        let balance_wei = self.get_balance(address).await?;
        tracing::debug!(address = %address, balance_wei = %balance_wei, "Fetched balance");

        // 纯 JSON-RPC 无法获取转账历史
        Ok(BalanceSnapshot {
            address: address.to_string(),
            balance_wei,
            transfers: Vec::new(),
        })
    }
}

/// 解析 JSON-RPC 的十六进制数量（如 "0x1bc16d674ec80000"）
pub fn parse_hex_quantity(value: &str) -> Result<u128> {
    let digits = value
        .trim()
        .strip_prefix("0x")
        .ok_or_else(|| SubaccountError::Rpc(format!("quantity '{}' is missing the 0x prefix", value)))?;
    if digits.is_empty() {
        return Ok(0);
    }
    u128::from_str_radix(digits, 16)
        .map_err(|e| SubaccountError::Rpc(format!("invalid quantity '{}': {}", value, e)))
}
