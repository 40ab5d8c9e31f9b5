//! 子账户引擎错误类型
//!
//! 每种失败对应一个错误变体，并映射到稳定的错误码字符串

use thiserror::Error;

/// 统一结果类型
pub type Result<T> = std::result::Result<T, SubaccountError>;

/// 错误码（对外稳定的 snake_case 标识）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    InvalidKey,
    Derivation,
    MissingField,
    InvalidAmount,
    Resolution,
    UnresolvedAddress,
    CategoryNotRecognized,
    InvalidCalldata,
    UnsupportedAction,
    Rpc,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidKey => "invalid_key",
            ErrorCode::Derivation => "derivation_error",
            ErrorCode::MissingField => "missing_field",
            ErrorCode::InvalidAmount => "invalid_amount",
            ErrorCode::Resolution => "resolution_error",
            ErrorCode::UnresolvedAddress => "unresolved_address",
            ErrorCode::CategoryNotRecognized => "category_not_recognized",
            ErrorCode::InvalidCalldata => "invalid_calldata",
            ErrorCode::UnsupportedAction => "unsupported_action",
            ErrorCode::Rpc => "rpc_error",
        }
    }
}

/// 子账户引擎错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubaccountError {
    /// 扩展公钥无法解析
    #[error("Invalid extended public key: {0}")]
    InvalidKey(String),

    /// 索引越界或派生失败
    #[error("Derivation failed: {0}")]
    Derivation(String),

    /// 缺少必填字段
    #[error("Missing required field: {0}")]
    MissingField(String),

    /// 金额无法解析或为负数
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// 上游提取服务显式返回的错误
    #[error("{0}")]
    Resolution(String),

    /// 所有候选规则均未得到地址
    #[error("Unable to resolve address: {0}")]
    UnresolvedAddress(String),

    /// 未知分类且未请求动态创建
    #[error("Category '{0}' not recognized")]
    CategoryNotRecognized(String),

    /// data 字段不是合法的 0x 十六进制
    #[error("Invalid calldata: {0}")]
    InvalidCalldata(String),

    /// 未知的子账户操作
    #[error("Action '{0}' not recognized")]
    UnsupportedAction(String),

    /// 余额查询 RPC 失败
    #[error("RPC error: {0}")]
    Rpc(String),
}

impl SubaccountError {
    pub fn code(&self) -> ErrorCode {
        match self {
            SubaccountError::InvalidKey(_) => ErrorCode::InvalidKey,
            SubaccountError::Derivation(_) => ErrorCode::Derivation,
            SubaccountError::MissingField(_) => ErrorCode::MissingField,
            SubaccountError::InvalidAmount(_) => ErrorCode::InvalidAmount,
            SubaccountError::Resolution(_) => ErrorCode::Resolution,
            SubaccountError::UnresolvedAddress(_) => ErrorCode::UnresolvedAddress,
            SubaccountError::CategoryNotRecognized(_) => ErrorCode::CategoryNotRecognized,
            SubaccountError::InvalidCalldata(_) => ErrorCode::InvalidCalldata,
            SubaccountError::UnsupportedAction(_) => ErrorCode::UnsupportedAction,
            SubaccountError::Rpc(_) => ErrorCode::Rpc,
        }
    }

    /// 供对话层直接展示的错误消息
    pub fn user_message(&self) -> String {
        match self {
            // 上游错误原样透传
            SubaccountError::Resolution(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}

impl From<reqwest::Error> for SubaccountError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return SubaccountError::Rpc(format!("request timed out: {}", err));
        }
        SubaccountError::Rpc(err.to_string())
    }
}
