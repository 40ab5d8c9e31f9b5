//! 未签名交易参数

use serde::{Deserialize, Serialize};

/// 未签名交易参数
///
/// 仅包含 from / to / value（0x 十六进制 wei）与可选 data，不涉及任何密钥材料。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionParameters {
    pub from: String,
    pub to: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub data: Option<String>,
}

impl TransactionParameters {
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialized_shape() {
        let params = TransactionParameters {
            from: "0xAAA".into(),
            to: "0xBBB".into(),
            value: "0x5af3107a4000".into(),
            data: None,
        };
        let json = params.to_json();
        let object = json.as_object().unwrap();
        assert_eq!(object.len(), 3);
        assert_eq!(object["value"], "0x5af3107a4000");
        assert!(!object.contains_key("data"));
    }
}
