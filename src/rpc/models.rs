//! Typed result shapes for the node queries the relayer makes

use crate::types::Fixed8;

use serde::de::{self, Deserializer};
use serde::Deserialize;
use serde_json::Value;

/// Result of `invokescript`: a dry run of a script in the node's VM
#[derive(Debug, Clone, Deserialize)]
pub struct RpcInvokeResult {
    #[serde(default)]
    pub script: String,
    #[serde(default)]
    pub state: String,
    #[serde(alias = "gasconsumed", alias = "gasConsumed", deserialize_with = "string_or_number")]
    pub gas_consumed: String,
    #[serde(default)]
    pub stack: Vec<Value>,
}

/// Result of `getunspents`
#[derive(Debug, Clone, Deserialize)]
pub struct RpcUnspent {
    pub address: String,
    #[serde(rename = "balance")]
    pub balances: Vec<UnspentBalance>,
}

/// Unspent outputs of one asset held by the queried address
#[derive(Debug, Clone, Deserialize)]
pub struct UnspentBalance {
    /// Asset id without the `0x` prefix
    pub asset_hash: String,
    #[serde(default)]
    pub asset: String,
    #[serde(default)]
    pub asset_symbol: String,
    #[serde(deserialize_with = "non_negative")]
    pub amount: Fixed8,
    #[serde(rename = "unspent")]
    pub unspents: Vec<Unspent>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Unspent {
    pub txid: String,
    #[serde(deserialize_with = "u16_from_string_or_number")]
    pub n: u16,
    #[serde(deserialize_with = "non_negative")]
    pub value: Fixed8,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(de::Error::custom(format!(
            "expected string or number, got {}",
            other
        ))),
    }
}

fn non_negative<'de, D>(deserializer: D) -> Result<Fixed8, D::Error>
where
    D: Deserializer<'de>,
{
    let amount = Fixed8::deserialize(deserializer)?;
    if amount.is_negative() {
        return Err(de::Error::custom(format!("negative amount {}", amount)));
    }
    Ok(amount)
}

fn u16_from_string_or_number<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = string_or_number(deserializer)?;
    raw.parse()
        .map_err(|e| de::Error::custom(format!("invalid output index {:?}: {}", raw, e)))
}
