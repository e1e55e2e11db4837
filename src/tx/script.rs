//! VM script emission for the app-call script and verification scripts

use crate::crypto::hash160;
use crate::error::{RelayerError, RelayerResult};
use crate::types::UInt160;

use serde::Deserialize;

/// Opcodes emitted by this crate
pub mod opcode {
    pub const PUSH0: u8 = 0x00;
    pub const PUSHBYTES75: u8 = 0x4b;
    pub const PUSHDATA1: u8 = 0x4c;
    pub const PUSHDATA2: u8 = 0x4d;
    pub const PUSHDATA4: u8 = 0x4e;
    pub const PUSHM1: u8 = 0x4f;
    pub const PUSH1: u8 = 0x51;
    pub const APPCALL: u8 = 0x67;
    pub const CHECKSIG: u8 = 0xac;
    pub const PACK: u8 = 0xc1;
}

/// Contract call argument as written in configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum ContractParam {
    Integer(i64),
    String(String),
    /// Hex-encoded bytes
    ByteArray(String),
    Boolean(bool),
    /// Script hash in `0x`-prefixed display form
    Hash160(String),
}

#[derive(Debug, Default, Clone)]
pub struct ScriptBuilder {
    script: Vec<u8>,
}

impl ScriptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, op: u8) -> &mut Self {
        self.script.push(op);
        self
    }

    pub fn emit_with(&mut self, op: u8, operand: &[u8]) -> &mut Self {
        self.script.push(op);
        self.script.extend_from_slice(operand);
        self
    }

    pub fn emit_push_bytes(&mut self, data: &[u8]) -> &mut Self {
        let len = data.len();
        if len <= opcode::PUSHBYTES75 as usize {
            self.script.push(len as u8);
        } else if len < 0x100 {
            self.script.push(opcode::PUSHDATA1);
            self.script.push(len as u8);
        } else if len < 0x10000 {
            self.script.push(opcode::PUSHDATA2);
            self.script.extend_from_slice(&(len as u16).to_le_bytes());
        } else {
            self.script.push(opcode::PUSHDATA4);
            self.script.extend_from_slice(&(len as u32).to_le_bytes());
        }
        self.script.extend_from_slice(data);
        self
    }

    pub fn emit_push_int(&mut self, value: i64) -> &mut Self {
        match value {
            -1 => self.emit(opcode::PUSHM1),
            0 => self.emit(opcode::PUSH0),
            1..=16 => self.emit(opcode::PUSH1 - 1 + value as u8),
            _ => self.emit_push_bytes(&integer_bytes(value)),
        }
    }

    pub fn emit_push_bool(&mut self, value: bool) -> &mut Self {
        self.emit(if value { opcode::PUSH1 } else { opcode::PUSH0 })
    }

    pub fn emit_push_str(&mut self, value: &str) -> &mut Self {
        self.emit_push_bytes(value.as_bytes())
    }

    pub fn emit_push_param(&mut self, param: &ContractParam) -> RelayerResult<&mut Self> {
        Ok(match param {
            ContractParam::Integer(v) => self.emit_push_int(*v),
            ContractParam::String(s) => self.emit_push_str(s),
            ContractParam::ByteArray(h) => {
                let bytes = hex::decode(h.strip_prefix("0x").unwrap_or(h)).map_err(|e| {
                    RelayerError::Parse(format!("invalid byte array parameter {:?}: {}", h, e))
                })?;
                self.emit_push_bytes(&bytes)
            }
            ContractParam::Boolean(b) => self.emit_push_bool(*b),
            ContractParam::Hash160(h) => {
                let hash: UInt160 = h.parse()?;
                self.emit_push_bytes(hash.as_bytes())
            }
        })
    }

    /// `contract.operation(params)`: arguments pushed last-first, packed,
    /// then the operation name and the APPCALL target
    pub fn emit_app_call(
        &mut self,
        contract: &UInt160,
        operation: &str,
        params: &[ContractParam],
    ) -> RelayerResult<&mut Self> {
        for param in params.iter().rev() {
            self.emit_push_param(param)?;
        }
        self.emit_push_int(params.len() as i64);
        self.emit(opcode::PACK);
        self.emit_push_str(operation);
        Ok(self.emit_with(opcode::APPCALL, contract.as_bytes()))
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.script.clone()
    }
}

/// Minimal little-endian two's complement encoding
fn integer_bytes(value: i64) -> Vec<u8> {
    let mut bytes = value.to_le_bytes().to_vec();
    while bytes.len() > 1 {
        let last = bytes[bytes.len() - 1];
        let sign_bit = bytes[bytes.len() - 2] & 0x80;
        if (last == 0x00 && sign_bit == 0) || (last == 0xff && sign_bit != 0) {
            bytes.pop();
        } else {
            break;
        }
    }
    bytes
}

/// Single-signature verification script: `PUSH(pubkey) CHECKSIG`
pub fn signature_redeem_script(public_point: &[u8]) -> Vec<u8> {
    ScriptBuilder::new()
        .emit_push_bytes(public_point)
        .emit(opcode::CHECKSIG)
        .to_vec()
}

pub fn script_hash(script: &[u8]) -> UInt160 {
    UInt160::from_le_bytes(hash160(script))
}
