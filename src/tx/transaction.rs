//! Invocation transaction model and its wire serialization

use crate::crypto::hash256;
use crate::error::{RelayerError, RelayerResult};
use crate::rpc::Unspent;
use crate::types::{Fixed8, UInt160, UInt256};

/// Transaction type byte for invocation transactions
pub const INVOCATION_TX_TYPE: u8 = 0xd1;

/// Reference to an output of a prior transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoinReference {
    pub prev_hash: UInt256,
    pub prev_index: u16,
}

impl TryFrom<&Unspent> for CoinReference {
    type Error = RelayerError;

    fn try_from(unspent: &Unspent) -> RelayerResult<Self> {
        Ok(Self {
            prev_hash: unspent.txid.parse()?,
            prev_index: unspent.n,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionOutput {
    pub asset_id: UInt256,
    pub value: Fixed8,
    pub script_hash: UInt160,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeUsage {
    /// Additional script hash that must witness the transaction
    Script,
    /// Free-form remark, `Remark(0)` through `Remark(15)`
    Remark(u8),
}

impl AttributeUsage {
    pub fn to_byte(self) -> u8 {
        match self {
            AttributeUsage::Script => 0x20,
            AttributeUsage::Remark(n) => 0xf0 | (n & 0x0f),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionAttribute {
    pub usage: AttributeUsage,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Witness {
    pub invocation_script: Vec<u8>,
    pub verification_script: Vec<u8>,
}

/// Draft of the single transaction a run builds
///
/// Created with only the script, then filled stage by stage: `gas` by fee
/// estimation, inputs/outputs/attributes by assembly, witnesses by signing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationTransaction {
    pub version: u8,
    pub script: Vec<u8>,
    /// System fee paid in the utility token; whole units only
    pub gas: Fixed8,
    pub attributes: Vec<TransactionAttribute>,
    pub inputs: Vec<CoinReference>,
    pub outputs: Vec<TransactionOutput>,
    pub witnesses: Vec<Witness>,
}

impl InvocationTransaction {
    pub fn new(script: Vec<u8>) -> Self {
        Self {
            version: 1,
            script,
            gas: Fixed8::ZERO,
            attributes: Vec::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            witnesses: Vec::new(),
        }
    }

    /// Everything except witnesses; this is what gets signed and hashed
    pub fn unsigned_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(64 + self.script.len());
        self.write_unsigned(&mut buf);
        buf
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = self.unsigned_bytes();
        write_var_int(&mut buf, self.witnesses.len() as u64);
        for witness in &self.witnesses {
            write_var_bytes(&mut buf, &witness.invocation_script);
            write_var_bytes(&mut buf, &witness.verification_script);
        }
        buf
    }

    pub fn size(&self) -> usize {
        self.to_bytes().len()
    }

    pub fn hash(&self) -> UInt256 {
        UInt256::from_le_bytes(hash256(&self.unsigned_bytes()))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    fn write_unsigned(&self, buf: &mut Vec<u8>) {
        buf.push(INVOCATION_TX_TYPE);
        buf.push(self.version);

        write_var_bytes(buf, &self.script);
        if self.version >= 1 {
            buf.extend_from_slice(&self.gas.raw().to_le_bytes());
        }

        write_var_int(buf, self.attributes.len() as u64);
        for attribute in &self.attributes {
            buf.push(attribute.usage.to_byte());
            match attribute.usage {
                AttributeUsage::Script => buf.extend_from_slice(&attribute.data),
                AttributeUsage::Remark(_) => write_var_bytes(buf, &attribute.data),
            }
        }

        write_var_int(buf, self.inputs.len() as u64);
        for input in &self.inputs {
            buf.extend_from_slice(input.prev_hash.as_bytes());
            buf.extend_from_slice(&input.prev_index.to_le_bytes());
        }

        write_var_int(buf, self.outputs.len() as u64);
        for output in &self.outputs {
            buf.extend_from_slice(output.asset_id.as_bytes());
            buf.extend_from_slice(&output.value.raw().to_le_bytes());
            buf.extend_from_slice(output.script_hash.as_bytes());
        }
    }
}

fn write_var_int(buf: &mut Vec<u8>, value: u64) {
    if value < 0xfd {
        buf.push(value as u8);
    } else if value <= 0xffff {
        buf.push(0xfd);
        buf.extend_from_slice(&(value as u16).to_le_bytes());
    } else if value <= 0xffff_ffff {
        buf.push(0xfe);
        buf.extend_from_slice(&(value as u32).to_le_bytes());
    } else {
        buf.push(0xff);
        buf.extend_from_slice(&value.to_le_bytes());
    }
}

fn write_var_bytes(buf: &mut Vec<u8>, data: &[u8]) {
    write_var_int(buf, data.len() as u64);
    buf.extend_from_slice(data);
}
