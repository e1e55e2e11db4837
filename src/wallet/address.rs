//! Base58Check address encoding for 160-bit script hashes

use crate::error::{RelayerError, RelayerResult};
use crate::types::UInt160;

/// Address version byte of the NEO 2.x network ("A..." addresses)
pub const ADDRESS_VERSION: u8 = 0x17;

/// Decode an address into the script hash it commits to
pub fn to_script_hash(address: &str) -> RelayerResult<UInt160> {
    let data = bs58::decode(address)
        .with_check(None)
        .into_vec()
        .map_err(|e| RelayerError::Parse(format!("invalid address {:?}: {}", address, e)))?;

    if data.len() != 1 + UInt160::LEN || data[0] != ADDRESS_VERSION {
        return Err(RelayerError::Parse(format!(
            "address {:?} is not a version {:#04x} address",
            address, ADDRESS_VERSION
        )));
    }

    UInt160::from_slice(&data[1..])
}

pub fn from_script_hash(script_hash: &UInt160) -> String {
    let mut data = Vec::with_capacity(1 + UInt160::LEN);
    data.push(ADDRESS_VERSION);
    data.extend_from_slice(script_hash.as_bytes());
    bs58::encode(data).with_check().into_string()
}
