//! Signing capability and the secp256r1 key pair that backs it
//!
//! The transaction pipeline only sees [`KeySigner`]: something that can sign
//! a byte buffer and report its public point. [`KeyPair`] is the local
//! implementation, imported from a WIF string held in an environment variable.

pub mod address;

use crate::config::WalletConfig;
use crate::error::{RelayerError, RelayerResult};
use crate::tx::script::{script_hash, signature_redeem_script};
use crate::types::UInt160;

use p256::ecdsa::signature::{Signer, Verifier};
use p256::ecdsa::{Signature, SigningKey, VerifyingKey};
use p256::elliptic_curve::sec1::ToEncodedPoint;
use p256::PublicKey;
use rand::rngs::OsRng;
use std::fmt;
use tracing::info;

const WIF_PREFIX: u8 = 0x80;
const WIF_COMPRESSED_FLAG: u8 = 0x01;
const PRIVATE_KEY_LEN: usize = 32;

/// Capability to authorize transaction data
pub trait KeySigner: Send + Sync {
    /// Sign `message`; the implementation hashes it with SHA-256
    fn sign(&self, message: &[u8]) -> RelayerResult<Vec<u8>>;

    /// Compressed SEC1 encoding of the public point
    fn public_point(&self) -> Vec<u8>;

    /// Script hash of the single-signature verification script
    fn script_hash(&self) -> UInt160 {
        script_hash(&signature_redeem_script(&self.public_point()))
    }
}

/// secp256r1 key pair
pub struct KeyPair {
    signing_key: SigningKey,
}

impl KeyPair {
    pub fn from_private_key(bytes: &[u8]) -> RelayerResult<Self> {
        let signing_key = SigningKey::from_slice(bytes)
            .map_err(|e| RelayerError::Wallet(format!("Invalid private key: {}", e)))?;
        Ok(Self { signing_key })
    }

    /// Import a compressed-key WIF (`0x80 ‖ key ‖ 0x01`, Base58Check)
    pub fn from_wif(wif: &str) -> RelayerResult<Self> {
        let decoded = bs58::decode(wif.trim())
            .with_check(None)
            .into_vec()
            .map_err(|e| RelayerError::Wallet(format!("Invalid WIF: {}", e)))?;

        if decoded.len() != PRIVATE_KEY_LEN + 2
            || decoded[0] != WIF_PREFIX
            || decoded[PRIVATE_KEY_LEN + 1] != WIF_COMPRESSED_FLAG
        {
            return Err(RelayerError::Wallet("Invalid WIF".to_string()));
        }

        Self::from_private_key(&decoded[1..=PRIVATE_KEY_LEN])
    }

    /// Generate a fresh key from the OS random source
    pub fn random() -> Self {
        Self {
            signing_key: SigningKey::random(&mut OsRng),
        }
    }
}

impl KeySigner for KeyPair {
    fn sign(&self, message: &[u8]) -> RelayerResult<Vec<u8>> {
        let signature: Signature = self
            .signing_key
            .try_sign(message)
            .map_err(|e| RelayerError::Wallet(format!("Signing failed: {}", e)))?;
        Ok(signature.to_bytes().to_vec())
    }

    fn public_point(&self) -> Vec<u8> {
        PublicKey::from(self.signing_key.verifying_key())
            .to_encoded_point(true)
            .as_bytes()
            .to_vec()
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_point", &hex::encode(self.public_point()))
            .finish()
    }
}

/// Check a 64-byte `r ‖ s` signature over `message` against a SEC1 public point
pub fn verify_signature(public_point: &[u8], message: &[u8], signature: &[u8]) -> bool {
    let Ok(key) = VerifyingKey::from_sec1_bytes(public_point) else {
        return false;
    };
    let Ok(signature) = Signature::from_slice(signature) else {
        return false;
    };
    key.verify(message, &signature).is_ok()
}

/// Load the signing key from the environment variable named in config
pub fn load_key_pair(config: &WalletConfig) -> RelayerResult<KeyPair> {
    let wif = std::env::var(&config.private_key_env).map_err(|_| {
        RelayerError::Wallet(format!(
            "No wallet configured. Set {} to a WIF private key",
            config.private_key_env
        ))
    })?;

    let key_pair = KeyPair::from_wif(&wif)?;
    info!(
        "Loaded signing key for {}",
        address::from_script_hash(&key_pair.script_hash())
    );
    Ok(key_pair)
}
