//! Signature witnesses for single-key transactions

use super::script::{opcode, signature_redeem_script, ScriptBuilder};
use super::transaction::{InvocationTransaction, Witness};
use crate::error::{RelayerError, RelayerResult};
use crate::wallet::{verify_signature, KeySigner};

use tracing::debug;

const SIGNATURE_LEN: usize = 64;
const PUBLIC_POINT_LEN: usize = 33;

pub struct WitnessBuilder;

impl WitnessBuilder {
    /// Sign the unsigned serialization of `tx`
    ///
    /// Invocation script pushes the 64-byte signature; verification script
    /// pushes the compressed public point followed by CHECKSIG.
    pub fn sign(tx: &InvocationTransaction, signer: &dyn KeySigner) -> RelayerResult<Witness> {
        let signature = signer.sign(&tx.unsigned_bytes())?;
        if signature.len() != SIGNATURE_LEN {
            return Err(RelayerError::Wallet(format!(
                "signer produced a {} byte signature",
                signature.len()
            )));
        }

        let witness = Witness {
            invocation_script: ScriptBuilder::new().emit_push_bytes(&signature).to_vec(),
            verification_script: signature_redeem_script(&signer.public_point()),
        };
        debug!("Signed transaction {}", tx.hash());
        Ok(witness)
    }

    /// Check `witness` against the unsigned serialization of `tx`
    ///
    /// Scripts that are not a single-signature witness are a `Wallet` error;
    /// a well-formed witness whose signature does not match returns `false`.
    pub fn verify(tx: &InvocationTransaction, witness: &Witness) -> RelayerResult<bool> {
        let signature = single_push(&witness.invocation_script, SIGNATURE_LEN)
            .ok_or_else(|| RelayerError::Wallet("malformed invocation script".to_string()))?;

        let verification = &witness.verification_script;
        let public_point = verification
            .split_last()
            .filter(|(op, _)| **op == opcode::CHECKSIG)
            .and_then(|(_, push)| single_push(push, PUBLIC_POINT_LEN))
            .ok_or_else(|| RelayerError::Wallet("malformed verification script".to_string()))?;

        Ok(verify_signature(public_point, &tx.unsigned_bytes(), signature))
    }
}

/// Payload of a script that is exactly one direct push of `len` bytes
fn single_push(script: &[u8], len: usize) -> Option<&[u8]> {
    match script.split_first() {
        Some((prefix, data)) if *prefix as usize == len && data.len() == len => Some(data),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Fixed8;
    use crate::wallet::KeyPair;

    fn draft() -> InvocationTransaction {
        let mut tx = InvocationTransaction::new(vec![0x00, 0xc1, 0x04, 0x6e, 0x61, 0x6d, 0x65]);
        tx.gas = Fixed8::from_units(1);
        tx
    }

    #[test]
    fn test_witness_layout() {
        let key_pair = KeyPair::from_private_key(&[0x33u8; 32]).unwrap();
        let witness = WitnessBuilder::sign(&draft(), &key_pair).unwrap();

        assert_eq!(witness.invocation_script.len(), 65);
        assert_eq!(witness.invocation_script[0], 0x40);
        assert_eq!(witness.verification_script.len(), 35);
        assert_eq!(witness.verification_script[0], 0x21);
        assert_eq!(&witness.verification_script[1..34], key_pair.public_point().as_slice());
        assert_eq!(witness.verification_script[34], opcode::CHECKSIG);
    }

    #[test]
    fn test_repeated_signatures_both_verify() {
        let key_pair = KeyPair::random();
        let tx = draft();

        let first = WitnessBuilder::sign(&tx, &key_pair).unwrap();
        let second = WitnessBuilder::sign(&tx, &key_pair).unwrap();
        assert!(WitnessBuilder::verify(&tx, &first).unwrap());
        assert!(WitnessBuilder::verify(&tx, &second).unwrap());
    }

    #[test]
    fn test_tampered_transaction_fails_verification() {
        let key_pair = KeyPair::random();
        let tx = draft();
        let witness = WitnessBuilder::sign(&tx, &key_pair).unwrap();

        let mut tampered = tx.clone();
        tampered.gas = Fixed8::from_units(2);
        assert!(!WitnessBuilder::verify(&tampered, &witness).unwrap());

        // witnesses are not part of what is signed
        let mut signed = tx;
        signed.witnesses.push(witness.clone());
        assert!(WitnessBuilder::verify(&signed, &witness).unwrap());
    }

    #[test]
    fn test_other_key_fails_verification() {
        let tx = draft();
        let mut witness = WitnessBuilder::sign(&tx, &KeyPair::random()).unwrap();
        witness.verification_script = signature_redeem_script(&KeyPair::random().public_point());
        assert!(!WitnessBuilder::verify(&tx, &witness).unwrap());
    }

    #[test]
    fn test_malformed_scripts_rejected() {
        let tx = draft();
        let good = WitnessBuilder::sign(&tx, &KeyPair::random()).unwrap();

        let short_signature = Witness {
            invocation_script: vec![0x40; 10],
            verification_script: good.verification_script.clone(),
        };
        assert!(matches!(
            WitnessBuilder::verify(&tx, &short_signature),
            Err(RelayerError::Wallet(_))
        ));

        let mut no_checksig = good.verification_script.clone();
        no_checksig.pop();
        let missing_opcode = Witness {
            invocation_script: good.invocation_script,
            verification_script: no_checksig,
        };
        assert!(matches!(
            WitnessBuilder::verify(&tx, &missing_opcode),
            Err(RelayerError::Wallet(_))
        ));
    }
}
