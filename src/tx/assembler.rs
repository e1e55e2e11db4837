//! Fills a fee-priced draft with inputs, change and attributes

use super::selector::Selection;
use super::transaction::{
    AttributeUsage, CoinReference, InvocationTransaction, TransactionAttribute, TransactionOutput,
};
use crate::error::RelayerResult;
use crate::types::{Fixed8, UInt160, UInt256};

use rand::rngs::OsRng;
use rand::RngCore;
use tracing::debug;

/// Length of the random remark that keeps otherwise identical transactions distinct
pub const NONCE_LEN: usize = 32;

/// Assembles the funding part of an invocation transaction for one fee asset
pub struct TransactionAssembler {
    asset_id: UInt256,
}

impl TransactionAssembler {
    pub fn new(asset_id: UInt256) -> Self {
        Self { asset_id }
    }

    pub fn asset_id(&self) -> &UInt256 {
        &self.asset_id
    }

    /// Attach inputs for `selection`, change back to `from`, and the two attributes
    ///
    /// Change is `selection.total - fee`, only emitted when positive.
    pub fn assemble(
        &self,
        mut tx: InvocationTransaction,
        fee: Fixed8,
        from: &UInt160,
        selection: &Selection,
    ) -> RelayerResult<InvocationTransaction> {
        tx.inputs = selection
            .chosen
            .iter()
            .map(CoinReference::try_from)
            .collect::<RelayerResult<Vec<_>>>()?;

        tx.outputs.clear();
        if selection.total > fee {
            tx.outputs.push(TransactionOutput {
                asset_id: self.asset_id,
                value: selection.total - fee,
                script_hash: *from,
            });
        }

        let mut nonce = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce);

        tx.attributes = vec![
            TransactionAttribute {
                usage: AttributeUsage::Script,
                data: from.as_bytes().to_vec(),
            },
            TransactionAttribute {
                usage: AttributeUsage::Remark(1),
                data: nonce.to_vec(),
            },
        ];

        debug!(
            "Assembled {} inputs, {} outputs, fee {} from {}",
            tx.inputs.len(),
            tx.outputs.len(),
            fee,
            from
        );
        Ok(tx)
    }
}
