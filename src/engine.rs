//! Sequences one invocation: price, fund, sign and broadcast
//!
//! Every stage runs once and in order. The first error aborts the run; nothing
//! is retried or persisted.

use crate::config::InvocationConfig;
use crate::error::{RelayerError, RelayerResult};
use crate::rpc::{RpcClient, Unspent};
use crate::tx::{
    CoinSelector, FeeEstimator, InvocationTransaction, ScriptBuilder, Selection,
    TransactionAssembler, WitnessBuilder,
};
use crate::types::{Fixed8, UInt160, UInt256};
use crate::wallet::{address, KeySigner};

use tracing::{debug, info, warn};

/// Result of a completed run
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub txid: UInt256,
    /// Total network fee: gas portion plus size surcharge
    pub fee: Fixed8,
    /// Hex of the signed transaction
    pub raw: String,
    /// Node verdict; `None` when the run was a dry run
    pub accepted: Option<bool>,
}

pub struct InvocationEngine {
    client: RpcClient,
    signer: Box<dyn KeySigner>,
    fee_estimator: FeeEstimator,
}

impl InvocationEngine {
    pub fn new(client: RpcClient, signer: Box<dyn KeySigner>) -> Self {
        Self {
            client,
            signer,
            fee_estimator: FeeEstimator::new(),
        }
    }

    pub fn client(&self) -> &RpcClient {
        &self.client
    }

    pub async fn run(&self, config: &InvocationConfig) -> RelayerResult<RunOutcome> {
        let from = address::to_script_hash(&config.from)?;
        let contract: UInt160 = config
            .contract
            .parse()
            .map_err(|e| RelayerError::Config(format!("invalid contract hash: {}", e)))?;
        let fee_asset: UInt256 = config
            .fee_asset
            .parse()
            .map_err(|e| RelayerError::Config(format!("invalid fee asset: {}", e)))?;
        if config.operation.is_empty() {
            return Err(RelayerError::Config("operation must not be empty".to_string()));
        }

        let script = ScriptBuilder::new()
            .emit_app_call(&contract, &config.operation, &config.params)?
            .to_vec();
        info!(
            "Invoking {}.{} with {} params ({} byte script)",
            contract,
            config.operation,
            config.params.len(),
            script.len()
        );

        let mut tx = InvocationTransaction::new(script);
        let fee = self.fee_estimator.estimate_fee(&self.client, &mut tx).await?;
        info!("Network fee {} (gas {})", fee, tx.gas);

        let selection = self.select_funding(&from, &fee_asset, fee).await?;

        let mut tx = TransactionAssembler::new(fee_asset).assemble(tx, fee, &from, &selection)?;

        if self.signer.script_hash() != from {
            warn!(
                "Signing key belongs to {}, not the paying address {}; the node will reject the witness",
                address::from_script_hash(&self.signer.script_hash()),
                config.from
            );
        }

        let witness = WitnessBuilder::sign(&tx, self.signer.as_ref())?;
        if !WitnessBuilder::verify(&tx, &witness)? {
            return Err(RelayerError::Wallet(
                "signature does not verify against the transaction".to_string(),
            ));
        }
        tx.witnesses.push(witness);

        let txid = tx.hash();
        let bytes = tx.to_bytes();
        let raw = hex::encode(&bytes);
        debug!("Signed transaction {} ({} bytes)", txid, bytes.len());

        let accepted = if config.dry_run {
            info!("Dry run: not broadcasting {}", txid);
            None
        } else {
            let accepted = self.client.send_raw_transaction(&bytes).await?;
            if accepted {
                info!("Transaction {} accepted by node", txid);
            } else {
                warn!("Transaction {} rejected by node", txid);
            }
            Some(accepted)
        };

        Ok(RunOutcome {
            txid,
            fee,
            raw,
            accepted,
        })
    }

    /// Query the paying address and pick inputs covering `fee`
    async fn select_funding(
        &self,
        from: &UInt160,
        fee_asset: &UInt256,
        fee: Fixed8,
    ) -> RelayerResult<Selection> {
        let holdings = self
            .client
            .get_unspents(&address::from_script_hash(from))
            .await?;

        let unspents: &[Unspent] = match CoinSelector::find_balance(&holdings, fee_asset) {
            Ok(balance) => balance.unspents.as_slice(),
            // Nothing to pay, so an address without the asset is fine
            Err(RelayerError::AssetNotFound { .. }) if fee.is_zero() => &[],
            Err(e) => return Err(e),
        };

        CoinSelector::select_inputs(unspents, fee)
    }
}
