//! NEO Invoke Relayer - one contract invocation per run
//!
//! Reads the invocation from configuration, funds the network fee from the
//! sender's unspent outputs, signs and broadcasts the transaction.

use anyhow::{Context, Result};
use tracing::{error, info, warn};

use neo_invoke_relayer::config::Settings;
use neo_invoke_relayer::rpc::RpcClient;
use neo_invoke_relayer::wallet::load_key_pair;
use neo_invoke_relayer::InvocationEngine;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    init_logging();

    info!("Starting NEO Invoke Relayer v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let settings = Settings::load()?;
    info!(
        "Loaded configuration: {}.{} from {}",
        settings.invocation.contract, settings.invocation.operation, settings.invocation.from
    );

    let client = RpcClient::from_config(&settings.rpc)
        .with_context(|| format!("Failed to set up RPC client for {}", settings.rpc.url))?;
    let key_pair = load_key_pair(&settings.wallet)?;

    let engine = InvocationEngine::new(client, Box::new(key_pair));
    probe_node(&engine).await;

    match engine.run(&settings.invocation).await {
        Ok(outcome) => {
            info!("Transaction id: {}", outcome.txid);
            info!("Network fee: {}", outcome.fee);
            match outcome.accepted {
                Some(true) => info!("Node accepted the transaction"),
                Some(false) => warn!("Node rejected the transaction"),
                None => info!("Signed transaction: {}", outcome.raw),
            }
            Ok(())
        }
        Err(e) => {
            error!("Invocation failed (retryable: {}): {}", e.is_retryable(), e);
            Err(e).context("Invocation failed")
        }
    }
}

/// Log what the node reports about itself; failures only warn
async fn probe_node(engine: &InvocationEngine) {
    let client = engine.client();
    match client.get_block_count().await {
        Ok(height) => info!("Node block count: {}", height),
        Err(e) => warn!("Failed to query block count: {}", e),
    }
    if let Ok(hash) = client.get_best_block_hash().await {
        info!("Best block: {}", hash);
    }
    match client.get_connection_count().await {
        Ok(0) => warn!("Node reports no peer connections"),
        Ok(peers) => info!("Node peers: {}", peers),
        Err(e) => warn!("Failed to query peer count: {}", e),
    }
}

fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("info,neo_invoke_relayer=debug,reqwest=warn,hyper=warn")
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .init();
}
