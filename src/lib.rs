//! NEO invocation relayer
//!
//! Builds a single invocation transaction for a contract call, prices it
//! against the node, funds the fee from the sender's unspent outputs, signs it
//! and broadcasts it over JSON-RPC.

pub mod config;
pub mod crypto;
pub mod engine;
pub mod error;
pub mod rpc;
pub mod tx;
pub mod types;
pub mod wallet;

pub use engine::{InvocationEngine, RunOutcome};
pub use error::{RelayerError, RelayerResult};
