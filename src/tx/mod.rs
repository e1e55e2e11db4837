//! Invocation transaction construction: script, fee, funding and witnesses

pub mod assembler;
pub mod fee;
pub mod script;
pub mod selector;
pub mod transaction;
pub mod witness;

pub use assembler::TransactionAssembler;
pub use fee::FeeEstimator;
pub use script::{ContractParam, ScriptBuilder};
pub use selector::{CoinSelector, Selection};
pub use transaction::{
    AttributeUsage, CoinReference, InvocationTransaction, TransactionAttribute, TransactionOutput,
    Witness,
};
pub use witness::WitnessBuilder;
