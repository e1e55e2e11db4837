//! Node access over JSON-RPC
//!
//! This module provides:
//! - An owned HTTP transport, substitutable behind the `Transport` trait
//! - JSON-RPC 2.0 envelope encoding and error mapping
//! - Typed wrappers for the node queries the relayer needs

pub mod client;
pub mod envelope;
pub mod models;
pub mod transport;

pub use client::RpcClient;
pub use envelope::{RpcRequest, RpcResponse, RpcResponseError};
pub use models::{RpcInvokeResult, RpcUnspent, Unspent, UnspentBalance};
pub use transport::{HttpTransport, Transport};
