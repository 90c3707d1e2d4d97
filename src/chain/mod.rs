//! Chain module - network identifiers, RPC endpoint selection and the client seam
//!
//! This module provides:
//! - The closed set of supported networks
//! - Per-network RPC endpoint pools with random selection
//! - The `ChainClient` trait every RPC-touching component is written against
//! - An ethers-backed HTTP implementation of that trait

pub mod contract;
pub mod network;
pub mod pool;
pub mod provider;

pub use network::Network;
pub use pool::EndpointPool;
pub use provider::ChainProvider;

use crate::error::MinterResult;

use async_trait::async_trait;
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, Bytes, H256, U256, U64};

/// State of a transaction receipt once the node has indexed it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiptStatus {
    /// Receipt is visible but carries no status yet
    Pending,
    /// Status 1
    Success,
    /// Any other status
    Reverted,
}

impl ReceiptStatus {
    pub fn from_status(status: Option<U64>) -> Self {
        match status {
            None => ReceiptStatus::Pending,
            Some(s) if s == U64::from(1) => ReceiptStatus::Success,
            Some(_) => ReceiptStatus::Reverted,
        }
    }
}

/// RPC operations the runner needs from one network
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChainClient: Send + Sync {
    async fn chain_id(&self) -> MinterResult<u64>;

    async fn gas_price(&self) -> MinterResult<U256>;

    /// Transaction count at the latest block, used as the next nonce
    async fn transaction_count(&self, address: Address) -> MinterResult<U256>;

    async fn estimate_gas(&self, tx: &TypedTransaction) -> MinterResult<U256>;

    async fn send_raw_transaction(&self, raw: Bytes) -> MinterResult<H256>;

    /// `Ok(None)` while the node has not indexed the transaction yet
    async fn receipt_status(&self, tx_hash: H256) -> MinterResult<Option<ReceiptStatus>>;

    /// `getPrice()` on a mint contract
    async fn mint_price(&self, contract: Address) -> MinterResult<U256>;

    /// `balanceOf(owner)` on a mint contract
    async fn balance_of(&self, contract: Address, owner: Address) -> MinterResult<U256>;
}
