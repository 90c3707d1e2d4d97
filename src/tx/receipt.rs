//! Receipt polling

use crate::chain::{ChainClient, ReceiptStatus};

use ethers::types::H256;
use std::time::Duration;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, error, info};

/// Waits for a broadcast transaction to be mined and classifies the result
#[derive(Debug, Clone)]
pub struct ReceiptPoller {
    /// Wait between polls while the receipt has no status yet
    pending_interval: Duration,
    /// Wait after a failed or empty lookup
    lookup_retry_interval: Duration,
}

impl ReceiptPoller {
    pub fn new() -> Self {
        Self {
            pending_interval: Duration::from_millis(300),
            lookup_retry_interval: Duration::from_secs(1),
        }
    }

    /// Poll until the receipt settles or `max_wait` passes.
    ///
    /// Returns `true` only for a status-1 receipt. A reverted receipt or a
    /// timeout both return `false`; neither is retried here.
    pub async fn poll<C: ChainClient + ?Sized>(
        &self,
        client: &C,
        who: &str,
        tx_hash: H256,
        max_wait: Duration,
    ) -> bool {
        let started = Instant::now();

        loop {
            let elapsed = started.elapsed();
            if elapsed > max_wait {
                error!("[{}] {:?} transaction is failed (timeout)", who, tx_hash);
                return false;
            }

            // a lookup that never answers must not outlive max_wait
            let lookup = timeout(max_wait - elapsed, client.receipt_status(tx_hash)).await;
            let Ok(lookup) = lookup else {
                error!("[{}] {:?} transaction is failed (timeout)", who, tx_hash);
                return false;
            };

            match lookup {
                Ok(Some(ReceiptStatus::Success)) => {
                    info!("[{}] {:?} is completed", who, tx_hash);
                    return true;
                }
                Ok(Some(ReceiptStatus::Reverted)) => {
                    error!("[{}] {:?} transaction is failed", who, tx_hash);
                    return false;
                }
                Ok(Some(ReceiptStatus::Pending)) => {
                    sleep(self.pending_interval).await;
                }
                Ok(None) => {
                    sleep(self.lookup_retry_interval).await;
                }
                Err(e) => {
                    debug!("[{}] receipt lookup for {:?} failed: {}", who, tx_hash, e);
                    sleep(self.lookup_retry_interval).await;
                }
            }
        }
    }
}

impl Default for ReceiptPoller {
    fn default() -> Self {
        Self::new()
    }
}
