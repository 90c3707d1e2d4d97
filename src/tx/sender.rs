//! Transaction submission with bounded retries
//!
//! One attempt is: fresh fee fields, chain id and nonce, build, estimate gas
//! with a safety margin, sign, broadcast, then wait for the receipt. Any error
//! before the receipt wait ends the attempt and the next one starts from
//! scratch against current chain state.

use super::builder::{apply_gas_margin, build_transaction, ContractCall, TxParams};
use super::fee::fetch_fee_fields;
use super::receipt::ReceiptPoller;
use crate::account::Account;
use crate::chain::{ChainClient, Network};
use crate::error::{MinterError, MinterResult};
use crate::pacing::Pacer;

use ethers::signers::Signer;
use ethers::types::{Bytes, H256};
use rand::Rng;
use std::time::Duration;
use tracing::{debug, error, info};

/// Limits for one submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitPolicy {
    /// Sign/broadcast cycles before giving up
    pub max_attempts: u32,
    /// Gas limit as a percentage of the estimate
    pub gas_limit_percent: u64,
    /// How long to wait for a receipt
    pub receipt_timeout: Duration,
}

impl Default for SubmitPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            gas_limit_percent: 150,
            receipt_timeout: Duration::from_secs(500),
        }
    }
}

/// Result of a submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitOutcome {
    pub success: bool,
    /// Raw signed transaction of the attempt that reached the chain
    pub signed: Option<Bytes>,
    pub tx_hash: H256,
}

impl SubmitOutcome {
    /// Every attempt failed before a receipt could be awaited
    pub fn exhausted() -> Self {
        Self {
            success: false,
            signed: None,
            tx_hash: H256::zero(),
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.signed.is_none() && self.tx_hash.is_zero()
    }
}

/// Signs, broadcasts and confirms transactions for an account
#[derive(Debug, Clone)]
pub struct TransactionSubmitter {
    policy: SubmitPolicy,
    pacer: Pacer,
    poller: ReceiptPoller,
}

impl TransactionSubmitter {
    pub fn new(policy: SubmitPolicy, pacer: Pacer) -> Self {
        Self {
            policy,
            pacer,
            poller: ReceiptPoller::new(),
        }
    }

    pub fn policy(&self) -> &SubmitPolicy {
        &self.policy
    }

    /// Submit `call` from `account` on `network`.
    ///
    /// Never fails: after `max_attempts` erroring attempts the outcome is
    /// [`SubmitOutcome::exhausted`].
    pub async fn submit<C, R>(
        &self,
        account: &Account<C>,
        network: Network,
        call: &ContractCall,
        rng: &mut R,
    ) -> SubmitOutcome
    where
        C: ChainClient,
        R: Rng + ?Sized,
    {
        let who = account.label();
        let client = match account.client(network) {
            Ok(client) => client,
            Err(e) => {
                error!("[{}] cannot submit: {}", who, e);
                return SubmitOutcome::exhausted();
            }
        };

        let max_attempts = self.policy.max_attempts;
        for attempt in 1..=max_attempts {
            match self.broadcast(account, client, network, call, rng).await {
                Ok((signed, tx_hash)) => {
                    info!(
                        "[{}] sending txn: {:?} (attempt {}/{})",
                        who, tx_hash, attempt, max_attempts
                    );
                    let success = self
                        .poller
                        .poll(client, &who, tx_hash, self.policy.receipt_timeout)
                        .await;
                    return SubmitOutcome {
                        success,
                        signed: Some(signed),
                        tx_hash,
                    };
                }
                Err(e) => {
                    let kind = if e.is_retryable() { "transient" } else { "permanent" };
                    error!(
                        "[{}] got {} error (attempt {}/{}): {}",
                        who, kind, attempt, max_attempts, e
                    );
                    self.pacer.error_pause(&who, rng).await;
                }
            }
        }

        error!("[{}] giving up after {} attempts", who, max_attempts);
        SubmitOutcome::exhausted()
    }

    /// Build, sign and broadcast against current chain state
    async fn broadcast<C, R>(
        &self,
        account: &Account<C>,
        client: &C,
        network: Network,
        call: &ContractCall,
        rng: &mut R,
    ) -> MinterResult<(Bytes, H256)>
    where
        C: ChainClient,
        R: Rng + ?Sized,
    {
        let who = account.label();
        let fees = fetch_fee_fields(client, network, &self.pacer, &who, rng).await?;
        let chain_id = client.chain_id().await?;
        let nonce = client.transaction_count(account.address()).await?;

        let params = TxParams {
            chain_id,
            nonce,
            from: account.address(),
            fees,
        };
        let mut tx = build_transaction(call, &params);

        let estimate = client.estimate_gas(&tx).await?;
        let gas_limit = apply_gas_margin(estimate, self.policy.gas_limit_percent);
        tx.set_gas(gas_limit);
        debug!(
            "[{}] nonce {} gas {} (estimate {}), max cost {} wei",
            who,
            nonce,
            gas_limit,
            estimate,
            fees.max_cost(gas_limit)
        );

        let signature = account
            .wallet()
            .clone()
            .with_chain_id(chain_id)
            .sign_transaction(&tx)
            .await
            .map_err(|e| MinterError::Wallet(e.to_string()))?;
        let signed = tx.rlp_signed(&signature);

        let tx_hash = client.send_raw_transaction(signed.clone()).await?;
        Ok((signed, tx_hash))
    }
}
