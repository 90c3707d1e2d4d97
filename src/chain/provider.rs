//! HTTP chain client backed by an ethers provider

use super::contract::MintContract;
use super::{ChainClient, Network, ReceiptStatus};
use crate::error::{MinterError, MinterResult};

use async_trait::async_trait;
use ethers::prelude::*;
use ethers::providers::{Http, Provider};
use ethers::types::transaction::eip2718::TypedTransaction;
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;

/// Upper bound on a single RPC request
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// One RPC connection to one network
pub struct ChainProvider {
    network: Network,
    url: String,
    http: Arc<Provider<Http>>,
    request_timeout: Duration,
}

impl ChainProvider {
    /// Create a provider for a single endpoint
    pub fn new(network: Network, url: &str) -> MinterResult<Self> {
        let provider = Provider::<Http>::try_from(url)
            .map_err(|e| MinterError::Config(format!("Invalid RPC URL {} for {}: {}", url, network, e)))?
            .interval(Duration::from_millis(100));

        debug!("Created HTTP provider for {}: {}", network, url);

        Ok(Self {
            network,
            url: url.to_string(),
            http: Arc::new(provider),
            request_timeout: REQUEST_TIMEOUT,
        })
    }

    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn rpc_error(&self, e: impl Display) -> MinterError {
        MinterError::Rpc {
            network: self.network,
            message: e.to_string(),
        }
    }

    /// Run one request, turning a node that stops answering into a timeout
    async fn timed<T, F>(&self, operation: &str, request: F) -> MinterResult<T>
    where
        F: Future<Output = MinterResult<T>>,
    {
        timeout(self.request_timeout, request)
            .await
            .map_err(|_| MinterError::Timeout {
                operation: format!("{} on {}", operation, self.network),
            })?
    }

    fn contract(&self, address: Address) -> MintContract<Provider<Http>> {
        MintContract::new(address, self.http.clone())
    }
}

#[async_trait]
impl ChainClient for ChainProvider {
    async fn chain_id(&self) -> MinterResult<u64> {
        let id = self
            .timed("eth_chainId", async {
                self.http.get_chainid().await.map_err(|e| self.rpc_error(e))
            })
            .await?;
        Ok(id.as_u64())
    }

    async fn gas_price(&self) -> MinterResult<U256> {
        self.timed("eth_gasPrice", async {
            self.http.get_gas_price().await.map_err(|e| self.rpc_error(e))
        })
        .await
    }

    async fn transaction_count(&self, address: Address) -> MinterResult<U256> {
        self.timed("eth_getTransactionCount", async {
            self.http
                .get_transaction_count(address, None)
                .await
                .map_err(|e| self.rpc_error(e))
        })
        .await
    }

    async fn estimate_gas(&self, tx: &TypedTransaction) -> MinterResult<U256> {
        self.timed("eth_estimateGas", async {
            self.http
                .estimate_gas(tx, None)
                .await
                .map_err(|e| MinterError::GasEstimation(format!("{}: {}", self.network, e)))
        })
        .await
    }

    async fn send_raw_transaction(&self, raw: Bytes) -> MinterResult<H256> {
        self.timed("eth_sendRawTransaction", async {
            let pending = self
                .http
                .send_raw_transaction(raw)
                .await
                .map_err(|e| self.rpc_error(e))?;
            Ok(pending.tx_hash())
        })
        .await
    }

    async fn receipt_status(&self, tx_hash: H256) -> MinterResult<Option<ReceiptStatus>> {
        let receipt = self
            .timed("eth_getTransactionReceipt", async {
                self.http
                    .get_transaction_receipt(tx_hash)
                    .await
                    .map_err(|e| self.rpc_error(e))
            })
            .await?;
        Ok(receipt.map(|r| ReceiptStatus::from_status(r.status)))
    }

    async fn mint_price(&self, contract: Address) -> MinterResult<U256> {
        self.timed("getPrice", async {
            self.contract(contract)
                .get_price()
                .call()
                .await
                .map_err(|e| MinterError::Contract(format!("getPrice on {:?}: {}", contract, e)))
        })
        .await
    }

    async fn balance_of(&self, contract: Address, owner: Address) -> MinterResult<U256> {
        self.timed("balanceOf", async {
            self.contract(contract)
                .balance_of(owner)
                .call()
                .await
                .map_err(|e| MinterError::Contract(format!("balanceOf on {:?}: {}", contract, e)))
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_malformed_url() {
        let err = ChainProvider::new(Network::Base, "not a url").err().unwrap();
        assert!(matches!(err, MinterError::Config(_)));
    }

    #[test]
    fn keeps_network_and_url() {
        let provider = ChainProvider::new(Network::Linea, "https://rpc.linea.example").unwrap();
        assert_eq!(provider.network(), Network::Linea);
        assert_eq!(provider.url(), "https://rpc.linea.example");
    }

    #[tokio::test]
    async fn silent_endpoint_times_out() {
        // the kernel completes the handshake but nobody ever reads the request
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let provider = ChainProvider::new(Network::Scroll, &url)
            .unwrap()
            .with_request_timeout(Duration::from_millis(200));

        let err = provider.gas_price().await.unwrap_err();

        assert!(matches!(
            err,
            MinterError::Timeout { ref operation } if operation == "eth_gasPrice on scroll"
        ));
        assert!(err.is_retryable());
        drop(listener);
    }
}
