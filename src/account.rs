//! Signing accounts and their per-network RPC clients

use crate::chain::{ChainClient, ChainProvider, EndpointPool, Network};
use crate::error::{MinterError, MinterResult};

use ethers::signers::{LocalWallet, Signer};
use ethers::types::Address;
use rand::Rng;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// A wallet plus the RPC clients it talks through.
///
/// Every account owns its own client registry; nothing is shared between
/// accounts.
pub struct Account<C = ChainProvider> {
    wallet: LocalWallet,
    clients: HashMap<Network, C>,
}

impl Account<ChainProvider> {
    /// Parse `key` and open one client per network in `pool`, each on a
    /// randomly chosen endpoint and with `request_timeout` on every call.
    pub fn connect<R: Rng + ?Sized>(
        key: &str,
        pool: &EndpointPool,
        request_timeout: Duration,
        rng: &mut R,
    ) -> MinterResult<Self> {
        let wallet = parse_key(key)?;
        let mut clients = HashMap::new();

        for network in pool.networks() {
            let client = ChainProvider::new(network, pool.choose(network, rng)?)?
                .with_request_timeout(request_timeout);
            debug!(
                "[{:?}] using {} for {}",
                wallet.address(),
                client.url(),
                client.network()
            );
            clients.insert(network, client);
        }

        Ok(Self::new(wallet, clients))
    }
}

impl<C: ChainClient> Account<C> {
    pub fn new(wallet: LocalWallet, clients: HashMap<Network, C>) -> Self {
        Self { wallet, clients }
    }

    pub fn address(&self) -> Address {
        self.wallet.address()
    }

    /// Log prefix for this account
    pub fn label(&self) -> String {
        format!("{:?}", self.address())
    }

    pub fn wallet(&self) -> &LocalWallet {
        &self.wallet
    }

    pub fn client(&self, network: Network) -> MinterResult<&C> {
        self.clients
            .get(&network)
            .ok_or(MinterError::NoEndpoint { network })
    }
}

/// Parse a hex private key, with or without `0x`
pub fn parse_key(key: &str) -> MinterResult<LocalWallet> {
    key.trim()
        .parse::<LocalWallet>()
        .map_err(|e| MinterError::Wallet(format!("Invalid private key: {}", e)))
}
