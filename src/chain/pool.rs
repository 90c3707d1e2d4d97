//! Per-network RPC endpoint pools

use super::Network;
use crate::error::{MinterError, MinterResult};

use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashMap;

/// Candidate RPC URLs for each network, read-only after startup
#[derive(Debug, Clone, Default)]
pub struct EndpointPool {
    endpoints: HashMap<Network, Vec<String>>,
}

impl EndpointPool {
    /// Build a pool, dropping networks that have no URLs
    pub fn new(endpoints: HashMap<Network, Vec<String>>) -> Self {
        let endpoints = endpoints
            .into_iter()
            .filter(|(_, urls)| !urls.is_empty())
            .collect();
        Self { endpoints }
    }

    /// Networks with at least one endpoint, in a stable order
    pub fn networks(&self) -> Vec<Network> {
        let mut networks: Vec<_> = self.endpoints.keys().copied().collect();
        networks.sort();
        networks
    }

    pub fn endpoints(&self, network: Network) -> &[String] {
        self.endpoints
            .get(&network)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Pick one endpoint for a network uniformly at random
    pub fn choose<R: Rng + ?Sized>(&self, network: Network, rng: &mut R) -> MinterResult<&str> {
        self.endpoints(network)
            .choose(rng)
            .map(String::as_str)
            .ok_or(MinterError::NoEndpoint { network })
    }
}
