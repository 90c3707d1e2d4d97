//! Per-network fee policy
//!
//! Networks in the priority-fee group get EIP-1559 transactions with
//! `maxFeePerGas` set to the node's gas price and a network-specific tip.
//! Every other network gets a legacy transaction priced at the node's gas
//! price.

use crate::chain::{ChainClient, Network};
use crate::error::MinterResult;
use crate::pacing::Pacer;

use ethers::types::U256;
use rand::Rng;
use tracing::debug;

const GWEI: u64 = 1_000_000_000;

/// Fee fields to merge into an unsigned transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeeFields {
    Legacy {
        gas_price: U256,
    },
    PriorityFee {
        max_fee_per_gas: U256,
        max_priority_fee_per_gas: U256,
    },
}

impl FeeFields {
    /// Upper bound on what a transaction with this gas limit can cost
    pub fn max_cost(&self, gas_limit: U256) -> U256 {
        match self {
            FeeFields::Legacy { gas_price } => gas_limit * *gas_price,
            FeeFields::PriorityFee {
                max_fee_per_gas, ..
            } => gas_limit * *max_fee_per_gas,
        }
    }
}

/// How the priority tip is chosen on a priority-fee network
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PriorityTip {
    /// A fixed amount of wei
    Fixed(u64),
    /// Same as the current gas price
    MatchGasPrice,
}

fn priority_tip(network: Network) -> Option<PriorityTip> {
    match network {
        Network::Polygon => Some(PriorityTip::Fixed(30 * GWEI)),
        Network::Ethereum => Some(PriorityTip::Fixed(GWEI / 20)),
        Network::Arbitrum => Some(PriorityTip::Fixed(GWEI / 100)),
        Network::Avalanche | Network::Base | Network::Optimism | Network::Linea => {
            Some(PriorityTip::MatchGasPrice)
        }
        Network::Zora | Network::Scroll | Network::Zksync => None,
    }
}

/// Whether `network` takes type-2 transactions
pub fn uses_priority_fee(network: Network) -> bool {
    priority_tip(network).is_some()
}

/// Fee fields for `network` given its current gas price
pub fn fee_fields(network: Network, gas_price: U256) -> FeeFields {
    match priority_tip(network) {
        None => FeeFields::Legacy { gas_price },
        Some(tip) => FeeFields::PriorityFee {
            max_fee_per_gas: gas_price,
            max_priority_fee_per_gas: match tip {
                PriorityTip::Fixed(wei) => U256::from(wei),
                PriorityTip::MatchGasPrice => gas_price,
            },
        },
    }
}

/// Read the current gas price (retrying transient failures) and derive fee fields
pub async fn fetch_fee_fields<C, R>(
    client: &C,
    network: Network,
    pacer: &Pacer,
    who: &str,
    rng: &mut R,
) -> MinterResult<FeeFields>
where
    C: ChainClient + ?Sized,
    R: Rng + ?Sized,
{
    let gas_price = pacer
        .retry_query(who, "gas price", rng, || client.gas_price())
        .await?;

    let fees = fee_fields(network, gas_price);
    debug!("[{}] fees on {}: {:?}", who, network, fees);
    Ok(fees)
}
