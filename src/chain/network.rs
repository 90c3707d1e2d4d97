//! Supported networks

use crate::error::MinterError;

use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Networks the runner knows how to price and submit on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Ethereum,
    Arbitrum,
    Optimism,
    Base,
    Linea,
    Polygon,
    Avalanche,
    Zora,
    Scroll,
    Zksync,
}

impl Network {
    pub const ALL: [Network; 10] = [
        Network::Ethereum,
        Network::Arbitrum,
        Network::Optimism,
        Network::Base,
        Network::Linea,
        Network::Polygon,
        Network::Avalanche,
        Network::Zora,
        Network::Scroll,
        Network::Zksync,
    ];

    /// Config / log name of the network
    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Ethereum => "ethereum",
            Network::Arbitrum => "arbitrum",
            Network::Optimism => "optimism",
            Network::Base => "base",
            Network::Linea => "linea",
            Network::Polygon => "polygon",
            Network::Avalanche => "avalanche",
            Network::Zora => "zora",
            Network::Scroll => "scroll",
            Network::Zksync => "zksync",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = MinterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Network::ALL
            .into_iter()
            .find(|n| n.as_str() == wanted)
            .ok_or_else(|| MinterError::UnknownNetwork(s.to_string()))
    }
}
