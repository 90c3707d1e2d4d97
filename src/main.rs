//! Mint Runner - sequential multi-chain NFT minting
//!
//! Loads a list of private keys and, for each account in random order, mints
//! from a fixed set of NFT contracts on the configured network, pacing calls
//! with randomized delays and retrying transient RPC failures.

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;

mod account;
mod chain;
mod config;
mod error;
mod mint;
mod pacing;
mod session;
mod tx;

use account::Account;
use config::Settings;
use mint::Minter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Initialize logging
    init_logging();

    info!("Starting Mint Runner v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let settings = Settings::load()?;
    let pool = settings.endpoint_pool();
    let minter = Minter::from_settings(&settings);
    let network = minter.network();
    info!(
        "Minting on {} ({} fees) with {:?} strategy: {} contracts, {} mints per account, up to {} attempts per mint",
        network,
        if tx::fee::uses_priority_fee(network) { "EIP-1559" } else { "legacy" },
        minter.strategy(),
        settings.contracts(network).len(),
        settings.runner.mint_amount,
        minter.submit_policy().max_attempts
    );

    // Load accounts
    let keys = session::load_keys(&settings.runner.keys_path)
        .with_context(|| format!("Failed to read keys from {:?}", settings.runner.keys_path))?;
    let mut rng = StdRng::from_entropy();
    let accounts = session::build_accounts(&keys, |key| {
        Account::connect(key, &pool, settings.rpc_timeout(), &mut rng)
    })?;
    info!(
        "Loaded {} accounts across {} networks",
        accounts.len(),
        pool.networks().len()
    );

    session::run(accounts, &minter, &mut rng).await;

    info!("Mint Runner stopped");
    Ok(())
}

fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,mint_runner=debug,hyper=warn,reqwest=warn"));

    // MINTER_LOG_JSON=1 switches to one JSON object per line
    let json = std::env::var_os("MINTER_LOG_JSON").is_some();

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| fmt::layer().json().with_target(true)))
        .with((!json).then(|| fmt::layer().with_target(true)))
        .init();
}
