//! Mint strategies
//!
//! Two variants, selected by `advanced_mint_mode`:
//! - `Unconditional`: mint N random contracts, repeats allowed
//! - `SkipOwned`: only contracts the account holds none of, each at most once

mod candidates;

pub use candidates::CandidateSet;

use crate::account::Account;
use crate::chain::contract::encode_safe_mint;
use crate::chain::{ChainClient, Network};
use crate::config::Settings;
use crate::pacing::{Pacer, RandomRange};
use crate::tx::{ContractCall, SubmitPolicy, TransactionSubmitter};

use ethers::types::{Address, U256};
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MintStrategy {
    Unconditional,
    SkipOwned,
}

impl MintStrategy {
    pub fn from_advanced_mode(advanced: bool) -> Self {
        if advanced {
            MintStrategy::SkipOwned
        } else {
            MintStrategy::Unconditional
        }
    }
}

/// Mint attempts made for one account
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MintReport {
    pub attempted: u32,
    pub succeeded: u32,
}

impl MintReport {
    fn record(&mut self, success: bool) {
        self.attempted += 1;
        if success {
            self.succeeded += 1;
        }
    }
}

/// Runs the configured strategy against one network's contracts
pub struct Minter {
    strategy: MintStrategy,
    network: Network,
    contracts: Vec<Address>,
    referral: Address,
    mint_amount: RandomRange,
    pacer: Pacer,
    submitter: TransactionSubmitter,
}

impl Minter {
    pub fn new(
        strategy: MintStrategy,
        network: Network,
        contracts: Vec<Address>,
        referral: Address,
        mint_amount: RandomRange,
        pacer: Pacer,
        policy: SubmitPolicy,
    ) -> Self {
        let submitter = TransactionSubmitter::new(policy, pacer.clone());
        Self {
            strategy,
            network,
            contracts,
            referral,
            mint_amount,
            pacer,
            submitter,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        let runner = &settings.runner;
        let network = runner.network;
        let pacer = Pacer::new(runner.task_sleep, runner.error_sleep, settings.query_timeout());
        let policy = SubmitPolicy {
            max_attempts: settings.max_submit_attempts(network),
            gas_limit_percent: runner.gas_limit_percent,
            receipt_timeout: settings.receipt_timeout(network),
        };

        Self::new(
            MintStrategy::from_advanced_mode(runner.advanced_mint_mode),
            network,
            settings.contracts(network).to_vec(),
            runner.referral,
            runner.mint_amount,
            pacer,
            policy,
        )
    }

    pub fn strategy(&self) -> MintStrategy {
        self.strategy
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn submit_policy(&self) -> &SubmitPolicy {
        self.submitter.policy()
    }

    /// Run the configured strategy for one account
    pub async fn run<C, R>(&self, account: &Account<C>, rng: &mut R) -> MintReport
    where
        C: ChainClient,
        R: Rng + ?Sized,
    {
        match self.strategy {
            MintStrategy::Unconditional => self.run_unconditional(account, rng).await,
            MintStrategy::SkipOwned => self.run_skip_owned(account, rng).await,
        }
    }

    async fn run_unconditional<C, R>(&self, account: &Account<C>, rng: &mut R) -> MintReport
    where
        C: ChainClient,
        R: Rng + ?Sized,
    {
        let who = account.label();
        let mut report = MintReport::default();

        let amount = self.mint_amount.sample(rng);
        info!("[{}] going to mint {} NFTs on {}", who, amount, self.network);

        for _ in 0..amount {
            let Some(&contract) = self.contracts.choose(rng) else {
                warn!("[{}] no contracts configured for {}", who, self.network);
                break;
            };
            let success = self.mint_one(account, contract, rng).await;
            report.record(success);
        }

        report
    }

    async fn run_skip_owned<C, R>(&self, account: &Account<C>, rng: &mut R) -> MintReport
    where
        C: ChainClient,
        R: Rng + ?Sized,
    {
        let who = account.label();
        let mut report = MintReport::default();

        let amount = self.mint_amount.sample(rng);
        let mut candidates = self.unminted_contracts(account, rng).await;
        if candidates.is_empty() {
            info!("[{}] all minted", who);
            return report;
        }
        info!(
            "[{}] going to mint {} NFTs on {} ({} not yet owned)",
            who,
            amount,
            self.network,
            candidates.len()
        );

        for _ in 0..amount {
            let Some(contract) = candidates.take(rng) else {
                info!("[{}] all minted", who);
                break;
            };
            let success = self.mint_one(account, contract, rng).await;
            report.record(success);
        }

        report
    }

    /// Contracts on which the account holds no token.
    ///
    /// A contract whose balance cannot be read before the query timeout is
    /// left out, so it is never minted twice by mistake.
    pub async fn unminted_contracts<C, R>(&self, account: &Account<C>, rng: &mut R) -> CandidateSet
    where
        C: ChainClient,
        R: Rng + ?Sized,
    {
        let who = account.label();
        let client = match account.client(self.network) {
            Ok(client) => client,
            Err(e) => {
                error!("[{}] {}", who, e);
                return CandidateSet::default();
            }
        };
        let owner = account.address();

        let mut remaining = Vec::new();
        for &contract in &self.contracts {
            let balance = self
                .pacer
                .retry_query(&who, "balanceOf", rng, || client.balance_of(contract, owner))
                .await;
            match balance {
                Ok(balance) if balance.is_zero() => remaining.push(contract),
                Ok(_) => {}
                Err(e) => warn!("[{}] skipping {:?}: {}", who, contract, e),
            }
        }

        CandidateSet::new(remaining)
    }

    /// Read the price, submit `safeMint(referral)` paying it, then pause.
    async fn mint_one<C, R>(&self, account: &Account<C>, contract: Address, rng: &mut R) -> bool
    where
        C: ChainClient,
        R: Rng + ?Sized,
    {
        let who = account.label();
        let client = match account.client(self.network) {
            Ok(client) => client,
            Err(e) => {
                error!("[{}] {}", who, e);
                return false;
            }
        };

        let price: U256 = match self
            .pacer
            .retry_query(&who, "getPrice", rng, || client.mint_price(contract))
            .await
        {
            Ok(price) => price,
            Err(e) => {
                error!("[{}] abandoning mint on {:?}: {}", who, contract, e);
                return false;
            }
        };

        let call = ContractCall {
            to: contract,
            data: encode_safe_mint(self.referral),
            value: price,
        };
        let outcome = self.submitter.submit(account, self.network, &call, rng).await;
        if outcome.is_exhausted() {
            error!("[{}] mint on {:?} was never broadcast", who, contract);
        }

        self.pacer.task_pause(&who, rng).await;
        outcome.success
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::tests::test_wallet;
    use crate::chain::{MockChainClient, ReceiptStatus};
    use crate::error::MinterError;
    use ethers::types::H256;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::{HashMap, HashSet};
    use std::sync::{Arc, Mutex};

    fn contracts(n: u64) -> Vec<Address> {
        (1..=n).map(|i| Address::from_low_u64_be(0x1000 + i)).collect()
    }

    fn minter(strategy: MintStrategy, contracts: Vec<Address>, amount: (u64, u64)) -> Minter {
        Minter::new(
            strategy,
            Network::Base,
            contracts,
            Address::from_low_u64_be(0xaa),
            RandomRange::new(amount.0, amount.1).unwrap(),
            Pacer::new(
                RandomRange::new(1, 3).unwrap(),
                RandomRange::new(1, 2).unwrap(),
                None,
            ),
            SubmitPolicy {
                max_attempts: 2,
                ..SubmitPolicy::default()
            },
        )
    }

    /// A chain on which every mint reaches a receipt with `status`;
    /// records the contract of each price read.
    fn minting_chain(status: ReceiptStatus, priced: Arc<Mutex<Vec<Address>>>) -> MockChainClient {
        let mut client = MockChainClient::new();
        client.expect_mint_price().returning(move |contract| {
            priced.lock().unwrap().push(contract);
            Ok(U256::from(1_000u64))
        });
        client.expect_gas_price().returning(|| Ok(U256::from(10u64)));
        client.expect_chain_id().returning(|| Ok(8453));
        client
            .expect_transaction_count()
            .returning(|_| Ok(U256::zero()));
        client
            .expect_estimate_gas()
            .returning(|_| Ok(U256::from(90_000u64)));
        client
            .expect_send_raw_transaction()
            .returning(|_| Ok(H256::repeat_byte(0xab)));
        client
            .expect_receipt_status()
            .returning(move |_| Ok(Some(status)));
        client
    }

    fn account(client: MockChainClient) -> Account<MockChainClient> {
        Account::new(test_wallet(), HashMap::from([(Network::Base, client)]))
    }

    #[test]
    fn strategy_follows_advanced_flag() {
        assert_eq!(MintStrategy::from_advanced_mode(true), MintStrategy::SkipOwned);
        assert_eq!(MintStrategy::from_advanced_mode(false), MintStrategy::Unconditional);
    }

    #[tokio::test(start_paused = true)]
    async fn unconditional_mints_exact_amount() {
        let priced = Arc::new(Mutex::new(Vec::new()));
        let account = account(minting_chain(ReceiptStatus::Success, priced.clone()));
        let list = contracts(5);
        let mut rng = StdRng::seed_from_u64(21);

        let report = minter(MintStrategy::Unconditional, list.clone(), (2, 2))
            .run(&account, &mut rng)
            .await;

        assert_eq!(report, MintReport { attempted: 2, succeeded: 2 });
        let priced = priced.lock().unwrap();
        assert_eq!(priced.len(), 2);
        assert!(priced.iter().all(|c| list.contains(c)));
    }

    #[tokio::test(start_paused = true)]
    async fn unconditional_picks_with_replacement() {
        let priced = Arc::new(Mutex::new(Vec::new()));
        let account = account(minting_chain(ReceiptStatus::Reverted, priced.clone()));
        let list = contracts(1);
        let mut rng = StdRng::seed_from_u64(21);

        let report = minter(MintStrategy::Unconditional, list.clone(), (3, 3))
            .run(&account, &mut rng)
            .await;

        // failures still count and do not stop the run
        assert_eq!(report, MintReport { attempted: 3, succeeded: 0 });
        assert_eq!(*priced.lock().unwrap(), vec![list[0]; 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn unminted_contracts_exclude_owned() {
        let list = contracts(10);
        let owned: HashSet<Address> = [list[2], list[6]].into_iter().collect();
        let mut client = MockChainClient::new();
        let held = owned.clone();
        client.expect_balance_of().times(10).returning(move |contract, _| {
            Ok(if held.contains(&contract) {
                U256::one()
            } else {
                U256::zero()
            })
        });
        let account = account(client);
        let mut rng = StdRng::seed_from_u64(3);

        let candidates = minter(MintStrategy::SkipOwned, list.clone(), (1, 1))
            .unminted_contracts(&account, &mut rng)
            .await;

        assert_eq!(candidates.len(), 8);
        for contract in &list {
            assert_eq!(candidates.contains(contract), !owned.contains(contract));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn skip_owned_attempts_each_candidate_once() {
        let list = contracts(10);
        let owned: HashSet<Address> = [list[2], list[6]].into_iter().collect();
        let priced = Arc::new(Mutex::new(Vec::new()));
        let mut client = minting_chain(ReceiptStatus::Reverted, priced.clone());
        let held = owned.clone();
        client.expect_balance_of().returning(move |contract, _| {
            Ok(if held.contains(&contract) {
                U256::one()
            } else {
                U256::zero()
            })
        });
        let account = account(client);
        let mut rng = StdRng::seed_from_u64(8);

        let report = minter(MintStrategy::SkipOwned, list, (20, 20))
            .run(&account, &mut rng)
            .await;

        // stops early once every unowned contract was tried
        assert_eq!(report.attempted, 8);
        let priced = priced.lock().unwrap();
        let distinct: HashSet<_> = priced.iter().copied().collect();
        assert_eq!(distinct.len(), 8);
        assert!(distinct.is_disjoint(&owned));
    }

    #[tokio::test(start_paused = true)]
    async fn skip_owned_stops_when_everything_is_owned() {
        let mut client = MockChainClient::new();
        client
            .expect_balance_of()
            .returning(|_, _| Ok(U256::from(2u64)));
        client.expect_mint_price().never();
        let account = account(client);
        let mut rng = StdRng::seed_from_u64(8);

        let report = minter(MintStrategy::SkipOwned, contracts(4), (2, 3))
            .run(&account, &mut rng)
            .await;

        assert_eq!(report, MintReport::default());
    }

    #[tokio::test(start_paused = true)]
    async fn unreadable_balance_is_skipped_when_queries_are_bounded() {
        let list = contracts(2);
        let broken = list[0];
        let mut client = MockChainClient::new();
        client.expect_balance_of().returning(move |contract, _| {
            if contract == broken {
                Err(MinterError::Contract("execution reverted".to_string()))
            } else {
                Ok(U256::zero())
            }
        });
        let account = account(client);
        let mut rng = StdRng::seed_from_u64(8);
        let mut bounded = minter(MintStrategy::SkipOwned, list.clone(), (1, 1));
        bounded.pacer = Pacer::new(
            RandomRange::new(1, 1).unwrap(),
            RandomRange::new(1, 1).unwrap(),
            Some(std::time::Duration::from_secs(5)),
        );

        let candidates = bounded.unminted_contracts(&account, &mut rng).await;

        assert_eq!(candidates.len(), 1);
        assert!(candidates.contains(&list[1]));
    }
}
