//! Session driver: keys in, accounts shuffled, strategy run per account

use crate::account::Account;
use crate::chain::ChainClient;
use crate::error::MinterResult;
use crate::mint::Minter;

use rand::seq::SliceRandom;
use rand::Rng;
use std::path::Path;
use tracing::info;

/// Totals across all accounts of a session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSummary {
    pub accounts: usize,
    pub attempted: u32,
    pub succeeded: u32,
}

/// One key per non-blank line
pub fn parse_keys(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn load_keys(path: &Path) -> MinterResult<Vec<String>> {
    let text = std::fs::read_to_string(path)?;
    Ok(parse_keys(&text))
}

/// Build one account per key
pub fn build_accounts<C, F>(keys: &[String], mut connect: F) -> MinterResult<Vec<Account<C>>>
where
    C: ChainClient,
    F: FnMut(&str) -> MinterResult<Account<C>>,
{
    keys.iter().map(|key| connect(key.as_str())).collect()
}

/// Process every account, in random order, one after another
pub async fn run<C, R>(mut accounts: Vec<Account<C>>, minter: &Minter, rng: &mut R) -> SessionSummary
where
    C: ChainClient,
    R: Rng + ?Sized,
{
    accounts.shuffle(rng);

    let mut summary = SessionSummary {
        accounts: accounts.len(),
        ..SessionSummary::default()
    };

    for account in &accounts {
        info!("[{}] in work now", account.label());
        let report = minter.run(account, rng).await;
        info!(
            "[{}] done: {}/{} mints succeeded",
            account.label(),
            report.succeeded,
            report.attempted
        );
        summary.attempted += report.attempted;
        summary.succeeded += report.succeeded;
    }

    info!(
        "Session finished: {} accounts, {}/{} mints succeeded",
        summary.accounts, summary.succeeded, summary.attempted
    );
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::parse_key;
    use crate::account::tests::KEYS;
    use crate::chain::{MockChainClient, Network, ReceiptStatus};
    use crate::error::MinterError;
    use crate::mint::MintStrategy;
    use crate::pacing::{Pacer, RandomRange};
    use crate::tx::SubmitPolicy;
    use ethers::signers::Signer;
    use ethers::types::{Address, H256, U256};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashMap;
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    fn offline(key: &str) -> MinterResult<Account<MockChainClient>> {
        Ok(Account::new(parse_key(key)?, HashMap::new()))
    }

    #[test]
    fn blank_lines_are_skipped() {
        let text = format!("{}\n\n  \n{}\r\n{}\n\n", KEYS[0], KEYS[1], KEYS[2]);
        assert_eq!(parse_keys(&text), KEYS.to_vec());
        assert!(parse_keys("\n\n").is_empty());
    }

    #[test]
    fn load_keys_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{}\n\n{}", KEYS[0], KEYS[1]).unwrap();

        let keys = load_keys(file.path()).unwrap();

        assert_eq!(keys, vec![KEYS[0].to_string(), KEYS[1].to_string()]);
    }

    #[test]
    fn load_keys_missing_file_is_io_error() {
        let err = load_keys(Path::new("/definitely/not/here/privates.txt")).unwrap_err();
        assert!(matches!(err, MinterError::Io(_)));
    }

    #[test]
    fn one_account_per_key() {
        let keys = parse_keys(&format!("{}\n\n{}\n", KEYS[0], KEYS[2]));
        let accounts = build_accounts(&keys, offline).unwrap();

        let addresses: Vec<_> = accounts.iter().map(|a| a.address()).collect();
        let expected: Vec<_> = [KEYS[0], KEYS[2]]
            .iter()
            .map(|k| parse_key(k).unwrap().address())
            .collect();
        assert_eq!(addresses, expected);
    }

    #[test]
    fn bad_key_fails_account_building() {
        let keys = vec![KEYS[0].to_string(), "0xnope".to_string()];
        assert!(build_accounts(&keys, offline).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn every_account_is_processed_once_in_shuffled_order() {
        let senders = Arc::new(Mutex::new(Vec::new()));
        let keys: Vec<String> = KEYS.iter().map(|k| k.to_string()).collect();

        let accounts = build_accounts(&keys, |key| {
            let wallet = parse_key(key)?;
            let owner = wallet.address();
            let seen = senders.clone();
            let mut client = MockChainClient::new();
            client.expect_mint_price().returning(move |_| {
                seen.lock().unwrap().push(owner);
                Ok(U256::from(5u64))
            });
            client.expect_gas_price().returning(|| Ok(U256::from(10u64)));
            client.expect_chain_id().returning(|| Ok(7777777));
            client
                .expect_transaction_count()
                .returning(|_| Ok(U256::zero()));
            client
                .expect_estimate_gas()
                .returning(|_| Ok(U256::from(70_000u64)));
            client
                .expect_send_raw_transaction()
                .returning(|_| Ok(H256::repeat_byte(1)));
            client
                .expect_receipt_status()
                .returning(|_| Ok(Some(ReceiptStatus::Success)));
            Ok(Account::new(wallet, HashMap::from([(Network::Zora, client)])))
        })
        .unwrap();

        let minter = Minter::new(
            MintStrategy::Unconditional,
            Network::Zora,
            vec![Address::from_low_u64_be(0x77)],
            Address::from_low_u64_be(0xaa),
            RandomRange::new(1, 1).unwrap(),
            Pacer::new(
                RandomRange::new(1, 1).unwrap(),
                RandomRange::new(1, 1).unwrap(),
                None,
            ),
            SubmitPolicy::default(),
        );
        let mut rng = StdRng::seed_from_u64(42);

        let summary = run(accounts, &minter, &mut rng).await;

        assert_eq!(
            summary,
            SessionSummary {
                accounts: 3,
                attempted: 3,
                succeeded: 3
            }
        );
        let mut order = senders.lock().unwrap().clone();
        assert_eq!(order.len(), 3);
        order.sort();
        let mut expected: Vec<_> = KEYS
            .iter()
            .map(|k| parse_key(k).unwrap().address())
            .collect();
        expected.sort();
        assert_eq!(order, expected);
    }
}
