//! Synthetic banking transactions.
//!
//! A seeded generator walks day by day across the horizon and draws card
//! purchases and salary deposits against a small [`Ledger`] of accounts. The
//! ledger is passed explicitly into every step, so the same seed always
//! yields the same transactions and balances.

use crate::backend::{BulkOperation, SearchBackend};
use crate::ingest::bulk::{BulkIndexer, BulkReport};
use crate::profile::TRANSACTIONS_INDEX;
use crate::progress::ProgressReporter;
use chrono::{Duration, NaiveDate};
use fsi_core::{AppError, AppResult};
use rand::distr::weighted::WeightedIndex;
use rand::distr::Distribution;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

const ACCOUNT_NUMBERS: [&str; 2] = ["ES0912345678", "ES0287654321"];
const DEPOSIT_ENTITY: &str = "ACME corp";

/// Longest horizon the generator accepts, in months.
pub const MAX_MONTHS: u32 = 10;
/// Upper bound of the per-day draw.
pub const MAX_PER_DAY: f64 = 10.0;

/// Merchant category; each has its own description wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MerchantCategory {
    Supermarket,
    ClothingRetailer,
    OnlineRetailer,
    Subscription,
}

impl MerchantCategory {
    const ALL: [MerchantCategory; 4] = [
        MerchantCategory::Supermarket,
        MerchantCategory::ClothingRetailer,
        MerchantCategory::OnlineRetailer,
        MerchantCategory::Subscription,
    ];

    pub fn merchants(&self) -> &'static [&'static str] {
        match self {
            MerchantCategory::Supermarket => &[
                "7Eleven",
                "Ahold Delhaize",
                "Aldi",
                "Coop",
                "Lidl",
                "SPAR",
                "Tesco",
                "Woolworths",
            ],
            MerchantCategory::ClothingRetailer => {
                &["H&M", "Zalando", "Primark", "LVMH", "Asos", "JD Sports", "Zara"]
            }
            MerchantCategory::OnlineRetailer => {
                &["Apple.com", "Amazon.com", "Bol.com", "Takealot.com"]
            }
            MerchantCategory::Subscription => &["Spotify", "Netflix", "HBOMax", "Apple Music"],
        }
    }

    fn describe(&self, entity: &str, value: i64, date: NaiveDate) -> String {
        let date = date.format("%Y-%m-%d");
        match self {
            MerchantCategory::Supermarket => {
                format!("Purchase at {} supermarket, for €{} on {}", entity, value, date)
            }
            MerchantCategory::ClothingRetailer => {
                format!("Purchase at {} clothing, for €{} on {}", entity, value, date)
            }
            MerchantCategory::OnlineRetailer => {
                format!("Payment to {} online shopping, for €{} on {}", entity, value, date)
            }
            MerchantCategory::Subscription => {
                format!("Payment for {} subscription, for €{} on {}", entity, value, date)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionType {
    #[serde(rename = "credit card")]
    CreditCard,
    #[serde(rename = "debit card")]
    DebitCard,
    #[serde(rename = "deposit")]
    Deposit,
}

impl TransactionType {
    const ALL: [TransactionType; 3] = [
        TransactionType::CreditCard,
        TransactionType::DebitCard,
        TransactionType::Deposit,
    ];
    /// Card payments are ten times as likely as a deposit.
    const WEIGHTS: [u32; 3] = [10, 10, 1];

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::CreditCard => "credit card",
            TransactionType::DebitCard => "debit card",
            TransactionType::Deposit => "deposit",
        }
    }
}

/// One generated transaction, in its stored form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub transaction_date: NaiveDate,
    pub value: i64,
    /// Account balance after this transaction
    pub balance: i64,
    pub account_number: String,
    pub description: String,
    pub entity: String,
    pub transaction_type: TransactionType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub number: String,
    pub balance: i64,
}

/// Running balances of the generated accounts. Balances may go negative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ledger {
    accounts: Vec<Account>,
}

impl Ledger {
    /// Open the demo accounts with random balances between 1500 and 10000.
    pub fn open<R: Rng>(rng: &mut R) -> Self {
        let accounts = ACCOUNT_NUMBERS
            .iter()
            .map(|number| Account {
                number: (*number).to_string(),
                balance: rng.random_range(1500..=10000),
            })
            .collect();
        Self { accounts }
    }

    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    fn pick<R: Rng>(&self, rng: &mut R) -> usize {
        rng.random_range(0..self.accounts.len())
    }

    /// Add `delta` to an account and return the new balance.
    fn post(&mut self, account: usize, delta: i64) -> (String, i64) {
        let entry = &mut self.accounts[account];
        entry.balance += delta;
        (entry.number.clone(), entry.balance)
    }
}

/// Generation parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorSettings {
    pub months: u32,
    pub min_per_day: f64,
    pub max_per_day: f64,
    /// Last day of the horizon
    pub end_date: NaiveDate,
    pub seed: u64,
}

impl GeneratorSettings {
    /// Days covered: thirty per month, both ends included.
    pub fn days(&self) -> i64 {
        i64::from(self.months) * 30 + 1
    }

    pub fn validate(&self) -> AppResult<()> {
        if !(1..=MAX_MONTHS).contains(&self.months) {
            return Err(AppError::Config(format!(
                "months must be between 1 and {}, got {}",
                MAX_MONTHS, self.months
            )));
        }
        if !(self.min_per_day.is_finite() && self.max_per_day.is_finite())
            || self.min_per_day < 0.0
            || self.min_per_day > self.max_per_day
            || self.max_per_day > MAX_PER_DAY
        {
            return Err(AppError::Config(format!(
                "Invalid per-day range {}..{}, expected 0 <= min <= max <= {}",
                self.min_per_day, self.max_per_day, MAX_PER_DAY
            )));
        }
        Ok(())
    }
}

/// Result of a generation run.
#[derive(Debug, Clone)]
pub struct GeneratedLedger {
    pub transactions: Vec<Transaction>,
    pub ledger: Ledger,
    /// Balances the accounts were opened with
    pub opening: Vec<Account>,
}

/// Generate transactions for every day of the horizon in date order.
pub fn generate_transactions(
    settings: &GeneratorSettings,
    progress: &ProgressReporter,
) -> AppResult<GeneratedLedger> {
    settings.validate()?;

    let mut rng = StdRng::seed_from_u64(settings.seed);
    let mut ledger = Ledger::open(&mut rng);
    let opening = ledger.accounts().to_vec();

    let type_dist = WeightedIndex::new(TransactionType::WEIGHTS)
        .map_err(|e| AppError::Other(format!("Invalid transaction weights: {}", e)))?;

    let start = settings.end_date - Duration::days(settings.days() - 1);
    let mut transactions = Vec::new();

    for day in 0..settings.days() {
        let date = start + Duration::days(day);
        let draw: f64 = rng.random_range(settings.min_per_day..=settings.max_per_day);
        let count = draw.floor() as usize + 1;

        for _ in 0..count {
            let kind = TransactionType::ALL[type_dist.sample(&mut rng)];
            transactions.push(next_transaction(&mut rng, &mut ledger, kind, date));
        }
        progress.generate(transactions.len() as u64, "transactions");
    }

    tracing::info!(
        count = transactions.len(),
        seed = settings.seed,
        "Generated synthetic transactions"
    );

    Ok(GeneratedLedger {
        transactions,
        ledger,
        opening,
    })
}

fn next_transaction<R: Rng>(
    rng: &mut R,
    ledger: &mut Ledger,
    kind: TransactionType,
    date: NaiveDate,
) -> Transaction {
    let account = ledger.pick(rng);

    match kind {
        TransactionType::Deposit => {
            let value = rng.random_range(1500..=10000);
            let (account_number, balance) = ledger.post(account, value);
            Transaction {
                transaction_date: date,
                value,
                balance,
                account_number,
                description: format!(
                    "Deposit from {}, of {} on {}",
                    DEPOSIT_ENTITY,
                    value,
                    date.format("%Y-%m-%d")
                ),
                entity: DEPOSIT_ENTITY.to_string(),
                transaction_type: kind,
            }
        }
        TransactionType::CreditCard | TransactionType::DebitCard => {
            let category = MerchantCategory::ALL[rng.random_range(0..MerchantCategory::ALL.len())];
            let entity = category
                .merchants()
                .choose(rng)
                .copied()
                .unwrap_or(DEPOSIT_ENTITY);
            let value = rng.random_range(0..=150);
            let (account_number, balance) = ledger.post(account, -value);
            Transaction {
                transaction_date: date,
                value,
                balance,
                account_number,
                description: category.describe(entity, value, date),
                entity: entity.to_string(),
                transaction_type: kind,
            }
        }
    }
}

/// Bulk writes for generated transactions, keyed by position.
pub fn transaction_operations(transactions: &[Transaction]) -> AppResult<Vec<BulkOperation>> {
    transactions
        .iter()
        .enumerate()
        .map(|(i, tx)| -> AppResult<BulkOperation> {
            Ok(BulkOperation::new(
                TRANSACTIONS_INDEX,
                i.to_string(),
                serde_json::to_value(tx)?,
            ))
        })
        .collect()
}

/// Replace the transactions index contents with `transactions`.
pub async fn seed_transactions(
    backend: &dyn SearchBackend,
    indexer: &BulkIndexer,
    transactions: &[Transaction],
) -> AppResult<BulkReport> {
    let deleted = backend
        .delete_by_query(TRANSACTIONS_INDEX, &serde_json::json!({ "match_all": {} }))
        .await?;
    tracing::info!(deleted, "Cleared {}", TRANSACTIONS_INDEX);

    let operations = transaction_operations(transactions)?;
    Ok(indexer.index_all(&operations).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::mock::MockBackend;
    use crate::ingest::bulk::BulkSettings;
    use proptest::prelude::*;
    use std::collections::HashMap;
    use std::sync::Arc;

    fn settings(months: u32, min: f64, max: f64, seed: u64) -> GeneratorSettings {
        GeneratorSettings {
            months,
            min_per_day: min,
            max_per_day: max,
            end_date: NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
            seed,
        }
    }

    fn generate(s: &GeneratorSettings) -> GeneratedLedger {
        generate_transactions(s, &ProgressReporter::noop()).unwrap()
    }

    #[test]
    fn test_same_seed_same_ledger() {
        let s = settings(1, 1.0, 4.0, 42);
        let a = generate(&s);
        let b = generate(&s);

        assert_eq!(a.transactions, b.transactions);
        assert_eq!(a.ledger, b.ledger);
    }

    #[test]
    fn test_fixed_rate_count() {
        // 31 days, exactly 3 + 1 transactions per day
        let generated = generate(&settings(1, 3.0, 3.0, 7));
        assert_eq!(generated.transactions.len(), 31 * 4);

        let first = &generated.transactions[0];
        assert_eq!(first.transaction_date, NaiveDate::from_ymd_opt(2024, 5, 31).unwrap());
        let last = generated.transactions.last().unwrap();
        assert_eq!(last.transaction_date, NaiveDate::from_ymd_opt(2024, 6, 30).unwrap());
    }

    #[test]
    fn test_values_and_descriptions() {
        let generated = generate(&settings(2, 1.0, 6.0, 3));

        for tx in &generated.transactions {
            match tx.transaction_type {
                TransactionType::Deposit => {
                    assert!((1500..=10000).contains(&tx.value));
                    assert_eq!(tx.entity, "ACME corp");
                    assert!(tx.description.starts_with("Deposit from ACME corp, of "));
                }
                _ => {
                    assert!((0..=150).contains(&tx.value));
                    assert!(tx.description.contains(&format!("€{}", tx.value)));
                    assert!(tx.description.contains(&tx.entity));
                }
            }
            assert!(ACCOUNT_NUMBERS.contains(&tx.account_number.as_str()));
        }
    }

    #[test]
    fn test_stored_shape() {
        let generated = generate(&settings(1, 1.0, 1.0, 11));
        let json = serde_json::to_value(&generated.transactions[0]).unwrap();

        for key in ["transaction_date", "value", "balance", "account_number", "description", "entity", "transaction_type"] {
            assert!(json.get(key).is_some(), "missing {}", key);
        }
        let kind = json["transaction_type"].as_str().unwrap();
        assert!(["credit card", "debit card", "deposit"].contains(&kind));
    }

    #[test]
    fn test_invalid_settings() {
        let progress = ProgressReporter::noop();
        assert!(generate_transactions(&settings(0, 1.0, 2.0, 1), &progress).is_err());
        assert!(generate_transactions(&settings(1, 3.0, 2.0, 1), &progress).is_err());
        assert!(generate_transactions(&settings(1, f64::NAN, 2.0, 1), &progress).is_err());
        assert!(generate_transactions(&settings(MAX_MONTHS + 1, 1.0, 2.0, 1), &progress).is_err());

        for max in [MAX_PER_DAY + 0.5, 1e9, 1e300, f64::INFINITY] {
            let result = generate_transactions(&settings(1, 0.0, max, 1), &progress);
            assert!(matches!(result, Err(AppError::Config(_))), "accepted {}", max);
        }

        let edge = settings(MAX_MONTHS, MAX_PER_DAY, MAX_PER_DAY, 1);
        assert!(edge.validate().is_ok());
    }

    #[tokio::test]
    async fn test_seed_clears_then_indexes() {
        let backend = Arc::new(MockBackend::new());
        let indexer = BulkIndexer::new(backend.clone(), BulkSettings::default());
        let generated = generate(&settings(1, 1.0, 1.0, 5));

        let report = seed_transactions(backend.as_ref(), &indexer, &generated.transactions)
            .await
            .unwrap();

        assert_eq!(report.total, generated.transactions.len());
        assert_eq!(report.successes, report.total);
        assert_eq!(backend.deletes.lock().unwrap()[0].0, TRANSACTIONS_INDEX);
        let batches = backend.bulk_batches.lock().unwrap();
        assert_eq!(batches[0][0].id, "0");
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(40))]

        #[test]
        fn prop_balances_follow_transactions(
            seed in any::<u64>(),
            months in 1u32..3,
            min in 0.0f64..4.0,
            spread in 0.0f64..4.0,
        ) {
            let s = settings(months, min, min + spread, seed);
            let generated = generate(&s);

            let mut running: HashMap<String, i64> = generated
                .opening
                .iter()
                .map(|a| (a.number.clone(), a.balance))
                .collect();

            for tx in &generated.transactions {
                let balance = running.get_mut(&tx.account_number).unwrap();
                match tx.transaction_type {
                    TransactionType::Deposit => *balance += tx.value,
                    _ => *balance -= tx.value,
                }
                prop_assert_eq!(*balance, tx.balance);
            }

            for account in generated.ledger.accounts() {
                prop_assert_eq!(running[&account.number], account.balance);
            }

            let min_total = (min.floor() as usize + 1) * s.days() as usize;
            prop_assert!(generated.transactions.len() >= min_total);
        }
    }
}
