//! Demo data: synthetic transactions and the campaign catalogue.

pub mod campaigns;
pub mod transactions;

pub use campaigns::{campaign_catalogue, seed_campaigns, Campaign};
pub use transactions::{
    generate_transactions, seed_transactions, GeneratedLedger, GeneratorSettings, Ledger,
    Transaction, TransactionType,
};
