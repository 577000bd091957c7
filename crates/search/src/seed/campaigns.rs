//! Demo marketing campaigns.

use crate::backend::BulkOperation;
use crate::ingest::bulk::{BulkIndexer, BulkReport};
use crate::profile::CAMPAIGNS_INDEX;
use fsi_core::AppResult;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Campaign {
    pub campaign_name: String,
    pub campaign_description: String,
}

const CATALOGUE: [(&str, &str); 6] = [
    (
        "Supermarket cashback",
        "Get 5% cashback on every grocery purchase at participating supermarkets, including Tesco, Lidl, Aldi and SPAR, when you pay with your debit card.",
    ),
    (
        "Fashion rewards",
        "Earn double reward points on clothing purchases at H&M, Zara, Primark and Zalando with your credit card for the next three months.",
    ),
    (
        "Online shopping protection",
        "Shop online at Amazon.com, Apple.com and Bol.com with free purchase protection and extended warranty on items paid by credit card.",
    ),
    (
        "Streaming bundle",
        "Pay for Spotify, Netflix or HBOMax with your card and receive one month of your subscription free every quarter.",
    ),
    (
        "Salary saver",
        "Have your salary deposited with us and get a bonus interest rate of 3% on your savings account balance up to 10000 euro.",
    ),
    (
        "Low balance overdraft",
        "Avoid overdraft fees with a free buffer of 250 euro when your current account balance runs low before payday.",
    ),
];

/// The fixed campaign catalogue.
pub fn campaign_catalogue() -> Vec<Campaign> {
    CATALOGUE
        .iter()
        .map(|(name, description)| Campaign {
            campaign_name: (*name).to_string(),
            campaign_description: (*description).to_string(),
        })
        .collect()
}

pub fn campaign_operations(campaigns: &[Campaign]) -> AppResult<Vec<BulkOperation>> {
    campaigns
        .iter()
        .enumerate()
        .map(|(i, campaign)| -> AppResult<BulkOperation> {
            Ok(BulkOperation::new(
                CAMPAIGNS_INDEX,
                format!("campaign-{}", i + 1),
                serde_json::to_value(campaign)?,
            ))
        })
        .collect()
}

/// Write the campaign catalogue. Ids are stable, so reseeding overwrites.
pub async fn seed_campaigns(indexer: &BulkIndexer) -> AppResult<BulkReport> {
    let operations = campaign_operations(&campaign_catalogue())?;
    tracing::info!(count = operations.len(), "Seeding campaigns");
    Ok(indexer.index_all(&operations).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::mock::MockBackend;
    use crate::ingest::bulk::BulkSettings;
    use std::sync::Arc;

    #[test]
    fn test_catalogue_is_complete() {
        let campaigns = campaign_catalogue();
        assert_eq!(campaigns.len(), 6);
        assert!(campaigns
            .iter()
            .all(|c| !c.campaign_name.is_empty() && !c.campaign_description.is_empty()));
    }

    #[tokio::test]
    async fn test_seed_campaigns_uses_stable_ids() {
        let backend = Arc::new(MockBackend::new());
        let indexer = BulkIndexer::new(backend.clone(), BulkSettings::default());

        let report = seed_campaigns(&indexer).await.unwrap();
        assert_eq!(report.summary(), "6/6");

        let batches = backend.bulk_batches.lock().unwrap();
        assert_eq!(batches[0][0].id, "campaign-1");
        assert_eq!(batches[0][0].index, CAMPAIGNS_INDEX);
        assert_eq!(batches[0][0].document["campaign_name"], "Supermarket cashback");
    }
}
