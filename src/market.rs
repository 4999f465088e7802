use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::config::Config;
use crate::detector::{GroupKind, OutcomeGroup, OutcomeQuote};
use crate::retry::retry_async;
use crate::types::GammaMarket;

/// Neg-risk rebalancing needs at least three buckets to be worth a
/// group evaluation; two-bucket events are just binary pairs.
const MIN_NEGRISK_GROUP_SIZE: usize = 3;

/// Anything that can hand the scanner priced, already-grouped outcomes
#[async_trait]
pub trait QuoteSource: Send + Sync {
    async fn fetch_groups(&self, limit: u32) -> Result<Vec<OutcomeGroup>>;
}

/// Polymarket Gamma API client (free, no auth)
pub struct GammaClient {
    client: Client,
    base_url: String,
}

impl GammaClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .tcp_nodelay(true)
            .timeout(std::time::Duration::from_secs(15))
            .connect_timeout(std::time::Duration::from_secs(10))
            .user_agent("simmer-arb/0.1")
            .build()?;

        Ok(Self {
            client,
            base_url: config.gamma_url.clone(),
        })
    }

    /// Fetch active markets that are currently accepting orders
    pub async fn fetch_markets(&self, limit: u32) -> Result<Vec<GammaMarket>> {
        let markets = retry_async("fetch markets", 3, || self.fetch_markets_once(limit)).await?;

        let accepting: Vec<GammaMarket> = markets
            .into_iter()
            .filter(|m| m.accepting_orders.unwrap_or(false))
            .collect();

        debug!("{} markets accepting orders", accepting.len());
        Ok(accepting)
    }

    async fn fetch_markets_once(&self, limit: u32) -> Result<Vec<GammaMarket>> {
        let url = format!(
            "{}/markets?limit={}&active=true&closed=false",
            self.base_url, limit
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to fetch markets")?;

        let markets: Vec<GammaMarket> = response
            .json()
            .await
            .context("Failed to parse markets")?;

        Ok(markets)
    }
}

#[async_trait]
impl QuoteSource for GammaClient {
    async fn fetch_groups(&self, limit: u32) -> Result<Vec<OutcomeGroup>> {
        let markets = self.fetch_markets(limit).await?;
        Ok(build_groups(&markets))
    }
}

/// Resolve raw market rows into evaluable outcome groups: one YES/NO
/// pair per binary market, plus one multi-outcome group per neg-risk
/// event id. Malformed rows are skipped, never errors.
pub fn build_groups(markets: &[GammaMarket]) -> Vec<OutcomeGroup> {
    let mut groups = Vec::new();

    // First-seen order of neg-risk ids keeps the output deterministic
    let mut negrisk_members: HashMap<&str, Vec<&GammaMarket>> = HashMap::new();
    let mut negrisk_order: Vec<&str> = Vec::new();

    for market in markets {
        if let Some(group_id) = market.neg_risk_market_id.as_deref() {
            let members = negrisk_members.entry(group_id).or_default();
            if members.is_empty() {
                negrisk_order.push(group_id);
            }
            members.push(market);
        }

        if let Some(group) = binary_pair(market) {
            groups.push(group);
        }
    }

    for group_id in negrisk_order {
        if let Some(group) = negrisk_group(group_id, &negrisk_members[group_id]) {
            groups.push(group);
        }
    }

    groups
}

/// Build a YES/NO pair from a two-outcome market row
fn binary_pair(market: &GammaMarket) -> Option<OutcomeGroup> {
    let prices = market.outcome_prices();
    let labels = market.outcome_labels();
    if prices.len() != 2 || labels.len() != 2 {
        return None;
    }

    let market_id = market.market_id()?.to_string();
    let title = market.question.clone().unwrap_or_else(|| "Unknown".to_string());

    // Token ids can be missing on fresh listings; detection still works,
    // execution resolves through the condition id anyway
    let mut token_ids = market.token_ids();
    token_ids.resize(2, String::new());

    let fetched_at = Some(Utc::now());
    let quotes = vec![
        OutcomeQuote {
            token_id: token_ids[0].clone(),
            label: labels[0].clone(),
            price: prices[0],
            fetched_at,
        },
        OutcomeQuote {
            token_id: token_ids[1].clone(),
            label: labels[1].clone(),
            price: prices[1],
            fetched_at,
        },
    ];

    Some(OutcomeGroup {
        market_id,
        title,
        kind: GroupKind::BinaryPair,
        quotes,
    })
}

/// Build a multi-outcome group from markets sharing a neg-risk event
/// id. Each member contributes its YES quote; exactly one member's YES
/// resolves true, so the quotes are mutually exclusive and exhaustive.
fn negrisk_group(group_id: &str, members: &[&GammaMarket]) -> Option<OutcomeGroup> {
    if members.len() < MIN_NEGRISK_GROUP_SIZE {
        return None;
    }

    let fetched_at = Some(Utc::now());
    let mut quotes = Vec::with_capacity(members.len());

    for member in members {
        let prices = member.outcome_prices();
        let Some(yes_price) = prices.first().copied() else {
            warn!("Skipping neg-risk member without prices in group {}", group_id);
            continue;
        };
        let Some(condition_id) = member.market_id() else {
            continue;
        };

        quotes.push(OutcomeQuote {
            token_id: condition_id.to_string(),
            label: member
                .question
                .clone()
                .unwrap_or_else(|| "Unknown".to_string()),
            price: yes_price,
            fetched_at,
        });
    }

    if quotes.len() < MIN_NEGRISK_GROUP_SIZE {
        return None;
    }

    let title = format!("NegRisk group: {}", quotes[0].label);
    Some(OutcomeGroup {
        market_id: group_id.to_string(),
        title,
        kind: GroupKind::MultiOutcome,
        quotes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn gamma_market(condition_id: &str, question: &str, prices: &str) -> GammaMarket {
        GammaMarket {
            condition_id: Some(condition_id.to_string()),
            question: Some(question.to_string()),
            outcome_prices: Some(prices.to_string()),
            outcomes: Some(r#"["Yes", "No"]"#.to_string()),
            clob_token_ids: Some(r#"["tok-a", "tok-b"]"#.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_binary_pair_from_market_row() {
        let markets = vec![gamma_market("0x1", "Rain tomorrow?", r#"["0.53", "0.42"]"#)];
        let groups = build_groups(&markets);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].kind, GroupKind::BinaryPair);
        assert_eq!(groups[0].market_id, "0x1");
        assert_eq!(groups[0].quotes[0].price, dec!(0.53));
        assert_eq!(groups[0].quotes[1].label, "No");
        assert_eq!(groups[0].quotes[0].token_id, "tok-a");
    }

    #[test]
    fn test_malformed_rows_are_skipped() {
        let broken = GammaMarket {
            condition_id: Some("0x2".to_string()),
            outcome_prices: Some("not json".to_string()),
            ..Default::default()
        };
        assert!(build_groups(&[broken]).is_empty());
    }

    #[test]
    fn test_negrisk_group_from_shared_event_id() {
        let mut members: Vec<GammaMarket> = (0..3)
            .map(|i| {
                let mut m = gamma_market(
                    &format!("0xcond{}", i),
                    &format!("Candidate {} wins?", i),
                    r#"["0.30", "0.70"]"#,
                );
                m.neg_risk = Some(true);
                m.neg_risk_market_id = Some("event-1".to_string());
                m
            })
            .collect();
        // A binary market outside the event should not join the group
        members.push(gamma_market("0x9", "Unrelated?", r#"["0.50", "0.50"]"#));

        let groups = build_groups(&members);
        let negrisk: Vec<&OutcomeGroup> = groups
            .iter()
            .filter(|g| g.kind == GroupKind::MultiOutcome)
            .collect();

        assert_eq!(negrisk.len(), 1);
        assert_eq!(negrisk[0].market_id, "event-1");
        assert_eq!(negrisk[0].quotes.len(), 3);
        // YES price of each member
        assert!(negrisk[0].quotes.iter().all(|q| q.price == dec!(0.30)));
        // Legs reference member condition ids for execution
        assert_eq!(negrisk[0].quotes[0].token_id, "0xcond0");
    }

    #[test]
    fn test_negrisk_group_needs_three_members() {
        let members: Vec<GammaMarket> = (0..2)
            .map(|i| {
                let mut m = gamma_market(&format!("0xcond{}", i), "Q?", r#"["0.40", "0.60"]"#);
                m.neg_risk_market_id = Some("event-2".to_string());
                m
            })
            .collect();

        let groups = build_groups(&members);
        assert!(groups.iter().all(|g| g.kind == GroupKind::BinaryPair));
    }
}
