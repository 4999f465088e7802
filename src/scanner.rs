use anyhow::Result;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::ScanConfig;
use crate::detector::{self, Classification, Opportunity};
use crate::market::QuoteSource;

/// Outcome of one scan cycle: every group evaluated, survivors ranked
#[derive(Debug, Clone)]
pub struct ScanReport {
    pub scan_id: String,
    pub started_at: DateTime<Utc>,
    pub groups_evaluated: usize,
    pub opportunities: Vec<Opportunity>,
}

impl ScanReport {
    pub fn total_potential_profit(&self) -> Decimal {
        self.opportunities.iter().map(|o| o.profit).sum()
    }

    pub fn average_roi(&self) -> Decimal {
        if self.opportunities.is_empty() {
            return Decimal::ZERO;
        }
        let sum: Decimal = self.opportunities.iter().map(|o| o.roi).sum();
        sum / Decimal::from(self.opportunities.len())
    }

    pub fn count_of(&self, classification: Classification) -> usize {
        self.opportunities
            .iter()
            .filter(|o| o.classification == classification)
            .count()
    }
}

/// Run one scan cycle: fetch groups, evaluate each independently, rank
/// the survivors. Evaluation is pure per group, so a bad group can only
/// remove itself from the result.
pub async fn scan(source: &dyn QuoteSource, config: &ScanConfig, limit: u32) -> Result<ScanReport> {
    let started_at = Utc::now();
    let groups = source.fetch_groups(limit).await?;
    let groups_evaluated = groups.len();

    let mut opportunities = Vec::new();
    for group in &groups {
        if let Some(opportunity) = detector::evaluate(group, config) {
            info!(
                "{}: {} | cost={} profit=${} roi={}%",
                opportunity.classification,
                opportunity.title,
                opportunity.total_cost.round_dp(3),
                opportunity.profit.round_dp(2),
                (opportunity.roi * Decimal::ONE_HUNDRED).round_dp(1)
            );
            opportunities.push(opportunity);
        }
    }

    debug!(
        "Evaluated {} groups, {} actionable",
        groups_evaluated,
        opportunities.len()
    );

    Ok(ScanReport {
        scan_id: Uuid::new_v4().to_string(),
        started_at,
        groups_evaluated,
        opportunities: detector::rank(opportunities),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::{GroupKind, OutcomeGroup, OutcomeQuote};
    use async_trait::async_trait;
    use rust_decimal_macros::dec;

    struct StubSource {
        groups: Vec<OutcomeGroup>,
    }

    #[async_trait]
    impl QuoteSource for StubSource {
        async fn fetch_groups(&self, _limit: u32) -> Result<Vec<OutcomeGroup>> {
            Ok(self.groups.clone())
        }
    }

    fn pair(market_id: &str, yes: Decimal, no: Decimal) -> OutcomeGroup {
        OutcomeGroup {
            market_id: market_id.to_string(),
            title: format!("Market {}", market_id),
            kind: GroupKind::BinaryPair,
            quotes: vec![
                OutcomeQuote {
                    token_id: format!("{}-yes", market_id),
                    label: "Yes".to_string(),
                    price: yes,
                    fetched_at: None,
                },
                OutcomeQuote {
                    token_id: format!("{}-no", market_id),
                    label: "No".to_string(),
                    price: no,
                    fetched_at: None,
                },
            ],
        }
    }

    #[tokio::test]
    async fn test_scan_ranks_survivors() {
        let source = StubSource {
            groups: vec![
                pair("thin", dec!(0.50), dec!(0.45)),  // ~5.3% roi
                pair("fair", dec!(0.50), dec!(0.50)),  // no arb
                pair("wide", dec!(0.40), dec!(0.50)),  // ~11.1% roi
            ],
        };

        let report = scan(&source, &ScanConfig::default(), 100).await.unwrap();

        assert_eq!(report.groups_evaluated, 3);
        assert_eq!(report.opportunities.len(), 2);
        assert_eq!(report.opportunities[0].market_id, "wide");
        assert_eq!(report.opportunities[1].market_id, "thin");
    }

    #[tokio::test]
    async fn test_scan_summary_stats() {
        let source = StubSource {
            groups: vec![
                pair("a", dec!(0.50), dec!(0.45)),
                pair("b", dec!(0.40), dec!(0.50)),
            ],
        };

        let report = scan(&source, &ScanConfig::default(), 100).await.unwrap();

        assert_eq!(report.total_potential_profit(), dec!(0.15));
        assert!(report.average_roi() > Decimal::ZERO);
        assert_eq!(report.count_of(Classification::SingleCondition), 2);
        assert_eq!(report.count_of(Classification::NegRisk), 0);
    }

    #[tokio::test]
    async fn test_empty_scan_is_normal() {
        let source = StubSource { groups: vec![] };
        let report = scan(&source, &ScanConfig::default(), 100).await.unwrap();

        assert_eq!(report.groups_evaluated, 0);
        assert!(report.opportunities.is_empty());
        assert_eq!(report.average_roi(), Decimal::ZERO);
    }
}
