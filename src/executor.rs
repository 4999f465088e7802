use anyhow::Result;
use futures_util::future::join_all;
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::detector::{Classification, LegStake, Opportunity};
use crate::simmer::SimmerClient;
use crate::types::{TradeRequest, TradeSide};

const TRADE_SOURCE: &str = "sdk:arbscanner";

/// Result of one leg's order placement
#[derive(Debug, Clone)]
pub struct LegResult {
    pub label: String,
    pub stake: Decimal,
    pub outcome: Result<Option<String>, String>,
}

impl LegResult {
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }
}

#[derive(Debug, Clone)]
pub struct ExecutionReport {
    pub market_id: String,
    pub title: String,
    pub dry_run: bool,
    pub legs: Vec<LegResult>,
}

impl ExecutionReport {
    pub fn filled_legs(&self) -> usize {
        self.legs.iter().filter(|leg| leg.is_ok()).count()
    }

    pub fn all_filled(&self) -> bool {
        !self.legs.is_empty() && self.legs.iter().all(|leg| leg.is_ok())
    }
}

/// Forwards detected opportunities to Simmer, one order per leg
///
/// The detector guarantees a full, evenly-sized leg set; this side just
/// places the orders. Cross-leg atomicity is the platform's problem,
/// so a partially filled set is reported, not rolled back.
pub struct ArbExecutor {
    simmer: SimmerClient,
    venue: String,
    dry_run: bool,
}

impl ArbExecutor {
    pub fn new(simmer: SimmerClient, venue: String, dry_run: bool) -> Self {
        Self {
            simmer,
            venue,
            dry_run,
        }
    }

    pub async fn execute(&self, opportunity: &Opportunity) -> Result<ExecutionReport> {
        if self.dry_run {
            return Ok(self.dry_run_report(opportunity));
        }

        let legs = match opportunity.classification {
            Classification::SingleCondition => self.execute_binary(opportunity).await?,
            Classification::NegRisk => self.execute_negrisk(opportunity).await,
        };

        Ok(ExecutionReport {
            market_id: opportunity.market_id.clone(),
            title: opportunity.title.clone(),
            dry_run: false,
            legs,
        })
    }

    fn dry_run_report(&self, opportunity: &Opportunity) -> ExecutionReport {
        for leg in &opportunity.legs {
            info!(
                "[DRY RUN] Would buy {} for ${} on {}",
                leg.label,
                leg.stake.round_dp(2),
                opportunity.title
            );
        }
        ExecutionReport {
            market_id: opportunity.market_id.clone(),
            title: opportunity.title.clone(),
            dry_run: true,
            legs: opportunity
                .legs
                .iter()
                .map(|leg| LegResult {
                    label: leg.label.clone(),
                    stake: leg.stake,
                    outcome: Ok(None),
                })
                .collect(),
        }
    }

    /// Buy both sides of one market. The market is imported once, then
    /// the YES and NO orders go out in parallel.
    async fn execute_binary(&self, opportunity: &Opportunity) -> Result<Vec<LegResult>> {
        let simmer_id = self.simmer.resolve_market(&opportunity.market_id).await?;

        let orders = join_all(opportunity.legs.iter().map(|leg| {
            let simmer_id = simmer_id.clone();
            async move {
                let result = match TradeSide::from_label(&leg.label) {
                    Some(side) => self.place_leg(&simmer_id, side, leg, opportunity).await,
                    None => Err(format!("outcome '{}' is not a yes/no side", leg.label)),
                };
                LegResult {
                    label: leg.label.clone(),
                    stake: leg.stake,
                    outcome: result,
                }
            }
        }))
        .await;

        Ok(orders)
    }

    /// Buy YES on every member market of a neg-risk group. Each leg's
    /// token id is the member's condition id, resolved independently.
    async fn execute_negrisk(&self, opportunity: &Opportunity) -> Vec<LegResult> {
        join_all(opportunity.legs.iter().map(|leg| async move {
            let result = match self.simmer.resolve_market(&leg.token_id).await {
                Ok(simmer_id) => {
                    self.place_leg(&simmer_id, TradeSide::Yes, leg, opportunity)
                        .await
                }
                Err(e) => Err(format!("could not resolve member market: {}", e)),
            };
            LegResult {
                label: leg.label.clone(),
                stake: leg.stake,
                outcome: result,
            }
        }))
        .await
    }

    async fn place_leg(
        &self,
        simmer_market_id: &str,
        side: TradeSide,
        leg: &LegStake,
        opportunity: &Opportunity,
    ) -> Result<Option<String>, String> {
        let request = TradeRequest {
            market_id: simmer_market_id.to_string(),
            side,
            amount: leg.stake,
            venue: self.venue.clone(),
            source: TRADE_SOURCE.to_string(),
            reasoning: Some(format!(
                "Arb: {}, cost={}, ROI={}%",
                opportunity.action,
                opportunity.total_cost.round_dp(3),
                (opportunity.roi * Decimal::ONE_HUNDRED).round_dp(1)
            )),
        };

        match self.simmer.trade(&request).await {
            Ok(response) => {
                info!(
                    "Leg filled: {} ${} on {}",
                    leg.label,
                    leg.stake.round_dp(2),
                    opportunity.title
                );
                Ok(response.trade_id)
            }
            Err(e) => {
                warn!("Leg failed: {} on {}: {}", leg.label, opportunity.title, e);
                Err(e.to_string())
            }
        }
    }
}
