//! Arbitrage detection over outcome groups
//!
//! Key insight: in a group of mutually exclusive, exhaustive outcomes,
//! exactly one pays out $1. If the asks across the whole group sum to
//! less than $1, buying every outcome locks in the difference as profit
//! regardless of which outcome wins.
//!
//! `evaluate` and `rank` are pure functions: no I/O, no shared state,
//! no retries. "No opportunity" is a normal result, not an error.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::fmt;

use crate::config::ScanConfig;

/// One tradeable side of a market at scan time
#[derive(Debug, Clone)]
pub struct OutcomeQuote {
    /// CLOB token id for binary outcomes, member condition id for
    /// neg-risk group legs
    pub token_id: String,
    pub label: String,
    /// Best ask, as cost per $1 of payout
    pub price: Decimal,
    pub fetched_at: Option<DateTime<Utc>>,
}

impl OutcomeQuote {
    /// A price pinned at 0 or 1 means the market has effectively
    /// resolved; such quotes are excluded from evaluation.
    pub fn is_tradeable(&self) -> bool {
        self.price > Decimal::ZERO && self.price < Decimal::ONE
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKind {
    /// YES/NO complement of a single binary market
    BinaryPair,
    /// Mutually exclusive outcomes spread across a neg-risk event
    MultiOutcome,
}

/// A set of quotes whose payouts are mutually exclusive and exhaustive
#[derive(Debug, Clone)]
pub struct OutcomeGroup {
    pub market_id: String,
    pub title: String,
    pub kind: GroupKind,
    pub quotes: Vec<OutcomeQuote>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    SingleCondition,
    NegRisk,
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Classification::SingleCondition => write!(f, "single_condition"),
            Classification::NegRisk => write!(f, "negrisk"),
        }
    }
}

/// Suggested action for the reporting/execution side
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeAction {
    BuyBoth,
    BuyAll,
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeAction::BuyBoth => write!(f, "buy_both"),
            TradeAction::BuyAll => write!(f, "buy_all"),
        }
    }
}

/// One outcome's order within the arbitrage trade
#[derive(Debug, Clone)]
pub struct LegStake {
    pub token_id: String,
    pub label: String,
    pub price: Decimal,
    pub stake: Decimal,
}

/// A detected arbitrage opportunity, quantified and sized
#[derive(Debug, Clone)]
pub struct Opportunity {
    pub market_id: String,
    pub title: String,
    pub classification: Classification,
    pub total_cost: Decimal,
    pub profit: Decimal,
    pub roi: Decimal,
    pub capital_allocated: Decimal,
    pub legs: Vec<LegStake>,
    pub action: TradeAction,
}

/// Evaluate one outcome group against the configured thresholds.
///
/// Returns `None` for anything that is not an actionable guaranteed
/// profit: degenerate groups, prices at or above fair value, and
/// opportunities below the profit or ROI floor. Threshold comparisons
/// happen on exact values; rounding to cents is presentation-only.
pub fn evaluate(group: &OutcomeGroup, config: &ScanConfig) -> Option<Opportunity> {
    let tradeable: Vec<&OutcomeQuote> = group
        .quotes
        .iter()
        .filter(|quote| quote.is_tradeable())
        .collect();

    // A lone surviving outcome has no complement to hedge against
    if tradeable.len() < 2 {
        return None;
    }

    let total_cost: Decimal = tradeable.iter().map(|quote| quote.price).sum();

    // Cannot happen once every price is > 0, but a skipped group beats
    // a division fault
    if total_cost <= Decimal::ZERO {
        return None;
    }

    let profit = Decimal::ONE - total_cost;
    if profit <= Decimal::ZERO {
        return None;
    }

    let roi = profit / total_cost;

    if profit < config.min_profit || roi < config.min_roi {
        return None;
    }

    let classification = match group.kind {
        GroupKind::BinaryPair => Classification::SingleCondition,
        GroupKind::MultiOutcome => Classification::NegRisk,
    };
    let action = match classification {
        Classification::SingleCondition => TradeAction::BuyBoth,
        Classification::NegRisk => TradeAction::BuyAll,
    };

    // Equal stake per leg. If the cap binds, scale every leg down
    // proportionally: a partial leg set is directional risk, not
    // arbitrage.
    let leg_count = Decimal::from(tradeable.len());
    let stake = if config.trade_size * leg_count > config.max_trade_size {
        config.max_trade_size / leg_count
    } else {
        config.trade_size
    };

    let legs: Vec<LegStake> = tradeable
        .iter()
        .map(|quote| LegStake {
            token_id: quote.token_id.clone(),
            label: quote.label.clone(),
            price: quote.price,
            stake,
        })
        .collect();
    let capital_allocated = stake * leg_count;

    Some(Opportunity {
        market_id: group.market_id.clone(),
        title: group.title.clone(),
        classification,
        total_cost,
        profit,
        roi,
        capital_allocated,
        legs,
        action,
    })
}

/// Rank opportunities for reporting: descending ROI, profit as the
/// tie-break. The sort is stable, so exact ties keep input order.
pub fn rank(mut opportunities: Vec<Opportunity>) -> Vec<Opportunity> {
    opportunities.sort_by(|a, b| b.roi.cmp(&a.roi).then(b.profit.cmp(&a.profit)));
    opportunities
}
