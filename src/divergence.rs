//! Model-vs-market divergence screening
//!
//! Simmer attaches a model probability to each imported market. When
//! that probability pulls away from the Polymarket price, someone is
//! wrong; a large gap is a directional signal worth surfacing.
//! Probabilities are model outputs, not money, so this module works in
//! `f64` end to end.

use serde::Serialize;
use std::cmp::Ordering;

use crate::types::SimmerMarket;

/// Divergence beyond which a row becomes a directional signal (5%)
const SIGNAL_THRESHOLD: f64 = 0.05;

/// High-conviction floor for the opportunities view (10%)
const OPPORTUNITY_THRESHOLD: f64 = 0.10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Model above market: buy pressure on YES
    Bullish,
    /// Model below market: buy pressure on NO
    Bearish,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Signal {
    Buy,
    Sell,
    Hold,
}

impl Signal {
    pub fn for_divergence(divergence: f64) -> Self {
        if divergence > SIGNAL_THRESHOLD {
            Signal::Buy
        } else if divergence < -SIGNAL_THRESHOLD {
            Signal::Sell
        } else {
            Signal::Hold
        }
    }
}

/// Screening criteria
#[derive(Debug, Clone)]
pub struct DivergenceFilter {
    /// Minimum |divergence| as a fraction (0.05 = 5%)
    pub min_divergence: f64,
    pub direction: Option<Direction>,
}

impl Default for DivergenceFilter {
    fn default() -> Self {
        Self {
            min_divergence: 0.05,
            direction: None,
        }
    }
}

/// One market that passed the screen
#[derive(Debug, Clone, Serialize)]
pub struct DivergenceRow {
    pub market_id: String,
    pub question: String,
    pub model_probability: f64,
    pub market_price: f64,
    pub divergence: f64,
    pub signal: Signal,
    pub resolves_at: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct DivergenceSummary {
    pub bullish: usize,
    pub bearish: usize,
    pub average_magnitude: f64,
}

/// Filter markets by divergence and sort by magnitude, largest first.
/// Rows without divergence data drop out silently.
pub fn screen(markets: &[SimmerMarket], filter: &DivergenceFilter) -> Vec<DivergenceRow> {
    let mut rows: Vec<DivergenceRow> = markets
        .iter()
        .filter_map(|market| {
            let divergence = market.divergence?;
            if divergence.abs() < filter.min_divergence {
                return None;
            }
            match filter.direction {
                Some(Direction::Bullish) if divergence <= 0.0 => return None,
                Some(Direction::Bearish) if divergence >= 0.0 => return None,
                _ => {}
            }

            Some(DivergenceRow {
                market_id: market.id.clone(),
                question: market.question.clone().unwrap_or_default(),
                model_probability: market.current_probability.unwrap_or(0.0),
                market_price: market.external_price_yes.unwrap_or(0.0),
                divergence,
                signal: Signal::for_divergence(divergence),
                resolves_at: market.resolves_at.clone(),
            })
        })
        .collect();

    rows.sort_by(|a, b| {
        b.divergence
            .abs()
            .partial_cmp(&a.divergence.abs())
            .unwrap_or(Ordering::Equal)
    });
    rows
}

/// High-conviction subset: |divergence| above 10%, top `limit` rows
pub fn top_opportunities(rows: &[DivergenceRow], limit: usize) -> Vec<DivergenceRow> {
    rows.iter()
        .filter(|row| row.divergence.abs() > OPPORTUNITY_THRESHOLD)
        .take(limit)
        .cloned()
        .collect()
}

pub fn summarize(rows: &[DivergenceRow]) -> DivergenceSummary {
    if rows.is_empty() {
        return DivergenceSummary::default();
    }

    let bullish = rows.iter().filter(|r| r.divergence > 0.0).count();
    let bearish = rows.iter().filter(|r| r.divergence < 0.0).count();
    let average_magnitude =
        rows.iter().map(|r| r.divergence.abs()).sum::<f64>() / rows.len() as f64;

    DivergenceSummary {
        bullish,
        bearish,
        average_magnitude,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn market(id: &str, divergence: Option<f64>) -> SimmerMarket {
        SimmerMarket {
            id: id.to_string(),
            question: Some(format!("Question {}", id)),
            current_probability: Some(0.6),
            external_price_yes: Some(0.5),
            divergence,
            resolves_at: None,
        }
    }

    #[test]
    fn test_screen_filters_and_sorts_by_magnitude() {
        let markets = vec![
            market("small", Some(0.02)),
            market("mid", Some(-0.08)),
            market("big", Some(0.15)),
            market("nodata", None),
        ];

        let rows = screen(&markets, &DivergenceFilter::default());

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].market_id, "big");
        assert_eq!(rows[1].market_id, "mid");
    }

    #[test]
    fn test_direction_filters() {
        let markets = vec![market("up", Some(0.10)), market("down", Some(-0.10))];

        let bullish = screen(
            &markets,
            &DivergenceFilter {
                min_divergence: 0.05,
                direction: Some(Direction::Bullish),
            },
        );
        assert_eq!(bullish.len(), 1);
        assert_eq!(bullish[0].market_id, "up");

        let bearish = screen(
            &markets,
            &DivergenceFilter {
                min_divergence: 0.05,
                direction: Some(Direction::Bearish),
            },
        );
        assert_eq!(bearish.len(), 1);
        assert_eq!(bearish[0].market_id, "down");
    }

    #[test]
    fn test_signal_boundaries() {
        assert_eq!(Signal::for_divergence(0.06), Signal::Buy);
        assert_eq!(Signal::for_divergence(-0.06), Signal::Sell);
        assert_eq!(Signal::for_divergence(0.05), Signal::Hold);
        assert_eq!(Signal::for_divergence(-0.03), Signal::Hold);
    }

    #[test]
    fn test_top_opportunities_uses_conviction_floor() {
        let markets = vec![
            market("a", Some(0.09)),
            market("b", Some(0.12)),
            market("c", Some(-0.30)),
        ];
        let rows = screen(&markets, &DivergenceFilter::default());

        let top = top_opportunities(&rows, 5);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].market_id, "c");
    }

    #[test]
    fn test_summary_counts_directions() {
        let markets = vec![
            market("a", Some(0.10)),
            market("b", Some(0.20)),
            market("c", Some(-0.10)),
        ];
        let rows = screen(&markets, &DivergenceFilter::default());
        let summary = summarize(&rows);

        assert_eq!(summary.bullish, 2);
        assert_eq!(summary.bearish, 1);
        assert!((summary.average_magnitude - 0.1333).abs() < 0.001);
    }
}
