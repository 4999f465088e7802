//! Human-readable rendering of scan results
//!
//! Money is rounded to cents and ROI to one decimal here and nowhere
//! earlier; threshold checks upstream always see exact values.

use rust_decimal::Decimal;

use crate::detector::Classification;
use crate::divergence::{DivergenceRow, DivergenceSummary};
use crate::scanner::ScanReport;

fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

fn pct(fraction: Decimal) -> Decimal {
    (fraction * Decimal::ONE_HUNDRED).round_dp(1)
}

/// Render the ranked opportunity list, `top` entries deep
pub fn render_opportunities(report: &ScanReport, top: usize) -> String {
    if report.opportunities.is_empty() {
        return "No arbitrage opportunities detected at current thresholds\n".to_string();
    }

    let mut out = String::new();
    out.push_str("Top opportunities:\n");
    out.push_str(&format!("{}\n", "-".repeat(60)));

    for (i, opp) in report.opportunities.iter().take(top).enumerate() {
        out.push_str(&format!(
            "{}. [{}] {}\n",
            i + 1,
            opp.classification,
            truncate(&opp.title, 45)
        ));
        out.push_str(&format!(
            "   ROI: {}% | Profit: ${} | Capital: ${} | Action: {}\n",
            pct(opp.roi),
            opp.profit.round_dp(2),
            opp.capital_allocated.round_dp(2),
            opp.action
        ));
        for leg in &opp.legs {
            out.push_str(&format!(
                "   - {} @ {} for ${}\n",
                truncate(&leg.label, 35),
                leg.price.round_dp(3),
                leg.stake.round_dp(2)
            ));
        }
    }

    out
}

/// Render the end-of-scan summary block
pub fn render_summary(report: &ScanReport) -> String {
    let mut out = String::new();

    out.push_str(&format!("{}\n", "=".repeat(60)));
    out.push_str("Summary:\n");
    out.push_str(&format!("  Groups evaluated: {}\n", report.groups_evaluated));
    out.push_str(&format!("  Opportunities: {}\n", report.opportunities.len()));
    out.push_str(&format!(
        "  Total potential profit: ${}\n",
        report.total_potential_profit().round_dp(2)
    ));
    out.push_str(&format!("  Average ROI: {}%\n", pct(report.average_roi())));
    out.push_str(&format!(
        "  Single-condition: {} | NegRisk: {}\n",
        report.count_of(Classification::SingleCondition),
        report.count_of(Classification::NegRisk)
    ));

    out
}

/// Render the divergence screen as a table
pub fn render_divergence_table(rows: &[DivergenceRow], summary: &DivergenceSummary) -> String {
    if rows.is_empty() {
        return "No markets match your filters.\n".to_string();
    }

    let mut out = String::new();
    out.push_str(&format!(
        "{:<40} {:>8} {:>8} {:>8} {:>6}\n",
        "Market", "Model", "Poly", "Div", "Signal"
    ));
    out.push_str(&format!("{}\n", "-".repeat(75)));

    for row in rows.iter().take(20) {
        out.push_str(&format!(
            "{:<40} {:>7.1}% {:>7.1}% {:>+7.1}% {:>6?}\n",
            truncate(&row.question, 38),
            row.model_probability * 100.0,
            row.market_price * 100.0,
            row.divergence * 100.0,
            row.signal
        ));
    }

    out.push_str(&format!("{}\n", "-".repeat(75)));
    out.push_str(&format!(
        "{} bullish, {} bearish, avg divergence {:.1}%\n",
        summary.bullish,
        summary.bearish,
        summary.average_magnitude * 100.0
    ));

    out
}
