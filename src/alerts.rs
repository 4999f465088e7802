use anyhow::Result;
use reqwest::Client;
use rust_decimal::Decimal;
use serde_json::json;
use tracing::error;

use crate::detector::Opportunity;

/// Discord webhook client for alerts
pub struct AlertClient {
    client: Client,
    webhook_url: Option<String>,
    enabled: bool,
}

impl AlertClient {
    pub fn new(webhook_url: Option<String>) -> Self {
        let enabled = webhook_url.is_some();
        Self {
            client: Client::new(),
            webhook_url,
            enabled,
        }
    }

    /// Send a Discord message
    async fn send(&self, content: &str, color: u32) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }

        let url = match &self.webhook_url {
            Some(u) => u,
            None => return Ok(()),
        };

        let payload = json!({
            "embeds": [{
                "description": content,
                "color": color
            }]
        });

        match self.client.post(url).json(&payload).send().await {
            Ok(_) => Ok(()),
            Err(e) => {
                error!("Failed to send Discord alert: {}", e);
                Ok(()) // Don't fail the scan over alerts
            }
        }
    }

    /// Alert: Scanner started
    pub async fn scanner_started(&self, dry_run: bool) {
        let mode = if dry_run { "DRY RUN" } else { "LIVE" };
        let msg = format!("🔍 **Arb Scanner Started**\nMode: {}", mode);
        let _ = self.send(&msg, 0x00FF00).await; // Green
    }

    /// Alert: Opportunity detected
    pub async fn opportunity_found(&self, opportunity: &Opportunity) {
        let msg = format!(
            "💰 **Arbitrage Detected**\n{}\nType: {}\nProfit: ${} | ROI: {}%",
            opportunity.title,
            opportunity.classification,
            opportunity.profit.round_dp(2),
            (opportunity.roi * Decimal::ONE_HUNDRED).round_dp(1)
        );
        let _ = self.send(&msg, 0x0099FF).await; // Blue
    }

    /// Alert: Scan cycle complete
    pub async fn scan_complete(&self, found: usize, total_profit: Decimal) {
        let msg = format!(
            "📊 **Scan Complete**\nOpportunities: {}\nPotential profit: ${}",
            found,
            total_profit.round_dp(2)
        );
        let _ = self.send(&msg, 0x0099FF).await; // Blue
    }

    /// Alert: Trades submitted for an opportunity
    pub async fn trades_submitted(&self, title: &str, legs: usize, capital: Decimal) {
        let msg = format!(
            "✅ **Trades Submitted**\n{}\n{} legs, ${} committed",
            title,
            legs,
            capital.round_dp(2)
        );
        let _ = self.send(&msg, 0x00FF00).await; // Green
    }

    /// Alert: Something failed
    pub async fn error(&self, title: &str, detail: &str) {
        let msg = format!("❌ **{}**\n{}", title, detail);
        let _ = self.send(&msg, 0xFF0000).await; // Red
    }
}
