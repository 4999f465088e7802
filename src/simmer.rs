use anyhow::{Context, Result};
use reqwest::Client;
use tracing::{debug, info};

use crate::config::Config;
use crate::retry::get_backoff;
use crate::types::{SdkPosition, SimmerMarket, SimmerMarketList, TradeRequest, TradeResponse};

/// Thin client for the Simmer SDK REST API
///
/// Bearer-token auth, JSON in and out. Read endpoints retry with
/// backoff; `trade` submits exactly once, since a blind retry could
/// double-fill a leg.
pub struct SimmerClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl SimmerClient {
    pub fn new(config: &Config) -> Result<Self> {
        let api_key = config
            .simmer_api_key
            .clone()
            .context("SIMMER_API_KEY not set")?;

        let client = Client::builder()
            .tcp_nodelay(true)
            .timeout(std::time::Duration::from_secs(30))
            .connect_timeout(std::time::Duration::from_secs(10))
            .user_agent("simmer-arb/0.1")
            .build()?;

        Ok(Self {
            client,
            base_url: config.simmer_api_url.clone(),
            api_key,
        })
    }

    async fn get_json(&self, path: &str) -> Result<serde_json::Value> {
        let url = format!("{}{}", self.base_url, path);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .with_context(|| format!("Failed to GET {}", path))?;

        let status = response.status();
        let body: serde_json::Value = response
            .json()
            .await
            .with_context(|| format!("Failed to parse response from {}", path))?;

        if !status.is_success() {
            anyhow::bail!("GET {} failed: {} - {}", path, status, body);
        }

        Ok(body)
    }

    async fn post_json(&self, path: &str, payload: &serde_json::Value) -> Result<serde_json::Value> {
        let url = format!("{}{}", self.base_url, path);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(payload)
            .send()
            .await
            .with_context(|| format!("Failed to POST {}", path))?;

        let status = response.status();
        let body: serde_json::Value = response
            .json()
            .await
            .with_context(|| format!("Failed to parse response from {}", path))?;

        if !status.is_success() {
            anyhow::bail!("POST {} failed: {} - {}", path, status, body);
        }

        Ok(body)
    }

    /// List markets, with divergence data where the platform has it
    pub async fn get_markets(&self) -> Result<Vec<SimmerMarket>> {
        let body = backoff::future::retry(get_backoff(), || async move {
            self.get_json("/api/sdk/markets")
                .await
                .map_err(backoff::Error::transient)
        })
        .await?;

        let list: SimmerMarketList =
            serde_json::from_value(body).context("Failed to parse market list")?;
        Ok(list.markets)
    }

    /// List open positions
    pub async fn get_positions(&self) -> Result<Vec<SdkPosition>> {
        let body = backoff::future::retry(get_backoff(), || async move {
            self.get_json("/api/sdk/positions")
                .await
                .map_err(backoff::Error::transient)
        })
        .await?;

        let positions = body
            .get("positions")
            .cloned()
            .unwrap_or(serde_json::Value::Array(vec![]));
        serde_json::from_value(positions).context("Failed to parse positions")
    }

    /// Find an already-imported market by Polymarket condition id
    pub async fn find_market(&self, condition_id: &str) -> Result<Option<String>> {
        let path = format!("/api/sdk/markets?q={}&limit=1", condition_id);
        let body = self.get_json(&path).await?;

        let id = body
            .get("markets")
            .and_then(|m| m.as_array())
            .and_then(|markets| markets.first())
            .and_then(|market| market.get("id"))
            .and_then(|id| id.as_str())
            .map(str::to_string);

        Ok(id)
    }

    /// Import a Polymarket market into Simmer, returning its market id
    pub async fn import_market(&self, condition_id: &str) -> Result<String> {
        let polymarket_url = format!("https://polymarket.com/event/{}", condition_id);
        let payload = serde_json::json!({ "polymarket_url": polymarket_url });

        let body = self.post_json("/api/sdk/markets/import", &payload).await?;

        body.get("market_id")
            .and_then(|id| id.as_str())
            .map(str::to_string)
            .with_context(|| format!("Import returned no market id for {}", condition_id))
    }

    /// Resolve a condition id to a Simmer market id, importing if needed
    pub async fn resolve_market(&self, condition_id: &str) -> Result<String> {
        if let Some(id) = self.find_market(condition_id).await? {
            debug!("Market {} already imported as {}", condition_id, id);
            return Ok(id);
        }

        info!("Importing market {} into Simmer", condition_id);
        self.import_market(condition_id).await
    }

    /// Place one order. No retry on this path.
    pub async fn trade(&self, request: &TradeRequest) -> Result<TradeResponse> {
        let payload = serde_json::to_value(request)?;
        let body = self.post_json("/api/sdk/trade", &payload).await?;

        let response: TradeResponse =
            serde_json::from_value(body).context("Failed to parse trade response")?;

        if !response.is_ok() {
            anyhow::bail!(
                "Trade rejected: {}",
                response.error.as_deref().unwrap_or("unknown error")
            );
        }

        Ok(response)
    }
}
