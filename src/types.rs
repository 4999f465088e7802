use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Market listing row from the Gamma API
///
/// Gamma returns outcome prices, labels, and token ids as JSON strings
/// embedded in the row (e.g. `"[\"0.53\", \"0.42\"]"`), so every field
/// that matters for detection goes through a parse helper.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GammaMarket {
    pub id: Option<String>,
    pub condition_id: Option<String>,
    pub question: Option<String>,
    pub outcome_prices: Option<String>,
    pub outcomes: Option<String>,
    pub clob_token_ids: Option<String>,
    pub neg_risk: Option<bool>,
    #[serde(rename = "negRiskMarketID")]
    pub neg_risk_market_id: Option<String>,
    pub accepting_orders: Option<bool>,
    pub active: Option<bool>,
    pub closed: Option<bool>,
}

impl GammaMarket {
    /// Condition id if present, falling back to the row id
    pub fn market_id(&self) -> Option<&str> {
        self.condition_id
            .as_deref()
            .filter(|s| !s.is_empty())
            .or(self.id.as_deref())
    }

    pub fn outcome_prices(&self) -> Vec<Decimal> {
        parse_json_list(&self.outcome_prices)
            .iter()
            .filter_map(|p| p.parse().ok())
            .collect()
    }

    pub fn outcome_labels(&self) -> Vec<String> {
        parse_json_list(&self.outcomes)
    }

    pub fn token_ids(&self) -> Vec<String> {
        parse_json_list(&self.clob_token_ids)
    }
}

/// Parse a Gamma JSON-string field into its list elements.
/// Malformed or missing fields become an empty list, never an error.
fn parse_json_list(raw: &Option<String>) -> Vec<String> {
    raw.as_deref()
        .and_then(|s| serde_json::from_str(s).ok())
        .unwrap_or_default()
}

/// Market row from the Simmer SDK API
///
/// Probabilities and divergence arrive as JSON floats; they are model
/// outputs, not money, so they stay `f64`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SimmerMarket {
    pub id: String,
    pub question: Option<String>,
    pub current_probability: Option<f64>,
    pub external_price_yes: Option<f64>,
    pub divergence: Option<f64>,
    pub resolves_at: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SimmerMarketList {
    #[serde(default)]
    pub markets: Vec<SimmerMarket>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeSide {
    Yes,
    No,
}

impl TradeSide {
    /// Map an outcome label to a tradeable side, if it is one
    pub fn from_label(label: &str) -> Option<Self> {
        match label.to_lowercase().as_str() {
            "yes" | "up" => Some(TradeSide::Yes),
            "no" | "down" => Some(TradeSide::No),
            _ => None,
        }
    }
}

/// Order placement request for the Simmer SDK trade endpoint
#[derive(Debug, Clone, Serialize)]
pub struct TradeRequest {
    pub market_id: String,
    pub side: TradeSide,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub venue: String,
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TradeResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub trade_id: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl TradeResponse {
    pub fn is_ok(&self) -> bool {
        self.error.is_none() && self.success.unwrap_or(true)
    }
}

/// Open position from the Simmer SDK API
#[derive(Debug, Clone, Deserialize)]
pub struct SdkPosition {
    pub market_id: String,
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub side: Option<String>,
    #[serde(default)]
    pub shares: Option<f64>,
    #[serde(default)]
    pub avg_price: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parses_json_string_fields() {
        let market = GammaMarket {
            condition_id: Some("0xabc".to_string()),
            outcome_prices: Some(r#"["0.53", "0.42"]"#.to_string()),
            outcomes: Some(r#"["Yes", "No"]"#.to_string()),
            clob_token_ids: Some(r#"["111", "222"]"#.to_string()),
            ..Default::default()
        };

        assert_eq!(market.outcome_prices(), vec![dec!(0.53), dec!(0.42)]);
        assert_eq!(market.outcome_labels(), vec!["Yes", "No"]);
        assert_eq!(market.token_ids(), vec!["111", "222"]);
        assert_eq!(market.market_id(), Some("0xabc"));
    }

    #[test]
    fn test_malformed_fields_parse_to_empty() {
        let market = GammaMarket {
            outcome_prices: Some("not json".to_string()),
            ..Default::default()
        };
        assert!(market.outcome_prices().is_empty());
        assert!(market.outcome_labels().is_empty());
    }

    #[test]
    fn test_market_id_falls_back_to_row_id() {
        let market = GammaMarket {
            id: Some("12345".to_string()),
            condition_id: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(market.market_id(), Some("12345"));
    }

    #[test]
    fn test_trade_side_from_label() {
        assert_eq!(TradeSide::from_label("Yes"), Some(TradeSide::Yes));
        assert_eq!(TradeSide::from_label("NO"), Some(TradeSide::No));
        assert_eq!(TradeSide::from_label("Chiefs"), None);
    }

    #[test]
    fn test_trade_request_serializes_amount_as_number() {
        let request = TradeRequest {
            market_id: "m1".to_string(),
            side: TradeSide::Yes,
            amount: dec!(5.0),
            venue: "simmer".to_string(),
            source: "sdk:arbscanner".to_string(),
            reasoning: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["side"], "yes");
        assert!(json["amount"].is_number());
        assert!(json.get("reasoning").is_none());
    }
}
