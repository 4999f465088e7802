use anyhow::Result;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use crate::detector::Opportunity;
use crate::scanner::ScanReport;

/// Appends scan history as JSONL for later analysis
pub struct ScanLogger {
    log_dir: String,
    session_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpportunityLog {
    pub timestamp: DateTime<Utc>,
    pub scan_id: String,
    pub market_id: String,
    pub title: String,
    pub classification: String,
    pub action: String,
    pub total_cost: Decimal,
    pub profit: Decimal,
    pub roi: Decimal,
    pub capital_allocated: Decimal,
    pub leg_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanLog {
    pub timestamp: DateTime<Utc>,
    pub scan_id: String,
    pub groups_evaluated: usize,
    pub opportunities_found: usize,
    pub total_potential_profit: Decimal,
    pub average_roi: Decimal,
    pub executed: u32,
    pub is_dry_run: bool,
}

impl ScanLogger {
    pub fn new(log_dir: &str) -> Result<Self> {
        let session_id = Utc::now().format("%Y%m%d_%H%M%S").to_string();

        fs::create_dir_all(log_dir)?;

        Ok(Self {
            log_dir: log_dir.to_string(),
            session_id,
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Log one detected opportunity
    pub fn log_opportunity(&self, scan_id: &str, opportunity: &Opportunity) -> Result<()> {
        let entry = OpportunityLog {
            timestamp: Utc::now(),
            scan_id: scan_id.to_string(),
            market_id: opportunity.market_id.clone(),
            title: opportunity.title.clone(),
            classification: opportunity.classification.to_string(),
            action: opportunity.action.to_string(),
            total_cost: opportunity.total_cost,
            profit: opportunity.profit,
            roi: opportunity.roi,
            capital_allocated: opportunity.capital_allocated,
            leg_count: opportunity.legs.len(),
        };
        let file_path = format!("{}/opportunities_{}.jsonl", self.log_dir, self.session_id);
        self.append_json(&file_path, &entry)
    }

    /// Log the cycle-level summary
    pub fn log_scan(&self, report: &ScanReport, executed: u32, is_dry_run: bool) -> Result<()> {
        let entry = ScanLog {
            timestamp: Utc::now(),
            scan_id: report.scan_id.clone(),
            groups_evaluated: report.groups_evaluated,
            opportunities_found: report.opportunities.len(),
            total_potential_profit: report.total_potential_profit(),
            average_roi: report.average_roi(),
            executed,
            is_dry_run,
        };
        let file_path = format!("{}/scans.jsonl", self.log_dir);
        self.append_json(&file_path, &entry)
    }

    fn append_json<T: Serialize>(&self, file_path: &str, data: &T) -> Result<()> {
        let json = serde_json::to_string(data)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(file_path)?;
        writeln!(file, "{}", json)?;
        Ok(())
    }

    /// Read back a session's opportunity history
    pub fn read_opportunities(log_dir: &str, session_id: &str) -> Result<Vec<OpportunityLog>> {
        let file_path = format!("{}/opportunities_{}.jsonl", log_dir, session_id);
        Self::read_jsonl(&file_path)
    }

    /// Read back every scan summary
    pub fn read_scans(log_dir: &str) -> Result<Vec<ScanLog>> {
        let file_path = format!("{}/scans.jsonl", log_dir);
        Self::read_jsonl(&file_path)
    }

    fn read_jsonl<T: for<'de> Deserialize<'de>>(file_path: &str) -> Result<Vec<T>> {
        if !Path::new(file_path).exists() {
            return Ok(vec![]);
        }

        let content = fs::read_to_string(file_path)?;
        let mut results = Vec::new();

        for line in content.lines() {
            if !line.trim().is_empty() {
                let item: T = serde_json::from_str(line)?;
                results.push(item);
            }
        }

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScanConfig;
    use crate::detector::{self, GroupKind, OutcomeGroup, OutcomeQuote};
    use rust_decimal_macros::dec;

    fn sample_opportunity() -> Opportunity {
        let group = OutcomeGroup {
            market_id: "0x1".to_string(),
            title: "Test market".to_string(),
            kind: GroupKind::BinaryPair,
            quotes: vec![
                OutcomeQuote {
                    token_id: "a".to_string(),
                    label: "Yes".to_string(),
                    price: dec!(0.53),
                    fetched_at: None,
                },
                OutcomeQuote {
                    token_id: "b".to_string(),
                    label: "No".to_string(),
                    price: dec!(0.42),
                    fetched_at: None,
                },
            ],
        };
        detector::evaluate(&group, &ScanConfig::default()).unwrap()
    }

    #[test]
    fn test_opportunity_log_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let logger = ScanLogger::new(dir.path().to_str().unwrap()).unwrap();

        logger.log_opportunity("scan-1", &sample_opportunity()).unwrap();
        logger.log_opportunity("scan-1", &sample_opportunity()).unwrap();

        let entries = ScanLogger::read_opportunities(
            dir.path().to_str().unwrap(),
            logger.session_id(),
        )
        .unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].classification, "single_condition");
        assert_eq!(entries[0].profit, dec!(0.05));
        assert_eq!(entries[0].leg_count, 2);
    }

    #[test]
    fn test_missing_log_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let entries =
            ScanLogger::read_opportunities(dir.path().to_str().unwrap(), "nope").unwrap();
        assert!(entries.is_empty());
    }
}
