/// Arbitrage scanner for Polymarket prediction markets
///
/// This library provides components for detecting price arbitrage on
/// Polymarket. When the ask prices of a market's mutually exclusive
/// outcomes sum to less than $1, buying every outcome locks in a profit
/// regardless of which one resolves. Detected opportunities can be
/// reported or executed through the Simmer trading API.

pub mod alerts;
pub mod config;
pub mod datalog;
pub mod detector;
pub mod divergence;
pub mod executor;
pub mod market;
pub mod report;
pub mod retry;
pub mod scanner;
pub mod simmer;
pub mod types;
