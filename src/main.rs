use anyhow::Result;
use clap::Parser;
use std::time::Duration;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use simmer_arb::alerts::AlertClient;
use simmer_arb::config::Config;
use simmer_arb::datalog::ScanLogger;
use simmer_arb::executor::ArbExecutor;
use simmer_arb::market::GammaClient;
use simmer_arb::report;
use simmer_arb::retry::CircuitBreaker;
use simmer_arb::scanner;
use simmer_arb::simmer::SimmerClient;

/// Cap on trades per cycle; a scan that lights up everywhere is more
/// likely stale data than free money
const MAX_EXECUTIONS_PER_SCAN: usize = 3;

#[derive(Parser, Debug)]
#[command(name = "simmer-arb", about = "Scan Polymarket for arbitrage and execute via Simmer")]
struct Args {
    /// Number of markets to fetch per scan
    #[arg(long, default_value_t = 100)]
    limit: u32,

    /// Execute trades on detected opportunities
    #[arg(long)]
    execute: bool,

    /// Walk the execution path but submit nothing
    #[arg(long)]
    dry_run: bool,

    /// Trading venue passed through to Simmer
    #[arg(long, default_value = "simmer")]
    venue: String,

    /// Re-scan continuously at this interval (seconds)
    #[arg(long)]
    watch: Option<u64>,

    /// Opportunities to show in the report
    #[arg(long, default_value_t = 5)]
    top: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::from_env()?;

    let _subscriber = FmtSubscriber::builder()
        .with_max_level(match config.log_level.as_str() {
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        })
        .with_target(false)
        .compact()
        .init();

    let dry_run = args.dry_run || config.dry_run;
    if args.execute && config.dry_run && !args.dry_run {
        warn!("DRY_RUN=true in environment; orders will not be submitted");
    }

    info!("╔═══════════════════════════════════════╗");
    info!("║        Simmer Arbitrage Scanner       ║");
    info!("╠═══════════════════════════════════════╣");
    info!("║ Mode: {:31} ║", if dry_run { "DRY RUN (no real orders)" } else { "LIVE TRADING" });
    info!("║ Min profit: ${:24} ║", config.scan.min_profit);
    info!("║ Min ROI: {:28} ║", config.scan.min_roi);
    info!("║ Per-leg size: ${:22} ║", config.scan.trade_size);
    info!("║ Max per opportunity: ${:15} ║", config.scan.max_trade_size);
    info!("╚═══════════════════════════════════════╝");

    let alerts = AlertClient::new(config.discord_webhook.clone());
    alerts.scanner_started(dry_run).await;

    let logger = ScanLogger::new(&config.data_dir)?;
    info!("Scan history in {}/ (session: {})", config.data_dir, logger.session_id());

    let gamma = GammaClient::new(&config)?;

    // Execution needs a Simmer key; without one we scan and report only
    let executor = if args.execute || args.dry_run {
        match SimmerClient::new(&config) {
            Ok(client) => Some(ArbExecutor::new(client, args.venue.clone(), dry_run)),
            Err(_) => {
                warn!("SIMMER_API_KEY not set - scan only, no execution");
                None
            }
        }
    } else {
        None
    };

    match args.watch {
        Some(secs) => {
            let interval = Duration::from_secs(secs.max(1));
            let breaker = CircuitBreaker::new(5, Duration::from_secs(300));
            info!("Watching every {:?}", interval);

            loop {
                if breaker.is_open() {
                    warn!("Too many consecutive scan failures, pausing");
                } else {
                    match run_scan(&args, &config, &gamma, executor.as_ref(), &alerts, &logger, dry_run)
                        .await
                    {
                        Ok(()) => breaker.record_success(),
                        Err(e) => {
                            error!("Scan failed: {}", e);
                            alerts.error("Scan failed", &e.to_string()).await;
                            breaker.record_failure();
                        }
                    }
                }
                tokio::time::sleep(interval).await;
            }
        }
        None => {
            run_scan(&args, &config, &gamma, executor.as_ref(), &alerts, &logger, dry_run).await
        }
    }
}

/// One scan cycle: detect, report, optionally execute, log
async fn run_scan(
    args: &Args,
    config: &Config,
    gamma: &GammaClient,
    executor: Option<&ArbExecutor>,
    alerts: &AlertClient,
    logger: &ScanLogger,
    dry_run: bool,
) -> Result<()> {
    info!("Fetching up to {} Polymarket markets...", args.limit);
    let scan_report = scanner::scan(gamma, &config.scan, args.limit).await?;

    println!("{}", report::render_opportunities(&scan_report, args.top));
    println!("{}", report::render_summary(&scan_report));

    for opportunity in &scan_report.opportunities {
        alerts.opportunity_found(opportunity).await;
        logger.log_opportunity(&scan_report.scan_id, opportunity)?;
    }

    let mut executed = 0u32;
    if let Some(executor) = executor {
        for opportunity in scan_report
            .opportunities
            .iter()
            .take(MAX_EXECUTIONS_PER_SCAN)
        {
            match executor.execute(opportunity).await {
                Ok(result) if result.dry_run => {}
                Ok(result) => {
                    executed += 1;
                    if result.all_filled() {
                        alerts
                            .trades_submitted(
                                &result.title,
                                result.filled_legs(),
                                opportunity.capital_allocated,
                            )
                            .await;
                    } else {
                        // Open directional exposure; flag loudly and move on
                        warn!(
                            "Partial execution: {}/{} legs filled on {}",
                            result.filled_legs(),
                            result.legs.len(),
                            result.title
                        );
                        alerts.error("Partial execution", &result.title).await;
                    }
                }
                Err(e) => {
                    error!("Execution failed for {}: {}", opportunity.title, e);
                    alerts.error("Execution failed", &e.to_string()).await;
                }
            }
        }
    }

    logger.log_scan(&scan_report, executed, dry_run)?;
    alerts
        .scan_complete(
            scan_report.opportunities.len(),
            scan_report.total_potential_profit(),
        )
        .await;

    Ok(())
}
