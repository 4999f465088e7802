//! Surface markets where Simmer's model price diverges from Polymarket

use anyhow::Result;
use clap::Parser;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use simmer_arb::config::Config;
use simmer_arb::divergence::{self, Direction, DivergenceFilter};
use simmer_arb::report;
use simmer_arb::simmer::SimmerClient;

#[derive(Parser, Debug)]
#[command(name = "divergence", about = "Scan for model-vs-market divergence on Simmer")]
struct Args {
    /// Minimum divergence in percent
    #[arg(long, default_value_t = 5.0)]
    min: f64,

    /// Only markets where the model is above the market price
    #[arg(long, conflicts_with = "bearish")]
    bullish: bool,

    /// Only markets where the model is below the market price
    #[arg(long)]
    bearish: bool,

    /// Show only high-conviction opportunities
    #[arg(long, short = 'o')]
    opportunities: bool,

    /// Machine-readable output
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::from_env()?;

    let _subscriber = FmtSubscriber::builder()
        .with_max_level(match config.log_level.as_str() {
            "debug" => Level::DEBUG,
            _ => Level::WARN, // keep the table clean unless asked
        })
        .with_target(false)
        .compact()
        .init();

    let client = SimmerClient::new(&config)?;
    let markets = client.get_markets().await?;

    let direction = if args.bullish {
        Some(Direction::Bullish)
    } else if args.bearish {
        Some(Direction::Bearish)
    } else {
        None
    };

    let filter = DivergenceFilter {
        min_divergence: args.min / 100.0,
        direction,
    };
    let rows = divergence::screen(&markets, &filter);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if args.opportunities {
        let top = divergence::top_opportunities(&rows, 5);
        if top.is_empty() {
            println!("No high-divergence opportunities right now.");
            return Ok(());
        }
        for row in &top {
            let action = match row.signal {
                divergence::Signal::Buy => "BUY YES",
                divergence::Signal::Sell => "BUY NO",
                divergence::Signal::Hold => "HOLD",
            };
            println!("📌 {}", row.question);
            println!(
                "   {} (model: {:.0}% vs market: {:.0}%) | divergence {:+.1}%",
                action,
                row.model_probability * 100.0,
                row.market_price * 100.0,
                row.divergence * 100.0
            );
            if let Some(resolves) = &row.resolves_at {
                println!("   Resolves: {}", resolves);
            }
            println!();
        }
        return Ok(());
    }

    let summary = divergence::summarize(&rows);
    println!("{}", report::render_divergence_table(&rows, &summary));

    Ok(())
}
