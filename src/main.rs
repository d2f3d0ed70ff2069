use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use quotekeeper::core::log::init_logging;
use quotekeeper::core::symbol::{MARKET_SOURCE, STOCK_KIND};
use std::path::Path;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Resolve the current price of an asset
    Resolve {
        /// Ticker or asset name
        symbol: String,
        /// Asset kind; only "stock" is priced live
        #[arg(long, default_value = STOCK_KIND)]
        kind: String,
        /// Source tag; only "market_api" is priced live
        #[arg(long, default_value = MARKET_SOURCE)]
        source: String,
        /// Value returned when no live price is available
        #[arg(long, default_value_t = 0.0)]
        stored: f64,
    },
    /// Show the durable cache entry for a symbol
    Cached { symbol: String },
    /// Resolve every market-priced holding
    Refresh,
}

impl Commands {
    fn into_app_command(self) -> Option<quotekeeper::AppCommand> {
        match self {
            Commands::Setup => None,
            Commands::Resolve {
                symbol,
                kind,
                source,
                stored,
            } => Some(quotekeeper::AppCommand::Resolve {
                symbol,
                kind,
                source,
                stored,
            }),
            Commands::Cached { symbol } => Some(quotekeeper::AppCommand::Cached { symbol }),
            Commands::Refresh => Some(quotekeeper::AppCommand::Refresh),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command.map(Commands::into_app_command) {
        Some(Some(cmd)) => quotekeeper::run_command(cmd, cli.config_path.as_deref()).await,
        Some(None) => {
            let path = cli.config_path.as_deref().map(Path::new);
            quotekeeper::cli::setup::run(path).map(|_| ())
        }
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
