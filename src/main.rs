//! `launchpad` - read-only command line access to the launchpad engine
//!
//! Lists tokens, resolves pools and prints quotes against any configured
//! chain. Nothing here signs or sends transactions.

use alloy_primitives::utils::{format_ether, parse_ether};
use alloy_primitives::Address;
use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use launchpad_engine::{ChainRegistry, EngineConfig, LaunchpadClient, TradeAction};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "launchpad", version, about = "Inspect tokens, pools and quotes on the launchpad")]
struct Cli {
    /// JSON file with chain definitions
    #[arg(long, default_value = "chains.json")]
    chains: PathBuf,

    /// Optional JSON file with engine settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Chain to query; defaults to the first configured chain
    #[arg(long)]
    chain: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List configured chains
    Chains,
    /// List every token the factory knows about
    Tokens,
    /// Show a token's descriptor and pool state
    Info { token: Address },
    /// Resolve the pool backing a token
    Pool { token: Address },
    /// Quote a trade. Amounts are in whole units with 18 decimals.
    Quote {
        token: Address,
        amount: String,
        /// Quote a sell instead of a buy
        #[arg(long)]
        sell: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let registry = ChainRegistry::from_file(&cli.chains)?;
    let config = match &cli.config {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    };

    if let Command::Chains = cli.command {
        for chain in registry.chains() {
            let factory = chain
                .factory_address
                .map(|address| address.to_string())
                .unwrap_or_else(|| "-".to_string());
            println!("{:>10}  {:<20} {:<6} factory {}", chain.chain_id, chain.name, chain.native_currency.symbol, factory);
        }
        return Ok(());
    }

    let chain_id = match cli.chain {
        Some(id) => id,
        None => registry
            .chains()
            .next()
            .map(|chain| chain.chain_id)
            .ok_or_else(|| anyhow!("chain registry {} is empty", cli.chains.display()))?,
    };
    info!("Using {} ({})", registry.display_name(chain_id), chain_id);

    let client = LaunchpadClient::builder(registry, chain_id).with_config(config).build()?;

    match cli.command {
        Command::Chains => {}
        Command::Tokens => {
            let tokens = client.get_all_tokens().await;
            for token in &tokens {
                println!("{}", token);
            }
            info!("{} tokens", tokens.len());
        }
        Command::Info { token } => match client.get_token_info(token).await {
            Some(info) => println!("{}", serde_json::to_string_pretty(&info)?),
            None => println!("{} is not a launchpad token", token),
        },
        Command::Pool { token } => {
            let pool = client.resolve_pool_address(token).await?;
            println!("{}", pool);
        }
        Command::Quote { token, amount, sell } => {
            let amount = parse_ether(&amount).with_context(|| format!("Invalid amount {}", amount))?;
            let action = if sell { TradeAction::Sell } else { TradeAction::Buy };
            let quote = client.get_swap_quote(token, amount, action).await?;

            println!("{} {} via {:?}", action, format_ether(quote.input_amount), quote.route);
            println!("  output         {}", format_ether(quote.output_amount));
            println!("  minimum        {} ({}% slippage)", format_ether(quote.minimum_output), quote.slippage_percent);
            println!("  price impact   {:.2}%", quote.price_impact_percent);
            println!("  gas fee (est.) {}", format_ether(quote.estimated_gas_fee));
            println!("  pool           {}", quote.pool);
        }
    }

    Ok(())
}
