// solprobe: command-line front end over the solprobe library.
//
// Every command prints pretty JSON on stdout. Failures go to stderr and the
// process exits with status 1.

use clap::{ArgAction, Parser, Subcommand};
use log::debug;
use serde::Serialize;
use solprobe::engine::helpers::{amount_to_raw, lamports_to_amount, resolve_token, validate_address};
use solprobe::engine::jupiter::{QuoteRequest, UltraOrderRequest};
use solprobe::{
    resolve, BalanceSource, EngineError, EngineResult, HeliusBalanceSource, HeliusService, JupiterClient, Network, Settings,
    WhaleQuery,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "solprobe")]
#[command(author, version, about = "Solana ledger probe", long_about = None)]
struct Cli {
    /// Config file (defaults to <config_dir>/solprobe/config.toml)
    #[arg(long, global = true, env = "SOLPROBE_CONFIG")]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// mainnet or devnet
    #[arg(long, global = true, default_value = "mainnet", value_parser = parse_network)]
    network: Network,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Find a wallet holding a token and enough SOL for fees
    Whale {
        /// Mint address or known symbol
        mint: String,
        /// Minimum token holding, natural units
        #[arg(long, default_value_t = 1000.0)]
        min_amount: f64,
        /// Minimum SOL balance
        #[arg(long, default_value_t = 0.1)]
        min_sol: f64,
        /// Maximum scan pages
        #[arg(long, default_value_t = 20)]
        iteration_budget: u32,
        #[arg(long, default_value_t = 1000)]
        page_size: u32,
        /// Native-balance probes in flight at once
        #[arg(long, default_value_t = 8)]
        concurrency: usize,
        /// Known whale to try last (repeatable)
        #[arg(long = "seed")]
        seeds: Vec<String>,
        /// Wall-clock bound on the scan, in seconds
        #[arg(long)]
        deadline_secs: Option<u64>,
    },
    /// Native SOL balance of an address
    Balance { address: String },
    /// Largest token accounts of a mint
    Holders { mint: String },
    /// Jupiter swap quote
    Quote {
        /// Input mint or symbol
        input: String,
        /// Output mint or symbol
        output: String,
        /// Input amount in natural units ("1.5")
        amount: String,
        #[arg(long, default_value_t = 50)]
        slippage_bps: u16,
    },
    /// Jupiter ultra order (unsigned); a whale taker is looked up when omitted
    Order {
        input: String,
        output: String,
        /// Input amount in natural units
        amount: String,
        #[arg(long)]
        taker: Option<String>,
    },
}

fn parse_network(raw: &str) -> Result<Network, String> {
    raw.parse::<Network>().map_err(|e| e.to_string())
}

#[derive(Serialize)]
struct BalanceOutput<'a> {
    address: &'a str,
    network: Network,
    lamports: u64,
    sol: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(value) => match serde_json::to_string_pretty(&value) {
            Ok(out) => {
                println!("{}", out);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("error: {}", e);
                ExitCode::FAILURE
            }
        },
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

async fn run(cli: Cli) -> EngineResult<serde_json::Value> {
    let settings = Settings::load(cli.config.as_deref())?;
    let network = cli.network;
    debug!("[cli] {:?} on {}", cli.command, network);

    match cli.command {
        Command::Whale {
            mint,
            min_amount,
            min_sol,
            iteration_budget,
            page_size,
            concurrency,
            seeds,
            deadline_secs,
        } => {
            let (mint, _) = resolve_token(&mint)?;
            let mut query = WhaleQuery::new(mint, network)
                .with_min_amount(min_amount)
                .with_min_sol(min_sol)
                .with_iteration_budget(iteration_budget)
                .with_page_size(page_size)
                .with_concurrency(concurrency)
                .with_seeds(seeds);
            if let Some(secs) = deadline_secs {
                query = query.with_deadline(Duration::from_secs(secs));
            }
            let source = HeliusBalanceSource::new(HeliusService::from_settings(&settings)?);
            Ok(serde_json::to_value(resolve(&query, &source).await?)?)
        }
        Command::Balance { address } => {
            let address = validate_address(&address)?;
            let helius = HeliusService::from_settings(&settings)?;
            let lamports = helius.get_balance(address, network, None).await?;
            Ok(serde_json::to_value(BalanceOutput {
                address,
                network,
                lamports,
                sol: lamports_to_amount(lamports, 9),
            })?)
        }
        Command::Holders { mint } => {
            let (mint, _) = resolve_token(&mint)?;
            let helius = HeliusService::from_settings(&settings)?;
            Ok(serde_json::to_value(helius.get_token_largest_accounts(&mint, network, None).await?)?)
        }
        Command::Quote { input, output, amount, slippage_bps } => {
            let (input_mint, raw) = input_amount(&settings, &input, &amount, network).await?;
            let (output_mint, _) = resolve_token(&output)?;
            let request = QuoteRequest::new(input_mint, output_mint, raw).with_slippage_bps(slippage_bps);
            let quote = JupiterClient::from_settings(&settings)?.quote(&request).await?;
            Ok(serde_json::to_value(quote)?)
        }
        Command::Order { input, output, amount, taker } => {
            let (input_mint, raw) = input_amount(&settings, &input, &amount, network).await?;
            let (output_mint, _) = resolve_token(&output)?;
            let mut request = UltraOrderRequest::new(input_mint, output_mint, raw.to_string());
            request.network = network;
            request.taker = taker.map(|t| validate_address(&t).map(str::to_string)).transpose()?;

            let jupiter = JupiterClient::from_settings(&settings)?;
            // Taker lookup needs Helius; without a key the order goes out taker-less.
            let whales = match request.taker {
                Some(_) => None,
                None => HeliusService::from_settings(&settings).ok().map(HeliusBalanceSource::new),
            };
            let order = jupiter
                .ultra_order(&request, whales.as_ref().map(|w| w as &dyn BalanceSource), None)
                .await?;
            Ok(serde_json::to_value(order)?)
        }
    }
}

/// Resolve the input token and convert `amount` to base units, fetching the
/// mint's decimals when the token is not a known symbol.
async fn input_amount(
    settings: &Settings,
    token: &str,
    amount: &str,
    network: Network,
) -> EngineResult<(String, u64)> {
    let (mint, decimals) = resolve_token(token)?;
    let decimals = match decimals {
        Some(d) => d,
        None => HeliusService::from_settings(settings)?.get_mint_decimals(&mint, network).await?,
    };
    let raw = amount_to_raw(amount, decimals)?;
    if raw == 0 {
        return Err(EngineError::InvalidInput("amount must be greater than zero".into()));
    }
    Ok((mint, raw))
}
