//! `viva`: drive the Viva Payments API from the command line.
//!
//! Credentials come from flags or `VIVA_MERCHANT_ID` / `VIVA_API_KEY`.
//! Responses are printed as pretty JSON on stdout; logs go to stderr.

mod observability;

use std::time::Duration;

use clap::{Parser, Subcommand};
use miette::{miette, IntoDiagnostic, Result};
use viva_core::{ApiResponse, ClientConfig, Environment, Params, UreqTransport, VivaClient};

use crate::observability::{init_logging, LogFormat};

#[derive(Parser)]
#[command(name = "viva", author, version, about, long_about = None)]
struct Cli {
    /// Merchant id used as the Basic auth user name
    #[arg(long, env = "VIVA_MERCHANT_ID")]
    merchant_id: String,

    /// API key used as the Basic auth password
    #[arg(long, env = "VIVA_API_KEY", hide_env_values = true)]
    api_key: String,

    /// Use the production endpoints instead of the sandbox
    #[arg(long, env = "VIVA_PRODUCTION")]
    production: bool,

    /// Root of an API-compatible host (e.g. a local mock); overrides --production
    #[arg(long, env = "VIVA_BASE_URL")]
    base_url: Option<String>,

    /// Request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a payment order
    CreateOrder {
        /// Amount in cents
        #[arg(long)]
        amount: u64,
        /// Extra request field, repeatable
        #[arg(long = "param", value_name = "KEY=VALUE", value_parser = parse_param)]
        params: Vec<(String, String)>,
        /// Also print the checkout URL for the new order
        #[arg(long)]
        redirect: bool,
    },
    /// Cancel a payment order
    CancelOrder {
        order_code: String,
        #[arg(long = "param", value_name = "KEY=VALUE", value_parser = parse_param)]
        params: Vec<(String, String)>,
    },
    /// Show a transaction
    GetTransaction {
        transaction_id: String,
        #[arg(long = "param", value_name = "KEY=VALUE", value_parser = parse_param)]
        params: Vec<(String, String)>,
    },
    /// Charge again using an earlier transaction
    Recurring {
        transaction_id: String,
        #[arg(long = "param", value_name = "KEY=VALUE", value_parser = parse_param)]
        params: Vec<(String, String)>,
    },
    /// Cancel or refund a transaction
    CancelTransaction {
        transaction_id: String,
        /// Amount in cents
        #[arg(long)]
        amount: u64,
    },
    /// Print the checkout URL for an order code (no network)
    RedirectUrl { order_code: String },
}

fn parse_param(raw: &str) -> std::result::Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{raw}'")),
    }
}

fn print_response(response: &ApiResponse) -> Result<()> {
    let rendered = serde_json::to_string_pretty(response).into_diagnostic()?;
    println!("{rendered}");
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(LogFormat::from_env());

    let environment = match cli.base_url {
        Some(root) => Environment::custom(root),
        None => Environment::from_production_flag(cli.production),
    };
    let config = ClientConfig::new(cli.merchant_id, cli.api_key, cli.production).with_environment(environment);
    let transport = UreqTransport::with_timeout(cli.timeout.map(Duration::from_secs));
    let client = VivaClient::with_transport(config, transport);

    match cli.command {
        Command::CreateOrder { amount, params, redirect } => {
            let response = client.create_order(amount, params.into_iter().collect()).into_diagnostic()?;
            print_response(&response)?;
            if redirect {
                let code = response
                    .order_code()
                    .ok_or_else(|| miette!("response carries no OrderCode"))?;
                println!("{}", client.get_redirect_url(code));
            }
        }
        Command::CancelOrder { order_code, params } => {
            print_response(&client.cancel_order(order_code, params.into_iter().collect()).into_diagnostic()?)?;
        }
        Command::GetTransaction { transaction_id, params } => {
            print_response(&client.get_transaction(transaction_id, params.into_iter().collect()).into_diagnostic()?)?;
        }
        Command::Recurring { transaction_id, params } => {
            let extra: Params = params.into_iter().collect();
            print_response(&client.create_recurring_transaction(transaction_id, extra).into_diagnostic()?)?;
        }
        Command::CancelTransaction { transaction_id, amount } => {
            print_response(&client.cancel_transaction(transaction_id, amount).into_diagnostic()?)?;
        }
        Command::RedirectUrl { order_code } => {
            println!("{}", client.get_redirect_url(order_code));
        }
    }

    Ok(())
}
