pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use orderdesk_core::config::LoadOptions;
use orderdesk_core::domain::paging::QueryParams;

use crate::commands::query::QueryCommand;
use crate::commands::CommandResult;

#[derive(Debug, Parser)]
#[command(
    name = "orderdesk",
    about = "Orderdesk operator CLI",
    long_about = "Browse customers, orders and sales predictions against the order backend, \
                  falling back to the built-in dataset when the backend is unreachable.",
    after_help = "Examples:\n  orderdesk customers --search mexico --page-size 5\n  \
                  orderdesk --offline order-detail 10248\n  orderdesk doctor --json"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Serve every request from the built-in dataset")]
    offline: bool,
    #[arg(long, global = true, value_name = "PATH", help = "Explicit config file path")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "List customers (filters: CompanyName, ContactName, Country, City)")]
    Customers(ListArgs),
    #[command(about = "List orders (filters: ShipName, ShipCountry, CustId, Status)")]
    Orders(ListArgs),
    #[command(about = "List sales predictions (filters: CustomerName)")]
    Predictions(ListArgs),
    #[command(about = "Show one order with reconciled line items and totals")]
    OrderDetail {
        #[arg(value_name = "ORDER_ID")]
        order_id: i64,
    },
    #[command(about = "List every order placed by one customer")]
    CustomerOrders {
        #[arg(value_name = "CUSTOMER_ID")]
        cust_id: i64,
    },
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, the fallback dataset, and backend reachability")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

#[derive(Debug, Args)]
struct ListArgs {
    #[arg(long, value_name = "N")]
    page: Option<u32>,
    #[arg(long, value_name = "N")]
    page_size: Option<u32>,
    #[arg(long, value_name = "FIELD [asc|desc]", help = "e.g. \"companyName desc\"")]
    order_by: Option<String>,
    #[arg(long, value_name = "TERM")]
    search: Option<String>,
    #[arg(long = "filter", value_name = "KEY=VALUE", value_parser = parse_filter)]
    filters: Vec<(String, String)>,
}

impl ListArgs {
    fn into_params(self) -> QueryParams {
        QueryParams {
            page_number: self.page,
            page_size: self.page_size,
            order_by: self.order_by,
            search_term: self.search,
            filters: self.filters,
        }
    }
}

fn parse_filter(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got `{raw}`")),
    }
}

impl Cli {
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            config_path: self.config.clone(),
            require_file: self.config.is_some(),
            ..LoadOptions::default()
        }
    }
}

pub fn run(cli: Cli) -> ExitCode {
    let options = cli.load_options();
    let offline = cli.offline;

    let result = match cli.command {
        Command::Customers(args) => {
            commands::query::run(QueryCommand::Customers(args.into_params()), options, offline)
        }
        Command::Orders(args) => {
            commands::query::run(QueryCommand::Orders(args.into_params()), options, offline)
        }
        Command::Predictions(args) => {
            commands::query::run(QueryCommand::Predictions(args.into_params()), options, offline)
        }
        Command::OrderDetail { order_id } => {
            commands::query::run(QueryCommand::OrderDetail(order_id), options, offline)
        }
        Command::CustomerOrders { cust_id } => {
            commands::query::run(QueryCommand::CustomerOrders(cust_id), options, offline)
        }
        Command::Config => CommandResult { exit_code: 0, output: commands::config::run(options) },
        Command::Doctor { json } => CommandResult {
            exit_code: 0,
            output: commands::doctor::run(options, offline, json),
        },
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
