use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::gateway::{FundsGateway, HttpGateway, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};
use crate::listing::{visible_funds, CategoryFilter, SortDirection, SortKey, SortState};
use crate::portfolio::Portfolio;
use crate::route::Route;
use crate::store::LocalPortfolioStore;

use clap::{arg, ArgMatches, Command};
use eyre::eyre;
use serde::Deserialize;
use serde::Serialize;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod error;
mod format;
mod fund;
mod gateway;
mod history;
mod holding;
mod lenient;
mod listing;
mod portfolio;
mod refresh;
mod report;
mod route;
mod store;
#[cfg(test)]
mod testing;
mod tui;
mod views;

const APP_NAME: &str = "mftracker";
const CONFIG_NAME: &str = "config";

#[derive(Debug, Serialize, Deserialize)]
struct Config {
    api_base_url: String,
    currency: String,
    refresh_interval_secs: u64,
    request_timeout_secs: u64,
    log_file: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_BASE_URL.to_string(),
            currency: "INR".to_string(),
            refresh_interval_secs: 300,
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            log_file: None,
        }
    }
}

fn cli() -> Command {
    Command::new("mftracker_rs")
        .about("Mutual fund NAV dashboard for the terminal")
        .arg_required_else_help(true)
        .arg(
            arg!(--api <URL> "Base URL of the fund API (overrides the config file)")
                .required(false)
                .global(true),
        )
        .subcommand(Command::new("config").about("Print the path to the config file"))
        .subcommand(
            Command::new("summary").about("Show portfolio totals and the market overview"),
        )
        .subcommand(
            Command::new("funds")
                .about("List funds")
                .arg(arg!(-s --search <TEXT> "Only funds whose name or code contains TEXT").required(false))
                .arg(
                    arg!(-c --category <CATEGORY> "Only funds of this category")
                        .required(false)
                        .default_value("all"),
                )
                .arg(
                    arg!(--sort <KEY> "Column to sort by")
                        .required(false)
                        .value_parser(["name", "code", "nav", "category"])
                        .default_value("name"),
                )
                .arg(arg!(--desc "Sort in descending order")),
        )
        .subcommand(Command::new("categories").about("List fund categories"))
        .subcommand(
            Command::new("fund")
                .about("Show a fund's details and recent NAV history")
                .arg(arg!(<ID> "Fund id or scheme code")),
        )
        .subcommand(
            Command::new("portfolio").about("Show your holdings with totals and allocation"),
        )
        .subcommand(
            Command::new("tui").about("Open the interactive dashboard").arg(
                arg!(-r --route <PATH> "View to open: /, /funds, /funds/<ID> or /portfolio")
                    .required(false)
                    .default_value("/"),
            ),
        )
}

enum LogTarget {
    Stderr,
    File(PathBuf),
}

fn init_tracing(target: LogTarget) -> eyre::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match target {
        LogTarget::Stderr => registry
            .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
            .init(),
        LogTarget::File(path) => {
            // the alternate screen owns the terminal, so the TUI logs to a file
            let file = OpenOptions::new().create(true).append(true).open(&path)?;
            registry
                .with(
                    fmt::layer()
                        .with_writer(Mutex::new(file))
                        .with_ansi(false)
                        .with_line_number(true),
                )
                .init();
        }
    }
    Ok(())
}

fn log_file_path(cfg: &Config) -> eyre::Result<PathBuf> {
    match &cfg.log_file {
        Some(path) => Ok(PathBuf::from(path)),
        None => Ok(confy::get_configuration_file_path(APP_NAME, CONFIG_NAME)?
            .with_file_name(format!("{APP_NAME}.log"))),
    }
}

fn api_url(cfg: &Config, matches: &ArgMatches) -> String {
    matches
        .get_one::<String>("api")
        .cloned()
        .unwrap_or_else(|| cfg.api_base_url.clone())
}

// runs one of the one-shot commands against the API
async fn run_command(
    gateway: &dyn FundsGateway,
    name: &str,
    matches: &ArgMatches,
    currency: &str,
) -> eyre::Result<()> {
    match name {
        "summary" => {
            let (items, market) =
                futures::try_join!(gateway.portfolio(), gateway.market_summary())?;
            let health = match gateway.health().await {
                Ok(health) => Some(health),
                Err(e) => {
                    tracing::warn!(error = %e, "health check failed");
                    None
                }
            };
            let totals = Portfolio::from_items(items).totals();
            print!("{}", report::summary(&market, &totals, currency, health.as_ref()));
        }
        "funds" => {
            let funds = gateway.list_funds().await?;
            let search = matches.get_one::<String>("search").map(String::as_str).unwrap_or("");
            let category = matches
                .get_one::<String>("category")
                .map(|c| CategoryFilter::parse(c))
                .unwrap_or_default();
            let key = matches
                .get_one::<String>("sort")
                .map(|k| k.parse::<SortKey>())
                .transpose()
                .map_err(|e| eyre!(e))?
                .unwrap_or_default();
            let direction = if matches.get_flag("desc") {
                SortDirection::Desc
            } else {
                SortDirection::Asc
            };
            let sort = SortState { key, direction };

            let visible = visible_funds(&funds, search, &category, sort);
            println!("{}", report::funds_table(&visible, funds.len(), sort));
        }
        "categories" => {
            for category in gateway.categories().await? {
                println!("{category}");
            }
        }
        "fund" => {
            let id = matches
                .get_one::<String>("ID")
                .ok_or_else(|| eyre!("missing fund id"))?;
            let detail = gateway.fund_detail(id).await?;
            print!("{}", report::fund_detail(&detail));
        }
        "portfolio" => {
            let portfolio = Portfolio::from_items(gateway.portfolio().await?);
            if portfolio.is_empty() {
                println!("No holdings in the portfolio");
                return Ok(());
            }
            portfolio.print(currency);
            portfolio.draw_pie_chart();
            portfolio.print_allocation();
        }
        other => return Err(eyre!("unknown command: {other}")),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let cfg: Config = confy::load(APP_NAME, CONFIG_NAME)?;

    let matches = cli().get_matches();
    let timeout = Duration::from_secs(cfg.request_timeout_secs);

    match matches.subcommand() {
        Some(("config", _)) => {
            println!(
                "Your config file is located here: \n{}",
                confy::get_configuration_file_path(APP_NAME, CONFIG_NAME)?.display()
            );
        }
        Some(("tui", sub)) => {
            init_tracing(LogTarget::File(log_file_path(&cfg)?))?;
            let route: Route = sub
                .get_one::<String>("route")
                .map(String::as_str)
                .unwrap_or("/")
                .parse()?;

            let gateway = HttpGateway::new(&api_url(&cfg, sub), timeout)?;
            let settings = tui::Settings {
                api_base_url: gateway.base_url().to_string(),
                currency: cfg.currency.clone(),
                refresh_interval: Duration::from_secs(cfg.refresh_interval_secs.max(1)),
            };
            tui::run_tui(
                Arc::new(gateway),
                Arc::new(LocalPortfolioStore::new()),
                settings,
                route,
            )
            .await?;
        }
        Some((name, sub)) => {
            init_tracing(LogTarget::Stderr)?;
            let gateway = HttpGateway::new(&api_url(&cfg, sub), timeout)?;
            run_command(&gateway, name, sub, &cfg.currency).await?;
        }
        None => {}
    }
    Ok(())
}
