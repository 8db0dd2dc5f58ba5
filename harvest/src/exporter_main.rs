//! harvest-exporter - sum tracked Harvest time per user and task
//!
//! Fetches the entries of a month (or an arbitrary range), sums them per
//! user and task, converts the totals into a target currency using the
//! exchange rate store maintained by `ecbx`, and prints the result as a
//! table, CSV or JSON.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::{Datelike, Local};
use clap::{Parser, ValueEnum};
use log::error;

use harvest::api::HarvestApi;
use harvest::dates;
use harvest::export::{self, RateStore};

/// Export tracked Harvest time per user, task and month
#[derive(Parser, Debug)]
#[command(name = "harvest-exporter")]
#[command(version, about, long_about = None)]
struct Args {
    /// Harvest account id
    #[arg(long, env = "HARVEST_ACCOUNT_ID")]
    account_id: String,

    /// Harvest personal access token
    #[arg(long, env = "HARVEST_BEARER_TOKEN")]
    bearer_token: String,

    /// Only export entries of this user (defaults to the token's user)
    #[arg(long, env = "HARVEST_USER")]
    user: Option<String>,

    /// Export entries of all users
    #[arg(long, conflicts_with = "user")]
    all_users: bool,

    /// First day of the range, YYYY-MM-DD or YYYYMMDD
    #[arg(long)]
    start: Option<String>,

    /// Last day of the range, YYYY-MM-DD or YYYYMMDD
    #[arg(long)]
    end: Option<String>,

    /// Export this month (defaults to the previous month)
    #[arg(long, conflicts_with_all = ["start", "end"], value_parser = clap::value_parser!(u32).range(1..=12))]
    month: Option<u32>,

    /// Year the --month belongs to (defaults to the current year)
    #[arg(long, requires = "month", conflicts_with_all = ["start", "end"])]
    year: Option<i32>,

    /// Currency to convert all totals into
    #[arg(long, default_value = "EUR")]
    currency: String,

    /// Agency the invoices are routed through; its cut is taken off the rates
    #[arg(long)]
    agency: Option<String>,

    /// Exchange rate database maintained by ecbx
    #[arg(long, default_value_t = default_rate_db())]
    rate_db: String,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Humanreadable)]
    format: Format,

    /// Display additional information
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Humanreadable,
    Csv,
    Json,
}

/// Returns the default rate database path: ~/.config/ecbx/rates.db
fn default_rate_db() -> String {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ecbx")
        .join("rates.db")
        .to_string_lossy()
        .to_string()
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    if let Err(e) = run(args).await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    let today = Local::now().date_naive();
    let (start, end) = if let Some(month) = args.month {
        let year = args.year.unwrap_or_else(|| today.year());
        dates::month_bounds(year, month)
            .with_context(|| format!("invalid month: {year}-{month:02}"))?
    } else {
        let (previous_start, previous_end) =
            dates::previous_month(today).context("failed to compute the previous month")?;
        let start = match &args.start {
            Some(raw) => dates::parse_date(raw)?,
            None => previous_start,
        };
        let end = match &args.end {
            Some(raw) => dates::parse_date(raw)?,
            None => previous_end,
        };
        (start, end)
    };
    if start > end {
        bail!("start {start} is after end {end}");
    }

    let currency = args.currency.to_uppercase();
    let api = HarvestApi::new(args.account_id.clone(), args.bearer_token.clone());

    let filter_user = if args.all_users {
        None
    } else {
        match args.user.clone() {
            Some(user) => Some(user),
            None => {
                let me = api
                    .get_current_user()
                    .await
                    .context("failed to resolve the authenticated user")?;
                Some(me.display_name())
            }
        }
    };

    let entries = api
        .get_time_entries(&dates::iso(start), &dates::iso(end))
        .await
        .context("failed to fetch time entries")?;

    let mut totals = export::aggregate(&entries, args.agency.as_deref())?;
    if let Some(user) = &filter_user {
        if !totals.contains_key(user) {
            let known: Vec<&str> = totals.keys().map(String::as_str).collect();
            bail!(
                "no billable entries for {user:?} between {start} and {end}; \
                 users with entries: {}",
                if known.is_empty() {
                    "none".to_string()
                } else {
                    known.join(", ")
                }
            );
        }
        totals.retain(|name, _| name == user);
    }

    let mut rates = RateStore::at(PathBuf::from(&args.rate_db));
    let rows = export::build_rows(
        &totals,
        start,
        end,
        &currency,
        args.agency.as_deref(),
        &mut rates,
    )
    .context("failed to build the export")?;

    match args.format {
        Format::Humanreadable => print!("{}", export::as_humanreadable(&rows)),
        Format::Csv => print!("{}", export::as_csv(&rows)?),
        Format::Json => println!("{}", export::as_json(&rows)?),
    }
    Ok(())
}
