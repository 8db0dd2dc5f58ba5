//! kimai-exporter - sum tracked Kimai time per customer
//!
//! Fetches the billable timesheets of a month (or an arbitrary range) for
//! one user, sums them per customer, converts the totals into a target
//! currency using the exchange rate store maintained by `ecbx`, and
//! prints the result as a table, CSV or JSON. The JSON is compatible with
//! the output of `harvest-exporter`, so the same invoicing tools work on
//! both.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::{Datelike, Local};
use clap::{Parser, ValueEnum};
use log::error;

use kimai::api::KimaiApi;
use kimai::dates;
use kimai::error::KimaiError;
use kimai::export::{self, RateStore};

/// Export tracked Kimai time per customer and month
#[derive(Parser, Debug)]
#[command(name = "kimai-exporter")]
#[command(version, about, long_about = None)]
struct Args {
    /// Base URL of the Kimai instance
    #[arg(long, env = "KIMAI_API_URL")]
    api_url: String,

    /// Kimai API token
    #[arg(long, env = "KIMAI_API_KEY")]
    api_key: String,

    /// Username or alias whose timesheets are exported
    #[arg(long, env = "KIMAI_USER")]
    user: String,

    /// Only export entries of this customer
    #[arg(long)]
    client: Option<String>,

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
    let api = KimaiApi::new(args.api_url.clone(), args.api_key.clone());

    let users = api.get_users().await.context("failed to list users")?;
    let mut matches = users.iter().filter(|u| u.matches(&args.user));
    let user = match (matches.next(), matches.next()) {
        (Some(user), None) => user,
        (Some(_), Some(_)) => return Err(KimaiError::AmbiguousUser(args.user.clone()).into()),
        (None, _) => return Err(KimaiError::UserNotFound(args.user.clone()).into()),
    };

    let totals = export::collect_totals(
        &api,
        user,
        &dates::day_start(start),
        &dates::day_end(end),
        args.client.as_deref(),
        args.agency.as_deref(),
    )
    .await
    .context("failed to collect timesheets")?;

    let mut rates = RateStore::at(PathBuf::from(&args.rate_db));
    let rows = export::build_rows(
        &totals,
        user.display_name(),
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
