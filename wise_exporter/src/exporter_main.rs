//! wise-exporter - download Wise balance statements
//!
//! Fetches the compact JSON statement of every standard balance of a
//! Wise profile for a month (or an arbitrary range) and writes one
//! file per balance. Strong customer authentication challenges are
//! answered with the configured signing key, PIN or a one-time code.

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::{Datelike, Local};
use clap::Parser;
use log::{error, warn};

use wise_exporter::api::{WiseApi, WISE_SANDBOX_URL};
use wise_exporter::dates;
use wise_exporter::sca::Signer;

/// Download Wise balance statements for bookkeeping
#[derive(Parser, Debug)]
#[command(name = "wise-exporter")]
#[command(version, about, long_about = None)]
struct Args {
    /// Wise personal API token
    #[arg(long, env = "WISE_API_TOKEN")]
    api_token: String,

    /// PEM private key whose public half is registered with Wise,
    /// used to sign signature challenges
    #[arg(long, env = "WISE_PRIVATE_KEY_PATH")]
    private_key: Option<PathBuf>,

    /// 4-digit Wise PIN for PIN challenges (prompted when unset)
    #[arg(long, env = "WISE_PIN")]
    pin: Option<String>,

    /// Profile id to export (defaults to the business profile)
    #[arg(long, env = "WISE_PROFILE")]
    profile: Option<u64>,

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

    /// Directory the statement files are written to
    #[arg(long, default_value = "statements")]
    output: PathBuf,

    /// Use the Wise sandbox API
    #[arg(long, default_value_t = false)]
    wise_test: bool,

    /// Display additional information
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
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

    let mut api = if args.wise_test {
        WiseApi::with_base_url(WISE_SANDBOX_URL.to_string(), args.api_token.clone())
    } else {
        WiseApi::new(args.api_token.clone())
    };
    match &args.private_key {
        Some(path) => api.signer = Some(Signer::from_pem_file(path)?),
        None => warn!("No private key configured; a signature challenge would fail"),
    }
    api.pin = args.pin.clone();

    let profile = match args.profile {
        Some(id) => id,
        None => api
            .pick_profile()
            .await
            .context("failed to pick a Wise profile")?,
    };
    let balances = api
        .get_balances(profile)
        .await
        .context("failed to list the balances")?;
    if balances.is_empty() {
        bail!("no standard balances for profile {profile}");
    }

    fs::create_dir_all(&args.output)
        .with_context(|| format!("failed to create {}", args.output.display()))?;

    let mut failures = 0;
    for balance in &balances {
        let statement = match api
            .get_balance_statement(profile, balance, &dates::iso(start), &dates::iso(end))
            .await
        {
            Ok(statement) => statement,
            Err(e) => {
                error!("Failed to fetch the {} statement: {:#}", balance.currency, e);
                failures += 1;
                continue;
            }
        };
        let path = args
            .output
            .join(format!("{}-{}.json", balance.currency, balance.id));
        fs::write(&path, serde_json::to_string_pretty(&statement)?)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("Wrote {}", path.display());
    }

    if failures == balances.len() {
        bail!("no statement could be fetched");
    }
    if failures > 0 {
        bail!("{failures} of {} statements could not be fetched", balances.len());
    }
    Ok(())
}
