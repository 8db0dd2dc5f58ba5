//! ecbx - fetch and query ECB reference exchange rates
//!
//! Keeps a local SQLite copy of the ECB's EUR reference-rate feed and
//! answers conversion queries against it.

use clap::{Parser, Subcommand, ValueEnum};
use rusqlite::Connection;
use std::path::PathBuf;

use ecbx::dates;
use ecbx::ecb::EcbFeed;
use ecbx::error::{EcbxError, Result};
use ecbx::store::{self, ClosestPolicy};

/// Query exchange rates from the European Central Bank
#[derive(Parser, Debug)]
#[command(name = "ecbx")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the SQLite database file
    #[arg(short = 'd', long, default_value_t = default_db_path())]
    db: String,

    /// Display additional information
    #[arg(short, long, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Initialize the database with the full historical feed
    Initialize,
    /// Ingest the last-90-days feed into an existing database
    Update,
    /// Show the status of the exchange rate database
    Status,
    /// Convert an amount from one currency to another
    #[command(allow_missing_positional = true)]
    Convert {
        /// Date to convert at, YYYY-MM-DD or YYYYMMDD (defaults to today)
        date: Option<String>,
        /// Base currency code
        base: String,
        /// Target currency code
        target: String,
        /// Amount to convert (defaults to 1)
        amount: Option<f64>,
        /// Strategy for finding the nearest stored date
        #[arg(short, long, value_enum, default_value_t = ClosestPolicy::Before)]
        closest: ClosestPolicy,
    },
    /// List all known currencies
    Currencies,
    /// Show all EUR-quoted rates for a date
    Rates {
        /// Date to show rates for (defaults to today)
        date: Option<String>,
    },
    /// Show the conversion matrix from a base currency
    Matrix {
        /// Date to show the matrix for (defaults to today)
        date: Option<String>,
        /// Base currency (defaults to EUR)
        base: Option<String>,
        /// Output format
        #[arg(short, long, value_enum, default_value_t = MatrixFormat::Text)]
        format: MatrixFormat,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum MatrixFormat {
    Text,
    Json,
}

/// Returns the default database path: ~/.config/ecbx/rates.db
fn default_db_path() -> String {
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
        log::error!("{}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    let db_path = PathBuf::from(&args.db);

    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        if !parent.exists() {
            std::fs::create_dir_all(parent)?;
            log::info!("Created directory: {}", parent.display());
        }
    }

    let mut conn = Connection::open(&db_path)?;
    log::debug!("Opened database: {}", db_path.display());
    store::init_schema(&conn)?;

    match args.command {
        Command::Initialize => cmd_initialize(&mut conn).await,
        Command::Update => cmd_update(&mut conn).await,
        Command::Status => cmd_status(&conn, &db_path),
        Command::Convert {
            date,
            base,
            target,
            amount,
            closest,
        } => cmd_convert(&mut conn, date, &base, &target, amount, closest, args.verbose),
        Command::Currencies => cmd_currencies(&conn),
        Command::Rates { date } => cmd_rates(&conn, date),
        Command::Matrix { date, base, format } => cmd_matrix(&mut conn, date, base, format),
    }
}

async fn cmd_initialize(conn: &mut Connection) -> Result<()> {
    if store::has_rates(conn)? {
        return Err(EcbxError::AlreadyInitialized);
    }

    let feed = EcbFeed::new();
    let observations = feed.fetch_history().await?;
    let result = store::ingest(conn, &observations)?;

    println!(
        "Initialized with {} rates covering {} days",
        result.rates, result.dates
    );
    Ok(())
}

async fn cmd_update(conn: &mut Connection) -> Result<()> {
    if !store::has_rates(conn)? {
        return Err(EcbxError::NotInitialized);
    }

    let feed = EcbFeed::new();
    let observations = feed.fetch_recent().await?;
    let result = store::ingest(conn, &observations)?;

    println!(
        "Updated {} rates covering {} days",
        result.rates, result.dates
    );
    Ok(())
}

fn cmd_status(conn: &Connection, db_path: &std::path::Path) -> Result<()> {
    let rates = store::rate_count(conn)?;
    let currencies = store::currency_count(conn)?;
    let range = store::date_range(conn)?;
    let last_updated = store::last_updated(conn)?;

    println!("Database:     {}", db_path.display());
    println!("Rates:        {}", rates);
    println!("Currencies:   {}", currencies);
    match range {
        Some((min, max)) => println!("Date range:   {} to {}", min, max),
        None => println!("Date range:   n/a"),
    }
    println!(
        "Last updated: {}",
        last_updated.unwrap_or_else(|| "never".to_string())
    );
    Ok(())
}

fn cmd_convert(
    conn: &mut Connection,
    date: Option<String>,
    base: &str,
    target: &str,
    amount: Option<f64>,
    closest: ClosestPolicy,
    verbose: bool,
) -> Result<()> {
    if !store::has_rates(conn)? {
        return Err(EcbxError::NotInitialized);
    }

    let requested = requested_date(date)?;
    let base = base.to_uppercase();
    let target = target.to_uppercase();
    let amount = amount.unwrap_or(1.0);

    let (used_date, rate) = store::get_rate(conn, &requested, &base, &target, closest)?;
    let converted = amount * rate;

    println!(
        "{:.2} {} = {:.2} {} ({})",
        amount, base, converted, target, used_date
    );
    if used_date != requested {
        println!(
            "Note: no rate stored for {}, used nearest date {} (policy: {})",
            requested, used_date, closest
        );
    }
    if verbose {
        println!("1 {} = {:.6} {}", base, rate, target);
    }
    Ok(())
}

fn cmd_currencies(conn: &Connection) -> Result<()> {
    let currencies = store::list_currencies(conn)?;

    println!("{:<6}{}", "Code", "Name");
    println!("{:<6}{}", "----", "----");
    for currency in currencies {
        println!("{:<6}{}", currency.code, currency.name);
    }
    Ok(())
}

fn cmd_rates(conn: &Connection, date: Option<String>) -> Result<()> {
    if !store::has_rates(conn)? {
        return Err(EcbxError::NotInitialized);
    }

    let requested = requested_date(date)?;
    let resolved = store::resolve_date(conn, &requested, ClosestPolicy::Before)?
        .ok_or_else(|| EcbxError::NoDataForDate(requested.clone()))?;

    let rates = store::rates_on(conn, &resolved)?;

    println!("Exchange rates for {} (EUR base)", resolved);
    println!();
    println!("{:<10}{:>12}", "Currency", "Rate");
    println!("{:<10}{:>12}", "--------", "----");
    for (currency, rate) in rates {
        println!("{:<10}{:>12.6}", currency, rate);
    }
    Ok(())
}

fn cmd_matrix(
    conn: &mut Connection,
    date: Option<String>,
    base: Option<String>,
    format: MatrixFormat,
) -> Result<()> {
    if !store::has_rates(conn)? {
        return Err(EcbxError::NotInitialized);
    }

    let requested = requested_date(date)?;
    let base = base.unwrap_or_else(|| "EUR".to_string()).to_uppercase();
    let resolved = store::resolve_date(conn, &requested, ClosestPolicy::Before)?
        .ok_or_else(|| EcbxError::NoDataForDate(requested.clone()))?;

    // Every currency quoted on the resolved date, plus EUR itself.
    let mut targets: Vec<String> = store::rates_on(conn, &resolved)?
        .into_iter()
        .map(|(currency, _)| currency)
        .collect();
    targets.push("EUR".to_string());
    targets.sort();
    targets.retain(|t| *t != base);

    let mut rates = Vec::with_capacity(targets.len());
    for target in &targets {
        let (_, rate) = store::get_rate(conn, &resolved, &base, target, ClosestPolicy::Before)?;
        rates.push((target.clone(), rate));
    }

    match format {
        MatrixFormat::Json => {
            let mut map = serde_json::Map::new();
            for (target, rate) in &rates {
                map.insert(
                    target.clone(),
                    serde_json::Value::from(*rate),
                );
            }
            let result = serde_json::json!({
                "date": resolved,
                "base": base,
                "rates": map,
            });
            println!("{}", serde_json::to_string_pretty(&result).unwrap_or_default());
        }
        MatrixFormat::Text => {
            println!("Exchange rates for {} on {}", base, resolved);
            println!();
            println!("{:<10}{:>14}", "Currency", "Rate");
            println!("{:<10}{:>14}", "--------", "----");
            for (target, rate) in rates {
                println!("{:<10}{:>14.6}", target, rate);
            }
        }
    }
    Ok(())
}

/// Resolve the date argument: parse it (or default to today) and map
/// weekends to the preceding Friday, since the ECB only publishes on
/// business days.
fn requested_date(date: Option<String>) -> Result<String> {
    let parsed = match date {
        Some(input) => dates::parse(&input)?,
        None => chrono::Local::now().date_naive(),
    };
    let business_day = dates::last_business_day(parsed);
    if business_day != parsed {
        log::info!(
            "{} falls on a weekend, using the preceding business day {}",
            parsed,
            business_day
        );
    }
    Ok(business_day.format("%Y-%m-%d").to_string())
}
