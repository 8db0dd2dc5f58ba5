//! harvest-rounder - round Harvest time entries up to a billing increment
//!
//! Fetches the tracked entries of a date range, shows which ones are not
//! on the increment yet and, after confirmation, writes the rounded hours
//! back to Harvest.

use std::io::Write;

use anyhow::{bail, Context, Result};
use chrono::{Days, Local};
use clap::Parser;
use log::{debug, error, info, warn};

use harvest::api::HarvestApi;
use harvest::dates;
use harvest::models::TimeEntry;
use harvest::rounding;

const INCREMENTS: [u32; 8] = [5, 6, 10, 12, 15, 20, 30, 60];

/// Round tracked Harvest time up to the nearest billing increment
#[derive(Parser, Debug)]
#[command(name = "harvest-rounder")]
#[command(version, about, long_about = None)]
struct Args {
    /// Harvest account id
    #[arg(long, env = "HARVEST_ACCOUNT_ID")]
    account_id: String,

    /// Harvest personal access token
    #[arg(long, env = "HARVEST_BEARER_TOKEN")]
    bearer_token: String,

    /// Only round entries of this user (defaults to the token's user)
    #[arg(long, env = "HARVEST_USER")]
    user: Option<String>,

    /// Round entries of all users
    #[arg(long, conflicts_with = "user")]
    all_users: bool,

    /// First day of the range, YYYY-MM-DD or YYYYMMDD (defaults to 28 days ago)
    #[arg(long)]
    start: Option<String>,

    /// Last day of the range, YYYY-MM-DD or YYYYMMDD (defaults to today)
    #[arg(long)]
    end: Option<String>,

    /// Rounding increment in minutes
    #[arg(long, default_value_t = 15, value_parser = parse_increment)]
    increment: u32,

    /// Show what would change without updating anything
    #[arg(long)]
    dry_run: bool,

    /// Apply the changes without asking for confirmation
    #[arg(long, short = 'y')]
    yes: bool,

    /// Display additional information
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

fn parse_increment(raw: &str) -> std::result::Result<u32, String> {
    let value: u32 = raw
        .parse()
        .map_err(|_| format!("`{raw}` is not a number of minutes"))?;
    if INCREMENTS.contains(&value) {
        Ok(value)
    } else {
        Err(format!("increment must be one of {INCREMENTS:?}"))
    }
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
    let start = match &args.start {
        Some(raw) => dates::parse_date(raw)?,
        None => today
            .checked_sub_days(Days::new(28))
            .context("failed to compute the default start date")?,
    };
    let end = match &args.end {
        Some(raw) => dates::parse_date(raw)?,
        None => today,
    };
    if start > end {
        bail!("start {start} is after end {end}");
    }

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
    let entries: Vec<TimeEntry> = entries
        .into_iter()
        .filter(|entry| {
            filter_user
                .as_deref()
                .map_or(true, |user| entry.user.name == user)
        })
        .collect();

    let mut locked = 0usize;
    let mut to_round: Vec<&TimeEntry> = Vec::new();
    for entry in &entries {
        if !rounding::needs_rounding(entry.hours, args.increment) {
            continue;
        }
        if entry.is_locked {
            warn!(
                "Skipping locked entry {} ({} {} {} {})",
                entry.id, entry.spent_date, entry.user.name, entry.project.name, entry.task.name
            );
            locked += 1;
            continue;
        }
        to_round.push(entry);
    }

    if to_round.is_empty() {
        println!(
            "All {} entries between {} and {} are already on {}-minute increments.",
            entries.len(),
            start,
            end,
            args.increment
        );
        return Ok(());
    }

    let mut before_minutes = 0i64;
    let mut after_minutes = 0i64;
    for entry in &to_round {
        let rounded = rounding::round_hours(entry.hours, args.increment);
        before_minutes += rounding::hours_to_minutes(entry.hours);
        after_minutes += rounding::hours_to_minutes(rounded);
        println!(
            "{} {} {} {}: {} -> {}",
            entry.spent_date,
            entry.user.name,
            entry.project.name,
            entry.task.name,
            rounding::format_hours(entry.hours),
            rounding::format_hours(rounded),
        );
    }
    println!();
    println!(
        "{} of {} entries need rounding: {} -> {} (+{})",
        to_round.len(),
        entries.len(),
        rounding::format_minutes(before_minutes),
        rounding::format_minutes(after_minutes),
        rounding::format_minutes(after_minutes - before_minutes),
    );

    if args.dry_run {
        info!("Dry run, nothing was updated");
        return Ok(());
    }
    if !args.yes && !confirm("Apply these changes?")? {
        println!("Aborted.");
        return Ok(());
    }

    let mut updated = 0usize;
    let mut failed = 0usize;
    for entry in &to_round {
        let rounded = rounding::round_hours(entry.hours, args.increment);
        match api.update_time_entry_hours(entry.id, rounded).await {
            Ok(_) => {
                debug!("Updated entry {} to {} hours", entry.id, rounded);
                updated += 1;
            }
            Err(e) => {
                error!("Failed to update entry {}: {}", entry.id, e);
                failed += 1;
            }
        }
    }
    println!("Updated {updated} entries.");
    if failed > 0 {
        bail!("{failed} entries could not be updated");
    }
    Ok(())
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{prompt} [y/N] ");
    std::io::stdout().flush().context("failed to flush stdout")?;
    let mut answer = String::new();
    std::io::stdin()
        .read_line(&mut answer)
        .context("failed to read the confirmation")?;
    Ok(matches!(
        answer.trim().to_lowercase().as_str(),
        "y" | "yes"
    ))
}
