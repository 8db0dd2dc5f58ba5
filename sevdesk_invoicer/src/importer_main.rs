//! sevdesk-wise-importer - import Wise balance statements as transactions
//!
//! Reads a Wise balance-statement CSV and creates one SevDesk transaction
//! per completed row, booked against a clearing account per currency. An
//! import-state file keeps re-runs from importing the same row twice.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::{error, info, warn};

use sevdesk_api::{NewTransaction, SevdeskApi, TransactionStatus};
use sevdesk_invoicer::accounts::AccountRegistry;
use sevdesk_invoicer::import_state::ImportState;
use sevdesk_invoicer::statement::{self, Disposition, ImportRules};
use sevdesk_invoicer::token;

/// Import a Wise balance statement CSV into SevDesk
#[derive(Parser, Debug)]
#[command(name = "sevdesk-wise-importer")]
#[command(version, about, long_about = None)]
struct Args {
    /// SevDesk API token
    #[arg(long, env = "SEVDESK_API_TOKEN")]
    token: Option<String>,

    /// Shell command printing the API token on stdout
    #[arg(long, env = "SEVDESK_API_TOKEN_COMMAND")]
    token_command: Option<String>,

    /// State file remembering the already imported rows
    #[arg(long, default_value = "import-state.json")]
    state: PathBuf,

    /// Statement currency and its Wise account id, e.g. EUR:12345
    #[arg(long, value_name = "CCY:ACCOUNT")]
    add_account: Vec<String>,

    /// Also import NEUTRAL conversions of this currency pair, e.g. EUR:USD
    #[arg(long, value_name = "SRC:TGT")]
    import_neutral: Vec<String>,

    /// Skip IN/OUT rows in this currency
    #[arg(long, value_name = "CCY")]
    ignore_currency: Vec<String>,

    /// Log what would be imported and create nothing
    #[arg(long, default_value_t = false)]
    dry_run: bool,

    /// Display additional information
    #[arg(short, long, default_value_t = false)]
    verbose: bool,

    /// Wise balance statement CSV
    statement: PathBuf,
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

/// Splits `EUR:12345` style flag values, upper-casing the currency.
fn split_pair(value: &str, flag: &str) -> Result<(String, String)> {
    match value.split_once(':') {
        Some((left, right)) if !left.is_empty() && !right.is_empty() => {
            Ok((left.to_uppercase(), right.to_string()))
        }
        _ => bail!("Invalid {flag} value {value:?}. Use the CCY:VALUE form"),
    }
}

async fn run(args: Args) -> Result<()> {
    let mut registry = AccountRegistry::default();
    for mapping in &args.add_account {
        let (currency, account_id) = split_pair(mapping, "--add-account")?;
        registry.add(&currency, &account_id)?;
    }
    if registry.is_empty() {
        bail!("No accounts configured; use --add-account CCY:ACCOUNT");
    }

    let mut rules = ImportRules::default();
    for pair in &args.import_neutral {
        let (source, target) = split_pair(pair, "--import-neutral")?;
        rules.neutral_pairs.push((source, target.to_uppercase()));
    }
    for currency in &args.ignore_currency {
        rules.ignored_currencies.insert(currency.to_uppercase());
    }

    let mut state = ImportState::load(&args.state)
        .with_context(|| format!("failed to read state file {}", args.state.display()))?;
    let records = statement::load(&args.statement)
        .with_context(|| format!("failed to read statement {}", args.statement.display()))?;
    info!("Read {} statement rows", records.len());

    // The dry run still looks accounts up so it can report duplicates,
    // it only skips the writes.
    let token = token::resolve(args.token, args.token_command.as_deref())?;
    let api = SevdeskApi::new(token);

    let mut imported = 0u32;
    let mut skipped = 0u32;
    for record in &records {
        let planned = match statement::map_record(record, &rules)? {
            Disposition::Import(planned) => planned,
            Disposition::Skip(reason) => {
                info!("Skipping {reason}");
                skipped += 1;
                continue;
            }
        };
        if planned.clock_skew() {
            warn!(
                "Record {} was created after it finished; the export clock is skewed",
                planned.record_id
            );
        }

        if args.dry_run {
            match registry.lookup(&api, &planned.currency).await? {
                Some(account) => {
                    let key = planned.state_key(account);
                    if state.contains(&key) {
                        info!("Skipping already imported {key}");
                        skipped += 1;
                    } else {
                        info!(
                            "Would create transaction {key}: {} {} for {:?} ({})",
                            planned.amount, planned.currency, planned.counterparty,
                            planned.reference
                        );
                        imported += 1;
                    }
                }
                // No account yet, so nothing can have been imported.
                None => {
                    info!(
                        "Would create clearing account {:?} and a transaction for record {}",
                        registry.account_name(&planned.currency)?,
                        planned.record_id
                    );
                    imported += 1;
                }
            }
            continue;
        }

        let account = registry.resolve(&api, &planned.currency).await?;
        let key = planned.state_key(account);
        if state.contains(&key) {
            info!("Skipping already imported {key}");
            skipped += 1;
            continue;
        }

        let new = NewTransaction {
            check_account: account,
            value_date: statement::api_timestamp(planned.finished_on),
            amount: planned.amount,
            status: TransactionStatus::Created,
            payee_payer_name: planned.counterparty.clone(),
            entry_date: Some(statement::api_timestamp(planned.created_on)),
            paymt_purpose: Some(planned.reference.clone()),
            payee_payer_acct_no: None,
            payee_payer_bank_code: None,
        };
        let transaction = api
            .create_transaction(&new)
            .await
            .with_context(|| format!("failed to create a transaction for record {}", record.id))?;
        state.insert(key)?;
        info!(
            "Created transaction #{} for record {}",
            transaction.id, planned.record_id
        );
        imported += 1;
    }

    if args.dry_run {
        println!("Dry run: {imported} transactions would be imported, {skipped} skipped.");
    } else {
        println!("Imported {imported} transactions, skipped {skipped}.");
    }
    Ok(())
}
