//! sevdesk-cli - inspect and manage a SevDesk account from the shell
//!
//! Check account transactions, check accounts and balances, vouchers,
//! SKR booking accounts, and tax rules. Listings print as aligned
//! tables by default or, with `--json`, as raw JSON for scripting.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{error, info, warn};
use serde_json::json;

use sevdesk_api::{
    NewTransaction, SevdeskApi, TransactionFilter, TransactionStatus, VoucherFilter, VoucherStatus,
};

mod config;
mod dates;
mod tables;

/// Inspect and manage a SevDesk account
#[derive(Parser, Debug)]
#[command(name = "sevdesk-cli")]
#[command(version, about, long_about = None)]
struct Args {
    /// API token; overrides the config file
    #[arg(long, env = "SEVDESK_API_TOKEN")]
    token: Option<String>,

    /// Config file (default: ~/.config/sevdesk-cli/config.json)
    #[arg(long)]
    config: Option<PathBuf>,

    /// API base URL; overrides the config file
    #[arg(long)]
    base_url: Option<String>,

    /// Print raw JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    /// Display additional information
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Manage check account transactions
    Transactions {
        #[command(subcommand)]
        command: TransactionsCommand,
    },
    /// Inspect check accounts
    CheckAccounts {
        #[command(subcommand)]
        command: CheckAccountsCommand,
    },
    /// Inspect and book vouchers
    Vouchers {
        #[command(subcommand)]
        command: VouchersCommand,
    },
    /// Look up SKR booking accounts
    AccountingTypes {
        #[command(subcommand)]
        command: AccountingTypesCommand,
    },
    /// List tax rules
    TaxRules {
        #[command(subcommand)]
        command: TaxRulesCommand,
    },
}

#[derive(Subcommand, Debug)]
enum TransactionsCommand {
    /// List transactions
    List {
        /// Only transactions of this check account id
        #[arg(long)]
        account: Option<u64>,
        /// Status name or code, e.g. "created" or "100"
        #[arg(long)]
        status: Option<TransactionStatus>,
        /// Earliest value date (YYYY-MM-DD or YYYYMMDD)
        #[arg(long)]
        from: Option<String>,
        /// Latest value date (YYYY-MM-DD or YYYYMMDD)
        #[arg(long)]
        to: Option<String>,
        /// Filter by payment purpose
        #[arg(long)]
        purpose: Option<String>,
        /// Maximum number of results
        #[arg(long, default_value_t = 100)]
        limit: u32,
    },
    /// Show one transaction
    Get {
        /// Id of the transaction
        id: u64,
    },
    /// Create a transaction
    Create {
        /// Id of the check account
        #[arg(long)]
        account: u64,
        /// Amount; negative for outgoing money
        #[arg(long)]
        amount: f64,
        /// Value date (YYYY-MM-DD or YYYYMMDD)
        #[arg(long)]
        date: String,
        /// Payee or payer name
        #[arg(long)]
        name: String,
        /// Payment purpose
        #[arg(long)]
        purpose: Option<String>,
        /// Status name or code
        #[arg(long, default_value = "created")]
        status: TransactionStatus,
    },
    /// Delete a transaction
    Delete {
        /// Id of the transaction
        id: u64,
    },
}

#[derive(Subcommand, Debug)]
enum CheckAccountsCommand {
    /// List all check accounts
    List,
    /// Show one check account
    Get {
        /// Id of the check account
        id: u64,
    },
    /// Booked balance at the end of a day
    Balance {
        /// Id of the check account
        id: u64,
        /// Date (YYYY-MM-DD or YYYYMMDD)
        #[arg(long)]
        date: String,
    },
    /// Create an offline clearing account
    CreateClearing {
        /// Name of the new account
        #[arg(long)]
        name: String,
        /// Currency code, e.g. eur
        #[arg(long)]
        currency: String,
    },
}

#[derive(Subcommand, Debug)]
enum VouchersCommand {
    /// List vouchers
    List {
        /// Status name or code, e.g. "unpaid" or "100"
        #[arg(long)]
        status: Option<VoucherStatus>,
        /// Earliest voucher date (YYYY-MM-DD or YYYYMMDD)
        #[arg(long)]
        from: Option<String>,
        /// Latest voucher date (YYYY-MM-DD or YYYYMMDD)
        #[arg(long)]
        to: Option<String>,
    },
    /// Show one voucher
    Get {
        /// Id of the voucher
        id: u64,
    },
    /// List the positions of a voucher
    Positions {
        /// Id of the voucher
        id: u64,
    },
    /// Book a voucher against a new transaction
    Book {
        /// Id of the voucher
        id: u64,
        /// Id of the check account the money moved on
        #[arg(long)]
        account: u64,
        /// Booked amount; negative for outgoing money
        #[arg(long)]
        amount: f64,
        /// Value date of the payment (YYYY-MM-DD or YYYYMMDD)
        #[arg(long)]
        date: String,
    },
}

#[derive(Subcommand, Debug)]
enum AccountingTypesCommand {
    /// List all SKR booking accounts
    List,
    /// Show one booking account by SKR number
    Get {
        /// SKR account number, e.g. 5400
        number: String,
    },
}

#[derive(Subcommand, Debug)]
enum TaxRulesCommand {
    /// List all tax rules
    List,
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
    let config_path = args.config.clone().unwrap_or_else(config::default_path);
    let config = config::load(&config_path)?;
    let token = config.resolve_token(args.token.as_deref())?;
    let api = match args.base_url.as_deref().or(config.base_url.as_deref()) {
        Some(base_url) => SevdeskApi::with_base_url(base_url.to_string(), token),
        None => SevdeskApi::new(token),
    };
    let json = args.json;

    match args.command {
        Command::Transactions { command } => match command {
            TransactionsCommand::List {
                account,
                status,
                from,
                to,
                purpose,
                limit,
            } => {
                let filter = TransactionFilter {
                    check_account: account,
                    status,
                    start_date: from.as_deref().map(parse_day_start).transpose()?,
                    end_date: to.as_deref().map(parse_day_end).transpose()?,
                    paymt_purpose: purpose,
                    limit: Some(limit),
                    offset: None,
                };
                cmd_transactions_list(&api, &filter, json).await
            }
            TransactionsCommand::Get { id } => cmd_transactions_get(&api, id, json).await,
            TransactionsCommand::Create {
                account,
                amount,
                date,
                name,
                purpose,
                status,
            } => {
                let new = NewTransaction {
                    check_account: account,
                    value_date: dates::value_date(dates::parse_date(&date)?),
                    amount,
                    status,
                    payee_payer_name: name,
                    entry_date: None,
                    paymt_purpose: purpose,
                    payee_payer_acct_no: None,
                    payee_payer_bank_code: None,
                };
                cmd_transactions_create(&api, &new, json).await
            }
            TransactionsCommand::Delete { id } => cmd_transactions_delete(&api, id).await,
        },
        Command::CheckAccounts { command } => match command {
            CheckAccountsCommand::List => cmd_check_accounts_list(&api, json).await,
            CheckAccountsCommand::Get { id } => cmd_check_accounts_get(&api, id, json).await,
            CheckAccountsCommand::Balance { id, date } => {
                cmd_check_accounts_balance(&api, id, &date, json).await
            }
            CheckAccountsCommand::CreateClearing { name, currency } => {
                cmd_check_accounts_create_clearing(&api, &name, &currency, json).await
            }
        },
        Command::Vouchers { command } => match command {
            VouchersCommand::List { status, from, to } => {
                let filter = VoucherFilter {
                    status,
                    credit_debit: None,
                    start_date: from.as_deref().map(parse_day_start).transpose()?,
                    end_date: to.as_deref().map(parse_day_end).transpose()?,
                    limit: None,
                    offset: None,
                };
                cmd_vouchers_list(&api, &filter, json).await
            }
            VouchersCommand::Get { id } => cmd_vouchers_get(&api, id, json).await,
            VouchersCommand::Positions { id } => cmd_vouchers_positions(&api, id, json).await,
            VouchersCommand::Book {
                id,
                account,
                amount,
                date,
            } => cmd_vouchers_book(&api, id, account, amount, &date, json).await,
        },
        Command::AccountingTypes { command } => match command {
            AccountingTypesCommand::List => cmd_accounting_types_list(&api, json).await,
            AccountingTypesCommand::Get { number } => {
                cmd_accounting_types_get(&api, &number, json).await
            }
        },
        Command::TaxRules { command } => match command {
            TaxRulesCommand::List => cmd_tax_rules_list(&api, json).await,
        },
    }
}

fn parse_day_start(input: &str) -> Result<i64> {
    Ok(dates::day_start_timestamp(dates::parse_date(input)?))
}

fn parse_day_end(input: &str) -> Result<i64> {
    Ok(dates::day_end_timestamp(dates::parse_date(input)?))
}

/// "Created (100)" for known codes, the raw code otherwise.
fn transaction_status_label(status: Option<i64>) -> String {
    match status {
        Some(code) => match TransactionStatus::from_code(code) {
            Some(status) => format!("{} ({code})", status.label()),
            None => format!("Unknown ({code})"),
        },
        None => "-".to_string(),
    }
}

fn voucher_status_label(status: Option<i64>) -> String {
    match status {
        Some(code) => match VoucherStatus::from_code(code) {
            Some(status) => format!("{} ({code})", status.label()),
            None => format!("Unknown ({code})"),
        },
        None => "-".to_string(),
    }
}

fn account_type_label(account_type: Option<&str>) -> String {
    match account_type {
        Some("online") => "Bank Account".to_string(),
        Some("offline") => "Clearing Account".to_string(),
        Some("register") => "Cash Register".to_string(),
        Some(other) => other.to_string(),
        None => "-".to_string(),
    }
}

fn credit_debit_label(credit_debit: Option<&str>) -> String {
    match credit_debit {
        Some("C") => "Credit".to_string(),
        Some("D") => "Debit".to_string(),
        Some(other) => other.to_string(),
        None => "-".to_string(),
    }
}

/// Dates arrive as `2024-03-01T00:00:00+00:00`; the day part is enough.
fn short_date(date: Option<&str>) -> String {
    match date {
        Some(date) => date.chars().take(10).collect(),
        None => "-".to_string(),
    }
}

fn opt(value: Option<&str>) -> String {
    value.unwrap_or("-").to_string()
}

fn opt_amount(value: Option<f64>) -> String {
    match value {
        Some(value) => format!("{value:.2}"),
        None => "-".to_string(),
    }
}

async fn cmd_transactions_list(
    api: &SevdeskApi,
    filter: &TransactionFilter,
    json: bool,
) -> Result<()> {
    let transactions = api.get_transactions(filter).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&transactions)?);
        return Ok(());
    }
    if transactions.is_empty() {
        println!("No transactions found.");
        return Ok(());
    }
    let rows: Vec<Vec<String>> = transactions
        .iter()
        .map(|t| {
            vec![
                t.id.to_string(),
                short_date(t.value_date.as_deref()),
                format!("{:.2}", t.amount),
                transaction_status_label(t.status),
                opt(t.payee_payer_name.as_deref()),
                opt(t.paymt_purpose.as_deref()),
            ]
        })
        .collect();
    print!(
        "{}",
        tables::render(
            &["ID", "Date", "Amount", "Status", "Payee/Payer", "Purpose"],
            &rows
        )
    );
    Ok(())
}

async fn cmd_transactions_get(api: &SevdeskApi, id: u64, json: bool) -> Result<()> {
    let transaction = api.get_transaction(id).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&transaction)?);
        return Ok(());
    }
    println!("Transaction #{}", transaction.id);
    println!("  Value date:  {}", short_date(transaction.value_date.as_deref()));
    println!("  Entry date:  {}", short_date(transaction.entry_date.as_deref()));
    println!("  Amount:      {:.2}", transaction.amount);
    println!("  Status:      {}", transaction_status_label(transaction.status));
    println!(
        "  Payee/Payer: {}",
        opt(transaction.payee_payer_name.as_deref())
    );
    println!("  Purpose:     {}", opt(transaction.paymt_purpose.as_deref()));
    if let Some(account) = &transaction.check_account {
        println!("  Account:     #{}", account.id);
    }
    Ok(())
}

async fn cmd_transactions_create(
    api: &SevdeskApi,
    new: &NewTransaction,
    json: bool,
) -> Result<()> {
    let transaction = api.create_transaction(new).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&transaction)?);
    } else {
        println!("Successfully created transaction #{}", transaction.id);
    }
    Ok(())
}

async fn cmd_transactions_delete(api: &SevdeskApi, id: u64) -> Result<()> {
    api.delete_transaction(id).await?;
    println!("Successfully deleted transaction #{id}");
    Ok(())
}

async fn cmd_check_accounts_list(api: &SevdeskApi, json: bool) -> Result<()> {
    let accounts = api.get_check_accounts().await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&accounts)?);
        return Ok(());
    }
    if accounts.is_empty() {
        println!("No check accounts found.");
        return Ok(());
    }
    let rows: Vec<Vec<String>> = accounts
        .iter()
        .map(|a| {
            vec![
                a.id.to_string(),
                a.name.clone(),
                account_type_label(a.account_type.as_deref()),
                opt(a.currency.as_deref()),
            ]
        })
        .collect();
    print!(
        "{}",
        tables::render(&["ID", "Name", "Type", "Currency"], &rows)
    );
    Ok(())
}

async fn cmd_check_accounts_get(api: &SevdeskApi, id: u64, json: bool) -> Result<()> {
    let account = api.get_check_account(id).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&account)?);
        return Ok(());
    }
    println!("Check account #{}", account.id);
    println!("  Name:     {}", account.name);
    println!("  Type:     {}", account_type_label(account.account_type.as_deref()));
    println!("  Currency: {}", opt(account.currency.as_deref()));
    Ok(())
}

async fn cmd_check_accounts_balance(
    api: &SevdeskApi,
    id: u64,
    date: &str,
    json: bool,
) -> Result<()> {
    let date = dates::iso(dates::parse_date(date)?);
    let balance = api.get_balance_at_date(id, &date).await?;
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({ "date": date, "balance": balance }))?
        );
    } else {
        println!("Balance on {date}: {balance:.2}");
    }
    Ok(())
}

async fn cmd_check_accounts_create_clearing(
    api: &SevdeskApi,
    name: &str,
    currency: &str,
    json: bool,
) -> Result<()> {
    let account = api
        .create_clearing_account(name, &currency.to_uppercase())
        .await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&account)?);
    } else {
        println!(
            "Successfully created clearing account #{} ({})",
            account.id, account.name
        );
    }
    Ok(())
}

async fn cmd_vouchers_list(api: &SevdeskApi, filter: &VoucherFilter, json: bool) -> Result<()> {
    let vouchers = api.get_vouchers(filter).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&vouchers)?);
        return Ok(());
    }
    if vouchers.is_empty() {
        println!("No vouchers found.");
        return Ok(());
    }
    let rows: Vec<Vec<String>> = vouchers
        .iter()
        .map(|v| {
            vec![
                v.id.to_string(),
                short_date(v.voucher_date.as_deref()),
                voucher_status_label(v.status),
                credit_debit_label(v.credit_debit.as_deref()),
                opt(v.supplier_name.as_deref()),
                opt(v.description.as_deref()),
                opt_amount(v.sum_gross),
            ]
        })
        .collect();
    print!(
        "{}",
        tables::render(
            &["ID", "Date", "Status", "Direction", "Supplier", "Description", "Gross"],
            &rows
        )
    );
    Ok(())
}

async fn cmd_vouchers_get(api: &SevdeskApi, id: u64, json: bool) -> Result<()> {
    let voucher = api.get_voucher(id).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&voucher)?);
        return Ok(());
    }
    println!("Voucher #{}", voucher.id);
    println!("  Date:        {}", short_date(voucher.voucher_date.as_deref()));
    println!("  Pay date:    {}", short_date(voucher.pay_date.as_deref()));
    println!("  Status:      {}", voucher_status_label(voucher.status));
    println!(
        "  Direction:   {}",
        credit_debit_label(voucher.credit_debit.as_deref())
    );
    println!("  Supplier:    {}", opt(voucher.supplier_name.as_deref()));
    println!("  Description: {}", opt(voucher.description.as_deref()));
    println!("  Net:         {}", opt_amount(voucher.sum_net));
    println!("  Tax:         {}", opt_amount(voucher.sum_tax));
    println!("  Gross:       {}", opt_amount(voucher.sum_gross));
    println!("  Currency:    {}", opt(voucher.currency.as_deref()));
    if let Some(document) = &voucher.document {
        println!("  Document:    #{}", document.id);
    }
    Ok(())
}

async fn cmd_vouchers_positions(api: &SevdeskApi, id: u64, json: bool) -> Result<()> {
    let positions = api.get_voucher_positions(id).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&positions)?);
        return Ok(());
    }
    if positions.is_empty() {
        println!("No positions found.");
        return Ok(());
    }
    let rows: Vec<Vec<String>> = positions
        .iter()
        .map(|p| {
            vec![
                p.id.to_string(),
                opt(p.comment.as_deref()),
                opt_amount(p.tax_rate),
                opt_amount(p.sum_net),
                opt_amount(p.sum_tax),
                opt_amount(p.sum_gross),
                p.account_datev
                    .as_ref()
                    .map(|a| format!("#{}", a.id))
                    .unwrap_or_else(|| "-".to_string()),
            ]
        })
        .collect();
    print!(
        "{}",
        tables::render(
            &["ID", "Comment", "Tax %", "Net", "Tax", "Gross", "Account"],
            &rows
        )
    );
    Ok(())
}

/// Books a voucher by first creating the matching transaction on the
/// given check account, then linking the two.
async fn cmd_vouchers_book(
    api: &SevdeskApi,
    id: u64,
    account: u64,
    amount: f64,
    date: &str,
    json: bool,
) -> Result<()> {
    let voucher = api
        .get_voucher(id)
        .await
        .with_context(|| format!("voucher #{id} not found"))?;
    if let Some(gross) = voucher.sum_gross {
        if (amount.abs() - gross).abs() > 0.005 {
            warn!(
                "Booking {:.2} against voucher #{id} with gross sum {gross:.2}",
                amount.abs()
            );
        }
    }

    let payee = voucher
        .supplier_name
        .clone()
        .or_else(|| voucher.description.clone())
        .unwrap_or_else(|| format!("Voucher {id}"));
    let new = NewTransaction {
        check_account: account,
        value_date: dates::value_date(dates::parse_date(date)?),
        amount,
        status: TransactionStatus::Created,
        payee_payer_name: payee,
        entry_date: None,
        paymt_purpose: voucher.description.clone(),
        payee_payer_acct_no: None,
        payee_payer_bank_code: None,
    };
    let transaction = api.create_transaction(&new).await?;
    info!("Created transaction #{} for voucher #{id}", transaction.id);

    api.book_voucher(id, transaction.id, Some(amount.abs()))
        .await?;
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "voucher": id,
                "transaction": transaction.id,
                "amount": amount,
            }))?
        );
    } else {
        println!(
            "Booked voucher #{id} against new transaction #{}",
            transaction.id
        );
    }
    Ok(())
}

async fn cmd_accounting_types_list(api: &SevdeskApi, json: bool) -> Result<()> {
    let accounts = api.accounting_types().await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&accounts)?);
        return Ok(());
    }
    if accounts.is_empty() {
        println!("No booking accounts found.");
        return Ok(());
    }
    let rows: Vec<Vec<String>> = accounts
        .iter()
        .map(|a| vec![a.number.clone(), a.name.clone(), a.id.to_string()])
        .collect();
    print!("{}", tables::render(&["Number", "Name", "ID"], &rows));
    Ok(())
}

async fn cmd_accounting_types_get(api: &SevdeskApi, number: &str, json: bool) -> Result<()> {
    let account = api.resolve_skr(number).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&account)?);
        return Ok(());
    }
    println!("Booking account {}", account.number);
    println!("  Name: {}", account.name);
    println!("  ID:   {}", account.id);
    Ok(())
}

async fn cmd_tax_rules_list(api: &SevdeskApi, json: bool) -> Result<()> {
    let rules = api.tax_rules().await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&rules)?);
        return Ok(());
    }
    if rules.is_empty() {
        println!("No tax rules found.");
        return Ok(());
    }
    let rows: Vec<Vec<String>> = rules
        .iter()
        .map(|r| {
            vec![
                r.id.to_string(),
                r.code.clone().unwrap_or_else(|| "-".to_string()),
                r.name.clone(),
            ]
        })
        .collect();
    print!("{}", tables::render(&["ID", "Code", "Name"], &rows));
    Ok(())
}
