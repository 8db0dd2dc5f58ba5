//! sevdesk-invoicer - create a SevDesk draft invoice from a billing report
//!
//! Reads the JSON report `harvest-exporter --format json` writes, plans
//! one invoice position per row and creates the invoice as a draft, billed
//! to the agency (or the client, or an explicit `--customer`).

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::Local;
use clap::Parser;
use log::{error, info};

use sevdesk_api::SevdeskApi;
use sevdesk_invoicer::invoice::plan_invoice;
use sevdesk_invoicer::{report, token};

/// Create a SevDesk draft invoice from a harvest-exporter JSON report
#[derive(Parser, Debug)]
#[command(name = "sevdesk-invoicer")]
#[command(version, about, long_about = None)]
struct Args {
    /// SevDesk API token
    #[arg(long, env = "SEVDESK_API_TOKEN")]
    token: Option<String>,

    /// Shell command printing the API token on stdout
    #[arg(long, env = "SEVDESK_API_TOKEN_COMMAND")]
    token_command: Option<String>,

    /// Bill this customer instead of the report's agency or client
    #[arg(long)]
    customer: Option<String>,

    /// Payment target in days, written into the invoice terms
    #[arg(long, default_value_t = 30)]
    days_until_payment: u32,

    /// Log the would-be invoice and create nothing
    #[arg(long, default_value_t = false)]
    dry_run: bool,

    /// Display additional information
    #[arg(short, long, default_value_t = false)]
    verbose: bool,

    /// Report file written by harvest-exporter --format json
    report: PathBuf,
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
    let rows = report::load(&args.report)
        .with_context(|| format!("failed to read report {}", args.report.display()))?;
    let plan = plan_invoice(&rows, args.customer.as_deref(), args.days_until_payment)?;

    info!(
        "{}: {} positions in {} for {:?}",
        plan.header,
        plan.positions.len(),
        plan.currency,
        plan.billing_target
    );
    for position in &plan.positions {
        let conversion = position
            .text
            .as_deref()
            .map(|text| format!(" ({text})"))
            .unwrap_or_default();
        info!(
            "  {}: {} h x {} {}{conversion}",
            position.name, position.quantity, position.price, plan.currency
        );
    }

    if args.dry_run {
        info!(
            "Delivery period {} - {}, payment within {} days",
            plan.delivery_date, plan.delivery_date_until, plan.time_to_pay
        );
        println!("Dry run, not creating the invoice.");
        return Ok(());
    }

    let token = token::resolve(args.token, args.token_command.as_deref())?;
    let api = SevdeskApi::new(token);

    let mut contacts = api.search_contacts_by_name(&plan.billing_target).await?;
    let contact = match contacts.len() {
        0 => bail!(
            "Could not find customer {:?}. Create it in the SevDesk contacts first",
            plan.billing_target
        ),
        1 => contacts.remove(0),
        _ => {
            let numbers: Vec<&str> = contacts
                .iter()
                .map(|contact| contact.customer_number.as_deref().unwrap_or("N/A"))
                .collect();
            bail!(
                "Found multiple customers named {:?}: {}",
                plan.billing_target,
                numbers.join(" ")
            );
        }
    };

    let user = api
        .get_current_user()
        .await
        .context("failed to resolve the SevDesk user the token belongs to")?;

    let invoice_date = Local::now().format("%d.%m.%Y").to_string();
    let new_invoice = plan.to_invoice(contact.id, Some(user.id), invoice_date);
    let created = api
        .create_invoice(&new_invoice, &plan.positions)
        .await
        .context("failed to create the invoice")?;

    println!("Invoice created successfully: {}", created.browser_url());
    Ok(())
}
