//! Wise balance-statement CSVs and their mapping onto transactions.

use std::collections::BTreeSet;
use std::path::Path;

use chrono::NaiveDateTime;
use serde::Deserialize;

use crate::error::{InvoicerError, Result};

/// Renames Wise applied to record id prefixes when it replaced the API
/// export with CSV downloads. Applied before building dedupe keys so
/// both generations of exports map to the same key.
const ID_ALIASES: &[(&str, &str)] = &[
    ("CARD_TRANSACTION", "CARD"),
    ("DIRECT_DEBIT_TRANSACTION", "DIRECT_DEBIT"),
];

/// One row of the statement CSV. Amounts stay strings until the
/// direction decides which of them matter.
#[derive(Debug, Clone, Deserialize)]
pub struct StatementRecord {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Status")]
    pub status: String,
    #[serde(rename = "Direction")]
    pub direction: String,
    #[serde(rename = "Created on")]
    pub created_on: String,
    #[serde(rename = "Finished on")]
    pub finished_on: String,
    #[serde(rename = "Source name")]
    pub source_name: String,
    #[serde(rename = "Target name")]
    pub target_name: String,
    #[serde(rename = "Source amount (after fees)")]
    pub source_amount: String,
    #[serde(rename = "Source fee amount")]
    pub source_fee: String,
    #[serde(rename = "Source currency")]
    pub source_currency: String,
    #[serde(rename = "Target amount (after fees)")]
    pub target_amount: String,
    #[serde(rename = "Target currency")]
    pub target_currency: String,
    #[serde(rename = "Exchange rate")]
    pub exchange_rate: String,
    #[serde(rename = "Reference")]
    pub reference: String,
}

/// Which rows to import beyond the plain IN/OUT ones.
#[derive(Debug, Clone, Default)]
pub struct ImportRules {
    /// Currency pairs whose NEUTRAL conversions are imported.
    pub neutral_pairs: Vec<(String, String)>,
    /// IN/OUT rows in these currencies are skipped.
    pub ignored_currencies: BTreeSet<String>,
}

/// A statement row reduced to the transaction it becomes.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedTransaction {
    /// Record id with [`ID_ALIASES`] applied.
    pub record_id: String,
    pub currency: String,
    pub amount: f64,
    pub counterparty: String,
    pub reference: String,
    pub created_on: NaiveDateTime,
    pub finished_on: NaiveDateTime,
}

impl PlannedTransaction {
    /// Dedupe key stored in the import state.
    pub fn state_key(&self, account_id: u64) -> String {
        format!("{}-{}-{}", self.currency, account_id, self.record_id)
    }

    /// The export occasionally dates a record's creation after its
    /// completion; worth a warning but not a rejection.
    pub fn clock_skew(&self) -> bool {
        self.created_on > self.finished_on
    }
}

/// What to do with one record.
#[derive(Debug, Clone, PartialEq)]
pub enum Disposition {
    Import(PlannedTransaction),
    /// Not imported; the string names the reason for the log.
    Skip(String),
}

pub fn parse<R: std::io::Read>(reader: R) -> Result<Vec<StatementRecord>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut records = Vec::new();
    for record in csv_reader.deserialize() {
        records.push(record?);
    }
    Ok(records)
}

pub fn load(path: &Path) -> Result<Vec<StatementRecord>> {
    parse(std::fs::File::open(path)?)
}

/// Decides whether `record` becomes a transaction and computes its
/// amount and counterparty.
///
/// IN rows book the target amount against the source name, OUT rows
/// book the negated source amount plus fee against the target name.
/// NEUTRAL rows are balance-to-balance conversions and only imported
/// when their currency pair is allowed.
pub fn map_record(record: &StatementRecord, rules: &ImportRules) -> Result<Disposition> {
    match record.status.as_str() {
        "COMPLETED" => {}
        "REFUNDED" => {
            return Ok(Disposition::Skip(format!(
                "refunded transaction {}",
                record.id
            )));
        }
        "CANCELLED" => {
            return Ok(Disposition::Skip(format!(
                "cancelled transaction {}",
                record.id
            )));
        }
        other => {
            return Err(InvoicerError::Record {
                id: record.id.clone(),
                problem: format!("unknown status {other:?}"),
            });
        }
    }

    let direction = record.direction.as_str();
    let (currency, counterparty, amount) = match direction {
        "IN" => (
            record.target_currency.clone(),
            record.source_name.clone(),
            parse_amount(&record.target_amount, "target amount", record)?,
        ),
        "OUT" => {
            let fee = if record.source_fee.trim().is_empty() {
                0.0
            } else {
                parse_amount(&record.source_fee, "source fee", record)?
            };
            let amount = parse_amount(&record.source_amount, "source amount", record)?;
            (
                record.source_currency.clone(),
                record.target_name.clone(),
                -amount - fee,
            )
        }
        "NEUTRAL" => {
            let pair = (
                record.source_currency.clone(),
                record.target_currency.clone(),
            );
            if !rules.neutral_pairs.contains(&pair) {
                return Ok(Disposition::Skip(format!(
                    "neutral transaction {} -> {}",
                    pair.0, pair.1
                )));
            }
            (
                record.target_currency.clone(),
                record.source_name.clone(),
                parse_amount(&record.target_amount, "target amount", record)?,
            )
        }
        other => {
            return Err(InvoicerError::Record {
                id: record.id.clone(),
                problem: format!("unknown direction {other:?}"),
            });
        }
    };

    // The statement lists every account; ignoring a currency only makes
    // sense for rows that move money in or out of it.
    if rules.ignored_currencies.contains(&currency) && matches!(direction, "IN" | "OUT") {
        return Ok(Disposition::Skip(format!(
            "{direction} transaction {} in ignored currency {currency}",
            record.id
        )));
    }

    let mut reference = record.reference.clone();
    if record.id.contains("CARD_TRANSACTION") && reference.is_empty() && direction == "OUT" {
        reference = format!(
            "Card transaction of {} ({})",
            record.target_amount, record.target_currency
        );
    }
    if reference.is_empty() && direction == "NEUTRAL" {
        reference = format!(
            "Currency exchange from {} to {} at exchange rate {}",
            record.source_currency, record.target_currency, record.exchange_rate
        );
    }

    let mut record_id = record.id.clone();
    for (original, replacement) in ID_ALIASES {
        record_id = record_id.replace(original, replacement);
    }

    Ok(Disposition::Import(PlannedTransaction {
        record_id,
        currency,
        amount,
        counterparty,
        reference,
        created_on: parse_timestamp(&record.created_on, "Created on", record)?,
        finished_on: parse_timestamp(&record.finished_on, "Finished on", record)?,
    }))
}

/// `%Y-%m-%dT%H:%M:%S+00:00`, the timestamp format transactions use.
pub fn api_timestamp(value: NaiveDateTime) -> String {
    value.format("%Y-%m-%dT%H:%M:%S+00:00").to_string()
}

fn parse_amount(value: &str, field: &str, record: &StatementRecord) -> Result<f64> {
    value.trim().parse().map_err(|_| InvoicerError::Record {
        id: record.id.clone(),
        problem: format!("{field} {value:?} is not a number"),
    })
}

fn parse_timestamp(value: &str, field: &str, record: &StatementRecord) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S").map_err(|_| InvoicerError::Record {
        id: record.id.clone(),
        problem: format!("{field} {value:?} is not a timestamp"),
    })
}
