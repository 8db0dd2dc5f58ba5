//! The billing report `harvest-exporter --format json` writes.

use std::path::Path;

use serde::Deserialize;

use crate::error::{InvoicerError, Result};

/// One billing row: a client/task pair with its rounded hours and the
/// cost in source and invoice currency.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportRow {
    pub user: String,
    /// Compact `YYYYMMDD` form.
    pub start_date: String,
    pub end_date: String,
    /// `-` when the work was billed without an agency.
    pub agency: String,
    pub client: String,
    pub task: String,
    pub rounded_hours: f64,
    pub source_cost: f64,
    pub source_currency: String,
    pub source_hourly_rate: f64,
    pub target_cost: f64,
    pub target_currency: String,
    pub target_hourly_rate: f64,
    pub exchange_rate: f64,
}

impl ReportRow {
    /// Whether an agency sits between the client and the invoice. The
    /// exporter writes `-` for none; older reports used `none`.
    pub fn has_agency(&self) -> bool {
        self.agency != "-" && !self.agency.eq_ignore_ascii_case("none")
    }
}

pub fn parse(raw: &str) -> Result<Vec<ReportRow>> {
    let rows: Vec<ReportRow> = serde_json::from_str(raw)?;
    if rows.is_empty() {
        return Err(InvoicerError::Report("the report has no rows".to_string()));
    }
    Ok(rows)
}

pub fn load(path: &Path) -> Result<Vec<ReportRow>> {
    let raw = std::fs::read_to_string(path)?;
    parse(&raw)
}
