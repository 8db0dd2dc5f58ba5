//! Aggregation of time entries into per-user, per-task billing rows.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::NaiveDate;
use ecbx::ClosestPolicy;
use log::{debug, warn};
use rusqlite::Connection;
use serde::Serialize;

use crate::dates;
use crate::error::{HarvestError, Result};
use crate::models::TimeEntry;
use crate::rounding;

/// Share of the hourly rate that is left after an agency takes its cut.
pub const AGENCY_SHARE: f64 = 0.8;

/// Summed tracked time for one client and task.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskTotals {
    pub client: String,
    pub task: String,
    pub minutes: i64,
    pub hourly_rate: f64,
    pub currency: String,
    pub cost: f64,
}

/// One line of the export, ready for rendering.
///
/// The field order is the column order of the CSV output.
#[derive(Debug, Clone, Serialize)]
pub struct ExportRow {
    pub user: String,
    pub start_date: String,
    pub end_date: String,
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

/// Sum entries per user and per client/task pair.
///
/// Entries without an hourly rate or client currency are skipped with a
/// warning. When `agency` is set every rate is reduced to the share that
/// remains after the agency cut. Tasks that end up with zero minutes are
/// dropped.
pub fn aggregate(
    entries: &[TimeEntry],
    agency: Option<&str>,
) -> Result<BTreeMap<String, Vec<TaskTotals>>> {
    let agency_factor = if agency.is_some() { AGENCY_SHARE } else { 1.0 };
    let mut users: BTreeMap<String, BTreeMap<(String, String), TaskTotals>> = BTreeMap::new();

    for entry in entries {
        let rate = match entry.hourly_rate() {
            Some(rate) => rate * agency_factor,
            None => {
                warn!(
                    "Skipping entry {} ({} {} - {}): no hourly rate",
                    entry.id, entry.spent_date, entry.client.name, entry.task.name
                );
                continue;
            }
        };
        let currency = match entry.client.currency.clone() {
            Some(currency) => currency,
            None => {
                warn!(
                    "Skipping entry {} ({} {}): client has no currency",
                    entry.id, entry.spent_date, entry.client.name
                );
                continue;
            }
        };

        let minutes = rounding::hours_to_minutes(entry.effective_hours());
        let key = (entry.client.name.clone(), entry.task.name.clone());
        let bucket = users
            .entry(entry.user.name.clone())
            .or_default()
            .entry(key)
            .or_insert_with(|| TaskTotals {
                client: entry.client.name.clone(),
                task: entry.task.name.clone(),
                minutes: 0,
                hourly_rate: rate,
                currency: currency.clone(),
                cost: 0.0,
            });

        if bucket.currency != currency {
            return Err(HarvestError::CurrencyMismatch {
                client: entry.client.name.clone(),
                task: entry.task.name.clone(),
                expected: bucket.currency.clone(),
                found: currency,
            });
        }
        if (bucket.hourly_rate - rate).abs() > f64::EPSILON {
            warn!(
                "Entries for {} - {} have different hourly rates ({} vs {})",
                entry.client.name, entry.task.name, bucket.hourly_rate, rate
            );
            bucket.hourly_rate = rate;
        }

        bucket.minutes += minutes;
        bucket.cost += minutes as f64 / 60.0 * rate;
    }

    let mut totals = BTreeMap::new();
    for (user, buckets) in users {
        let tasks: Vec<TaskTotals> = buckets
            .into_values()
            .filter(|bucket| bucket.minutes > 0)
            .collect();
        if !tasks.is_empty() {
            totals.insert(user, tasks);
        }
    }
    Ok(totals)
}

/// Exchange rates backed by the store that `ecbx` maintains.
///
/// The database is only opened when a conversion is actually needed, so
/// exports that stay in one currency work without it.
pub struct RateStore {
    path: PathBuf,
    conn: Option<Connection>,
}

impl RateStore {
    /// Store that opens the database at `path` on first use.
    pub fn at(path: PathBuf) -> Self {
        Self { path, conn: None }
    }

    /// Store over an already opened database connection.
    pub fn with_connection(conn: Connection) -> Self {
        Self {
            path: PathBuf::new(),
            conn: Some(conn),
        }
    }

    /// Rate from `source` to `target` on the latest day at or before `date`.
    pub fn rate(&mut self, date: &str, source: &str, target: &str) -> Result<f64> {
        if source.eq_ignore_ascii_case(target) {
            return Ok(1.0);
        }
        let conn = self.connection()?;
        let (used_date, rate) =
            ecbx::store::get_rate(conn, date, source, target, ClosestPolicy::Before)?;
        if used_date != date {
            debug!("Using the {source} -> {target} rate from {used_date} for {date}");
        }
        Ok(rate)
    }

    fn connection(&mut self) -> Result<&mut Connection> {
        if self.conn.is_none() {
            if !self.path.exists() {
                return Err(HarvestError::Rates(ecbx::EcbxError::NotInitialized));
            }
            debug!("Opening exchange rate store {}", self.path.display());
            self.conn = Some(Connection::open(&self.path).map_err(ecbx::EcbxError::from)?);
        }
        match self.conn.as_mut() {
            Some(conn) => Ok(conn),
            None => Err(HarvestError::Rates(ecbx::EcbxError::NotInitialized)),
        }
    }
}

/// Turn aggregated totals into export rows, converting each cost into the
/// target currency at the rate of the range's end date.
pub fn build_rows(
    totals: &BTreeMap<String, Vec<TaskTotals>>,
    start: NaiveDate,
    end: NaiveDate,
    target_currency: &str,
    agency: Option<&str>,
    rates: &mut RateStore,
) -> Result<Vec<ExportRow>> {
    let lookup_date = dates::iso(end);
    let start_compact = dates::compact(start);
    let end_compact = dates::compact(end);

    let mut rows = Vec::new();
    for (user, tasks) in totals {
        for bucket in tasks {
            let rate = rates.rate(&lookup_date, &bucket.currency, target_currency)?;
            rows.push(ExportRow {
                user: user.clone(),
                start_date: start_compact.clone(),
                end_date: end_compact.clone(),
                agency: agency.unwrap_or("-").to_string(),
                client: bucket.client.clone(),
                task: bucket.task.clone(),
                rounded_hours: bucket.minutes as f64 / 60.0,
                source_cost: round2(bucket.cost),
                source_currency: bucket.currency.clone(),
                source_hourly_rate: round2(bucket.hourly_rate),
                target_cost: round2(bucket.cost * rate),
                target_currency: target_currency.to_string(),
                target_hourly_rate: round2(bucket.hourly_rate * rate),
                exchange_rate: rate,
            });
        }
    }
    Ok(rows)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Aligned table with per-range totals and the exchange rates used.
pub fn as_humanreadable(rows: &[ExportRow]) -> String {
    if rows.is_empty() {
        return "No billable entries in this range.\n".to_string();
    }

    let currency = &rows[0].target_currency;
    let rate_header = format!("Rate ({currency}/h)");
    let cost_header = format!("Cost ({currency})");

    let mut user_width = "User".len();
    let mut task_width = "Client - Task".len();
    for row in rows {
        user_width = user_width.max(row.user.len());
        task_width = task_width.max(row.client.len() + row.task.len() + 3);
    }
    let rate_width = rate_header.len().max(10);
    let cost_width = cost_header.len().max(12);

    let mut output = format!("Time: {} -> {}\n\n", rows[0].start_date, rows[0].end_date);
    output.push_str(&format!(
        "{:<user_width$} | {:<task_width$} | {:>7} | {:>rate_width$} | {:>cost_width$}\n",
        "User", "Client - Task", "Hours", rate_header, cost_header,
    ));
    output.push_str(&format!(
        "{:-<user_width$}-+-{:-<task_width$}-+-{:-<7}-+-{:-<rate_width$}-+-{:-<cost_width$}\n",
        "", "", "", "", "",
    ));

    let mut total_hours = 0.0;
    let mut total_cost = 0.0;
    for row in rows {
        total_hours += row.rounded_hours;
        total_cost += row.target_cost;
        output.push_str(&format!(
            "{:<user_width$} | {:<task_width$} | {:>7.2} | {:>rate_width$.2} | {:>cost_width$.2}\n",
            row.user,
            format!("{} - {}", row.client, row.task),
            row.rounded_hours,
            row.target_hourly_rate,
            row.target_cost,
        ));
    }
    output.push_str(&format!(
        "{:-<user_width$}-+-{:-<task_width$}-+-{:-<7}-+-{:-<rate_width$}-+-{:-<cost_width$}\n",
        "", "", "", "", "",
    ));
    output.push_str(&format!(
        "{:<user_width$} | {:<task_width$} | {:>7.2} | {:>rate_width$} | {:>cost_width$.2}\n",
        "Total", "", total_hours, "", total_cost,
    ));

    let mut used_rates: Vec<(String, f64)> = Vec::new();
    for row in rows {
        let pair = (row.source_currency.clone(), row.exchange_rate);
        if row.source_currency != row.target_currency && !used_rates.contains(&pair) {
            used_rates.push(pair);
        }
    }
    if !used_rates.is_empty() {
        output.push_str("\nExchange rates:\n");
        for (source, rate) in used_rates {
            output.push_str(&format!("  1 {source} = {rate:.4} {currency}\n"));
        }
    }
    output
}

/// CSV with one line per row, columns in `ExportRow` field order.
pub fn as_csv(rows: &[ExportRow]) -> Result<String> {
    let mut buffer = Vec::new();
    {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(true)
            .from_writer(&mut buffer);
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
    }
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

/// Pretty-printed JSON array, the format the invoicing tools consume.
pub fn as_json(rows: &[ExportRow]) -> Result<String> {
    Ok(serde_json::to_string_pretty(rows)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Client, Reference, UserAssignment};
    use ecbx::RateObservation;

    fn entry(
        id: u64,
        user: &str,
        client: &str,
        task: &str,
        currency: &str,
        hours: f64,
        rate: f64,
    ) -> TimeEntry {
        TimeEntry {
            id,
            spent_date: "2024-02-05".to_string(),
            hours,
            rounded_hours: Some(hours),
            notes: None,
            is_locked: false,
            user: Reference {
                id: 1,
                name: user.to_string(),
            },
            client: Client {
                id: 2,
                name: client.to_string(),
                currency: Some(currency.to_string()),
            },
            project: Reference {
                id: 3,
                name: "Website".to_string(),
            },
            task: Reference {
                id: 4,
                name: task.to_string(),
            },
            user_assignment: Some(UserAssignment {
                hourly_rate: Some(rate),
            }),
            billable: true,
            billable_rate: Some(rate),
        }
    }

    fn range() -> (NaiveDate, NaiveDate) {
        (
            NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
        )
    }

    #[test]
    fn aggregate_sums_minutes_and_cost_per_task() {
        let entries = vec![
            entry(1, "Jane Doe", "ACME", "Development", "EUR", 1.25, 100.0),
            entry(2, "Jane Doe", "ACME", "Development", "EUR", 0.5, 100.0),
            entry(3, "Jane Doe", "ACME", "Review", "EUR", 1.0, 100.0),
        ];
        let totals = aggregate(&entries, None).unwrap();
        let tasks = &totals["Jane Doe"];
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].task, "Development");
        assert_eq!(tasks[0].minutes, 105);
        assert_eq!(tasks[0].cost, 175.0);
        assert_eq!(tasks[1].task, "Review");
        assert_eq!(tasks[1].minutes, 60);
    }

    #[test]
    fn aggregate_applies_the_agency_share() {
        let entries = vec![entry(1, "Jane Doe", "ACME", "Development", "EUR", 2.0, 100.0)];
        let totals = aggregate(&entries, Some("Broker Inc")).unwrap();
        let task = &totals["Jane Doe"][0];
        assert_eq!(task.hourly_rate, 80.0);
        assert_eq!(task.cost, 160.0);
    }

    #[test]
    fn aggregate_rejects_mixed_currencies() {
        let entries = vec![
            entry(1, "Jane Doe", "ACME", "Development", "EUR", 1.0, 100.0),
            entry(2, "Jane Doe", "ACME", "Development", "USD", 1.0, 100.0),
        ];
        let error = aggregate(&entries, None).unwrap_err();
        match error {
            HarvestError::CurrencyMismatch {
                expected, found, ..
            } => {
                assert_eq!(expected, "EUR");
                assert_eq!(found, "USD");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn aggregate_skips_entries_without_a_rate() {
        let mut unbillable = entry(1, "Jane Doe", "ACME", "Development", "EUR", 1.0, 100.0);
        unbillable.billable_rate = None;
        unbillable.user_assignment = None;
        let totals = aggregate(&[unbillable], None).unwrap();
        assert!(totals.is_empty());
    }

    #[test]
    fn aggregate_drops_zero_hour_tasks() {
        let entries = vec![entry(1, "Jane Doe", "ACME", "Development", "EUR", 0.0, 100.0)];
        let totals = aggregate(&entries, None).unwrap();
        assert!(totals.is_empty());
    }

    #[test]
    fn same_currency_rows_never_open_the_store() {
        let entries = vec![entry(1, "Jane Doe", "ACME", "Development", "EUR", 1.5, 100.0)];
        let totals = aggregate(&entries, None).unwrap();
        let mut rates = RateStore::at(PathBuf::from("/nonexistent/rates.db"));
        let (start, end) = range();
        let rows = build_rows(&totals, start, end, "EUR", None, &mut rates).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].exchange_rate, 1.0);
        assert_eq!(rows[0].target_cost, rows[0].source_cost);
        assert_eq!(rows[0].start_date, "20240201");
        assert_eq!(rows[0].end_date, "20240229");
    }

    #[test]
    fn build_rows_converts_via_the_rate_store() {
        let mut conn = Connection::open_in_memory().unwrap();
        ecbx::store::init_schema(&conn).unwrap();
        ecbx::store::ingest(
            &mut conn,
            &[RateObservation {
                date: "2024-02-28".to_string(),
                currency: "USD".to_string(),
                rate: 2.0,
            }],
        )
        .unwrap();

        let entries = vec![entry(1, "Jane Doe", "ACME", "Development", "USD", 3.0, 100.0)];
        let totals = aggregate(&entries, None).unwrap();
        let mut rates = RateStore::with_connection(conn);
        let (start, end) = range();
        let rows = build_rows(&totals, start, end, "EUR", None, &mut rates).unwrap();

        // 1 EUR buys 2 USD, so 1 USD is 0.50 EUR.
        assert_eq!(rows[0].exchange_rate, 0.5);
        assert_eq!(rows[0].source_cost, 300.0);
        assert_eq!(rows[0].target_cost, 150.0);
        assert_eq!(rows[0].target_hourly_rate, 50.0);
        assert_eq!(rows[0].target_currency, "EUR");
    }

    #[test]
    fn missing_rates_surface_as_errors() {
        let conn = Connection::open_in_memory().unwrap();
        ecbx::store::init_schema(&conn).unwrap();

        let entries = vec![entry(1, "Jane Doe", "ACME", "Development", "USD", 1.0, 100.0)];
        let totals = aggregate(&entries, None).unwrap();
        let mut rates = RateStore::with_connection(conn);
        let (start, end) = range();
        let error = build_rows(&totals, start, end, "EUR", None, &mut rates).unwrap_err();
        assert!(matches!(
            error,
            HarvestError::Rates(ecbx::EcbxError::NoRateAvailable { .. })
        ));
    }

    #[test]
    fn csv_has_the_expected_columns() {
        let entries = vec![entry(1, "Jane Doe", "ACME", "Development", "EUR", 1.5, 100.0)];
        let totals = aggregate(&entries, Some("Broker Inc")).unwrap();
        let mut rates = RateStore::at(PathBuf::from("/nonexistent/rates.db"));
        let (start, end) = range();
        let rows = build_rows(&totals, start, end, "EUR", Some("Broker Inc"), &mut rates).unwrap();

        let csv = as_csv(&rows).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "user,start_date,end_date,agency,client,task,rounded_hours,source_cost,\
             source_currency,source_hourly_rate,target_cost,target_currency,\
             target_hourly_rate,exchange_rate"
        );
        let row = lines.next().unwrap();
        assert!(row.starts_with("Jane Doe,20240201,20240229,Broker Inc,ACME,Development,1.5,"));
    }

    #[test]
    fn humanreadable_lists_totals_and_exchange_rates() {
        let mut conn = Connection::open_in_memory().unwrap();
        ecbx::store::init_schema(&conn).unwrap();
        ecbx::store::ingest(
            &mut conn,
            &[RateObservation {
                date: "2024-02-28".to_string(),
                currency: "USD".to_string(),
                rate: 2.0,
            }],
        )
        .unwrap();

        let entries = vec![
            entry(1, "Jane Doe", "ACME", "Development", "USD", 2.0, 100.0),
            entry(2, "John Roe", "Globex", "Support", "EUR", 1.0, 60.0),
        ];
        let totals = aggregate(&entries, None).unwrap();
        let mut rates = RateStore::with_connection(conn);
        let (start, end) = range();
        let rows = build_rows(&totals, start, end, "EUR", None, &mut rates).unwrap();

        let table = as_humanreadable(&rows);
        assert!(table.starts_with("Time: 20240201 -> 20240229\n"));
        assert!(table.contains("Jane Doe"));
        assert!(table.contains("Globex - Support"));
        assert!(table.contains("Total"));
        assert!(table.contains("Exchange rates:"));
        assert!(table.contains("1 USD = 0.5000 EUR"));
    }

    #[test]
    fn empty_export_renders_placeholders() {
        assert_eq!(
            as_humanreadable(&[]),
            "No billable entries in this range.\n"
        );
        assert_eq!(as_json(&[]).unwrap(), "[]");
        assert_eq!(as_csv(&[]).unwrap(), "");
    }
}
