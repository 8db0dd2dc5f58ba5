//! Per-customer aggregation of billable timesheets into export rows.
//!
//! The row format matches `harvest-exporter` so the invoicing tools can
//! consume the JSON of either exporter.

use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;

use chrono::NaiveDate;
use ecbx::ClosestPolicy;
use log::{debug, info, warn};
use rusqlite::Connection;
use serde::Serialize;

use crate::api::KimaiApi;
use crate::dates;
use crate::error::{KimaiError, Result};
use crate::models::UserInfo;

/// Share of the hourly rate that is left after an agency takes its cut.
pub const AGENCY_SHARE: f64 = 0.8;

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

/// Summed billable time for one customer.
#[derive(Debug, Clone)]
pub struct CustomerTotals {
    pub customer: String,
    pub currency: String,
    pub seconds: i64,
    pub hourly_rate: f64,
    pub tasks: BTreeSet<String>,
}

/// Collect billable totals per customer for one user.
///
/// Customers are discovered through the visible projects. Timesheets are
/// fetched once per customer and labelled by activity name; a project
/// whose name differs from the customer's is listed as a task of its own.
/// The list endpoint omits rates, so the hourly rate is read off the
/// first entry of each customer.
pub async fn collect_totals(
    api: &KimaiApi,
    user: &UserInfo,
    begin: &str,
    end: &str,
    client: Option<&str>,
    agency: Option<&str>,
) -> Result<Vec<CustomerTotals>> {
    let agency_factor = if agency.is_some() { AGENCY_SHARE } else { 1.0 };
    let projects = api.get_projects().await?;

    let mut project_names: HashMap<u64, String> = HashMap::new();
    let mut customer_ids: Vec<u64> = Vec::new();
    for project in &projects {
        project_names.insert(project.id, project.name.clone());
        if !customer_ids.contains(&project.customer) {
            customer_ids.push(project.customer);
        }
    }

    let mut totals: Vec<CustomerTotals> = Vec::new();
    let mut activity_names: HashMap<u64, String> = HashMap::new();

    for customer_id in customer_ids {
        let customer = api.get_customer(customer_id).await?;
        if let Some(filter) = client {
            if customer.name != filter {
                debug!("Skipping customer {}", customer.name);
                continue;
            }
        }

        let entries = api
            .get_timesheets(user.id, customer.id, begin, end)
            .await?;
        if entries.is_empty() {
            debug!("No billable entries for {}", customer.name);
            continue;
        }

        let mut seconds = 0i64;
        let mut tasks: BTreeSet<String> = BTreeSet::new();
        for entry in &entries {
            seconds += entry.duration.max(0);
            let activity = match activity_names.get(&entry.activity) {
                Some(name) => name.clone(),
                None => {
                    let activity = api.get_activity(entry.activity).await?;
                    activity_names.insert(entry.activity, activity.name.clone());
                    activity.name
                }
            };
            tasks.insert(activity);
            if let Some(project) = project_names.get(&entry.project) {
                if project != &customer.name {
                    tasks.insert(project.clone());
                }
            }
        }
        if seconds == 0 {
            continue;
        }

        let full = api.get_timesheet(entries[0].id).await?;
        let hourly_rate = match full.effective_hourly_rate() {
            Some(rate) => rate * agency_factor,
            None => {
                warn!(
                    "Skipping {}: its timesheets carry no hourly rate",
                    customer.name
                );
                continue;
            }
        };

        info!(
            "{}: {} entries across {} tasks",
            customer.name,
            entries.len(),
            tasks.len()
        );
        totals.push(CustomerTotals {
            customer: customer.name,
            currency: customer.currency,
            seconds,
            hourly_rate,
            tasks,
        });
    }
    Ok(totals)
}

/// Seconds rounded to tenths of an hour, the resolution invoices use.
pub fn rounded_hours(seconds: i64) -> f64 {
    (seconds as f64 / 3600.0 * 10.0).round() / 10.0
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
                return Err(KimaiError::Rates(ecbx::EcbxError::NotInitialized));
            }
            debug!("Opening exchange rate store {}", self.path.display());
            self.conn = Some(Connection::open(&self.path).map_err(ecbx::EcbxError::from)?);
        }
        match self.conn.as_mut() {
            Some(conn) => Ok(conn),
            None => Err(KimaiError::Rates(ecbx::EcbxError::NotInitialized)),
        }
    }
}

/// Turn customer totals into export rows, converting each cost into the
/// target currency at the rate of the range's end date.
pub fn build_rows(
    totals: &[CustomerTotals],
    user: &str,
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
    for customer in totals {
        let exact_hours = customer.seconds as f64 / 3600.0;
        let hours = rounded_hours(customer.seconds);
        if hours <= 0.0 {
            continue;
        }
        let drift = hours - exact_hours;
        if drift.abs() > 1e-9 {
            info!(
                "{}: rounding {exact_hours:.4}h to {hours:.1}h ({drift:+.4}h)",
                customer.customer
            );
        }

        let rate = rates.rate(&lookup_date, &customer.currency, target_currency)?;
        let task = customer
            .tasks
            .iter()
            .cloned()
            .collect::<Vec<_>>()
            .join(", ");
        rows.push(ExportRow {
            user: user.to_string(),
            start_date: start_compact.clone(),
            end_date: end_compact.clone(),
            agency: agency.unwrap_or("-").to_string(),
            client: customer.customer.clone(),
            task,
            rounded_hours: hours,
            source_cost: round2(hours * customer.hourly_rate),
            source_currency: customer.currency.clone(),
            source_hourly_rate: round2(customer.hourly_rate),
            target_cost: round2(hours * customer.hourly_rate * rate),
            target_currency: target_currency.to_string(),
            target_hourly_rate: round2(customer.hourly_rate * rate),
            exchange_rate: rate,
        });
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
    use ecbx::RateObservation;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_user() -> UserInfo {
        UserInfo {
            id: 5,
            username: "jane".to_string(),
            alias: Some("Jane Doe".to_string()),
            enabled: true,
        }
    }

    fn range() -> (NaiveDate, NaiveDate) {
        (
            NaiveDate::from_ymd_opt(2024, 7, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 7, 31).unwrap(),
        )
    }

    #[test]
    fn hours_round_to_tenths() {
        assert_eq!(rounded_hours(5400), 1.5);
        assert_eq!(rounded_hours(5520), 1.5);
        assert_eq!(rounded_hours(5580), 1.6);
        assert_eq!(rounded_hours(0), 0.0);
    }

    #[tokio::test]
    async fn totals_join_activities_and_distinct_project_names() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/projects"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "id": 1, "name": "Website", "customer": 10 },
                { "id": 2, "name": "ACME", "customer": 10 }
            ])))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/customers/10"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 10, "name": "ACME", "currency": "USD"
            })))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/timesheets"))
            .and(query_param("user", "5"))
            .and(query_param("customer", "10"))
            .and(query_param("billable", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "id": 70, "begin": "2024-07-02T09:00:00", "end": "2024-07-02T10:00:00",
                  "duration": 3600, "user": 5, "project": 1, "activity": 3, "billable": true },
                { "id": 71, "begin": "2024-07-03T09:00:00", "end": "2024-07-03T09:30:00",
                  "duration": 1800, "user": 5, "project": 2, "activity": 4, "billable": true }
            ])))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/activities/3"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "id": 3, "name": "Development" })),
            )
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/activities/4"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "id": 4, "name": "Review" })),
            )
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/timesheets/70"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 70, "duration": 3600, "user": 5, "project": 1, "activity": 3,
                "rate": 100.0, "internalRate": 80.0, "hourlyRate": 100.0, "billable": true
            })))
            .mount(&mock_server)
            .await;

        let api = KimaiApi::new(mock_server.uri(), "token".to_string());
        let totals = collect_totals(
            &api,
            &test_user(),
            "2024-07-01T00:00:00",
            "2024-07-31T23:59:59",
            None,
            None,
        )
        .await
        .unwrap();

        assert_eq!(totals.len(), 1);
        let acme = &totals[0];
        assert_eq!(acme.customer, "ACME");
        assert_eq!(acme.currency, "USD");
        assert_eq!(acme.seconds, 5400);
        assert_eq!(acme.hourly_rate, 100.0);
        // "ACME" matches the customer name, so only "Website" is a task.
        let tasks: Vec<&str> = acme.tasks.iter().map(String::as_str).collect();
        assert_eq!(tasks, vec!["Development", "Review", "Website"]);
    }

    #[tokio::test]
    async fn client_filter_skips_other_customers() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/projects"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "id": 1, "name": "Website", "customer": 10 }
            ])))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/customers/10"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 10, "name": "ACME", "currency": "USD"
            })))
            .mount(&mock_server)
            .await;

        let api = KimaiApi::new(mock_server.uri(), "token".to_string());
        let totals = collect_totals(
            &api,
            &test_user(),
            "2024-07-01T00:00:00",
            "2024-07-31T23:59:59",
            Some("Globex"),
            None,
        )
        .await
        .unwrap();
        assert!(totals.is_empty());
    }

    #[test]
    fn rows_convert_currency_and_join_tasks() {
        let mut conn = Connection::open_in_memory().unwrap();
        ecbx::store::init_schema(&conn).unwrap();
        ecbx::store::ingest(
            &mut conn,
            &[RateObservation {
                date: "2024-07-31".to_string(),
                currency: "USD".to_string(),
                rate: 2.0,
            }],
        )
        .unwrap();

        let totals = vec![CustomerTotals {
            customer: "ACME".to_string(),
            currency: "USD".to_string(),
            seconds: 5400,
            hourly_rate: 100.0,
            tasks: ["Development", "Website"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }];
        let mut rates = RateStore::with_connection(conn);
        let (start, end) = range();
        let rows = build_rows(&totals, "Jane Doe", start, end, "EUR", None, &mut rates).unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].task, "Development, Website");
        assert_eq!(rows[0].rounded_hours, 1.5);
        assert_eq!(rows[0].source_cost, 150.0);
        assert_eq!(rows[0].exchange_rate, 0.5);
        assert_eq!(rows[0].target_cost, 75.0);
        assert_eq!(rows[0].start_date, "20240701");
        assert_eq!(rows[0].end_date, "20240731");
    }

    #[test]
    fn csv_columns_match_the_harvest_exporter() {
        let totals = vec![CustomerTotals {
            customer: "ACME".to_string(),
            currency: "EUR".to_string(),
            seconds: 3600,
            hourly_rate: 90.0,
            tasks: ["Development"].iter().map(|s| s.to_string()).collect(),
        }];
        let mut rates = RateStore::at(PathBuf::from("/nonexistent/rates.db"));
        let (start, end) = range();
        let rows = build_rows(&totals, "Jane Doe", start, end, "EUR", None, &mut rates).unwrap();

        let csv = as_csv(&rows).unwrap();
        assert!(csv.starts_with(
            "user,start_date,end_date,agency,client,task,rounded_hours,source_cost,\
             source_currency,source_hourly_rate,target_cost,target_currency,\
             target_hourly_rate,exchange_rate\n"
        ));
    }
}
