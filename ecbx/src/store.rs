//! SQLite storage for exchange rates.
//!
//! Uses parameterized queries exclusively (no SQL string concatenation).
//! All multi-row writes are transactional.

use std::collections::HashSet;
use std::fmt;

use rusqlite::{params, Connection, Transaction};

use crate::ecb::RateObservation;
use crate::error::{EcbxError, Result};

/// Result type for database operations
pub type DbResult<T> = rusqlite::Result<T>;

/// Strategy for resolving a requested date to a stored one when the exact
/// date has no rate (the ECB skips weekends and holidays).
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ClosestPolicy {
    /// Latest stored date on or before the requested one
    Before,
    /// Earliest stored date on or after the requested one
    After,
    /// Stored date with the smallest absolute day distance
    Closest,
}

impl ClosestPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClosestPolicy::Before => "before",
            ClosestPolicy::After => "after",
            ClosestPolicy::Closest => "closest",
        }
    }
}

impl fmt::Display for ClosestPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A known currency: ISO code plus the name the ECB publishes it under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Currency {
    pub code: String,
    pub name: String,
}

/// Counts from a feed ingest.
#[derive(Debug)]
pub struct IngestResult {
    /// Rate rows written (both directions counted)
    pub rates: usize,
    /// Distinct observation dates seen
    pub dates: usize,
}

/// Currencies the ECB publishes reference rates for, plus EUR itself.
const CURRENCY_NAMES: &[(&str, &str)] = &[
    ("EUR", "Euro"),
    ("USD", "US dollar"),
    ("JPY", "Japanese yen"),
    ("BGN", "Bulgarian lev"),
    ("CZK", "Czech koruna"),
    ("DKK", "Danish krone"),
    ("GBP", "Pound sterling"),
    ("HUF", "Hungarian forint"),
    ("PLN", "Polish zloty"),
    ("RON", "Romanian leu"),
    ("SEK", "Swedish krona"),
    ("CHF", "Swiss franc"),
    ("ISK", "Icelandic krona"),
    ("NOK", "Norwegian krone"),
    ("TRY", "Turkish lira"),
    ("AUD", "Australian dollar"),
    ("BRL", "Brazilian real"),
    ("CAD", "Canadian dollar"),
    ("CNY", "Chinese yuan renminbi"),
    ("HKD", "Hong Kong dollar"),
    ("HRK", "Croatian kuna"),
    ("IDR", "Indonesian rupiah"),
    ("ILS", "Israeli shekel"),
    ("INR", "Indian rupee"),
    ("KRW", "South Korean won"),
    ("MXN", "Mexican peso"),
    ("MYR", "Malaysian ringgit"),
    ("NZD", "New Zealand dollar"),
    ("PHP", "Philippine peso"),
    ("SGD", "Singapore dollar"),
    ("THB", "Thai baht"),
    ("ZAR", "South African rand"),
];

/// Initialize the database schema and seed the currency names.
///
/// Idempotent: tables are created if missing, seeded names never
/// overwrite existing rows.
pub fn init_schema(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS currencies (
            code TEXT PRIMARY KEY,
            name TEXT NOT NULL
        );

        -- One row per (date, direction); EUR legs come from the feed,
        -- non-EUR pairs are synthesized on lookup.
        CREATE TABLE IF NOT EXISTS rates (
            date TEXT NOT NULL,
            base_currency TEXT NOT NULL,
            target_currency TEXT NOT NULL,
            rate REAL NOT NULL,
            PRIMARY KEY (date, base_currency, target_currency)
        );

        CREATE TABLE IF NOT EXISTS metadata (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );
        ",
    )?;

    let mut stmt =
        conn.prepare_cached("INSERT OR IGNORE INTO currencies (code, name) VALUES (?1, ?2)")?;
    for (code, name) in CURRENCY_NAMES {
        stmt.execute(params![code, name])?;
    }

    log::debug!("Database schema initialized");
    Ok(())
}

/// True once the database holds at least one rate row.
pub fn has_rates(conn: &Connection) -> DbResult<bool> {
    Ok(rate_count(conn)? > 0)
}

/// Total number of rate rows.
pub fn rate_count(conn: &Connection) -> DbResult<i64> {
    conn.query_row("SELECT COUNT(*) FROM rates", [], |row| row.get(0))
}

/// Number of known currencies.
pub fn currency_count(conn: &Connection) -> DbResult<i64> {
    conn.query_row("SELECT COUNT(*) FROM currencies", [], |row| row.get(0))
}

/// Oldest and newest observation dates, if any.
pub fn date_range(conn: &Connection) -> DbResult<Option<(String, String)>> {
    let (min, max): (Option<String>, Option<String>) =
        conn.query_row("SELECT MIN(date), MAX(date) FROM rates", [], |row| {
            Ok((row.get(0)?, row.get(1)?))
        })?;
    Ok(min.zip(max))
}

/// All distinct observation dates, oldest first.
pub fn list_dates(conn: &Connection) -> DbResult<Vec<String>> {
    let mut stmt = conn.prepare("SELECT DISTINCT date FROM rates ORDER BY date ASC")?;
    let dates: DbResult<Vec<String>> = stmt.query_map([], |row| row.get(0))?.collect();
    dates
}

/// All known currencies, ordered by code.
pub fn list_currencies(conn: &Connection) -> DbResult<Vec<Currency>> {
    let mut stmt = conn.prepare("SELECT code, name FROM currencies ORDER BY code")?;
    let currencies: DbResult<Vec<Currency>> = stmt
        .query_map([], |row| {
            Ok(Currency {
                code: row.get(0)?,
                name: row.get(1)?,
            })
        })?
        .collect();
    currencies
}

/// All EUR-quoted rates on a date, ordered by target currency.
pub fn rates_on(conn: &Connection, date: &str) -> DbResult<Vec<(String, f64)>> {
    let mut stmt = conn.prepare_cached(
        "SELECT target_currency, rate
         FROM rates
         WHERE date = ?1 AND base_currency = 'EUR'
         ORDER BY target_currency",
    )?;
    let rates: DbResult<Vec<(String, f64)>> = stmt
        .query_map(params![date], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect();
    rates
}

/// Timestamp of the last ingest (RFC 3339), if any.
pub fn last_updated(conn: &Connection) -> DbResult<Option<String>> {
    let mut stmt = conn.prepare("SELECT value FROM metadata WHERE key = 'last_updated'")?;
    let mut rows = stmt.query([])?;
    match rows.next()? {
        Some(row) => Ok(Some(row.get(0)?)),
        None => Ok(None),
    }
}

fn set_last_updated(tx: &Transaction<'_>, value: &str) -> DbResult<()> {
    tx.execute(
        "INSERT OR REPLACE INTO metadata (key, value) VALUES ('last_updated', ?1)",
        params![value],
    )?;
    Ok(())
}

/// Ingest feed observations.
///
/// Each observation writes both directions: `EUR -> currency` with the
/// published rate and `currency -> EUR` with its inverse. Re-ingesting a
/// date is harmless (INSERT OR REPLACE). The `last_updated` timestamp is
/// refreshed at the end of the transaction.
pub fn ingest(conn: &mut Connection, observations: &[RateObservation]) -> DbResult<IngestResult> {
    let tx = conn.transaction()?;
    let result = ingest_tx(&tx, observations)?;
    tx.commit()?;
    Ok(result)
}

fn ingest_tx(tx: &Transaction<'_>, observations: &[RateObservation]) -> DbResult<IngestResult> {
    let mut rate_stmt = tx.prepare_cached(
        "INSERT OR REPLACE INTO rates (date, base_currency, target_currency, rate)
         VALUES (?1, ?2, ?3, ?4)",
    )?;
    let mut currency_stmt =
        tx.prepare_cached("INSERT OR IGNORE INTO currencies (code, name) VALUES (?1, ?2)")?;

    let mut rates = 0;
    let mut dates = HashSet::new();

    for observation in observations {
        if observation.rate <= 0.0 {
            log::warn!(
                "Skipping {} on {}: non-positive rate {}",
                observation.currency,
                observation.date,
                observation.rate
            );
            continue;
        }

        rate_stmt.execute(params![
            &observation.date,
            "EUR",
            &observation.currency,
            observation.rate,
        ])?;
        rate_stmt.execute(params![
            &observation.date,
            &observation.currency,
            "EUR",
            1.0 / observation.rate,
        ])?;
        // Historical feeds carry discontinued codes; name them after
        // themselves when the seed list does not know them.
        currency_stmt.execute(params![&observation.currency, &observation.currency])?;

        rates += 2;
        dates.insert(observation.date.as_str());
    }

    set_last_updated(tx, &chrono::Utc::now().to_rfc3339())?;

    log::info!(
        "Ingested {} rate rows covering {} dates",
        rates,
        dates.len()
    );
    Ok(IngestResult {
        rates,
        dates: dates.len(),
    })
}

/// Resolve a requested date to a stored observation date under `policy`,
/// regardless of currency pair.
pub fn resolve_date(
    conn: &Connection,
    date: &str,
    policy: ClosestPolicy,
) -> DbResult<Option<String>> {
    let sql = match policy {
        ClosestPolicy::Before => {
            "SELECT date FROM rates WHERE date <= ?1 ORDER BY date DESC LIMIT 1"
        }
        ClosestPolicy::After => {
            "SELECT date FROM rates WHERE date >= ?1 ORDER BY date ASC LIMIT 1"
        }
        ClosestPolicy::Closest => {
            "SELECT date, ABS(julianday(date) - julianday(?1)) AS diff FROM rates
             ORDER BY diff ASC LIMIT 1"
        }
    };
    let mut stmt = conn.prepare_cached(sql)?;
    let mut rows = stmt.query(params![date])?;
    match rows.next()? {
        Some(row) => Ok(Some(row.get(0)?)),
        None => Ok(None),
    }
}

/// Look up a stored rate for the pair around `date` under `policy`.
fn find_direct(
    conn: &Connection,
    date: &str,
    base: &str,
    target: &str,
    policy: ClosestPolicy,
) -> DbResult<Option<(String, f64)>> {
    let sql = match policy {
        ClosestPolicy::Before => {
            "SELECT date, rate FROM rates
             WHERE date <= ?1 AND base_currency = ?2 AND target_currency = ?3
             ORDER BY date DESC LIMIT 1"
        }
        ClosestPolicy::After => {
            "SELECT date, rate FROM rates
             WHERE date >= ?1 AND base_currency = ?2 AND target_currency = ?3
             ORDER BY date ASC LIMIT 1"
        }
        ClosestPolicy::Closest => {
            "SELECT date, rate, ABS(julianday(date) - julianday(?1)) AS diff FROM rates
             WHERE base_currency = ?2 AND target_currency = ?3
             ORDER BY diff ASC LIMIT 1"
        }
    };

    let mut stmt = conn.prepare_cached(sql)?;
    let mut rows = stmt.query(params![date, base, target])?;
    match rows.next()? {
        Some(row) => Ok(Some((row.get(0)?, row.get(1)?))),
        None => Ok(None),
    }
}

/// Persist a synthesized pair in both directions so later lookups hit the
/// direct path.
fn persist_cross_rate(
    conn: &mut Connection,
    date: &str,
    base: &str,
    target: &str,
    rate: f64,
) -> DbResult<()> {
    let tx = conn.transaction()?;
    tx.execute(
        "INSERT OR REPLACE INTO rates (date, base_currency, target_currency, rate)
         VALUES (?1, ?2, ?3, ?4)",
        params![date, base, target, rate],
    )?;
    tx.execute(
        "INSERT OR REPLACE INTO rates (date, base_currency, target_currency, rate)
         VALUES (?1, ?2, ?3, ?4)",
        params![date, target, base, 1.0 / rate],
    )?;
    tx.commit()
}

/// Resolve the exchange rate from `base` to `target` around `date`.
///
/// Returns the date actually used and the rate. Currency codes are
/// upper-cased here. When no direct row exists the cross-rate is
/// synthesized from the two EUR legs and persisted for later lookups;
/// both legs must resolve to the same date.
pub fn get_rate(
    conn: &mut Connection,
    date: &str,
    base: &str,
    target: &str,
    policy: ClosestPolicy,
) -> Result<(String, f64)> {
    let base = base.to_uppercase();
    let target = target.to_uppercase();

    if base == target {
        return Ok((date.to_string(), 1.0));
    }

    if let Some((found_date, rate)) = find_direct(conn, date, &base, &target, policy)? {
        log::debug!(
            "Direct rate {} -> {} on {}: {}",
            base,
            target,
            found_date,
            rate
        );
        return Ok((found_date, rate));
    }

    // Cross-rate: compose the two EUR legs at the policy-resolved date.
    let eur_to_target = find_direct(conn, date, "EUR", &target, policy)?;
    let base_to_eur = find_direct(conn, date, &base, "EUR", policy)?;

    match (eur_to_target, base_to_eur) {
        (Some((target_date, eur_to_target)), Some((base_date, base_to_eur))) => {
            if target_date != base_date {
                log::warn!(
                    "Cross-rate legs for {} -> {} resolved to different dates ({} vs {})",
                    base,
                    target,
                    base_date,
                    target_date
                );
                return Err(EcbxError::NoRateAvailable {
                    base,
                    target,
                    date: date.to_string(),
                });
            }
            let rate = eur_to_target * base_to_eur;
            persist_cross_rate(conn, &target_date, &base, &target, rate)?;
            log::debug!(
                "Synthesized cross-rate {} -> {} on {}: {}",
                base,
                target,
                target_date,
                rate
            );
            Ok((target_date, rate))
        }
        _ => Err(EcbxError::NoRateAvailable {
            base,
            target,
            date: date.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Create an in-memory database for testing
    fn test_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn
    }

    fn observation(date: &str, currency: &str, rate: f64) -> RateObservation {
        RateObservation {
            date: date.to_string(),
            currency: currency.to_string(),
            rate,
        }
    }

    #[test]
    fn init_schema_seeds_currency_names() {
        let conn = test_db();
        let currencies = list_currencies(&conn).unwrap();
        assert!(currencies.len() >= 32);
        let eur = currencies.iter().find(|c| c.code == "EUR").unwrap();
        assert_eq!(eur.name, "Euro");
    }

    #[test]
    fn init_schema_is_idempotent() {
        let conn = test_db();
        init_schema(&conn).unwrap();
        let count = currency_count(&conn).unwrap();
        init_schema(&conn).unwrap();
        assert_eq!(currency_count(&conn).unwrap(), count);
    }

    #[test]
    fn ingest_writes_both_directions() {
        let mut conn = test_db();
        let result = ingest(&mut conn, &[observation("2024-03-15", "USD", 1.25)]).unwrap();
        assert_eq!(result.rates, 2);
        assert_eq!(result.dates, 1);

        let forward: f64 = conn
            .query_row(
                "SELECT rate FROM rates WHERE base_currency = 'EUR' AND target_currency = 'USD'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert!((forward - 1.25).abs() < 1e-12);

        let inverse: f64 = conn
            .query_row(
                "SELECT rate FROM rates WHERE base_currency = 'USD' AND target_currency = 'EUR'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert!((inverse - 0.8).abs() < 1e-12);
    }

    #[test]
    fn ingest_registers_unknown_currencies() {
        let mut conn = test_db();
        ingest(&mut conn, &[observation("2001-05-02", "SIT", 217.9)]).unwrap();
        let currencies = list_currencies(&conn).unwrap();
        let sit = currencies.iter().find(|c| c.code == "SIT").unwrap();
        assert_eq!(sit.name, "SIT");
    }

    #[test]
    fn ingest_skips_non_positive_rates() {
        let mut conn = test_db();
        let result = ingest(&mut conn, &[observation("2024-03-15", "USD", 0.0)]).unwrap();
        assert_eq!(result.rates, 0);
        assert!(!has_rates(&conn).unwrap());
    }

    #[test]
    fn ingest_sets_last_updated() {
        let mut conn = test_db();
        assert!(last_updated(&conn).unwrap().is_none());
        ingest(&mut conn, &[observation("2024-03-15", "USD", 1.25)]).unwrap();
        let stamp = last_updated(&conn).unwrap().unwrap();
        assert!(stamp.starts_with("20"));
    }

    #[test]
    fn reingest_is_idempotent() {
        let mut conn = test_db();
        let obs = [observation("2024-03-15", "USD", 1.25)];
        ingest(&mut conn, &obs).unwrap();
        ingest(&mut conn, &obs).unwrap();
        assert_eq!(rate_count(&conn).unwrap(), 2);
    }

    #[test]
    fn get_rate_identity_pair() {
        let mut conn = test_db();
        let (date, rate) = get_rate(&mut conn, "2024-03-15", "usd", "USD", ClosestPolicy::Before)
            .unwrap();
        assert_eq!(date, "2024-03-15");
        assert!((rate - 1.0).abs() < 1e-12);
    }

    #[test]
    fn get_rate_exact_date() {
        let mut conn = test_db();
        ingest(&mut conn, &[observation("2024-03-15", "USD", 1.0892)]).unwrap();
        let (date, rate) =
            get_rate(&mut conn, "2024-03-15", "EUR", "USD", ClosestPolicy::Before).unwrap();
        assert_eq!(date, "2024-03-15");
        assert!((rate - 1.0892).abs() < 1e-12);
    }

    #[test]
    fn get_rate_lowercase_input() {
        let mut conn = test_db();
        ingest(&mut conn, &[observation("2024-03-15", "USD", 1.0892)]).unwrap();
        let (_, rate) =
            get_rate(&mut conn, "2024-03-15", "eur", "usd", ClosestPolicy::Before).unwrap();
        assert!((rate - 1.0892).abs() < 1e-12);
    }

    #[test]
    fn policy_before_picks_latest_earlier_date() {
        let mut conn = test_db();
        ingest(
            &mut conn,
            &[
                observation("2024-03-14", "USD", 1.09),
                observation("2024-03-12", "USD", 1.08),
            ],
        )
        .unwrap();
        // 2024-03-15 has no row; before resolves to the 14th
        let (date, rate) =
            get_rate(&mut conn, "2024-03-15", "EUR", "USD", ClosestPolicy::Before).unwrap();
        assert_eq!(date, "2024-03-14");
        assert!((rate - 1.09).abs() < 1e-12);
    }

    #[test]
    fn policy_after_picks_earliest_later_date() {
        let mut conn = test_db();
        ingest(
            &mut conn,
            &[
                observation("2024-03-14", "USD", 1.09),
                observation("2024-03-18", "USD", 1.10),
            ],
        )
        .unwrap();
        let (date, rate) =
            get_rate(&mut conn, "2024-03-15", "EUR", "USD", ClosestPolicy::After).unwrap();
        assert_eq!(date, "2024-03-18");
        assert!((rate - 1.10).abs() < 1e-12);
    }

    #[test]
    fn policy_closest_picks_smallest_distance() {
        let mut conn = test_db();
        ingest(
            &mut conn,
            &[
                observation("2024-03-11", "USD", 1.08),
                observation("2024-03-18", "USD", 1.10),
            ],
        )
        .unwrap();
        // 2024-03-16 is two days from the 18th, five from the 11th
        let (date, _) =
            get_rate(&mut conn, "2024-03-16", "EUR", "USD", ClosestPolicy::Closest).unwrap();
        assert_eq!(date, "2024-03-18");
    }

    #[test]
    fn policy_before_fails_when_nothing_earlier() {
        let mut conn = test_db();
        ingest(&mut conn, &[observation("2024-03-14", "USD", 1.09)]).unwrap();
        let err = get_rate(&mut conn, "2024-03-10", "EUR", "USD", ClosestPolicy::Before)
            .unwrap_err();
        match err {
            EcbxError::NoRateAvailable { base, target, date } => {
                assert_eq!(base, "EUR");
                assert_eq!(target, "USD");
                assert_eq!(date, "2024-03-10");
            }
            other => panic!("expected NoRateAvailable, got {:?}", other),
        }
    }

    #[test]
    fn cross_rate_is_synthesized_and_persisted() {
        let mut conn = test_db();
        ingest(
            &mut conn,
            &[
                observation("2024-03-15", "USD", 1.25),
                observation("2024-03-15", "GBP", 0.8),
            ],
        )
        .unwrap();
        assert_eq!(rate_count(&conn).unwrap(), 4);

        // USD -> GBP = (EUR -> GBP) * (USD -> EUR) = 0.8 * (1/1.25) = 0.64
        let (date, rate) =
            get_rate(&mut conn, "2024-03-15", "USD", "GBP", ClosestPolicy::Before).unwrap();
        assert_eq!(date, "2024-03-15");
        assert!((rate - 0.64).abs() < 1e-9);

        // Both directions were persisted
        assert_eq!(rate_count(&conn).unwrap(), 6);
        let inverse: f64 = conn
            .query_row(
                "SELECT rate FROM rates WHERE base_currency = 'GBP' AND target_currency = 'USD'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert!((inverse - 1.0 / 0.64).abs() < 1e-9);

        // A second lookup hits the direct path and adds nothing
        let (_, again) =
            get_rate(&mut conn, "2024-03-15", "USD", "GBP", ClosestPolicy::Before).unwrap();
        assert!((again - rate).abs() < 1e-12);
        assert_eq!(rate_count(&conn).unwrap(), 6);
    }

    #[test]
    fn cross_rate_fails_on_mismatched_leg_dates() {
        let mut conn = test_db();
        // USD only on the 14th, GBP only on the 15th
        ingest(
            &mut conn,
            &[
                observation("2024-03-14", "USD", 1.25),
                observation("2024-03-15", "GBP", 0.8),
            ],
        )
        .unwrap();
        // EUR->GBP resolves to the 15th, USD->EUR to the 14th
        let err = get_rate(&mut conn, "2024-03-14", "USD", "GBP", ClosestPolicy::After)
            .unwrap_err();
        assert!(matches!(err, EcbxError::NoRateAvailable { .. }));
    }

    #[test]
    fn unknown_pair_errors() {
        let mut conn = test_db();
        ingest(&mut conn, &[observation("2024-03-15", "USD", 1.25)]).unwrap();
        assert!(
            get_rate(&mut conn, "2024-03-15", "EUR", "XXX", ClosestPolicy::Before).is_err()
        );
    }

    #[test]
    fn rates_on_lists_eur_quotes_sorted() {
        let mut conn = test_db();
        ingest(
            &mut conn,
            &[
                observation("2024-03-15", "USD", 1.25),
                observation("2024-03-15", "GBP", 0.8),
                observation("2024-03-14", "USD", 1.24),
            ],
        )
        .unwrap();
        let rates = rates_on(&conn, "2024-03-15").unwrap();
        assert_eq!(rates.len(), 2);
        assert_eq!(rates[0].0, "GBP");
        assert_eq!(rates[1].0, "USD");
    }

    #[test]
    fn resolve_date_honors_policy() {
        let mut conn = test_db();
        ingest(
            &mut conn,
            &[
                observation("2024-03-12", "USD", 1.24),
                observation("2024-03-15", "USD", 1.25),
            ],
        )
        .unwrap();
        assert_eq!(
            resolve_date(&conn, "2024-03-13", ClosestPolicy::Before).unwrap(),
            Some("2024-03-12".to_string())
        );
        assert_eq!(
            resolve_date(&conn, "2024-03-13", ClosestPolicy::After).unwrap(),
            Some("2024-03-15".to_string())
        );
        assert_eq!(
            resolve_date(&conn, "2024-03-14", ClosestPolicy::Closest).unwrap(),
            Some("2024-03-15".to_string())
        );
        assert_eq!(
            resolve_date(&conn, "2024-03-01", ClosestPolicy::Before).unwrap(),
            None
        );
    }

    #[test]
    fn date_range_and_dates() {
        let mut conn = test_db();
        assert!(date_range(&conn).unwrap().is_none());
        ingest(
            &mut conn,
            &[
                observation("2024-03-12", "USD", 1.24),
                observation("2024-03-15", "USD", 1.25),
            ],
        )
        .unwrap();
        let (min, max) = date_range(&conn).unwrap().unwrap();
        assert_eq!(min, "2024-03-12");
        assert_eq!(max, "2024-03-15");
        assert_eq!(list_dates(&conn).unwrap(), vec!["2024-03-12", "2024-03-15"]);
    }
}
