//! Wire models for the Kimai API.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ProjectInfo {
    pub id: u64,
    pub name: String,
    pub customer: u64,
    #[serde(default)]
    pub visible: bool,
    #[serde(default)]
    pub billable: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserInfo {
    pub id: u64,
    pub username: String,
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub enabled: bool,
}

impl UserInfo {
    /// The alias when set, otherwise the username.
    pub fn display_name(&self) -> &str {
        match self.alias.as_deref() {
            Some(alias) if !alias.is_empty() => alias,
            _ => &self.username,
        }
    }

    /// Whether `name` matches the username or the alias.
    pub fn matches(&self, name: &str) -> bool {
        self.username == name || self.alias.as_deref() == Some(name)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CustomerInfo {
    pub id: u64,
    pub name: String,
    pub currency: String,
    #[serde(default)]
    pub visible: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ActivityInfo {
    pub id: u64,
    pub name: String,
}

/// A timesheet as `/api/timesheets` lists it. `duration` is in seconds;
/// running entries have no `end` yet.
#[derive(Debug, Clone, Deserialize)]
pub struct TimeEntry {
    pub id: u64,
    pub begin: String,
    #[serde(default)]
    pub end: Option<String>,
    #[serde(default)]
    pub duration: i64,
    pub user: u64,
    pub project: u64,
    pub activity: u64,
    #[serde(default)]
    pub billable: bool,
}

/// A single timesheet fetched by id, which additionally carries the rates.
#[derive(Debug, Clone, Deserialize)]
pub struct TimeEntryFull {
    pub id: u64,
    #[serde(default)]
    pub duration: i64,
    pub user: u64,
    pub project: u64,
    pub activity: u64,
    #[serde(default)]
    pub rate: f64,
    #[serde(default, rename = "internalRate")]
    pub internal_rate: f64,
    #[serde(default, rename = "hourlyRate")]
    pub hourly_rate: Option<f64>,
    #[serde(default)]
    pub billable: bool,
}

impl TimeEntryFull {
    /// The hourly rate, derived from the entry total when Kimai does not
    /// report one directly.
    pub fn effective_hourly_rate(&self) -> Option<f64> {
        match self.hourly_rate {
            Some(rate) if rate > 0.0 => Some(rate),
            _ if self.rate > 0.0 && self.duration > 0 => {
                Some(self.rate / (self.duration as f64 / 3600.0))
            }
            _ => None,
        }
    }
}
