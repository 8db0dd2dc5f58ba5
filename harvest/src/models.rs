//! Wire models for the Harvest v2 API.
//!
//! Only the fields the tools act on are deserialized; everything else in
//! the responses is ignored.

use serde::Deserialize;

/// The authenticated user as returned by `/users/me`.
#[derive(Debug, Clone, Deserialize)]
pub struct CurrentUser {
    pub id: u64,
    pub first_name: String,
    pub last_name: String,
}

impl CurrentUser {
    /// Name in the form Harvest uses on time entries.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// A named object reference embedded in a time entry.
#[derive(Debug, Clone, Deserialize)]
pub struct Reference {
    pub id: u64,
    pub name: String,
}

/// The client a time entry is billed to.
#[derive(Debug, Clone, Deserialize)]
pub struct Client {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserAssignment {
    #[serde(default)]
    pub hourly_rate: Option<f64>,
}

/// One tracked time entry.
#[derive(Debug, Clone, Deserialize)]
pub struct TimeEntry {
    pub id: u64,
    pub spent_date: String,
    pub hours: f64,
    #[serde(default)]
    pub rounded_hours: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub is_locked: bool,
    pub user: Reference,
    pub client: Client,
    pub project: Reference,
    pub task: Reference,
    #[serde(default)]
    pub user_assignment: Option<UserAssignment>,
    #[serde(default)]
    pub billable: bool,
    #[serde(default)]
    pub billable_rate: Option<f64>,
}

impl TimeEntry {
    /// Hourly rate the entry is billed at, if any.
    ///
    /// Harvest fills `billable_rate` for billable entries; the rate from
    /// the user assignment is the fallback for older projects.
    pub fn hourly_rate(&self) -> Option<f64> {
        self.billable_rate
            .or_else(|| self.user_assignment.as_ref().and_then(|ua| ua.hourly_rate))
            .filter(|rate| *rate > 0.0)
    }

    /// Hours after rounding, falling back to the raw hours.
    pub fn effective_hours(&self) -> f64 {
        self.rounded_hours.unwrap_or(self.hours)
    }
}

/// One page of `/time_entries`.
#[derive(Debug, Deserialize)]
pub struct TimeEntriesPage {
    pub time_entries: Vec<TimeEntry>,
    #[serde(default)]
    pub links: PageLinks,
}

#[derive(Debug, Default, Deserialize)]
pub struct PageLinks {
    #[serde(default)]
    pub next: Option<String>,
}
