//! Client and exporter for the Kimai time tracking API.
//!
//! The `kimai-exporter` binary sums billable timesheets per customer and
//! prints the totals in the same row format as `harvest-exporter`, so the
//! downstream invoicing tools can consume either.

pub mod api;
pub mod dates;
pub mod error;
pub mod export;
pub mod models;

pub use api::KimaiApi;
pub use error::{KimaiError, Result};
