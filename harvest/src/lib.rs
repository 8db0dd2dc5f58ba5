//! Client and tooling for the Harvest time tracking API.
//!
//! The crate ships two binaries: `harvest-rounder`, which rounds tracked
//! time up to a billing increment, and `harvest-exporter`, which sums the
//! tracked time per user and task and converts the totals into a target
//! currency using the rate store maintained by `ecbx`.

pub mod api;
pub mod dates;
pub mod error;
pub mod export;
pub mod models;
pub mod rounding;

pub use api::HarvestApi;
pub use error::{HarvestError, Result};
