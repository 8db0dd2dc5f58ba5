//! Glue between billing exports and SevDesk.
//!
//! Two pipelines share this crate: turning a `harvest-exporter` JSON
//! report into a draft invoice, and importing Wise balance-statement
//! CSVs as check account transactions.

pub mod accounts;
pub mod error;
pub mod import_state;
pub mod invoice;
pub mod report;
pub mod statement;
pub mod token;

pub use error::{InvoicerError, Result};
