//! Client and CLI for a Paperless-ngx document archive.
//!
//! Covers the day-to-day surface: tags, correspondents, document types,
//! document search and updates, uploads with task polling, and bulk tag
//! operations.

pub mod api;
pub mod error;
pub mod models;
pub mod tables;

pub use api::PaperlessApi;
pub use error::{PaperlessError, Result};
