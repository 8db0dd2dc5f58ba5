//! ecbx - ECB exchange rate store
//!
//! Downloads the European Central Bank's EUR reference-rate feed into a
//! SQLite database and answers conversion queries against it, including
//! cross-rates between non-EUR currencies.

pub mod dates;
pub mod ecb;
pub mod error;
pub mod store;

pub use ecb::{EcbFeed, RateObservation};
pub use error::{EcbxError, Result};
pub use store::ClosestPolicy;
