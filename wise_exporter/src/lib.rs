//! Client for the Wise API that survives SCA challenges.
//!
//! Wise answers sensitive reads with 403 plus an `x-2fa-approval` header
//! carrying a one-time token; the request must be retried after passing
//! the token's challenge (signature, PIN or a texted code). [`api`]
//! wraps that dance around the profile, balance and statement endpoints.

pub mod api;
pub mod dates;
pub mod error;
pub mod sca;

pub use error::{Result, WiseError};
