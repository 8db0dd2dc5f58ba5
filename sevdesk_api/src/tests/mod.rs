//! Unit tests for the SevDesk API client.

mod accounting_types_tests;
mod check_accounts_tests;
mod client_tests;
mod resolver_tests;
