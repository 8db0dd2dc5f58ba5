//! Client for the SevDesk bookkeeping REST API.
//!
//! Covers the slices of the API the companion tools need: contacts,
//! check accounts and their transactions, invoices, vouchers, and the
//! lookup collections behind them (SKR booking accounts, units, tax
//! rules). Lookup collections are fetched once and cached per client.

use std::sync::Arc;

use log::debug;
use reqwest::Client;
use tokio::sync::RwLock;

mod accounting_types;
mod check_accounts;
mod client;
mod contacts;
mod error;
mod invoices;
mod models;
mod resolver;
mod transactions;
mod vouchers;

pub use accounting_types::SkrAccount;
pub use check_accounts::CheckAccount;
pub use contacts::{Contact, ContactCategory, SevUser};
pub use error::{Result, SevdeskError};
pub use invoices::{
    Invoice, InvoicePosition, InvoiceStatus, NewInvoice, TAX_RULE_NOT_TAXABLE_DOMESTIC,
};
pub use models::{ObjectRef, Unity};
pub use resolver::ResolvedObject;
pub use transactions::{
    NewTransaction, Transaction, TransactionFilter, TransactionStatus, TransactionUpdate,
};
pub use vouchers::{
    CreditDebit, Document, NewVoucher, NewVoucherPosition, TaxType, Voucher, VoucherFilter,
    VoucherPosition, VoucherStatus, VoucherType,
};

use accounting_types::SkrCache;
use resolver::ObjectCache;

/// Production endpoint.
pub const DEFAULT_BASE_URL: &str = "https://my.sevdesk.de/api/v1";

/// SevDesk API client.
pub struct SevdeskApi {
    pub(crate) client: Client,
    pub(crate) token: String,
    pub base_url: String,
    pub(crate) skr_cache: Arc<RwLock<SkrCache>>,
    pub(crate) object_cache: Arc<RwLock<ObjectCache>>,
}

impl SevdeskApi {
    /// Client against the production API.
    pub fn new(token: String) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL.to_string(), token)
    }

    pub fn with_base_url(base_url: String, token: String) -> Self {
        debug!("Creating SevDesk API client for {base_url}");
        Self {
            client: Client::new(),
            token,
            base_url: base_url.trim_end_matches('/').to_string(),
            skr_cache: Arc::new(RwLock::new(SkrCache::default())),
            object_cache: Arc::new(RwLock::new(ObjectCache::default())),
        }
    }
}

#[cfg(test)]
#[path = "tests/mod.rs"]
mod tests;
