//! Currency to check-account mapping for the statement importer.

use std::collections::HashMap;

use log::info;
use sevdesk_api::SevdeskApi;

use crate::error::{InvoicerError, Result};

/// The check accounts holding Wise balances, one per currency. Accounts
/// are named `Wise ({currency}, {account_id})` so several Wise accounts
/// can live in the same SevDesk instance.
#[derive(Debug, Default)]
pub struct AccountRegistry {
    /// Currency to Wise account id.
    mappings: HashMap<String, String>,
    /// Currency to SevDesk check account id, filled lazily.
    resolved: HashMap<String, u64>,
}

impl AccountRegistry {
    pub fn add(&mut self, currency: &str, account_id: &str) -> Result<()> {
        let currency = currency.to_uppercase();
        if self.mappings.contains_key(&currency) {
            return Err(InvoicerError::DuplicateCurrency(currency));
        }
        self.mappings.insert(currency, account_id.to_string());
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    pub fn account_name(&self, currency: &str) -> Result<String> {
        let account_id = self
            .mappings
            .get(currency)
            .ok_or_else(|| InvoicerError::UnmappedCurrency(currency.to_string()))?;
        Ok(format!("Wise ({currency}, {account_id})"))
    }

    /// Check account id for `currency` when the account already exists.
    pub async fn lookup(&mut self, api: &SevdeskApi, currency: &str) -> Result<Option<u64>> {
        if let Some(id) = self.resolved.get(currency) {
            return Ok(Some(*id));
        }
        let name = self.account_name(currency)?;
        match api.find_check_account(&name).await? {
            Some(account) => {
                self.resolved.insert(currency.to_string(), account.id);
                Ok(Some(account.id))
            }
            None => Ok(None),
        }
    }

    /// Check account id for `currency`, creating the clearing account on
    /// first use.
    pub async fn resolve(&mut self, api: &SevdeskApi, currency: &str) -> Result<u64> {
        if let Some(id) = self.lookup(api, currency).await? {
            return Ok(id);
        }
        let name = self.account_name(currency)?;
        info!("Check account {name:?} is missing, creating it");
        let account = api.create_clearing_account(&name, currency).await?;
        self.resolved.insert(currency.to_string(), account.id);
        Ok(account.id)
    }
}
