//! SKR booking account (AccountDatev) lookup.
//!
//! The full index runs to a few thousand rows, so it is paged in once
//! per client and kept in memory.

use std::collections::HashMap;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SevdeskError};
use crate::models::{string_from_any, u64_from_any};
use crate::SevdeskApi;

const PAGE_SIZE: u64 = 1000;

/// One SKR booking account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkrAccount {
    #[serde(deserialize_with = "u64_from_any")]
    pub id: u64,
    /// SKR account number, e.g. "5400".
    #[serde(deserialize_with = "string_from_any")]
    pub number: String,
    pub name: String,
}

#[derive(Debug, Default)]
pub(crate) struct SkrCache {
    accounts: HashMap<String, SkrAccount>,
    loaded: bool,
}

impl SevdeskApi {
    async fn load_accounting_types(&self) -> Result<()> {
        {
            let cache = self.skr_cache.read().await;
            if cache.loaded {
                return Ok(());
            }
        }

        info!("Fetching the AccountDatev index");
        let mut accounts = HashMap::new();
        let mut offset = 0u64;
        loop {
            let query = [
                ("limit", PAGE_SIZE.to_string()),
                ("offset", offset.to_string()),
                ("countAll", "true".to_string()),
            ];
            let (page, total): (Vec<SkrAccount>, Option<u64>) =
                self.get_page("AccountDatev", &query).await?;
            let fetched = page.len() as u64;
            debug!("Fetched {fetched} booking accounts at offset {offset}");
            for account in page {
                accounts.insert(account.number.clone(), account);
            }
            offset += fetched;
            // Full pages without a count keep paging until a short one.
            let more = match total {
                Some(total) => offset < total,
                None => fetched == PAGE_SIZE,
            };
            if fetched == 0 || !more {
                break;
            }
        }
        info!("Cached {} booking accounts", accounts.len());

        let mut cache = self.skr_cache.write().await;
        cache.accounts = accounts;
        cache.loaded = true;
        Ok(())
    }

    /// Booking account for an SKR number.
    pub async fn resolve_skr(&self, number: &str) -> Result<SkrAccount> {
        self.load_accounting_types().await?;
        let cache = self.skr_cache.read().await;
        cache
            .accounts
            .get(number)
            .cloned()
            .ok_or_else(|| SevdeskError::UnknownSkr(number.to_string()))
    }

    /// All booking accounts, sorted by number.
    pub async fn accounting_types(&self) -> Result<Vec<SkrAccount>> {
        self.load_accounting_types().await?;
        let cache = self.skr_cache.read().await;
        let mut accounts: Vec<SkrAccount> = cache.accounts.values().cloned().collect();
        accounts.sort_by(|a, b| a.number.cmp(&b.number));
        Ok(accounts)
    }
}
