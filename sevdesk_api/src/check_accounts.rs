//! Check accounts: bank accounts, clearing accounts, cash registers.

use log::{debug, info};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::client::ObjectResponse;
use crate::error::{Result, SevdeskError};
use crate::models::{opt_i64_from_any, u64_from_any};
use crate::SevdeskApi;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckAccount {
    #[serde(deserialize_with = "u64_from_any")]
    pub id: u64,
    pub name: String,
    /// "online" for bank accounts, "offline" for clearing accounts,
    /// "register" for cash registers.
    #[serde(rename = "type", default)]
    pub account_type: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default, deserialize_with = "opt_i64_from_any")]
    pub status: Option<i64>,
}

impl CheckAccount {
    pub fn is_register(&self) -> bool {
        self.account_type.as_deref() == Some("register")
    }
}

impl SevdeskApi {
    pub async fn get_check_accounts(&self) -> Result<Vec<CheckAccount>> {
        let accounts: Vec<CheckAccount> = self.get_list("CheckAccount", &[]).await?;
        debug!("Fetched {} check accounts", accounts.len());
        Ok(accounts)
    }

    pub async fn get_check_account(&self, id: u64) -> Result<CheckAccount> {
        self.get_single(&format!("CheckAccount/{id}"), &[]).await
    }

    /// Account with exactly this name, ignoring cash registers.
    pub async fn find_check_account(&self, name: &str) -> Result<Option<CheckAccount>> {
        let accounts = self.get_check_accounts().await?;
        Ok(accounts
            .into_iter()
            .filter(|account| !account.is_register())
            .find(|account| account.name == name))
    }

    /// Creates an offline clearing account.
    pub async fn create_clearing_account(
        &self,
        name: &str,
        currency: &str,
    ) -> Result<CheckAccount> {
        let body = json!({
            "name": name,
            "type": "offline",
            "currency": currency,
            "status": 100,
        });
        let account: CheckAccount = self.post_json("CheckAccount", &body).await?;
        info!("Created clearing account {name:?} with id {}", account.id);
        Ok(account)
    }

    /// Booked balance of the account at the end of `date` (YYYY-MM-DD).
    pub async fn get_balance_at_date(&self, id: u64, date: &str) -> Result<f64> {
        let url = format!("{}/CheckAccount/{id}/getBalanceAtDate", self.base_url);
        debug!("Fetching {url} for {date}");
        let response = self
            .request(Method::GET, &url)
            .query(&[("date", date)])
            .send()
            .await?;
        let body = self.read_body(response, &url).await?;
        let parsed: ObjectResponse<serde_json::Value> = serde_json::from_str(&body)?;
        match parsed.objects {
            serde_json::Value::Number(number) => number.as_f64().ok_or_else(|| {
                SevdeskError::UnexpectedResponse(format!("balance out of range: {number}"))
            }),
            serde_json::Value::String(text) => text.trim().parse().map_err(|_| {
                SevdeskError::UnexpectedResponse(format!("balance was not a number: {text:?}"))
            }),
            other => Err(SevdeskError::UnexpectedResponse(format!(
                "balance was not a number: {other}"
            ))),
        }
    }
}
