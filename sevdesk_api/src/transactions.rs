//! Check account transactions.

use log::{debug, info};
use serde::{Deserialize, Serialize, Serializer};

use crate::error::Result;
use crate::models::{f64_from_any, opt_i64_from_any, u64_from_any, ObjectRef};
use crate::SevdeskApi;

/// Lifecycle states of a check account transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionStatus {
    Created,
    Linked,
    Private,
    AutoBooked,
    Booked,
}

impl TransactionStatus {
    pub fn code(self) -> i64 {
        match self {
            TransactionStatus::Created => 100,
            TransactionStatus::Linked => 200,
            TransactionStatus::Private => 300,
            TransactionStatus::AutoBooked => 350,
            TransactionStatus::Booked => 400,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            100 => Some(TransactionStatus::Created),
            200 => Some(TransactionStatus::Linked),
            300 => Some(TransactionStatus::Private),
            350 => Some(TransactionStatus::AutoBooked),
            400 => Some(TransactionStatus::Booked),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TransactionStatus::Created => "Created",
            TransactionStatus::Linked => "Linked",
            TransactionStatus::Private => "Private",
            TransactionStatus::AutoBooked => "AutoBooked",
            TransactionStatus::Booked => "Booked",
        }
    }
}

impl std::str::FromStr for TransactionStatus {
    type Err = String;

    /// Accepts status names ("created") and raw codes ("100").
    fn from_str(value: &str) -> std::result::Result<Self, String> {
        match value.to_lowercase().as_str() {
            "created" => Ok(TransactionStatus::Created),
            "linked" => Ok(TransactionStatus::Linked),
            "private" => Ok(TransactionStatus::Private),
            "autobooked" | "auto_booked" | "auto-booked" => Ok(TransactionStatus::AutoBooked),
            "booked" => Ok(TransactionStatus::Booked),
            other => other
                .parse::<i64>()
                .ok()
                .and_then(TransactionStatus::from_code)
                .ok_or_else(|| {
                    format!(
                        "Invalid status '{value}'. Valid options: Created (100), Linked (200), \
                         Private (300), AutoBooked (350), Booked (400)"
                    )
                }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(deserialize_with = "u64_from_any")]
    pub id: u64,
    #[serde(rename = "valueDate", default)]
    pub value_date: Option<String>,
    #[serde(rename = "entryDate", default)]
    pub entry_date: Option<String>,
    #[serde(deserialize_with = "f64_from_any")]
    pub amount: f64,
    #[serde(default, deserialize_with = "opt_i64_from_any")]
    pub status: Option<i64>,
    #[serde(rename = "payeePayerName", default)]
    pub payee_payer_name: Option<String>,
    #[serde(rename = "paymtPurpose", default)]
    pub paymt_purpose: Option<String>,
    #[serde(rename = "payeePayerAcctNo", default)]
    pub payee_payer_acct_no: Option<String>,
    #[serde(rename = "payeePayerBankCode", default)]
    pub payee_payer_bank_code: Option<String>,
    #[serde(rename = "checkAccount", default)]
    pub check_account: Option<ObjectRef>,
}

/// Filters for [`SevdeskApi::get_transactions`]. Dates are unix
/// timestamps.
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub check_account: Option<u64>,
    pub status: Option<TransactionStatus>,
    pub start_date: Option<i64>,
    pub end_date: Option<i64>,
    pub paymt_purpose: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl TransactionFilter {
    fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("limit", self.limit.unwrap_or(100).to_string()),
            ("offset", self.offset.unwrap_or(0).to_string()),
            ("countAll", "true".to_string()),
        ];
        if let Some(account) = self.check_account {
            query.push(("checkAccount[id]", account.to_string()));
            query.push(("checkAccount[objectName]", "CheckAccount".to_string()));
        }
        if let Some(status) = self.status {
            query.push(("status", status.code().to_string()));
        }
        if let Some(start) = self.start_date {
            query.push(("startDate", start.to_string()));
        }
        if let Some(end) = self.end_date {
            query.push(("endDate", end.to_string()));
        }
        if let Some(purpose) = &self.paymt_purpose {
            query.push(("paymtPurpose", purpose.clone()));
        }
        query
    }
}

/// Payload for creating a transaction. `value_date` and `entry_date`
/// use the `%Y-%m-%dT%H:%M:%S+00:00` format.
#[derive(Debug, Clone, Serialize)]
pub struct NewTransaction {
    #[serde(rename = "checkAccount", serialize_with = "as_check_account_ref")]
    pub check_account: u64,
    #[serde(rename = "valueDate")]
    pub value_date: String,
    pub amount: f64,
    #[serde(serialize_with = "as_status_code")]
    pub status: TransactionStatus,
    #[serde(rename = "payeePayerName")]
    pub payee_payer_name: String,
    #[serde(rename = "entryDate", skip_serializing_if = "Option::is_none")]
    pub entry_date: Option<String>,
    #[serde(rename = "paymtPurpose", skip_serializing_if = "Option::is_none")]
    pub paymt_purpose: Option<String>,
    #[serde(rename = "payeePayerAcctNo", skip_serializing_if = "Option::is_none")]
    pub payee_payer_acct_no: Option<String>,
    #[serde(rename = "payeePayerBankCode", skip_serializing_if = "Option::is_none")]
    pub payee_payer_bank_code: Option<String>,
}

/// Partial update; only set fields are sent.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TransactionUpdate {
    #[serde(rename = "valueDate", skip_serializing_if = "Option::is_none")]
    pub value_date: Option<String>,
    #[serde(rename = "entryDate", skip_serializing_if = "Option::is_none")]
    pub entry_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(rename = "payeePayerName", skip_serializing_if = "Option::is_none")]
    pub payee_payer_name: Option<String>,
    #[serde(rename = "paymtPurpose", skip_serializing_if = "Option::is_none")]
    pub paymt_purpose: Option<String>,
    #[serde(rename = "payeePayerAcctNo", skip_serializing_if = "Option::is_none")]
    pub payee_payer_acct_no: Option<String>,
    #[serde(rename = "payeePayerBankCode", skip_serializing_if = "Option::is_none")]
    pub payee_payer_bank_code: Option<String>,
}

fn as_check_account_ref<S: Serializer>(
    id: &u64,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    ObjectRef::new(*id, "CheckAccount").serialize(serializer)
}

fn as_status_code<S: Serializer>(
    status: &TransactionStatus,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_i64(status.code())
}

impl SevdeskApi {
    pub async fn get_transactions(&self, filter: &TransactionFilter) -> Result<Vec<Transaction>> {
        let query = filter.to_query();
        let transactions: Vec<Transaction> =
            self.get_list("CheckAccountTransaction", &query).await?;
        debug!("Fetched {} transactions", transactions.len());
        Ok(transactions)
    }

    pub async fn get_transaction(&self, id: u64) -> Result<Transaction> {
        self.get_single(&format!("CheckAccountTransaction/{id}"), &[])
            .await
    }

    pub async fn create_transaction(&self, new: &NewTransaction) -> Result<Transaction> {
        let transaction: Transaction = self.post_json("CheckAccountTransaction", new).await?;
        info!(
            "Created transaction {} over {} on {}",
            transaction.id, new.amount, new.value_date
        );
        Ok(transaction)
    }

    pub async fn update_transaction(
        &self,
        id: u64,
        update: &TransactionUpdate,
    ) -> Result<Transaction> {
        let transaction: Transaction = self
            .put_json(&format!("CheckAccountTransaction/{id}"), update)
            .await?;
        info!("Updated transaction {id}");
        Ok(transaction)
    }

    pub async fn delete_transaction(&self, id: u64) -> Result<()> {
        self.delete(&format!("CheckAccountTransaction/{id}")).await?;
        info!("Deleted transaction {id}");
        Ok(())
    }
}
