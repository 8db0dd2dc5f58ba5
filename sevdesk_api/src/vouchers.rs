//! Vouchers (receipts) and their supporting documents.

use log::{debug, info};
use reqwest::{multipart, Method};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::client::ObjectResponse;
use crate::error::{Result, SevdeskError};
use crate::models::{
    opt_f64_from_any, opt_i64_from_any, opt_u64_from_any, u64_from_any, ObjectRef, Unity,
};
use crate::SevdeskApi;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoucherStatus {
    Draft,
    Unpaid,
    Paid,
}

impl VoucherStatus {
    pub fn code(self) -> i64 {
        match self {
            VoucherStatus::Draft => 50,
            VoucherStatus::Unpaid => 100,
            VoucherStatus::Paid => 1000,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            50 => Some(VoucherStatus::Draft),
            100 => Some(VoucherStatus::Unpaid),
            1000 => Some(VoucherStatus::Paid),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            VoucherStatus::Draft => "Draft",
            VoucherStatus::Unpaid => "Unpaid",
            VoucherStatus::Paid => "Paid",
        }
    }
}

impl std::str::FromStr for VoucherStatus {
    type Err = String;

    /// Accepts status names ("draft") and raw codes ("50").
    fn from_str(value: &str) -> std::result::Result<Self, String> {
        match value.to_lowercase().as_str() {
            "draft" => Ok(VoucherStatus::Draft),
            "unpaid" | "open" => Ok(VoucherStatus::Unpaid),
            "paid" => Ok(VoucherStatus::Paid),
            other => other
                .parse::<i64>()
                .ok()
                .and_then(VoucherStatus::from_code)
                .ok_or_else(|| {
                    format!(
                        "Invalid status '{value}'. Valid options: Draft (50), Unpaid (100), \
                         Paid (1000)"
                    )
                }),
        }
    }
}

/// Money direction of a voucher: "C" for credit, "D" for debit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreditDebit {
    Credit,
    Debit,
}

impl CreditDebit {
    pub fn as_str(self) -> &'static str {
        match self {
            CreditDebit::Credit => "C",
            CreditDebit::Debit => "D",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CreditDebit::Credit => "Credit",
            CreditDebit::Debit => "Debit",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoucherType {
    Voucher,
    RecurringVoucher,
}

impl VoucherType {
    pub fn as_str(self) -> &'static str {
        match self {
            VoucherType::Voucher => "VOU",
            VoucherType::RecurringVoucher => "RV",
        }
    }
}

/// Tax regime of a voucher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaxType {
    Default,
    Eu,
    NotEu,
    Custom,
    SmallBusiness,
}

impl TaxType {
    pub fn as_str(self) -> &'static str {
        match self {
            TaxType::Default => "default",
            TaxType::Eu => "eu",
            TaxType::NotEu => "noteu",
            TaxType::Custom => "custom",
            TaxType::SmallBusiness => "ss",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Voucher {
    #[serde(deserialize_with = "u64_from_any")]
    pub id: u64,
    #[serde(rename = "voucherDate", default)]
    pub voucher_date: Option<String>,
    #[serde(rename = "payDate", default)]
    pub pay_date: Option<String>,
    #[serde(default, deserialize_with = "opt_i64_from_any")]
    pub status: Option<i64>,
    #[serde(rename = "creditDebit", default)]
    pub credit_debit: Option<String>,
    #[serde(rename = "voucherType", default)]
    pub voucher_type: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "supplierName", default)]
    pub supplier_name: Option<String>,
    #[serde(default)]
    pub supplier: Option<ObjectRef>,
    #[serde(rename = "sumNet", default, deserialize_with = "opt_f64_from_any")]
    pub sum_net: Option<f64>,
    #[serde(rename = "sumTax", default, deserialize_with = "opt_f64_from_any")]
    pub sum_tax: Option<f64>,
    #[serde(rename = "sumGross", default, deserialize_with = "opt_f64_from_any")]
    pub sum_gross: Option<f64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub document: Option<ObjectRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoucherPosition {
    #[serde(deserialize_with = "u64_from_any")]
    pub id: u64,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(rename = "taxRate", default, deserialize_with = "opt_f64_from_any")]
    pub tax_rate: Option<f64>,
    #[serde(rename = "sumNet", default, deserialize_with = "opt_f64_from_any")]
    pub sum_net: Option<f64>,
    #[serde(rename = "sumTax", default, deserialize_with = "opt_f64_from_any")]
    pub sum_tax: Option<f64>,
    #[serde(rename = "sumGross", default, deserialize_with = "opt_f64_from_any")]
    pub sum_gross: Option<f64>,
    #[serde(rename = "accountDatev", default)]
    pub account_datev: Option<ObjectRef>,
}

/// Filters for [`SevdeskApi::get_vouchers`]. Dates are unix timestamps.
#[derive(Debug, Clone, Default)]
pub struct VoucherFilter {
    pub status: Option<VoucherStatus>,
    pub credit_debit: Option<CreditDebit>,
    pub start_date: Option<i64>,
    pub end_date: Option<i64>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl VoucherFilter {
    fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("limit", self.limit.unwrap_or(100).to_string()),
            ("offset", self.offset.unwrap_or(0).to_string()),
        ];
        if let Some(status) = self.status {
            query.push(("status", status.code().to_string()));
        }
        if let Some(credit_debit) = self.credit_debit {
            query.push(("creditDebit", credit_debit.as_str().to_string()));
        }
        if let Some(start) = self.start_date {
            query.push(("startDate", start.to_string()));
        }
        if let Some(end) = self.end_date {
            query.push(("endDate", end.to_string()));
        }
        query
    }
}

/// Payload for the saveVoucher factory. `voucher_date` uses `%d.%m.%Y`,
/// `pay_date` the `%Y-%m-%dT%H:%M:%S+00:00` format.
#[derive(Debug, Clone)]
pub struct NewVoucher {
    pub credit_debit: CreditDebit,
    pub tax_type: TaxType,
    pub voucher_type: VoucherType,
    pub status: VoucherStatus,
    pub voucher_date: String,
    pub currency: Option<String>,
    pub supplier: Option<u64>,
    pub supplier_name: Option<String>,
    pub description: Option<String>,
    pub pay_date: Option<String>,
    pub tax_rule: Option<u64>,
}

impl NewVoucher {
    pub(crate) fn to_payload(&self) -> Value {
        let mut voucher = json!({
            "objectName": "Voucher",
            "mapAll": true,
            "creditDebit": self.credit_debit.as_str(),
            "taxType": self.tax_type.as_str(),
            "voucherType": self.voucher_type.as_str(),
            "status": self.status.code(),
            "voucherDate": self.voucher_date,
        });
        if let Some(currency) = &self.currency {
            voucher["currency"] = json!(currency);
        }
        if let Some(supplier) = self.supplier {
            voucher["supplier"] = json!({ "id": supplier, "objectName": "Contact" });
        }
        if let Some(name) = &self.supplier_name {
            voucher["supplierName"] = json!(name);
        }
        if let Some(description) = &self.description {
            voucher["description"] = json!(description);
        }
        if let Some(pay_date) = &self.pay_date {
            voucher["payDate"] = json!(pay_date);
        }
        if let Some(rule) = self.tax_rule {
            voucher["taxRule"] = json!({ "id": rule, "objectName": "TaxRule" });
        }
        voucher
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// One voucher line. `price` is a unit price, net or gross depending
/// on `net`; the sums are derived from it.
#[derive(Debug, Clone)]
pub struct NewVoucherPosition {
    pub name: String,
    pub quantity: f64,
    pub price: f64,
    pub tax_rate: f64,
    pub net: bool,
    pub unity: Unity,
    pub text: Option<String>,
    /// AccountDatev id of the SKR booking account.
    pub accounting_type: Option<u64>,
    pub is_asset: bool,
}

impl NewVoucherPosition {
    pub(crate) fn to_payload(&self, position_number: usize) -> Value {
        let total = self.quantity * self.price;
        let (sum_net, sum_tax, sum_gross) = if self.net {
            let net = round2(total);
            let tax = round2(net * self.tax_rate / 100.0);
            (net, tax, round2(net + tax))
        } else {
            let gross = round2(total);
            let net = round2(gross / (1.0 + self.tax_rate / 100.0));
            (net, round2(gross - net), gross)
        };
        let mut position = json!({
            "objectName": "VoucherPos",
            "mapAll": true,
            "comment": self.name,
            "quantity": self.quantity,
            "price": self.price,
            "taxRate": self.tax_rate,
            "net": self.net,
            "unity": { "id": self.unity.id(), "objectName": "Unity" },
            "sumNet": sum_net,
            "sumTax": sum_tax,
            "sumGross": sum_gross,
            "positionNumber": position_number,
        });
        if let Some(text) = &self.text {
            position["text"] = json!(text);
        }
        if let Some(account) = self.accounting_type {
            position["accountDatev"] = json!({ "id": account, "objectName": "AccountDatev" });
            position["isAsset"] = json!(self.is_asset);
        }
        position
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    #[serde(deserialize_with = "u64_from_any")]
    pub id: u64,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub extension: Option<String>,
    #[serde(default, deserialize_with = "opt_u64_from_any")]
    pub filesize: Option<u64>,
}

impl SevdeskApi {
    pub async fn get_vouchers(&self, filter: &VoucherFilter) -> Result<Vec<Voucher>> {
        let query = filter.to_query();
        let vouchers: Vec<Voucher> = self.get_list("Voucher", &query).await?;
        debug!("Fetched {} vouchers", vouchers.len());
        Ok(vouchers)
    }

    pub async fn get_voucher(&self, id: u64) -> Result<Voucher> {
        self.get_single(&format!("Voucher/{id}"), &[]).await
    }

    pub async fn get_voucher_positions(&self, voucher_id: u64) -> Result<Vec<VoucherPosition>> {
        self.get_list(
            "VoucherPos",
            &[
                ("voucher[id]", voucher_id.to_string()),
                ("voucher[objectName]", "Voucher".to_string()),
            ],
        )
        .await
    }

    /// Uploads a supporting file, returning the internal filename to
    /// pass to [`SevdeskApi::create_voucher`].
    pub async fn upload_voucher_file(&self, file_name: &str, bytes: Vec<u8>) -> Result<String> {
        let url = format!("{}/Voucher/Factory/uploadTempFile", self.base_url);
        info!("Uploading {file_name} ({} bytes)", bytes.len());
        let part = multipart::Part::bytes(bytes).file_name(file_name.to_string());
        let form = multipart::Form::new().part("file", part);
        let response = self
            .request(Method::POST, &url)
            .multipart(form)
            .send()
            .await?;
        let body = self.read_body(response, &url).await?;
        let parsed: ObjectResponse<Value> = serde_json::from_str(&body)?;
        parsed
            .objects
            .get("filename")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                SevdeskError::UnexpectedResponse(
                    "uploadTempFile response carried no filename".to_string(),
                )
            })
    }

    /// Creates a voucher together with its positions in one call,
    /// optionally attached to a previously uploaded file.
    pub async fn create_voucher(
        &self,
        voucher: &NewVoucher,
        positions: &[NewVoucherPosition],
        filename: Option<&str>,
    ) -> Result<Voucher> {
        let position_payloads: Vec<Value> = positions
            .iter()
            .enumerate()
            .map(|(index, position)| position.to_payload(index + 1))
            .collect();
        let mut body = json!({
            "voucher": voucher.to_payload(),
            "voucherPosDelete": null,
            "voucherPosSave": position_payloads,
        });
        if let Some(filename) = filename {
            body["filename"] = json!(filename);
        }
        debug!("Creating voucher with {} positions", positions.len());
        let objects: Value = self.post_json("Voucher/Factory/saveVoucher", &body).await?;
        let created = objects.get("voucher").cloned().ok_or_else(|| {
            SevdeskError::UnexpectedResponse("saveVoucher response carried no voucher".to_string())
        })?;
        let created: Voucher = serde_json::from_value(created)?;
        info!("Created voucher {}", created.id);
        Ok(created)
    }

    /// Books a voucher against a check account transaction. Without an
    /// explicit amount SevDesk books the full voucher sum.
    pub async fn book_voucher(
        &self,
        voucher_id: u64,
        transaction_id: u64,
        amount: Option<f64>,
    ) -> Result<()> {
        let mut body = json!({
            "checkAccountTransaction": {
                "id": transaction_id,
                "objectName": "CheckAccountTransaction",
            },
        });
        if let Some(amount) = amount {
            body["amount"] = json!(amount);
        }
        let url = format!("{}/Voucher/{voucher_id}/bookAmount", self.base_url);
        debug!("POST {url}");
        let response = self
            .request(Method::POST, &url)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;
        self.read_body(response, &url).await?;
        info!("Booked voucher {voucher_id} against transaction {transaction_id}");
        Ok(())
    }

    pub async fn get_document(&self, id: u64) -> Result<Document> {
        self.get_single(&format!("Document/{id}"), &[]).await
    }

    /// Raw content of a stored document; SevDesk delivers it base64
    /// encoded.
    pub async fn download_document(&self, id: u64) -> Result<Vec<u8>> {
        use base64::Engine;

        let url = format!("{}/Document/{id}/download", self.base_url);
        debug!("Fetching {url}");
        let response = self.request(Method::GET, &url).send().await?;
        let body = self.read_body(response, &url).await?;
        let parsed: ObjectResponse<Value> = serde_json::from_str(&body)?;
        let content = parsed
            .objects
            .get("content")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                SevdeskError::UnexpectedResponse(
                    "document download carried no content".to_string(),
                )
            })?;
        if parsed
            .objects
            .get("base64Encoded")
            .and_then(Value::as_bool)
            .unwrap_or(true)
        {
            base64::engine::general_purpose::STANDARD
                .decode(content)
                .map_err(|err| {
                    SevdeskError::UnexpectedResponse(format!(
                        "document content was not valid base64: {err}"
                    ))
                })
        } else {
            Ok(content.as_bytes().to_vec())
        }
    }
}
