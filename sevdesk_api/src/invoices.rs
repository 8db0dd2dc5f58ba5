//! Invoice creation via the saveInvoice factory endpoint.

use log::{debug, info};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{Result, SevdeskError};
use crate::models::{opt_i64_from_any, u64_from_any, Unity};
use crate::SevdeskApi;

/// Tax rule 17, "Nicht im Inland steuerbare Leistung".
pub const TAX_RULE_NOT_TAXABLE_DOMESTIC: u64 = 17;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvoiceStatus {
    Draft,
    Open,
    Paid,
}

impl InvoiceStatus {
    pub fn code(self) -> i64 {
        match self {
            InvoiceStatus::Draft => 100,
            InvoiceStatus::Open => 200,
            InvoiceStatus::Paid => 1000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    #[serde(deserialize_with = "u64_from_any")]
    pub id: u64,
    #[serde(rename = "invoiceNumber", default)]
    pub invoice_number: Option<String>,
    #[serde(default, deserialize_with = "opt_i64_from_any")]
    pub status: Option<i64>,
    #[serde(default)]
    pub header: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
}

impl Invoice {
    /// Link into the web UI.
    pub fn browser_url(&self) -> String {
        format!("https://my.sevdesk.de/fi/detail/type/RE/id/{}", self.id)
    }
}

/// Payload for [`SevdeskApi::create_invoice`]. Dates use the `%d.%m.%Y`
/// format the web UI sends.
#[derive(Debug, Clone)]
pub struct NewInvoice {
    pub contact: u64,
    /// SevUser id of the responsible team member.
    pub contact_person: Option<u64>,
    pub invoice_date: String,
    pub header: String,
    pub head_text: Option<String>,
    pub foot_text: Option<String>,
    pub time_to_pay: Option<u32>,
    pub delivery_date: Option<String>,
    pub delivery_date_until: Option<String>,
    pub status: InvoiceStatus,
    pub tax_rate: f64,
    pub tax_text: Option<String>,
    pub tax_rule: Option<u64>,
    pub currency: Option<String>,
    pub small_settlement: bool,
    pub show_net: bool,
    pub reference: Option<String>,
}

impl NewInvoice {
    // The factory endpoint wants the status as a string.
    pub(crate) fn to_payload(&self) -> Value {
        let contact_person = match self.contact_person {
            Some(id) => json!({ "id": id, "objectName": "SevUser" }),
            None => Value::Null,
        };
        let mut invoice = json!({
            "objectName": "Invoice",
            "mapAll": true,
            "invoiceType": "RE",
            "contact": { "id": self.contact, "objectName": "Contact" },
            "invoiceDate": self.invoice_date,
            "header": self.header,
            "status": self.status.code().to_string(),
            "smallSettlement": self.small_settlement,
            "contactPerson": contact_person,
            "taxRate": self.tax_rate,
            "showNet": self.show_net,
            "discount": 0,
        });
        if let Some(text) = &self.head_text {
            invoice["headText"] = json!(text);
        }
        if let Some(text) = &self.foot_text {
            invoice["footText"] = json!(text);
        }
        if let Some(days) = self.time_to_pay {
            invoice["timeToPay"] = json!(days);
        }
        if let Some(date) = &self.delivery_date {
            invoice["deliveryDate"] = json!(date);
        }
        if let Some(date) = &self.delivery_date_until {
            invoice["deliveryDateUntil"] = json!(date);
        }
        if let Some(text) = &self.tax_text {
            invoice["taxText"] = json!(text);
        }
        if let Some(rule) = self.tax_rule {
            invoice["taxRule"] = json!({ "id": rule, "objectName": "TaxRule" });
        }
        if let Some(currency) = &self.currency {
            invoice["currency"] = json!(currency);
        }
        if let Some(reference) = &self.reference {
            invoice["reference"] = json!(reference);
        }
        invoice
    }
}

/// One invoice line. `price` is the net unit price when the invoice
/// has `show_net` set.
#[derive(Debug, Clone)]
pub struct InvoicePosition {
    pub name: String,
    pub quantity: f64,
    pub price: f64,
    pub unity: Unity,
    pub tax_rate: f64,
    pub text: Option<String>,
}

impl InvoicePosition {
    pub(crate) fn to_payload(&self, position_number: usize) -> Value {
        let mut position = json!({
            "objectName": "InvoicePos",
            "mapAll": true,
            "name": self.name,
            "quantity": self.quantity,
            "price": self.price,
            "unity": { "id": self.unity.id(), "objectName": "Unity" },
            "taxRate": self.tax_rate,
            "positionNumber": position_number,
        });
        if let Some(text) = &self.text {
            position["text"] = json!(text);
        }
        position
    }
}

impl SevdeskApi {
    /// Creates an invoice together with its positions in one call.
    /// Positions are numbered in the order given.
    pub async fn create_invoice(
        &self,
        invoice: &NewInvoice,
        positions: &[InvoicePosition],
    ) -> Result<Invoice> {
        let position_payloads: Vec<Value> = positions
            .iter()
            .enumerate()
            .map(|(index, position)| position.to_payload(index + 1))
            .collect();
        let body = json!({
            "invoice": invoice.to_payload(),
            "invoicePosSave": position_payloads,
        });
        debug!("Creating invoice with {} positions", positions.len());
        let objects: Value = self.post_json("Invoice/Factory/saveInvoice", &body).await?;
        let created = objects.get("invoice").cloned().ok_or_else(|| {
            SevdeskError::UnexpectedResponse("saveInvoice response carried no invoice".to_string())
        })?;
        let created: Invoice = serde_json::from_value(created)?;
        info!(
            "Created invoice {} ({})",
            created.id,
            created.invoice_number.as_deref().unwrap_or("no number yet")
        );
        Ok(created)
    }
}
