//! Assembling a draft invoice from billing report rows.

use chrono::NaiveDate;
use sevdesk_api::{
    InvoicePosition, InvoiceStatus, NewInvoice, Unity, TAX_RULE_NOT_TAXABLE_DOMESTIC,
};

use crate::error::{InvoicerError, Result};
use crate::report::ReportRow;

/// How far a computed unit price may stray from the reported hourly
/// rate before the report is considered inconsistent.
const PRICE_TOLERANCE: f64 = 0.02;

/// Everything needed to create the invoice, short of the contact ids
/// that are only known after talking to the API.
#[derive(Debug, Clone)]
pub struct InvoicePlan {
    pub billing_target: String,
    pub header: String,
    pub head_text: String,
    pub currency: String,
    /// `%d.%m.%Y`, the date format invoices carry.
    pub delivery_date: String,
    pub delivery_date_until: String,
    pub time_to_pay: u32,
    pub positions: Vec<InvoicePosition>,
}

impl InvoicePlan {
    pub fn to_invoice(
        &self,
        contact: u64,
        contact_person: Option<u64>,
        invoice_date: String,
    ) -> NewInvoice {
        NewInvoice {
            contact,
            contact_person,
            invoice_date,
            header: self.header.clone(),
            head_text: Some(self.head_text.clone()),
            foot_text: None,
            time_to_pay: Some(self.time_to_pay),
            delivery_date: Some(self.delivery_date.clone()),
            delivery_date_until: Some(self.delivery_date_until.clone()),
            status: InvoiceStatus::Draft,
            tax_rate: 0.0,
            tax_text: None,
            tax_rule: Some(TAX_RULE_NOT_TAXABLE_DOMESTIC),
            currency: Some(self.currency.clone()),
            small_settlement: false,
            show_net: true,
            reference: None,
        }
    }
}

/// Plans one draft invoice over all rows of a report.
///
/// The billing target is the `customer` override when given, else the
/// first row's agency (when one is set), else its client. The delivery
/// period and the `Bill for {month}` header come from the first row's
/// date range.
pub fn plan_invoice(
    rows: &[ReportRow],
    customer: Option<&str>,
    days_until_payment: u32,
) -> Result<InvoicePlan> {
    let first = rows
        .first()
        .ok_or_else(|| InvoicerError::Report("the report has no rows".to_string()))?;
    if let Some(mixed) = rows
        .iter()
        .find(|row| row.target_currency != first.target_currency)
    {
        return Err(InvoicerError::Report(format!(
            "rows mix target currencies {} and {}",
            first.target_currency, mixed.target_currency
        )));
    }

    let start = parse_date(&first.start_date)?;
    let end = parse_date(&first.end_date)?;

    let billing_target = match customer {
        Some(customer) => customer.to_string(),
        None if first.has_agency() => first.agency.clone(),
        None => first.client.clone(),
    };

    let positions = rows.iter().map(line_item).collect::<Result<Vec<_>>>()?;

    Ok(InvoicePlan {
        billing_target,
        header: format!("Bill for {}", start.format("%Y-%m")),
        head_text: format!(
            "Terms of payment: Payment within {days_until_payment} days from \
             receipt of invoice without deductions."
        ),
        currency: first.target_currency.clone(),
        delivery_date: start.format("%d.%m.%Y").to_string(),
        delivery_date_until: end.format("%d.%m.%Y").to_string(),
        time_to_pay: days_until_payment,
        positions,
    })
}

/// One invoice position per report row. The position text carries the
/// currency conversion when source and invoice currency differ.
fn line_item(row: &ReportRow) -> Result<InvoicePosition> {
    let name = format!("{} - {}", row.client, row.task);
    if row.rounded_hours <= 0.0 {
        return Err(InvoicerError::Report(format!("{name} has no hours")));
    }
    let price = unit_price(&name, row.target_cost, row.rounded_hours, row.target_hourly_rate)?;
    let source_price = unit_price(
        &name,
        row.source_cost,
        row.rounded_hours,
        row.source_hourly_rate,
    )?;

    let text = if row.source_currency != row.target_currency {
        Some(format!(
            "{} {} x {} = {} {}",
            row.source_currency, source_price, row.exchange_rate, row.target_currency, price
        ))
    } else {
        None
    };

    Ok(InvoicePosition {
        name,
        quantity: row.rounded_hours,
        price,
        unity: Unity::Hour,
        tax_rate: 0.0,
        text,
    })
}

/// Cost divided by hours, snapped to the reported hourly rate when the
/// two agree within [`PRICE_TOLERANCE`]. A larger gap means the report
/// was aggregated wrongly and must not be invoiced.
fn unit_price(name: &str, cost: f64, hours: f64, hourly_rate: f64) -> Result<f64> {
    let price = round2(cost / hours);
    if (price - hourly_rate).abs() <= PRICE_TOLERANCE {
        Ok(hourly_rate)
    } else {
        Err(InvoicerError::PriceMismatch {
            name: name.to_string(),
            unit_price: price,
            hourly_rate,
        })
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn parse_date(input: &str) -> Result<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return Ok(date);
    }
    if input.len() == 8 && input.chars().all(|c| c.is_ascii_digit()) {
        if let Ok(date) = NaiveDate::parse_from_str(input, "%Y%m%d") {
            return Ok(date);
        }
    }
    Err(InvoicerError::InvalidDate(input.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> ReportRow {
        serde_json::from_str(
            r#"{
                "user": "Jane Doe",
                "start_date": "20240201",
                "end_date": "20240229",
                "agency": "Broker Inc",
                "client": "ACME",
                "task": "Development",
                "rounded_hours": 10.0,
                "source_cost": 1000.0,
                "source_currency": "USD",
                "source_hourly_rate": 100.0,
                "target_cost": 950.0,
                "target_currency": "EUR",
                "target_hourly_rate": 95.0,
                "exchange_rate": 0.95
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn plans_bill_the_agency_by_default() {
        let plan = plan_invoice(&[row()], None, 30).unwrap();
        assert_eq!(plan.billing_target, "Broker Inc");
        assert_eq!(plan.header, "Bill for 2024-02");
        assert_eq!(plan.delivery_date, "01.02.2024");
        assert_eq!(plan.delivery_date_until, "29.02.2024");
        assert_eq!(plan.currency, "EUR");
        assert_eq!(plan.time_to_pay, 30);
        assert!(plan.head_text.contains("within 30 days"));
    }

    #[test]
    fn plans_fall_back_to_the_client_without_an_agency() {
        let mut no_agency = row();
        no_agency.agency = "-".to_string();
        let plan = plan_invoice(&[no_agency], None, 30).unwrap();
        assert_eq!(plan.billing_target, "ACME");
    }

    #[test]
    fn the_customer_flag_overrides_the_report() {
        let plan = plan_invoice(&[row()], Some("Umbrella Corp"), 30).unwrap();
        assert_eq!(plan.billing_target, "Umbrella Corp");
    }

    #[test]
    fn positions_snap_to_the_hourly_rate() {
        let plan = plan_invoice(&[row()], None, 30).unwrap();
        let position = &plan.positions[0];
        assert_eq!(position.name, "ACME - Development");
        assert_eq!(position.quantity, 10.0);
        assert_eq!(position.price, 95.0);
        assert_eq!(position.tax_rate, 0.0);
    }

    #[test]
    fn rounding_drift_within_two_cents_is_tolerated() {
        let mut drifted = row();
        // 949.9 / 10h = 94.99, one cent off the 95.0 rate.
        drifted.target_cost = 949.9;
        let plan = plan_invoice(&[drifted], None, 30).unwrap();
        assert_eq!(plan.positions[0].price, 95.0);
    }

    #[test]
    fn inconsistent_prices_are_rejected() {
        let mut wrong = row();
        wrong.target_cost = 900.0;
        let error = plan_invoice(&[wrong], None, 30).unwrap_err();
        match error {
            InvoicerError::PriceMismatch {
                unit_price,
                hourly_rate,
                ..
            } => {
                assert_eq!(unit_price, 90.0);
                assert_eq!(hourly_rate, 95.0);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn converted_rows_carry_the_conversion_text() {
        let plan = plan_invoice(&[row()], None, 30).unwrap();
        assert_eq!(
            plan.positions[0].text.as_deref(),
            Some("USD 100 x 0.95 = EUR 95")
        );
    }

    #[test]
    fn single_currency_rows_have_no_text() {
        let mut domestic = row();
        domestic.source_currency = "EUR".to_string();
        domestic.source_cost = 950.0;
        domestic.source_hourly_rate = 95.0;
        domestic.exchange_rate = 1.0;
        let plan = plan_invoice(&[domestic], None, 30).unwrap();
        assert!(plan.positions[0].text.is_none());
    }

    #[test]
    fn mixed_target_currencies_are_rejected() {
        let mut other = row();
        other.target_currency = "USD".to_string();
        let error = plan_invoice(&[row(), other], None, 30).unwrap_err();
        assert!(matches!(error, InvoicerError::Report(_)));
    }

    #[test]
    fn plans_turn_into_draft_invoices() {
        let plan = plan_invoice(&[row()], None, 14).unwrap();
        let invoice = plan.to_invoice(12, Some(5), "01.03.2024".to_string());
        assert_eq!(invoice.contact, 12);
        assert_eq!(invoice.contact_person, Some(5));
        assert_eq!(invoice.invoice_date, "01.03.2024");
        assert_eq!(invoice.time_to_pay, Some(14));
        assert_eq!(invoice.tax_rule, Some(TAX_RULE_NOT_TAXABLE_DOMESTIC));
        assert_eq!(invoice.status.code(), 100);
        assert_eq!(invoice.currency.as_deref(), Some("EUR"));
    }
}
