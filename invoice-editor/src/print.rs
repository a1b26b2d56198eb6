//! Static, printable rendering of the draft invoice.
//!
//! The output mirrors the draft's current values as plain text; it carries no
//! inputs or buttons.

use askama::Template;
use chrono::NaiveDate;

use crate::editor::InvoiceDraft;
use crate::services::calculation::format_money;

/// Placeholder printed when the customer name is blank.
pub const BLANK_CUSTOMER: &str = "_________________";

/// Issuer block shown at the top of the printed invoice.
#[derive(Debug, Clone)]
pub struct PrintHeader {
    pub issuer_name: String,
    pub issuer_address: Vec<String>,
}

impl Default for PrintHeader {
    fn default() -> Self {
        Self {
            issuer_name: "Samyama Sdn Bhd".to_string(),
            issuer_address: vec![
                "Level 23, Menara 1".to_string(),
                "Kuala Lumpur, 50450".to_string(),
                "Malaysia".to_string(),
            ],
        }
    }
}

/// One formatted row of the item table.
#[derive(Debug, Clone)]
pub struct PrintRow {
    pub description: String,
    pub quantity: String,
    pub rate: String,
    pub discount: String,
    pub amount: String,
}

#[derive(Template)]
#[template(path = "invoice_print.html")]
pub struct PrintTemplate {
    pub issuer_name: String,
    pub issuer_address: Vec<String>,
    pub invoice_no: String,
    pub currency: &'static str,
    pub customer_name: String,
    pub customer_email: String,
    pub date: String,
    pub rows: Vec<PrintRow>,
    pub subtotal: String,
    /// Already negated: a discount of 250 prints as `-250.00`.
    pub discount: String,
    pub total: String,
}

impl PrintTemplate {
    /// Snapshot `draft` as a printable page dated `date`.
    pub fn new(draft: &InvoiceDraft, header: &PrintHeader, date: NaiveDate) -> Self {
        let calculation = draft.calculate();
        let customer_name = if draft.customer_name.trim().is_empty() {
            BLANK_CUSTOMER.to_string()
        } else {
            draft.customer_name.clone()
        };

        let rows = draft
            .items
            .items()
            .iter()
            .zip(&calculation.lines)
            .map(|(item, line)| PrintRow {
                description: item.description.clone(),
                quantity: line.quantity.normalize().to_string(),
                rate: format_money(line.rate),
                discount: format_money(line.discount),
                amount: format_money(line.amount),
            })
            .collect();

        let totals = &calculation.totals;
        Self {
            issuer_name: header.issuer_name.clone(),
            issuer_address: header.issuer_address.clone(),
            invoice_no: draft.invoice_no().to_string(),
            currency: draft.currency.as_str(),
            customer_name,
            customer_email: draft.customer_email.clone(),
            date: date.format("%-d %B %Y").to_string(),
            rows,
            subtotal: format_money(totals.subtotal),
            discount: format_money(-totals.discount),
            total: format_money(totals.total),
        }
    }
}
