use chrono::{DateTime, Local, TimeZone};

use crate::models::{Currency, InvoiceRecord, LineItemRecord};
use crate::services::calculation::{calculate, coerce, Calculation};
use crate::services::line_items::{LineItemStore, RemovalPolicy};

/// Invoice number for a session started at `at`: `INV-YYMMDD-HHMM`.
pub fn generate_invoice_no<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format("INV-%y%m%d-%H%M").to_string()
}

/// In-memory invoice being edited.
#[derive(Debug)]
pub struct InvoiceDraft {
    invoice_no: String,
    pub customer_name: String,
    pub customer_email: String,
    pub currency: Currency,
    pub items: LineItemStore,
}

impl InvoiceDraft {
    /// Empty draft numbered from the current local time.
    pub fn new(currency: Currency, policy: RemovalPolicy) -> Self {
        Self::with_invoice_no(generate_invoice_no(&Local::now()), currency, policy)
    }

    pub fn with_invoice_no(
        invoice_no: impl Into<String>,
        currency: Currency,
        policy: RemovalPolicy,
    ) -> Self {
        Self {
            invoice_no: invoice_no.into(),
            customer_name: String::new(),
            customer_email: String::new(),
            currency,
            items: LineItemStore::new(policy),
        }
    }

    /// Draft pre-filled with the starter consultation line.
    pub fn seeded(currency: Currency, policy: RemovalPolicy) -> Self {
        let mut draft = Self::new(currency, policy);
        draft.items.push_item("Consultation Services", "1", "150", "0");
        draft
    }

    pub fn invoice_no(&self) -> &str {
        &self.invoice_no
    }

    pub fn calculate(&self) -> Calculation {
        calculate(self.items.items())
    }

    /// Freeze the draft into a storable record, coercing numeric fields.
    pub fn snapshot(&self) -> InvoiceRecord {
        let items = self
            .items
            .items()
            .iter()
            .map(|item| LineItemRecord {
                id: item.id,
                description: item.description.clone(),
                quantity: coerce(&item.quantity),
                rate: coerce(&item.rate),
                discount: coerce(&item.discount),
            })
            .collect();

        InvoiceRecord {
            invoice_no: self.invoice_no.clone(),
            customer_name: self.customer_name.clone(),
            customer_email: self.customer_email.clone(),
            currency: self.currency,
            items,
            totals: self.calculate().totals,
        }
    }
}
