//! Invoice snapshot models for the invoice editor.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Currency, LineItemRecord};

/// Derived invoice totals.
///
/// `total` is always `subtotal - discount` and may be negative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    #[serde(with = "rust_decimal::serde::float")]
    pub subtotal: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub discount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
}

/// Snapshot of a draft invoice taken at save time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceRecord {
    pub invoice_no: String,
    pub customer_name: String,
    pub customer_email: String,
    pub currency: Currency,
    pub items: Vec<LineItemRecord>,
    pub totals: Totals,
}

/// Invoice record as held by the document store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredInvoice {
    pub id: String,
    pub app_id: String,
    pub user_id: Option<String>,
    #[serde(flatten)]
    pub record: InvoiceRecord,
    /// Assigned by the store when the record is written.
    pub created_at: DateTime<Utc>,
}
