//! Domain models for the invoice editor.

mod currency;
mod invoice;
mod line_item;

pub use currency::Currency;
pub use invoice::{InvoiceRecord, StoredInvoice, Totals};
pub use line_item::{ItemField, LineItem, LineItemId, LineItemRecord};
