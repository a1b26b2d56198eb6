use serde::{Deserialize, Serialize};

use crate::editor::EditorView;
use crate::models::{LineItemId, StoredInvoice};

/// Partial update of the invoice header. Absent fields are left as they are.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct UpdateCustomerRequest {
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub currency: Option<String>,
}

/// Set one line item field to the raw text the user typed.
#[derive(Debug, Deserialize, Serialize)]
pub struct UpdateItemRequest {
    pub field: String,
    pub value: String,
}

#[derive(Debug, Serialize)]
pub struct AddItemResponse {
    pub id: LineItemId,
    pub invoice: EditorView,
}

#[derive(Debug, Serialize)]
pub struct SavedInvoicesResponse {
    pub invoices: Vec<StoredInvoice>,
    pub total: usize,
}
