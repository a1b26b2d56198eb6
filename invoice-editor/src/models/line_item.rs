//! Line item models for the invoice editor.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Identifier of a line item within one editing session.
///
/// Derived from the creation time in milliseconds and strictly increasing, so
/// ordering by id is ordering by creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineItemId(pub u64);

impl std::fmt::Display for LineItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Line item as edited.
///
/// Numeric fields hold the raw text typed by the user so partial input such
/// as `"1."` survives editing. They are coerced only when totals are computed
/// or the invoice is saved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: LineItemId,
    pub description: String,
    pub quantity: String,
    pub rate: String,
    pub discount: String,
}

impl LineItem {
    /// Blank description and zero numeric fields.
    pub fn blank(id: LineItemId) -> Self {
        Self {
            id,
            description: String::new(),
            quantity: "0".to_string(),
            rate: "0".to_string(),
            discount: "0".to_string(),
        }
    }

    /// Replace one field with a raw value.
    pub fn set(&mut self, field: ItemField, value: String) {
        match field {
            ItemField::Description => self.description = value,
            ItemField::Quantity => self.quantity = value,
            ItemField::Rate => self.rate = value,
            ItemField::Discount => self.discount = value,
        }
    }
}

/// Editable field of a line item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemField {
    Description,
    Quantity,
    Rate,
    Discount,
}

impl std::str::FromStr for ItemField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "description" => Ok(ItemField::Description),
            "quantity" | "qty" => Ok(ItemField::Quantity),
            "rate" => Ok(ItemField::Rate),
            "discount" => Ok(ItemField::Discount),
            _ => Err(format!("Unknown line item field: {}", s)),
        }
    }
}

/// Line item with numeric fields coerced, as written to storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItemRecord {
    pub id: LineItemId,
    pub description: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub quantity: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub rate: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub discount: Decimal,
}
