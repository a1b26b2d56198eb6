//! Ordered, editable collection of line items.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::models::{ItemField, LineItem, LineItemId};

/// Whether the last remaining line item may be removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalPolicy {
    /// Removing the only remaining item is a no-op.
    #[default]
    KeepLast,
    /// Items may be removed down to an empty list.
    AllowEmpty,
}

impl std::str::FromStr for RemovalPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "keep_last" => Ok(RemovalPolicy::KeepLast),
            "allow_empty" => Ok(RemovalPolicy::AllowEmpty),
            _ => Err(format!("Invalid removal policy: {}", s)),
        }
    }
}

/// Generates creation-order ids from the wall clock in milliseconds.
///
/// Two items created within the same millisecond (or after the clock steps
/// back) get the previous id plus one, so ids never repeat.
#[derive(Debug, Default)]
pub struct IdGenerator {
    last: u64,
}

impl IdGenerator {
    pub fn next_id(&mut self) -> LineItemId {
        let now = u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0);
        let id = now.max(self.last + 1);
        self.last = id;
        LineItemId(id)
    }
}

#[derive(Debug, Default)]
pub struct LineItemStore {
    items: Vec<LineItem>,
    ids: IdGenerator,
    policy: RemovalPolicy,
}

impl LineItemStore {
    pub fn new(policy: RemovalPolicy) -> Self {
        Self {
            items: Vec::new(),
            ids: IdGenerator::default(),
            policy,
        }
    }

    /// Append a blank item and return its id.
    pub fn add_item(&mut self) -> LineItemId {
        let id = self.ids.next_id();
        self.items.push(LineItem::blank(id));
        id
    }

    /// Append an item with the given raw values and return its id.
    pub fn push_item(
        &mut self,
        description: impl Into<String>,
        quantity: impl Into<String>,
        rate: impl Into<String>,
        discount: impl Into<String>,
    ) -> LineItemId {
        let id = self.ids.next_id();
        self.items.push(LineItem {
            id,
            description: description.into(),
            quantity: quantity.into(),
            rate: rate.into(),
            discount: discount.into(),
        });
        id
    }

    /// Set one field of the matching item. Returns false when no item has `id`.
    pub fn update_item(&mut self, id: LineItemId, field: ItemField, value: impl Into<String>) -> bool {
        match self.items.iter_mut().find(|item| item.id == id) {
            Some(item) => {
                item.set(field, value.into());
                true
            }
            None => false,
        }
    }

    /// Remove the matching item. Returns false when nothing was removed,
    /// either because `id` is unknown or the removal policy keeps the last item.
    pub fn remove_item(&mut self, id: LineItemId) -> bool {
        if self.policy == RemovalPolicy::KeepLast && self.items.len() == 1 {
            return false;
        }
        let before = self.items.len();
        self.items.retain(|item| item.id != id);
        self.items.len() != before
    }

    pub fn get(&self, id: LineItemId) -> Option<&LineItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn policy(&self) -> RemovalPolicy {
        self.policy
    }
}
