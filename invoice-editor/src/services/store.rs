use async_trait::async_trait;
use chrono::Utc;
use service_core::error::AppError;
use std::collections::HashMap;
use tokio::sync::{watch, RwLock};
use uuid::Uuid;

use crate::models::{InvoiceRecord, StoredInvoice};

/// Collection an invoice is written to: per app, optionally per user.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CollectionScope {
    pub app_id: String,
    pub user_id: Option<String>,
}

impl CollectionScope {
    pub fn new(app_id: impl Into<String>, user_id: Option<String>) -> Self {
        Self {
            app_id: app_id.into(),
            user_id,
        }
    }

    /// Path-style name of the scope, used in logs.
    pub fn path(&self) -> String {
        match &self.user_id {
            Some(user_id) => format!("artifacts/{}/users/{}/invoices", self.app_id, user_id),
            None => format!("artifacts/{}/invoices", self.app_id),
        }
    }
}

/// Append-only sink for saved invoices.
///
/// Stores assign the record id and creation timestamp themselves; callers
/// never supply either.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn append(
        &self,
        scope: &CollectionScope,
        record: &InvoiceRecord,
    ) -> Result<StoredInvoice, AppError>;

    /// Records in the scope, newest first.
    async fn list(&self, scope: &CollectionScope) -> Result<Vec<StoredInvoice>, AppError>;

    /// Live view of [`DocumentStore::list`], refreshed after every append.
    async fn subscribe(
        &self,
        scope: &CollectionScope,
    ) -> Result<watch::Receiver<Vec<StoredInvoice>>, AppError>;

    async fn health_check(&self) -> Result<(), AppError>;
}

#[derive(Default)]
struct MemoryCollections {
    records: HashMap<CollectionScope, Vec<StoredInvoice>>,
    feeds: HashMap<CollectionScope, watch::Sender<Vec<StoredInvoice>>>,
}

impl MemoryCollections {
    fn newest_first(&self, scope: &CollectionScope) -> Vec<StoredInvoice> {
        let mut records = self.records.get(scope).cloned().unwrap_or_default();
        records.reverse();
        records
    }
}

/// In-process store, used when no database is configured and in tests.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<MemoryCollections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records across all scopes.
    pub async fn len(&self) -> usize {
        self.inner.read().await.records.values().map(Vec::len).sum()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn append(
        &self,
        scope: &CollectionScope,
        record: &InvoiceRecord,
    ) -> Result<StoredInvoice, AppError> {
        let stored = StoredInvoice {
            id: Uuid::new_v4().to_string(),
            app_id: scope.app_id.clone(),
            user_id: scope.user_id.clone(),
            record: record.clone(),
            created_at: Utc::now(),
        };

        let mut inner = self.inner.write().await;
        inner
            .records
            .entry(scope.clone())
            .or_default()
            .push(stored.clone());

        let snapshot = inner.newest_first(scope);
        if let Some(feed) = inner.feeds.get(scope) {
            feed.send_replace(snapshot);
        }

        Ok(stored)
    }

    async fn list(&self, scope: &CollectionScope) -> Result<Vec<StoredInvoice>, AppError> {
        Ok(self.inner.read().await.newest_first(scope))
    }

    async fn subscribe(
        &self,
        scope: &CollectionScope,
    ) -> Result<watch::Receiver<Vec<StoredInvoice>>, AppError> {
        let mut inner = self.inner.write().await;
        if let Some(feed) = inner.feeds.get(scope) {
            return Ok(feed.subscribe());
        }

        let (tx, rx) = watch::channel(inner.newest_first(scope));
        inner.feeds.insert(scope.clone(), tx);
        Ok(rx)
    }

    async fn health_check(&self) -> Result<(), AppError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Currency, Totals};

    fn record(invoice_no: &str) -> InvoiceRecord {
        InvoiceRecord {
            invoice_no: invoice_no.to_string(),
            customer_name: "Acme".to_string(),
            customer_email: String::new(),
            currency: Currency::Myr,
            items: Vec::new(),
            totals: Totals::default(),
        }
    }

    #[test]
    fn scope_paths() {
        let user = CollectionScope::new("invoice-app", Some("u1".to_string()));
        let shared = CollectionScope::new("invoice-app", None);
        assert_eq!(user.path(), "artifacts/invoice-app/users/u1/invoices");
        assert_eq!(shared.path(), "artifacts/invoice-app/invoices");
    }

    #[tokio::test]
    async fn append_assigns_id_and_timestamp() {
        let store = MemoryStore::new();
        let scope = CollectionScope::new("app", Some("u1".to_string()));
        let before = Utc::now();

        let a = store.append(&scope, &record("INV-1")).await.unwrap();
        let b = store.append(&scope, &record("INV-1")).await.unwrap();

        assert_ne!(a.id, b.id);
        assert!(a.created_at >= before);
        assert_eq!(a.user_id.as_deref(), Some("u1"));
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn list_is_scoped_and_newest_first() {
        let store = MemoryStore::new();
        let mine = CollectionScope::new("app", Some("u1".to_string()));
        let theirs = CollectionScope::new("app", Some("u2".to_string()));

        store.append(&mine, &record("INV-1")).await.unwrap();
        store.append(&theirs, &record("INV-X")).await.unwrap();
        store.append(&mine, &record("INV-2")).await.unwrap();

        let listed = store.list(&mine).await.unwrap();
        let numbers: Vec<_> = listed.iter().map(|s| s.record.invoice_no.as_str()).collect();
        assert_eq!(numbers, vec!["INV-2", "INV-1"]);
    }

    #[tokio::test]
    async fn subscribers_see_appends() {
        let store = MemoryStore::new();
        let scope = CollectionScope::new("app", None);
        store.append(&scope, &record("INV-1")).await.unwrap();

        let mut feed = store.subscribe(&scope).await.unwrap();
        assert_eq!(feed.borrow_and_update().len(), 1);

        store.append(&scope, &record("INV-2")).await.unwrap();
        feed.changed().await.unwrap();
        let latest = feed.borrow_and_update().clone();
        assert_eq!(latest.len(), 2);
        assert_eq!(latest[0].record.invoice_no, "INV-2");
    }
}
