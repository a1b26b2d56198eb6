#![allow(dead_code)]

use async_trait::async_trait;
use invoice_editor::config::EditorConfig;
use invoice_editor::editor::{EditorSettings, InvoiceEditor};
use invoice_editor::models::{InvoiceRecord, StoredInvoice};
use invoice_editor::services::{
    AuthSession, CollectionScope, DocumentStore, MemoryStore, SessionProvider,
};
use invoice_editor::startup::Application;
use serde_json::Value;
use service_core::error::AppError;
use std::sync::Arc;
use tokio::sync::{watch, Notify};

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub store: Arc<MemoryStore>,
    pub editor: Arc<InvoiceEditor>,
    pub client: reqwest::Client,
}

/// Editor config for tests: random port, in-memory store.
pub fn test_config() -> EditorConfig {
    let mut config = EditorConfig::default();
    config.common.port = 0;
    config.mongodb.uri = None;
    config
}

impl TestApp {
    /// Spawn with an anonymous session and the default settings.
    pub async fn spawn() -> Self {
        Self::spawn_with(test_config(), true).await
    }

    pub async fn spawn_with(config: EditorConfig, signed_in: bool) -> Self {
        let store = Arc::new(MemoryStore::new());
        let sessions = if signed_in {
            AuthSession::initialize(None, None).await
        } else {
            AuthSession::signed_out(None)
        };

        let app = Application::build_with(config, store.clone(), Arc::new(sessions))
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let editor = app.editor().clone();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for the server to accept connections
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(20)).await;
        }

        TestApp {
            address,
            port,
            store,
            editor,
            client,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn invoice(&self) -> Value {
        self.client
            .get(self.url("/invoice"))
            .send()
            .await
            .expect("Failed to fetch invoice")
            .json()
            .await
            .expect("Invalid invoice body")
    }

    /// Add an item and return its id.
    pub async fn add_item(&self) -> u64 {
        let body: Value = self
            .client
            .post(self.url("/invoice/items"))
            .send()
            .await
            .expect("Failed to add item")
            .json()
            .await
            .expect("Invalid add item body");
        body["id"].as_u64().expect("Missing item id")
    }

    pub async fn set_field(&self, id: u64, field: &str, value: &str) -> reqwest::Response {
        self.client
            .patch(self.url(&format!("/invoice/items/{}", id)))
            .json(&serde_json::json!({ "field": field, "value": value }))
            .send()
            .await
            .expect("Failed to update item")
    }

    /// Fill one item with raw values.
    pub async fn fill_item(&self, id: u64, description: &str, qty: &str, rate: &str, discount: &str) {
        for (field, value) in [
            ("description", description),
            ("quantity", qty),
            ("rate", rate),
            ("discount", discount),
        ] {
            let response = self.set_field(id, field, value).await;
            assert!(response.status().is_success());
        }
    }

    pub async fn remove_item(&self, id: u64) -> Value {
        self.client
            .delete(self.url(&format!("/invoice/items/{}", id)))
            .send()
            .await
            .expect("Failed to remove item")
            .json()
            .await
            .expect("Invalid remove body")
    }

    pub async fn save(&self) -> Value {
        self.client
            .post(self.url("/invoice/save"))
            .send()
            .await
            .expect("Failed to save")
            .json()
            .await
            .expect("Invalid save body")
    }
}

/// Ids of the items in an invoice body, in order.
pub fn item_ids(invoice: &Value) -> Vec<u64> {
    invoice["items"]
        .as_array()
        .expect("items array")
        .iter()
        .map(|item| item["id"].as_u64().expect("item id"))
        .collect()
}

pub fn total(invoice: &Value, key: &str) -> f64 {
    invoice["calculation"]["totals"][key]
        .as_f64()
        .expect("numeric total")
}

/// Editor wired to the given store with an anonymous session.
pub async fn editor_with(store: Arc<dyn DocumentStore>, settings: EditorSettings) -> InvoiceEditor {
    let sessions: Arc<dyn SessionProvider> = Arc::new(AuthSession::initialize(None, None).await);
    InvoiceEditor::new(settings, store, sessions)
}

/// Store whose writes always fail.
pub struct FailingStore;

#[async_trait]
impl DocumentStore for FailingStore {
    async fn append(
        &self,
        _scope: &CollectionScope,
        _record: &InvoiceRecord,
    ) -> Result<StoredInvoice, AppError> {
        Err(AppError::DatabaseError(anyhow::anyhow!("connection reset")))
    }

    async fn list(&self, _scope: &CollectionScope) -> Result<Vec<StoredInvoice>, AppError> {
        Ok(Vec::new())
    }

    async fn subscribe(
        &self,
        _scope: &CollectionScope,
    ) -> Result<watch::Receiver<Vec<StoredInvoice>>, AppError> {
        Ok(watch::channel(Vec::new()).1)
    }

    async fn health_check(&self) -> Result<(), AppError> {
        Err(AppError::ServiceUnavailable)
    }
}

/// Memory store whose appends block until released.
#[derive(Default)]
pub struct GatedStore {
    pub inner: MemoryStore,
    pub entered: Notify,
    pub release: Notify,
}

#[async_trait]
impl DocumentStore for GatedStore {
    async fn append(
        &self,
        scope: &CollectionScope,
        record: &InvoiceRecord,
    ) -> Result<StoredInvoice, AppError> {
        self.entered.notify_one();
        self.release.notified().await;
        self.inner.append(scope, record).await
    }

    async fn list(&self, scope: &CollectionScope) -> Result<Vec<StoredInvoice>, AppError> {
        self.inner.list(scope).await
    }

    async fn subscribe(
        &self,
        scope: &CollectionScope,
    ) -> Result<watch::Receiver<Vec<StoredInvoice>>, AppError> {
        self.inner.subscribe(scope).await
    }

    async fn health_check(&self) -> Result<(), AppError> {
        Ok(())
    }
}
