use async_trait::async_trait;
use futures::stream::{StreamExt, TryStreamExt};
use mongodb::{
    bson::{self, doc, Bson, Document},
    options::{FindOneAndUpdateOptions, FindOptions, IndexOptions, ReturnDocument},
    Client as MongoClient, Collection, Database, IndexModel,
};
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use std::time::Duration;
use tokio::sync::watch;
use uuid::Uuid;

use super::metrics::{DB_QUERY_DURATION, ERRORS_TOTAL};
use super::store::{CollectionScope, DocumentStore};
use crate::models::{Currency, InvoiceRecord, LineItemRecord, StoredInvoice, Totals};

const INVOICES: &str = "invoices";

/// How often a live feed re-reads the collection when change streams are
/// unavailable (standalone servers).
const POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Stored shape of an invoice in MongoDB.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct InvoiceDocument {
    #[serde(rename = "_id")]
    id: String,
    app_id: String,
    user_id: Option<String>,
    invoice_no: String,
    customer_name: String,
    #[serde(default)]
    customer_email: String,
    currency: Currency,
    items: Vec<LineItemRecord>,
    totals: Totals,
    created_at: bson::DateTime,
}

impl From<InvoiceDocument> for StoredInvoice {
    fn from(doc: InvoiceDocument) -> Self {
        StoredInvoice {
            id: doc.id,
            app_id: doc.app_id,
            user_id: doc.user_id,
            record: InvoiceRecord {
                invoice_no: doc.invoice_no,
                customer_name: doc.customer_name,
                customer_email: doc.customer_email,
                currency: doc.currency,
                items: doc.items,
                totals: doc.totals,
            },
            created_at: doc.created_at.to_chrono(),
        }
    }
}

#[derive(Clone)]
pub struct MongoStore {
    client: MongoClient,
    db: Database,
}

impl MongoStore {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, AppError> {
        tracing::info!("Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri).await.map_err(|e| {
            tracing::error!("Failed to connect to MongoDB: {}", e);
            AppError::from(e)
        })?;
        let db = client.database(database);
        tracing::info!(database = %database, "Successfully connected to MongoDB database");
        Ok(Self { client, db })
    }

    pub async fn initialize_indexes(&self) -> Result<(), AppError> {
        tracing::info!("Creating MongoDB indexes for invoice-editor");

        // Scoped listing, newest first
        let scope_index = IndexModel::builder()
            .keys(doc! { "app_id": 1, "user_id": 1, "created_at": -1 })
            .options(
                IndexOptions::builder()
                    .name("scope_created_lookup".to_string())
                    .build(),
            )
            .build();

        self.invoices()
            .create_index(scope_index, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create scope index on invoices collection: {}", e);
                AppError::from(e)
            })?;
        tracing::info!("Created index on invoices.(app_id, user_id, created_at)");

        Ok(())
    }

    fn invoices(&self) -> Collection<InvoiceDocument> {
        self.db.collection(INVOICES)
    }

    fn raw_invoices(&self) -> Collection<Document> {
        self.db.collection(INVOICES)
    }

    /// Push fresh listings into `tx` until every receiver is gone.
    async fn follow(&self, scope: CollectionScope, tx: watch::Sender<Vec<StoredInvoice>>) {
        let mut inserted = doc! {
            "operationType": "insert",
            "fullDocument.app_id": scope.app_id.clone(),
        };
        inserted.insert(
            "fullDocument.user_id",
            scope.user_id.clone().map(Bson::String).unwrap_or(Bson::Null),
        );
        let pipeline = vec![doc! { "$match": inserted }];

        match self.raw_invoices().watch(pipeline, None).await {
            Ok(mut changes) => loop {
                tokio::select! {
                    _ = tx.closed() => break,
                    change = changes.next() => match change {
                        Some(Ok(_)) => self.refresh(&scope, &tx).await,
                        Some(Err(e)) => {
                            tracing::warn!(error = %e, "Invoice change stream failed, polling instead");
                            self.poll(&scope, &tx).await;
                            break;
                        }
                        None => break,
                    },
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, "Change streams unavailable, polling invoices");
                self.poll(&scope, &tx).await;
            }
        }

        tracing::debug!(scope = %scope.path(), "Invoice feed closed");
    }

    async fn poll(&self, scope: &CollectionScope, tx: &watch::Sender<Vec<StoredInvoice>>) {
        let mut ticker = tokio::time::interval(POLL_INTERVAL);
        loop {
            tokio::select! {
                _ = tx.closed() => break,
                _ = ticker.tick() => self.refresh(scope, tx).await,
            }
        }
    }

    async fn refresh(&self, scope: &CollectionScope, tx: &watch::Sender<Vec<StoredInvoice>>) {
        match self.list(scope).await {
            Ok(latest) => {
                tx.send_if_modified(move |current| {
                    if *current == latest {
                        false
                    } else {
                        *current = latest;
                        true
                    }
                });
            }
            Err(e) => tracing::warn!(error = %e, "Failed to refresh invoice feed"),
        }
    }
}

fn scope_filter(scope: &CollectionScope) -> Document {
    let mut filter = doc! { "app_id": scope.app_id.clone() };
    filter.insert(
        "user_id",
        scope.user_id.clone().map(Bson::String).unwrap_or(Bson::Null),
    );
    filter
}

/// Wrap a value so `$set` in an update pipeline stores it verbatim instead of
/// evaluating strings such as `"$100"` as field paths.
fn literal(value: Bson) -> Bson {
    Bson::Document(doc! { "$literal": value })
}

/// `$set` stage of the upsert pipeline that writes one invoice.
fn append_update(scope: &CollectionScope, record: &InvoiceRecord) -> Result<Document, AppError> {
    let mut fields = Document::new();
    fields.insert("app_id", literal(Bson::String(scope.app_id.clone())));
    fields.insert(
        "user_id",
        literal(scope.user_id.clone().map(Bson::String).unwrap_or(Bson::Null)),
    );
    for (key, value) in bson::to_document(record)? {
        fields.insert(key, literal(value));
    }
    // Creation time comes from the server clock.
    fields.insert("created_at", "$$NOW");

    Ok(doc! { "$set": fields })
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn append(
        &self,
        scope: &CollectionScope,
        record: &InvoiceRecord,
    ) -> Result<StoredInvoice, AppError> {
        let _timer = DB_QUERY_DURATION.with_label_values(&["append"]).start_timer();
        let id = Uuid::new_v4().to_string();
        let update = append_update(scope, record)?;

        let options = FindOneAndUpdateOptions::builder()
            .upsert(true)
            .return_document(ReturnDocument::After)
            .build();

        let written = self
            .invoices()
            .find_one_and_update(doc! { "_id": id.clone() }, vec![update], options)
            .await
            .map_err(|e| {
                tracing::error!(scope = %scope.path(), "Failed to write invoice: {}", e);
                ERRORS_TOTAL.with_label_values(&["database"]).inc();
                AppError::from(e)
            })?
            .ok_or_else(|| {
                AppError::DatabaseError(anyhow::anyhow!(
                    "Upsert of invoice {} returned no document",
                    id
                ))
            })?;

        Ok(written.into())
    }

    async fn list(&self, scope: &CollectionScope) -> Result<Vec<StoredInvoice>, AppError> {
        let _timer = DB_QUERY_DURATION.with_label_values(&["list"]).start_timer();
        let find_options = FindOptions::builder()
            .sort(doc! { "created_at": -1 })
            .build();

        let mut cursor = self
            .invoices()
            .find(scope_filter(scope), find_options)
            .await
            .map_err(AppError::from)?;

        let mut invoices = Vec::new();
        while let Some(doc) = cursor.try_next().await.map_err(AppError::from)? {
            invoices.push(StoredInvoice::from(doc));
        }

        Ok(invoices)
    }

    async fn subscribe(
        &self,
        scope: &CollectionScope,
    ) -> Result<watch::Receiver<Vec<StoredInvoice>>, AppError> {
        let (tx, rx) = watch::channel(self.list(scope).await?);

        let store = self.clone();
        let scope = scope.clone();
        tokio::spawn(async move {
            store.follow(scope, tx).await;
        });

        Ok(rx)
    }

    async fn health_check(&self) -> Result<(), AppError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| {
                tracing::error!("MongoDB health check failed: {}", e);
                AppError::from(e)
            })?;
        Ok(())
    }
}
