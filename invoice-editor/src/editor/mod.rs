//! The editing session: draft invoice, save state and injected collaborators.

mod draft;
mod save;

pub use draft::{generate_invoice_no, InvoiceDraft};
pub use save::{SaveState, SaveTracker};

use chrono::Local;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};

use crate::models::{Currency, InvoiceRecord, ItemField, LineItem, LineItemId, StoredInvoice};
use crate::print::{PrintHeader, PrintTemplate};
use crate::services::calculation::Calculation;
use crate::services::line_items::RemovalPolicy;
use crate::services::metrics::{ERRORS_TOTAL, INVOICE_AMOUNT_TOTAL, SAVES_TOTAL, SAVE_DURATION};
use crate::services::session::{Session, SessionProvider};
use crate::services::store::{CollectionScope, DocumentStore};
use service_core::error::AppError;

#[derive(Debug, Clone)]
pub struct EditorSettings {
    pub app_id: String,
    /// Nest saved invoices under the session's user id.
    pub scope_by_user: bool,
    pub removal_policy: RemovalPolicy,
    /// How long `saved` is shown before returning to `idle`.
    pub ack_timeout: Duration,
    pub seed_first_item: bool,
    pub default_currency: Currency,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            app_id: "invoice-app".to_string(),
            scope_by_user: true,
            removal_policy: RemovalPolicy::KeepLast,
            ack_timeout: Duration::from_millis(2000),
            seed_first_item: true,
            default_currency: Currency::Myr,
        }
    }
}

/// Result of [`InvoiceEditor::save`]. Failures are logged, never returned.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SaveOutcome {
    Saved { invoice: StoredInvoice },
    /// No session; nothing was written.
    Skipped,
    /// Another save is still running; nothing was written.
    InFlight,
    Failed,
}

/// Current draft together with its computed amounts.
#[derive(Debug, Clone, Serialize)]
pub struct EditorView {
    pub invoice_no: String,
    pub customer_name: String,
    pub customer_email: String,
    pub currency: Currency,
    pub items: Vec<LineItem>,
    pub calculation: Calculation,
    pub save_state: SaveState,
}

#[derive(Debug)]
struct EditorState {
    draft: InvoiceDraft,
    save: SaveTracker,
}

pub struct InvoiceEditor {
    state: Arc<Mutex<EditorState>>,
    store: Arc<dyn DocumentStore>,
    sessions: Arc<dyn SessionProvider>,
    settings: EditorSettings,
}

impl InvoiceEditor {
    pub fn new(
        settings: EditorSettings,
        store: Arc<dyn DocumentStore>,
        sessions: Arc<dyn SessionProvider>,
    ) -> Self {
        let draft = if settings.seed_first_item {
            InvoiceDraft::seeded(settings.default_currency, settings.removal_policy)
        } else {
            InvoiceDraft::new(settings.default_currency, settings.removal_policy)
        };
        tracing::info!(invoice_no = %draft.invoice_no(), "Started invoice session");

        Self {
            state: Arc::new(Mutex::new(EditorState {
                draft,
                save: SaveTracker::default(),
            })),
            store,
            sessions,
            settings,
        }
    }

    pub fn settings(&self) -> &EditorSettings {
        &self.settings
    }

    pub async fn view(&self) -> EditorView {
        let state = self.state.lock().await;
        let draft = &state.draft;
        EditorView {
            invoice_no: draft.invoice_no().to_string(),
            customer_name: draft.customer_name.clone(),
            customer_email: draft.customer_email.clone(),
            currency: draft.currency,
            items: draft.items.items().to_vec(),
            calculation: draft.calculate(),
            save_state: state.save.state(),
        }
    }

    pub async fn save_state(&self) -> SaveState {
        self.state.lock().await.save.state()
    }

    pub async fn add_item(&self) -> LineItemId {
        let id = self.state.lock().await.draft.items.add_item();
        tracing::debug!(item_id = %id, "Added line item");
        id
    }

    /// Returns false when no item has `id`; the draft is left unchanged.
    pub async fn update_item(&self, id: LineItemId, field: ItemField, value: String) -> bool {
        let updated = self
            .state
            .lock()
            .await
            .draft
            .items
            .update_item(id, field, value);
        if !updated {
            tracing::debug!(item_id = %id, "Ignoring update for unknown line item");
        }
        updated
    }

    /// Returns false when nothing was removed.
    pub async fn remove_item(&self, id: LineItemId) -> bool {
        let removed = self.state.lock().await.draft.items.remove_item(id);
        tracing::debug!(item_id = %id, removed, "Remove line item");
        removed
    }

    pub async fn set_customer_name(&self, name: String) {
        self.state.lock().await.draft.customer_name = name;
    }

    pub async fn set_customer_email(&self, email: String) {
        self.state.lock().await.draft.customer_email = email;
    }

    pub async fn set_currency(&self, currency: Currency) {
        self.state.lock().await.draft.currency = currency;
    }

    /// Printable page of the draft exactly as it is now.
    pub async fn print(&self, header: &PrintHeader) -> PrintTemplate {
        let state = self.state.lock().await;
        PrintTemplate::new(&state.draft, header, Local::now().date_naive())
    }

    /// Append a snapshot of the draft to the document store.
    ///
    /// Edits made while the write is in flight are kept in the draft but are
    /// not part of the snapshot being written. The write and the state change
    /// after it run on a spawned task and finish even if this future is dropped.
    pub async fn save(&self) -> SaveOutcome {
        let Some(session) = self.sessions.current().await else {
            tracing::debug!("No session, skipping save");
            SAVES_TOTAL.with_label_values(&["skipped"]).inc();
            return SaveOutcome::Skipped;
        };

        let (record, generation) = {
            let mut state = self.state.lock().await;
            if state.save.is_saving() {
                tracing::debug!("Save already in flight");
                SAVES_TOTAL.with_label_values(&["in_flight"]).inc();
                return SaveOutcome::InFlight;
            }
            let generation = state.save.begin();
            (state.draft.snapshot(), generation)
        };

        let write = tokio::spawn(persist(
            Arc::clone(&self.state),
            Arc::clone(&self.store),
            self.scope_for(&session),
            record,
            generation,
            self.settings.ack_timeout,
        ));

        match write.await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(error = %e, "Save task did not complete");
                self.state.lock().await.save.fail(generation);
                SAVES_TOTAL.with_label_values(&["failed"]).inc();
                ERRORS_TOTAL.with_label_values(&["save"]).inc();
                SaveOutcome::Failed
            }
        }
    }

    /// Saved invoices in the session's scope, newest first. Empty without a
    /// session.
    pub async fn saved_invoices(&self) -> Result<Vec<StoredInvoice>, AppError> {
        match self.sessions.current().await {
            Some(session) => self.store.list(&self.scope_for(&session)).await,
            None => Ok(Vec::new()),
        }
    }

    /// Live, read-only feed of saved invoices. `None` without a session.
    pub async fn subscribe_saved(
        &self,
    ) -> Result<Option<watch::Receiver<Vec<StoredInvoice>>>, AppError> {
        match self.sessions.current().await {
            Some(session) => Ok(Some(
                self.store.subscribe(&self.scope_for(&session)).await?,
            )),
            None => Ok(None),
        }
    }

    fn scope_for(&self, session: &Session) -> CollectionScope {
        let user_id = self
            .settings
            .scope_by_user
            .then(|| session.user_id.clone());
        CollectionScope::new(self.settings.app_id.clone(), user_id)
    }
}

/// Write `record` and move the save state on to `saved` or back to `idle`.
async fn persist(
    state: Arc<Mutex<EditorState>>,
    store: Arc<dyn DocumentStore>,
    scope: CollectionScope,
    record: InvoiceRecord,
    generation: u64,
    ack_timeout: Duration,
) -> SaveOutcome {
    let timer = SAVE_DURATION.start_timer();
    let result = store.append(&scope, &record).await;
    timer.observe_duration();

    match result {
        Ok(stored) => {
            state.lock().await.save.complete(generation);
            schedule_acknowledgement(state, generation, ack_timeout);

            SAVES_TOTAL.with_label_values(&["saved"]).inc();
            if let Some(amount) = record.totals.total.to_f64().filter(|a| *a > 0.0) {
                INVOICE_AMOUNT_TOTAL
                    .with_label_values(&[record.currency.as_str()])
                    .inc_by(amount);
            }
            tracing::info!(
                invoice_id = %stored.id,
                invoice_no = %stored.record.invoice_no,
                scope = %scope.path(),
                total = %record.totals.total,
                "Invoice saved"
            );

            SaveOutcome::Saved { invoice: stored }
        }
        Err(e) => {
            tracing::error!(
                error = %e,
                invoice_no = %record.invoice_no,
                scope = %scope.path(),
                "Error saving invoice"
            );
            state.lock().await.save.fail(generation);
            SAVES_TOTAL.with_label_values(&["failed"]).inc();
            ERRORS_TOTAL.with_label_values(&["save"]).inc();
            SaveOutcome::Failed
        }
    }
}

fn schedule_acknowledgement(state: Arc<Mutex<EditorState>>, generation: u64, delay: Duration) {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        state.lock().await.save.acknowledge(generation);
    });
}
