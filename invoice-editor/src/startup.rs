use crate::config::EditorConfig;
use crate::editor::InvoiceEditor;
use crate::handlers;
use crate::services::{AuthSession, DocumentStore, MemoryStore, MongoStore, SessionProvider};
use axum::{
    middleware,
    routing::{get, patch, post, put},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::request_id_middleware;
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub config: EditorConfig,
    pub editor: Arc<InvoiceEditor>,
    pub store: Arc<dyn DocumentStore>,
}

pub struct Application {
    port: u16,
    server: Box<dyn std::future::Future<Output = std::io::Result<()>> + Send + Unpin>,
    state: AppState,
}

/// MongoDB when a URI is configured, otherwise an in-process store.
pub async fn connect_store(config: &EditorConfig) -> Result<Arc<dyn DocumentStore>, AppError> {
    match &config.mongodb.uri {
        Some(uri) => {
            let db = MongoStore::connect(uri, &config.mongodb.database)
                .await
                .map_err(|e| {
                    tracing::error!("Failed to connect to MongoDB: {}", e);
                    e
                })?;
            db.initialize_indexes().await.map_err(|e| {
                tracing::error!("Failed to initialize database indexes: {}", e);
                e
            })?;
            Ok(Arc::new(db))
        }
        None => {
            tracing::warn!("MONGODB_URI not set, saved invoices are kept in memory");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics_endpoint))
        .route("/invoice", get(handlers::get_invoice))
        .route("/invoice/customer", put(handlers::update_customer))
        .route("/invoice/items", post(handlers::add_item))
        .route(
            "/invoice/items/:id",
            patch(handlers::update_item).delete(handlers::remove_item),
        )
        .route("/invoice/save", post(handlers::save_invoice))
        .route("/invoice/print", get(handlers::print_invoice))
        .route("/invoices", get(handlers::list_invoices))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

impl Application {
    pub async fn build(config: EditorConfig) -> Result<Self, AppError> {
        let store = connect_store(&config).await?;
        let sessions = Arc::new(
            AuthSession::initialize(
                config.auth.jwt_secret.clone(),
                config.auth.initial_token.as_deref(),
            )
            .await,
        );

        Self::build_with(config, store, sessions).await
    }

    /// Build around already-constructed collaborators.
    pub async fn build_with(
        config: EditorConfig,
        store: Arc<dyn DocumentStore>,
        sessions: Arc<dyn SessionProvider>,
    ) -> Result<Self, AppError> {
        let editor = Arc::new(InvoiceEditor::new(
            config.editor.clone(),
            store.clone(),
            sessions,
        ));

        let state = AppState {
            config: config.clone(),
            editor,
            store,
        };

        let app = router(state.clone());

        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Listening on {}", port);

        let server = axum::serve(listener, app);

        Ok(Self {
            port,
            server: Box::new(server.into_future()),
            state,
        })
    }

    pub fn editor(&self) -> &Arc<InvoiceEditor> {
        &self.state.editor
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.server.await
    }
}
