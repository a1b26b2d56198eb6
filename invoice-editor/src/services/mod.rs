//! Services module for invoice-editor.

pub mod calculation;
pub mod database;
pub mod line_items;
pub mod metrics;
pub mod session;
pub mod store;

pub use calculation::{calculate, coerce, format_money, Calculation, LineAmount};
pub use database::MongoStore;
pub use line_items::{LineItemStore, RemovalPolicy};
pub use metrics::{get_metrics, init_metrics};
pub use session::{AuthSession, Session, SessionProvider};
pub use store::{CollectionScope, DocumentStore, MemoryStore};
