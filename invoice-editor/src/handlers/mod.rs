pub mod health;
pub mod invoice;

pub use health::{health_check, metrics_endpoint, readiness_check};
pub use invoice::{
    add_item, get_invoice, list_invoices, print_invoice, remove_item, save_invoice,
    update_customer, update_item,
};
