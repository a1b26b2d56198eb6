//! invoice-editor: a single-session invoice editor.
//!
//! Line items are edited as raw text, totals are derived on demand, and each
//! save appends an immutable snapshot to a document store.

pub mod config;
pub mod dtos;
pub mod editor;
pub mod handlers;
pub mod models;
pub mod print;
pub mod services;
pub mod startup;
