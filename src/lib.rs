//! clientdesk — client-relationship and service-billing core.
//!
//! Tracks companies ("clients"), the recurring services billed to them,
//! account-manager assignments, and work logs, and derives invoices and
//! revenue reports. This crate is the data/business-rule layer every
//! surrounding page consumes; routing, forms, and rendering live elsewhere.

pub mod autosave;
pub mod error;
pub mod persist;
pub mod services;
pub mod state;
pub mod store;
pub mod types;
pub mod util;

pub use error::AppError;
pub use state::{AppState, Config};
pub use store::Store;
