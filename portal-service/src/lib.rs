//! Decor events portal: event bookkeeping, invoicing, and the operator
//! dashboard over a shared MongoDB store.

pub mod config;
pub mod dtos;
pub mod forms;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod startup;
pub mod utils;

pub use startup::{build_router, AppState, Application};
