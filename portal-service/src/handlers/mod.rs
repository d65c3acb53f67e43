pub mod auth;
pub mod events;
pub mod health;
pub mod invoices;
pub mod metrics;
pub mod pages;
