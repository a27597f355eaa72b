//! HTTP request handlers.

pub mod health;
pub mod index;

pub use health::{health_handler, metrics_handler, ready_handler};
pub use index::index_handler;
