//! Desktop chat client for the HealthBot advice service.

pub mod api;
pub mod config;
pub mod formatter;
pub mod history;
pub mod quick_actions;
pub mod state;
pub mod store;

pub use formatter::{format, FormatOptions, Formatter};
