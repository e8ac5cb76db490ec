//! Relay Application - The data-access core
//!
//! This crate provides:
//! - [`ApiDispatcher`]: one transport call per request, failure
//!   classification, and republication on the shared [`ApiEvents`]
//!   channels
//! - [`CrudClient`]: a generic collection facade over one remote
//!   resource
//! - [`SearchController`]: pagination/search state with a coalescing,
//!   latest-trigger-wins reload pipeline
//!
//! External systems are reached only through the port traits in
//! [`ports`]; adapters live in `relay-infrastructure`.

pub mod config;
pub mod crud;
pub mod dispatcher;
pub mod error;
pub mod events;
pub mod ports;
pub mod search;

pub use config::{ApiConfig, BASE_URL_ENV};
pub use crud::CrudClient;
pub use dispatcher::{ApiDispatcher, ResultStream, SPREADSHEET_MIME};
pub use error::{ApiError, ApiResult};
pub use events::ApiEvents;
pub use search::SearchController;
