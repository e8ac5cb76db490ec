//! Port definitions (interfaces)
//!
//! Ports define the boundaries between the data-access core and external
//! systems. Each port is a trait implemented by an adapter in the
//! infrastructure layer.

mod file_saver;
mod transport;

pub use file_saver::{FileSaver, FileSaverError};
pub use transport::{CallOptions, Payload, Transport, TransportFailure, TransportResult, TransportStream};
