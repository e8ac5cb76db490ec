//! Concrete adapter implementations

mod disk_file_saver;
mod reqwest_transport;

pub use disk_file_saver::DiskFileSaver;
pub use reqwest_transport::ReqwestTransport;
