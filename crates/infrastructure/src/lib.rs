//! Relay Infrastructure - Adapters and implementations
//!
//! This crate provides concrete implementations of the ports defined in
//! the application layer: a reqwest-backed transport and a disk-backed
//! file saver.

pub mod adapters;

pub use adapters::{DiskFileSaver, ReqwestTransport};
