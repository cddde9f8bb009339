//! Infrastructure implementations.
//!
//! Pack store backends behind the `RecordStore` port, id generation,
//! configuration and the loaders for files around a module.

pub mod config;
pub mod files;
pub mod ids;
pub mod ports;
pub mod stores;
