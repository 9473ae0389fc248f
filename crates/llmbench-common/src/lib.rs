//! Common types for llmbench
//!
//! Device handles, device-kind classification and the error type shared by
//! the device-detection, engine and CLI crates.

pub mod device;
pub mod error;

pub use device::{Device, DeviceKind, MemoryModel};
pub use error::{BenchError, Result};
