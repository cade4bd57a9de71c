//! Byte-stream transport layer.
//!
//! This module owns the TCP connection to a device: connection setup with a
//! timeout, line-oriented writes, and the background reader that feeds the
//! pattern buffer.

pub mod config;
mod tcp;

pub use config::{DeviceConfig, DeviceConfigBuilder, Timeouts};
pub use tcp::{LINE_ENDING, TcpTransport};
