//! # Oltscope
//!
//! Async CLI client for locating subscriber units (ONUs) on EPON OLTs.
//!
//! Oltscope logs into an OLT's command-line interface over a raw TCP byte
//! stream, walks the configured EPON ports, and finds the unit whose
//! description label matches a query. The result carries the unit's status
//! row and, optionally, its optical diagnostics and link state.
//!
//! ## Features
//!
//! - Prompt-synchronized command execution over plain TCP/telnet
//! - Efficient pattern buffer matching (tail search)
//! - Login, privilege escalation and interface context navigation
//! - Parsers tolerant of missing columns and firmware typos
//! - One pooled session per device, reused while fresh
//! - Short-lived result cache
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use oltscope::{DeviceConfig, OltClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), oltscope::Error> {
//!     let config = DeviceConfig::builder("olt-centro", "192.168.1.1")
//!         .username("admin")
//!         .password("secret")
//!         .enable_password("enable-secret")
//!         .build()?;
//!
//!     let client = OltClient::new(config)?;
//!     if let Some(info) = client.get_unit_info("rogersaade").await? {
//!         println!("{}", info);
//!     }
//!
//!     client.close().await;
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod channel;
pub mod driver;
pub mod error;
pub mod fleet;
pub mod model;
pub mod parse;
pub mod platform;
pub mod pool;
pub mod query;
pub mod report;
pub mod transport;

// Re-export main types for convenience
pub use cache::ResultCache;
pub use driver::{CliSession, Response};
pub use error::Error;
pub use fleet::Fleet;
pub use model::{LinkState, LinkStatus, OnuId, OnuInfo, OnuState, OnuStatus, OpticalDiagnostics};
pub use platform::OltDialect;
pub use query::{ClientOptions, OltClient};
pub use report::format_report;
pub use transport::{DeviceConfig, Timeouts};
