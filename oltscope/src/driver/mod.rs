//! Session driver.
//!
//! The driver layer runs the CLI state machine over a transport: sending
//! commands, logging in, and moving between interface contexts.

mod context;
mod login;
pub(crate) mod response;
mod session;

pub use response::Response;
pub use session::CliSession;
