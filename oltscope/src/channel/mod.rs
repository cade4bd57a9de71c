//! Channel layer: output buffering, telnet filtering and prompt synchronization.
//!
//! Everything between raw socket bytes and "the response to this command is
//! complete" lives here.

mod buffer;
mod patterns;
pub mod sync;
mod telnet;

pub use buffer::PatternBuffer;
pub use patterns::{compile_prompt_pattern, contains_port_token};
pub use sync::{Capture, PromptSync, wait_until};
pub use telnet::TelnetFilter;
