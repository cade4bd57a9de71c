//! Dialect definitions.
//!
//! A dialect bundles the prompt patterns and the fixed command set used to
//! drive one family of OLT CLIs.

mod definition;
pub mod epon;

pub use definition::{Commands, DialectBuilder, OltDialect, Prompts};
