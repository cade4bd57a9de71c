//! EPON OLT dialect.
//!
//! The command set and prompts of the EPON head-ends this crate targets.
//!
//! # Prompt Examples
//!
//! ```text
//! Login:                         # login
//! Password:                      # login / enable password
//! OLT>                           # user exec
//! OLT#                           # privileged exec
//! OLT(config)#                   # global configuration
//! OLT(config-pon-0/1)#           # interface epon 0/1
//! ```
//!
//! # Session Path
//!
//! ```text
//! Login ─► Password ─► OLT> ─enable─► Password ─► OLT# ─terminal length 0─► OLT#
//!
//! OLT# ─configure terminal─► OLT(config)# ─interface epon 0/N─► OLT(config-pon-0/N)#
//!  ▲                                                                      │
//!  └──────────────────────────────── end ◄────────────────────────────────┘
//! ```

use super::definition::{Commands, DialectBuilder, OltDialect};
use crate::error::Result;

/// Builder preloaded with the EPON dialect, for callers that need to tweak it.
pub fn builder() -> DialectBuilder {
    OltDialect::builder("epon")
        .with_commands(Commands {
            enable: "enable".to_string(),
            disable_paging: "terminal length 0".to_string(),
            configure: "configure terminal".to_string(),
            interface: "interface epon {port}".to_string(),
            exit_context: "end".to_string(),
            status_listing: "show onu info".to_string(),
            description: "show onu {onu} description".to_string(),
            optical: "show onu {onu} optical-transceiver-diagnosis".to_string(),
            link_state: "show onu {onu} port-state".to_string(),
        })
        .with_failure_pattern("% Unknown command")
        .with_failure_pattern("% Invalid input")
        .with_failure_pattern("% Incomplete command")
        .with_failure_pattern("% ONU is not exist")
}

/// Create the EPON dialect.
pub fn dialect() -> Result<OltDialect> {
    builder().build()
}
