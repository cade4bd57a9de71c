//! Entering and leaving EPON interface contexts.

use std::time::Duration;

use log::debug;

use super::session::CliSession;
use crate::channel::contains_port_token;
use crate::error::{Result, SessionError};

fn navigation_error(port: &str, reason: impl Into<String>) -> crate::Error {
    SessionError::ContextNavigation {
        port: port.to_string(),
        reason: reason.into(),
    }
    .into()
}

impl CliSession {
    /// Go from privileged exec into the interface context of `port`.
    ///
    /// Succeeds only if the interface prompt that comes back names `port`.
    pub async fn enter_interface(&self, port: &str, timeout: Duration) -> Result<()> {
        let prompts = &self.dialect().prompts;

        let capture = self
            .send_and_expect(&self.dialect().commands.configure, &prompts.config, timeout)
            .await?;
        if !capture.matched {
            return Err(navigation_error(port, "configuration prompt not observed"));
        }

        let command = self.dialect().interface_command(port);
        let capture = self
            .send_and_expect(&command, &prompts.interface, timeout)
            .await?;
        if !capture.matched {
            return Err(navigation_error(port, "interface prompt not observed"));
        }
        if !contains_port_token(&capture.prompt, port) {
            return Err(navigation_error(
                port,
                format!("prompt '{}' does not name the port", capture.prompt),
            ));
        }

        debug!("{}: entered {}", self.peer(), capture.prompt);
        Ok(())
    }

    /// Leave the interface context back to privileged exec.
    pub async fn exit_interface(&self, port: &str, timeout: Duration) -> Result<()> {
        let capture = self
            .send_and_expect(
                &self.dialect().commands.exit_context,
                &self.dialect().prompts.privileged,
                timeout,
            )
            .await?;
        if !capture.matched {
            return Err(navigation_error(port, "privileged prompt not observed on exit"));
        }
        Ok(())
    }
}
