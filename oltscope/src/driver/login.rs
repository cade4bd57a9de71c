//! Login and privilege escalation.
//!
//! ```text
//! Connected ─► AwaitLogin ─► AwaitPassword ─► AwaitExec ─┬─► AwaitEnablePassword ─► Privileged
//!                                                        └─(already #)──────────────► Privileged
//! Privileged ─terminal length 0─► Ready
//! ```
//!
//! Every arrow waits for one prompt within the login timeout. A prompt that
//! does not show up ends the sequence with [`SessionError::Authentication`]
//! naming the stage.

use log::{debug, info};
use secrecy::ExposeSecret;

use super::session::CliSession;
use crate::channel::Capture;
use crate::error::{LoginStage, Result, SessionError};
use crate::transport::DeviceConfig;

impl CliSession {
    /// Log in, escalate to privileged exec and disable pagination.
    ///
    /// Must be called once, right after [`CliSession::connect`].
    pub async fn authenticate(&self, config: &DeviceConfig) -> Result<()> {
        let prompts = &self.dialect().prompts;
        let commands = &self.dialect().commands;
        let timeout = config.timeouts.login;
        let check = |capture: &Capture, stage: LoginStage| -> Result<()> {
            if capture.matched {
                Ok(())
            } else {
                Err(SessionError::Authentication {
                    user: config.username.clone(),
                    stage,
                }
                .into())
            }
        };

        let banner = self.expect(&prompts.login, timeout).await;
        check(&banner, LoginStage::LoginPrompt)?;

        let capture = self
            .send_and_expect(&config.username, &prompts.password, timeout)
            .await?;
        check(&capture, LoginStage::PasswordPrompt)?;

        let capture = self
            .send_secret(config.password.expose_secret(), &prompts.exec, timeout)
            .await?;
        check(&capture, LoginStage::UserPrompt)?;

        if prompts.privileged.is_match(capture.prompt.as_bytes()) {
            debug!("{}: already privileged after login", self.peer());
        } else {
            let capture = self
                .send_and_expect(&commands.enable, &prompts.password, timeout)
                .await?;
            check(&capture, LoginStage::EnablePasswordPrompt)?;

            let capture = self
                .send_secret(config.enable_password.expose_secret(), &prompts.exec, timeout)
                .await?;
            // A wrong enable password drops back to the user prompt.
            let privileged = capture.matched && prompts.privileged.is_match(capture.prompt.as_bytes());
            if !privileged {
                return Err(SessionError::Authentication {
                    user: config.username.clone(),
                    stage: LoginStage::PrivilegedPrompt,
                }
                .into());
            }
        }

        let capture = self
            .send_and_expect(&commands.disable_paging, &prompts.privileged, config.timeouts.command)
            .await?;
        check(&capture, LoginStage::Pagination)?;

        info!("{}: logged in as {}", self.peer(), config.username);
        Ok(())
    }
}
