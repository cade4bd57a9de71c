//! A CLI session: one transport plus the dialect used to talk over it.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, trace, warn};
use regex::bytes::Regex;

use super::response::Response;
use crate::channel::{Capture, PromptSync};
use crate::error::{Result, SessionError, TransportError};
use crate::platform::OltDialect;
use crate::transport::{DeviceConfig, TcpTransport};

/// Connected CLI session to one OLT.
///
/// Every exchange is "send a line, then wait for a prompt". The session does
/// not track which CLI state the device is in; the login and context code
/// pick the prompt to wait for.
pub struct CliSession {
    transport: TcpTransport,
    dialect: Arc<OltDialect>,
    sync: PromptSync,
}

impl CliSession {
    /// Open a TCP connection to the device.
    pub async fn connect(
        config: &DeviceConfig,
        dialect: Arc<OltDialect>,
        sync: PromptSync,
    ) -> Result<Self> {
        let transport = TcpTransport::connect(config, dialect.search_depth).await?;
        Ok(Self::from_transport(transport, dialect, sync))
    }

    pub fn from_transport(transport: TcpTransport, dialect: Arc<OltDialect>, sync: PromptSync) -> Self {
        Self {
            transport,
            dialect,
            sync,
        }
    }

    pub fn dialect(&self) -> &OltDialect {
        &self.dialect
    }

    pub fn peer(&self) -> &str {
        self.transport.peer()
    }

    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    /// Wait for `pattern` without sending anything.
    pub async fn expect(&self, pattern: &Regex, timeout: Duration) -> Capture {
        self.sync.read_until(&self.transport, pattern, timeout).await
    }

    /// Send `input` and wait for `pattern`.
    ///
    /// Only a failed write is an error; an unmatched prompt comes back as a
    /// capture with `matched == false`.
    pub async fn send_and_expect(
        &self,
        input: &str,
        pattern: &Regex,
        timeout: Duration,
    ) -> Result<Capture> {
        debug!("{} >> {}", self.peer(), input);
        self.drain_stale();
        self.transport.send_line(input).await?;
        Ok(self.expect(pattern, timeout).await)
    }

    /// Same as [`send_and_expect`](Self::send_and_expect), with `input` masked in logs.
    pub async fn send_secret(
        &self,
        input: &str,
        pattern: &Regex,
        timeout: Duration,
    ) -> Result<Capture> {
        debug!("{} >> ********", self.peer());
        self.drain_stale();
        self.transport.send_line(input).await?;
        Ok(self.expect(pattern, timeout).await)
    }

    /// Send a command and wait for `pattern`.
    ///
    /// A reply slower than `timeout` gets one more `timeout` to finish; its
    /// output is joined to what arrived first. If the prompt still has not
    /// shown up the stream can no longer be matched to commands, and this
    /// fails with [`SessionError::OutOfSync`]. A peer that went away fails
    /// with [`TransportError::Disconnected`].
    pub async fn send_command(
        &self,
        command: &str,
        pattern: &Regex,
        timeout: Duration,
    ) -> Result<Response> {
        let mut capture = self.send_and_expect(command, pattern, timeout).await?;

        if !capture.matched {
            if !self.transport.is_connected() {
                return Err(TransportError::Disconnected.into());
            }
            warn!(
                "{}: no prompt after '{}' within {:?}, waiting for a late reply",
                self.peer(),
                command,
                timeout
            );
            let late = self.expect(pattern, timeout).await;
            if !late.matched {
                if !self.transport.is_connected() {
                    return Err(TransportError::Disconnected.into());
                }
                return Err(SessionError::OutOfSync {
                    command: command.to_string(),
                }
                .into());
            }
            capture.text.push_str(&late.text);
            capture.prompt = late.prompt;
        }

        let result = self.dialect.normalize_output(&capture.text, command);
        let failure_message = self.dialect.detect_failure(&result);
        if let Some(message) = &failure_message {
            debug!("{}: '{}' rejected: {}", self.peer(), command, message);
        }

        Ok(Response {
            command: command.to_string(),
            result,
            prompt: capture.prompt,
            failure_message,
        })
    }

    /// Throw away output nobody asked for, so the next prompt seen belongs
    /// to the next command.
    fn drain_stale(&self) {
        let stale = self.transport.take_buffer();
        if !stale.is_empty() {
            trace!(
                "{}: discarding stale output {:?}",
                self.peer(),
                String::from_utf8_lossy(&stale)
            );
        }
    }

    /// Close the connection.
    pub async fn disconnect(&mut self) {
        self.transport.disconnect().await;
    }
}

impl std::fmt::Debug for CliSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CliSession")
            .field("peer", &self.transport.peer())
            .field("dialect", &self.dialect.name)
            .field("connected", &self.transport.is_connected())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::epon;
    use tokio::io::{AsyncReadExt, AsyncWriteExt, duplex};

    fn session(stream: tokio::io::DuplexStream) -> CliSession {
        let dialect = Arc::new(epon::dialect().unwrap());
        let transport = TcpTransport::from_stream(stream, "test", dialect.search_depth);
        CliSession::from_transport(transport, dialect, PromptSync::new(Duration::from_millis(10)))
    }

    #[tokio::test]
    async fn test_send_command_strips_echo_and_prompt() {
        let (client, mut device) = duplex(4096);
        let session = session(client);

        tokio::spawn(async move {
            let mut line = vec![0u8; 14];
            device.read_exact(&mut line).await.unwrap();
            device
                .write_all(b"show onu info\r\nEPON0/1:1 online\r\nOLT(config-pon-0/1)# ")
                .await
                .unwrap();
            tokio::time::sleep(Duration::from_millis(200)).await;
        });

        let pattern = session.dialect().prompts.interface.clone();
        let response = session
            .send_command("show onu info", &pattern, Duration::from_secs(1))
            .await
            .unwrap();

        assert!(response.is_success());
        assert_eq!(response.result, "EPON0/1:1 online\n");
        assert_eq!(response.prompt, "OLT(config-pon-0/1)#");
    }

    #[tokio::test]
    async fn test_rejected_command_is_flagged() {
        let (client, mut device) = duplex(4096);
        let session = session(client);

        tokio::spawn(async move {
            let mut line = vec![0u8; 6];
            device.read_exact(&mut line).await.unwrap();
            device
                .write_all(b"bogus\n% Unknown command.\nOLT# ")
                .await
                .unwrap();
            tokio::time::sleep(Duration::from_millis(200)).await;
        });

        let pattern = session.dialect().prompts.privileged.clone();
        let response = session
            .send_command("bogus", &pattern, Duration::from_secs(1))
            .await
            .unwrap();
        assert!(!response.is_success());
    }

    #[tokio::test]
    async fn test_dropped_peer_is_an_error() {
        let (client, mut device) = duplex(4096);
        let session = session(client);

        tokio::spawn(async move {
            let mut line = vec![0u8; 14];
            device.read_exact(&mut line).await.unwrap();
            device.write_all(b"partial").await.unwrap();
        });

        let pattern = session.dialect().prompts.privileged.clone();
        let result = session
            .send_command("show onu info", &pattern, Duration::from_secs(2))
            .await;
        assert!(matches!(
            result,
            Err(crate::Error::Transport(TransportError::Disconnected))
        ));
    }

    #[tokio::test]
    async fn test_late_reply_is_joined() {
        let (client, mut device) = duplex(4096);
        let session = session(client);

        tokio::spawn(async move {
            let mut line = vec![0u8; 14];
            device.read_exact(&mut line).await.unwrap();
            device.write_all(b"show onu info\r\nEPON0/1:1 ").await.unwrap();
            tokio::time::sleep(Duration::from_millis(300)).await;
            device.write_all(b"online\r\nOLT# ").await.unwrap();
            tokio::time::sleep(Duration::from_millis(300)).await;
        });

        let pattern = session.dialect().prompts.privileged.clone();
        let response = session
            .send_command("show onu info", &pattern, Duration::from_millis(200))
            .await
            .unwrap();
        assert_eq!(response.result, "EPON0/1:1 online\n");
        assert_eq!(response.prompt, "OLT#");
    }

    #[tokio::test]
    async fn test_missing_prompt_is_out_of_sync() {
        let (client, mut device) = duplex(4096);
        let session = session(client);

        device.write_all(b"EPON0/1:1 online").await.unwrap();
        let pattern = session.dialect().prompts.privileged.clone();
        let result = session
            .send_command("show onu info", &pattern, Duration::from_millis(50))
            .await;

        assert!(matches!(
            result,
            Err(crate::Error::Session(SessionError::OutOfSync { .. }))
        ));
        drop(device);
    }

    #[tokio::test]
    async fn test_stale_output_is_dropped_before_send() {
        let (client, mut device) = duplex(4096);
        let session = session(client);

        device.write_all(b"old reply\r\nOLT# ").await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        tokio::spawn(async move {
            let mut line = vec![0u8; 14];
            device.read_exact(&mut line).await.unwrap();
            device
                .write_all(b"show onu info\r\nEPON0/1:2 online\r\nOLT# ")
                .await
                .unwrap();
            tokio::time::sleep(Duration::from_millis(200)).await;
        });

        let pattern = session.dialect().prompts.privileged.clone();
        let response = session
            .send_command("show onu info", &pattern, Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(response.result, "EPON0/1:2 online\n");
    }
}
