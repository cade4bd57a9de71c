//! Raw TCP byte-stream transport.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex, MutexGuard};

use bytes::BytesMut;
use log::{debug, trace, warn};
use regex::bytes::Regex;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadHalf};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use super::config::DeviceConfig;
use crate::channel::{PatternBuffer, TelnetFilter};
use crate::error::{Result, TransportError};

/// Terminator appended to every command line.
pub const LINE_ENDING: &str = "\r";

type SharedWriter = Arc<Mutex<Box<dyn AsyncWrite + Send + Unpin>>>;

/// One connection to a device.
///
/// A background task reads the socket and appends the cleaned output to a
/// shared [`PatternBuffer`]. Nothing frames the responses; callers use the
/// prompt synchronizer to decide when a response is complete.
pub struct TcpTransport {
    /// `host:port` label for logs.
    peer: String,

    writer: SharedWriter,

    buffer: Arc<StdMutex<PatternBuffer>>,

    connected: Arc<AtomicBool>,

    reader: JoinHandle<()>,
}

impl TcpTransport {
    /// Connect to the device's CLI port.
    pub async fn connect(config: &DeviceConfig, search_depth: usize) -> Result<Self> {
        let timeout = config.timeouts.connect;
        let stream = tokio::time::timeout(
            timeout,
            TcpStream::connect((config.host.as_str(), config.port)),
        )
        .await
        .map_err(|_| TransportError::Timeout(timeout))?
        .map_err(|source| TransportError::ConnectionFailed {
            host: config.host.clone(),
            port: config.port,
            source,
        })?;

        if let Err(e) = stream.set_nodelay(true) {
            debug!("{}: could not set TCP_NODELAY: {}", config.socket_addr(), e);
        }

        debug!("{}: connected", config.socket_addr());
        Ok(Self::from_stream(stream, config.socket_addr(), search_depth))
    }

    /// Wrap an already-established byte stream.
    pub fn from_stream<S>(stream: S, peer: impl Into<String>, search_depth: usize) -> Self
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let peer = peer.into();
        let (read_half, write_half) = tokio::io::split(stream);
        let writer: SharedWriter = Arc::new(Mutex::new(Box::new(write_half)));
        let buffer = Arc::new(StdMutex::new(PatternBuffer::new(search_depth)));
        let connected = Arc::new(AtomicBool::new(true));

        let reader = tokio::spawn(read_loop(
            read_half,
            peer.clone(),
            buffer.clone(),
            writer.clone(),
            connected.clone(),
        ));

        Self {
            peer,
            writer,
            buffer,
            connected,
            reader,
        }
    }

    /// Send one command line, terminated by a carriage return.
    pub async fn send_line(&self, line: &str) -> Result<()> {
        if !self.is_connected() {
            return Err(TransportError::Disconnected.into());
        }

        let mut payload = Vec::with_capacity(line.len() + LINE_ENDING.len());
        payload.extend_from_slice(line.as_bytes());
        payload.extend_from_slice(LINE_ENDING.as_bytes());

        let mut writer = self.writer.lock().await;
        let written = match writer.write_all(&payload).await {
            Ok(()) => writer.flush().await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            self.connected.store(false, Ordering::SeqCst);
            return Err(TransportError::Io(e).into());
        }
        Ok(())
    }

    /// Read and clear everything received so far.
    pub fn take_buffer(&self) -> Vec<u8> {
        self.lock_buffer().take()
    }

    /// If the buffer tail matches `pattern`, consume the whole buffer.
    ///
    /// Returns the bytes before the match and the matched bytes. Anything
    /// after the match is discarded with the rest of the buffer.
    pub fn take_through(&self, pattern: &Regex) -> Option<(Vec<u8>, Vec<u8>)> {
        let mut buffer = self.lock_buffer();
        let range = buffer.find_tail(pattern)?;
        let mut data = buffer.take();
        data.truncate(range.end);
        let matched = data.split_off(range.start);
        Some((data, matched))
    }

    /// Check if the peer is still connected.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// `host:port` of the device.
    pub fn peer(&self) -> &str {
        &self.peer
    }

    /// Close the connection and stop the reader task.
    pub async fn disconnect(&mut self) {
        self.connected.store(false, Ordering::SeqCst);
        if let Err(e) = self.writer.lock().await.shutdown().await {
            trace!("{}: shutdown error ignored: {}", self.peer, e);
        }
        self.reader.abort();
        debug!("{}: disconnected", self.peer);
    }

    fn lock_buffer(&self) -> MutexGuard<'_, PatternBuffer> {
        self.buffer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for TcpTransport {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

async fn read_loop<S>(
    mut reader: ReadHalf<S>,
    peer: String,
    buffer: Arc<StdMutex<PatternBuffer>>,
    writer: SharedWriter,
    connected: Arc<AtomicBool>,
) where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let mut chunk = BytesMut::with_capacity(4096);
    let mut telnet = TelnetFilter::new();
    let mut data = Vec::with_capacity(4096);
    let mut replies = Vec::new();

    loop {
        chunk.clear();
        match reader.read_buf(&mut chunk).await {
            Ok(0) => {
                debug!("{}: peer closed the connection", peer);
                break;
            }
            Ok(_) => {
                data.clear();
                replies.clear();
                telnet.feed(&chunk, &mut data, &mut replies);

                if !data.is_empty() {
                    trace!("{} << {:?}", peer, String::from_utf8_lossy(&data));
                    buffer
                        .lock()
                        .unwrap_or_else(|poisoned| poisoned.into_inner())
                        .extend(&data);
                }

                if !replies.is_empty() {
                    let mut writer = writer.lock().await;
                    if let Err(e) = writer.write_all(&replies).await {
                        warn!("{}: failed to answer telnet negotiation: {}", peer, e);
                        break;
                    }
                }
            }
            Err(e) => {
                debug!("{}: read error: {}", peer, e);
                break;
            }
        }
    }

    connected.store(false, Ordering::SeqCst);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::duplex;

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    #[tokio::test]
    async fn test_inbound_bytes_accumulate() {
        let (client, mut device) = duplex(1024);
        let transport = TcpTransport::from_stream(client, "test", 1000);

        device.write_all(b"Login: ").await.unwrap();
        settle().await;

        assert_eq!(transport.take_buffer(), b"Login: ");
        assert!(transport.take_buffer().is_empty());
    }

    #[tokio::test]
    async fn test_send_line_appends_carriage_return() {
        let (client, mut device) = duplex(1024);
        let transport = TcpTransport::from_stream(client, "test", 1000);

        transport.send_line("show onu info").await.unwrap();

        let mut received = vec![0u8; 14];
        device.read_exact(&mut received).await.unwrap();
        assert_eq!(received, b"show onu info\r");
    }

    #[tokio::test]
    async fn test_take_through_discards_trailing_bytes() {
        let (client, mut device) = duplex(1024);
        let transport = TcpTransport::from_stream(client, "test", 1000);

        device.write_all(b"output\nOLT#noise").await.unwrap();
        settle().await;

        let pattern = Regex::new(r"OLT#").unwrap();
        let (before, prompt) = transport.take_through(&pattern).unwrap();
        assert_eq!(before, b"output\n");
        assert_eq!(prompt, b"OLT#");
        assert!(transport.take_buffer().is_empty());
    }

    #[tokio::test]
    async fn test_peer_close_marks_disconnected() {
        let (client, device) = duplex(1024);
        let transport = TcpTransport::from_stream(client, "test", 1000);

        drop(device);
        settle().await;

        assert!(!transport.is_connected());
        assert!(transport.send_line("enable").await.is_err());
    }

    #[tokio::test]
    async fn test_connect_refused() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let config = DeviceConfig::builder("olt", "127.0.0.1")
            .port(port)
            .username("admin")
            .build()
            .unwrap();
        let result = TcpTransport::connect(&config, 1000).await;
        assert!(matches!(
            result,
            Err(crate::Error::Transport(TransportError::ConnectionFailed { .. }))
        ));
    }
}
