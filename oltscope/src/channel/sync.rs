//! Prompt synchronization.
//!
//! The device stream has no message framing. A response counts as complete
//! once a prompt pattern shows up at the tail of the accumulated output; the
//! synchronizer polls for that and hands the captured text over exactly once.

use std::time::Duration;

use log::trace;
use regex::bytes::Regex;
use tokio::time::Instant;

use crate::transport::TcpTransport;

/// Default interval between buffer inspections.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Poll `probe` until it yields a value or `timeout` elapses.
///
/// Returns `None` on timeout; timing out is not an error.
pub async fn wait_until<T, F>(mut probe: F, timeout: Duration, poll_interval: Duration) -> Option<T>
where
    F: FnMut() -> Option<T>,
{
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(value) = probe() {
            return Some(value);
        }
        let now = Instant::now();
        if now >= deadline {
            return None;
        }
        tokio::time::sleep(poll_interval.min(deadline - now)).await;
    }
}

/// Text captured between two synchronization points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capture {
    /// Output preceding the prompt (or everything, when unmatched).
    pub text: String,

    /// The matched prompt, trimmed. Empty when unmatched.
    pub prompt: String,

    /// Whether the prompt pattern was observed before the timeout.
    pub matched: bool,
}

impl Capture {
    fn matched(before: &[u8], prompt: &[u8]) -> Self {
        Self {
            text: String::from_utf8_lossy(before).into_owned(),
            prompt: String::from_utf8_lossy(prompt).trim().to_string(),
            matched: true,
        }
    }

    fn partial(data: &[u8]) -> Self {
        Self {
            text: String::from_utf8_lossy(data).into_owned(),
            prompt: String::new(),
            matched: false,
        }
    }
}

/// Waits for prompts on a transport's buffer.
#[derive(Debug, Clone, Copy)]
pub struct PromptSync {
    poll_interval: Duration,
}

impl PromptSync {
    pub fn new(poll_interval: Duration) -> Self {
        Self { poll_interval }
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Wait until `pattern` matches the buffer tail, then consume the buffer.
    ///
    /// On timeout, or when the peer has gone away, everything captured so
    /// far is returned with `matched == false`.
    pub async fn read_until(
        &self,
        transport: &TcpTransport,
        pattern: &Regex,
        timeout: Duration,
    ) -> Capture {
        let mut peer_gone = false;
        let found = wait_until(
            || {
                if let Some((before, prompt)) = transport.take_through(pattern) {
                    return Some(Capture::matched(&before, &prompt));
                }
                if !transport.is_connected() {
                    // One last look, the reader may have appended before closing.
                    peer_gone = true;
                    return Some(match transport.take_through(pattern) {
                        Some((before, prompt)) => Capture::matched(&before, &prompt),
                        None => Capture::partial(&transport.take_buffer()),
                    });
                }
                None
            },
            timeout,
            self.poll_interval,
        )
        .await;

        match found {
            Some(capture) => {
                if peer_gone && !capture.matched {
                    trace!("{}: peer gone while waiting for {}", transport.peer(), pattern);
                }
                capture
            }
            None => {
                trace!(
                    "{}: timed out after {:?} waiting for {}",
                    transport.peer(),
                    timeout,
                    pattern
                );
                Capture::partial(&transport.take_buffer())
            }
        }
    }
}

impl Default for PromptSync {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL)
    }
}
