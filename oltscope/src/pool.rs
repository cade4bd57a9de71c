//! Per-device session pool.
//!
//! Each device gets at most one live CLI session. The session is reused
//! while it stays connected and has been used within the idle TTL; anything
//! else triggers a fresh connect and login. The slot is held for the whole
//! duration of a query so commands from two queries never interleave on the
//! same stream.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use log::{debug, info, warn};
use tokio::sync::{Mutex, MutexGuard};
use tokio::time::Instant;

use crate::channel::PromptSync;
use crate::driver::CliSession;
use crate::error::{Result, SessionError};
use crate::platform::OltDialect;
use crate::transport::DeviceConfig;

/// Default idle time after which a pooled session is replaced.
pub const DEFAULT_IDLE_TTL: Duration = Duration::from_secs(5 * 60);

/// An authenticated session and when it was last used.
#[derive(Debug)]
pub struct PooledSession {
    session: CliSession,
    last_used: Instant,
}

impl PooledSession {
    fn is_reusable(&self, idle_ttl: Duration) -> bool {
        self.session.is_connected() && self.last_used.elapsed() < idle_ttl
    }
}

/// Connection counters, for diagnostics and tests.
#[derive(Debug, Default)]
pub struct PoolStats {
    connects: AtomicUsize,
    logins: AtomicUsize,
}

impl PoolStats {
    /// TCP connections opened.
    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::Relaxed)
    }

    /// Login sequences started.
    pub fn logins(&self) -> usize {
        self.logins.load(Ordering::Relaxed)
    }
}

/// Holds the single session slot of one device.
pub struct SessionPool {
    config: Arc<DeviceConfig>,
    dialect: Arc<OltDialect>,
    sync: PromptSync,
    idle_ttl: Duration,
    slot: Mutex<Option<PooledSession>>,
    stats: PoolStats,
}

impl SessionPool {
    pub fn new(
        config: Arc<DeviceConfig>,
        dialect: Arc<OltDialect>,
        sync: PromptSync,
        idle_ttl: Duration,
    ) -> Self {
        Self {
            config,
            dialect,
            sync,
            idle_ttl,
            slot: Mutex::new(None),
            stats: PoolStats::default(),
        }
    }

    pub fn stats(&self) -> &PoolStats {
        &self.stats
    }

    /// Lock the slot and make sure it holds an authenticated session.
    ///
    /// Waits for any query in progress on this device. A failed connect or
    /// login leaves the slot empty.
    pub async fn acquire(&self) -> Result<SessionGuard<'_>> {
        let mut slot = self.slot.lock().await;

        let reusable = slot
            .as_ref()
            .is_some_and(|pooled| pooled.is_reusable(self.idle_ttl));

        if reusable {
            debug!("{}: reusing session", self.config.name);
        } else {
            if let Some(mut stale) = slot.take() {
                debug!("{}: replacing stale session", self.config.name);
                stale.session.disconnect().await;
            }
            *slot = Some(self.open().await?);
        }

        Ok(SessionGuard {
            device: &self.config.name,
            slot,
            completed: false,
        })
    }

    async fn open(&self) -> Result<PooledSession> {
        let mut session =
            CliSession::connect(&self.config, self.dialect.clone(), self.sync).await?;
        self.stats.connects.fetch_add(1, Ordering::Relaxed);

        self.stats.logins.fetch_add(1, Ordering::Relaxed);
        if let Err(e) = session.authenticate(&self.config).await {
            warn!("{}: login failed: {}", self.config.name, e);
            session.disconnect().await;
            return Err(e);
        }

        info!("{}: session ready", self.config.name);
        Ok(PooledSession {
            session,
            last_used: Instant::now(),
        })
    }

    /// Disconnect the pooled session, if any.
    pub async fn close(&self) {
        if let Some(mut pooled) = self.slot.lock().await.take() {
            pooled.session.disconnect().await;
            debug!("{}: session closed", self.config.name);
        }
    }
}

impl std::fmt::Debug for SessionPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionPool")
            .field("device", &self.config.name)
            .field("idle_ttl", &self.idle_ttl)
            .field("stats", &self.stats)
            .finish()
    }
}

/// Exclusive use of a device's session for the length of one query.
///
/// A guard dropped before [`touch`](Self::touch) marks the query complete
/// takes the session with it: a cancelled query leaves the device in an
/// unknown CLI mode with output still in flight.
pub struct SessionGuard<'a> {
    device: &'a str,
    slot: MutexGuard<'a, Option<PooledSession>>,
    completed: bool,
}

impl SessionGuard<'_> {
    pub fn session(&self) -> Result<&CliSession> {
        self.slot
            .as_ref()
            .map(|pooled| &pooled.session)
            .ok_or_else(|| SessionError::NotAuthenticated.into())
    }

    /// Mark the query complete and the session as just used.
    pub fn touch(&mut self) {
        if let Some(pooled) = self.slot.as_mut() {
            pooled.last_used = Instant::now();
        }
        self.completed = true;
    }

    /// Drop the session; the next acquire starts from scratch.
    pub async fn discard(mut self) {
        if let Some(mut pooled) = self.slot.take() {
            pooled.session.disconnect().await;
        }
    }
}

impl Drop for SessionGuard<'_> {
    fn drop(&mut self) {
        if self.completed {
            return;
        }
        // Dropping the transport aborts its reader and closes the socket.
        if self.slot.take().is_some() {
            warn!("{}: query abandoned, dropping its session", self.device);
        }
    }
}
