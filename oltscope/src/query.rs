//! Unit lookup against one OLT.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};

use crate::cache::{DEFAULT_CACHE_CAPACITY, DEFAULT_CACHE_TTL, ResultCache};
use crate::channel::PromptSync;
use crate::channel::sync::DEFAULT_POLL_INTERVAL;
use crate::driver::CliSession;
use crate::error::{Error, Result};
use crate::model::{LinkState, OnuInfo, OnuStatus, OpticalDiagnostics};
use crate::parse::{parse_description, parse_link_state, parse_optical, parse_status_table};
use crate::platform::{OltDialect, epon};
use crate::pool::{DEFAULT_IDLE_TTL, PoolStats, SessionPool};
use crate::transport::DeviceConfig;

/// Tuning knobs shared by every client.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// A pooled session unused for this long is replaced.
    pub session_idle_ttl: Duration,
    pub cache_ttl: Duration,
    pub cache_capacity: u64,
    /// How often the output buffer is checked for a prompt.
    pub poll_interval: Duration,
    /// Fetch optical diagnostics and link state for a matched unit.
    pub fetch_details: bool,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            session_idle_ttl: DEFAULT_IDLE_TTL,
            cache_ttl: DEFAULT_CACHE_TTL,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            poll_interval: DEFAULT_POLL_INTERVAL,
            fetch_details: true,
        }
    }
}

/// Looks up ONUs by description on one OLT.
///
/// # Example
///
/// ```rust,no_run
/// use oltscope::{DeviceConfig, OltClient};
///
/// # async fn example() -> Result<(), oltscope::Error> {
/// let config = DeviceConfig::builder("olt-centro", "10.0.0.2")
///     .username("admin")
///     .password("secret")
///     .build()?;
/// let client = OltClient::new(config)?;
///
/// match client.get_unit_info("rogersaade").await? {
///     Some(info) => println!("{info}"),
///     None => println!("not found"),
/// }
/// client.close().await;
/// # Ok(())
/// # }
/// ```
pub struct OltClient {
    config: Arc<DeviceConfig>,
    dialect: Arc<OltDialect>,
    pool: SessionPool,
    cache: ResultCache,
    options: ClientOptions,
}

impl OltClient {
    /// Client with the EPON dialect and default options.
    pub fn new(config: DeviceConfig) -> Result<Self> {
        Self::builder(config).build()
    }

    pub fn builder(config: DeviceConfig) -> OltClientBuilder {
        OltClientBuilder::new(config)
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    pub fn pool_stats(&self) -> &PoolStats {
        self.pool.stats()
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    /// Find the ONU whose description equals `description` (case-insensitive).
    ///
    /// `Ok(None)` means every configured port was searched without a match.
    /// Any failure to reach, log into or navigate the device is returned as
    /// [`Error::DeviceUnreachable`] after the pooled session is discarded.
    pub async fn get_unit_info(&self, description: &str) -> Result<Option<OnuInfo>> {
        let target = ResultCache::normalize_query(description);
        if let Some(info) = self.cache.get(self.name(), &target).await {
            debug!("{}: cache hit for '{}'", self.name(), target);
            return Ok(Some(info));
        }

        let mut guard = match self.pool.acquire().await {
            Ok(guard) => guard,
            Err(e) => {
                warn!("{}: unreachable: {}", self.name(), e);
                return Err(Error::unreachable(self.name(), e));
            }
        };

        let found = match guard.session() {
            Ok(session) => self.search(session, &target).await,
            Err(e) => Err(e),
        };

        match found {
            Ok(found) => {
                guard.touch();
                if let Some(info) = &found {
                    info!("{}: '{}' is {}", self.name(), target, info.unit.onu_id);
                    self.cache.put(self.name(), &target, info.clone()).await;
                } else {
                    debug!("{}: '{}' not found", self.name(), target);
                }
                Ok(found)
            }
            Err(e) => {
                warn!("{}: lookup of '{}' aborted: {}", self.name(), target, e);
                guard.discard().await;
                Err(Error::unreachable(self.name(), e))
            }
        }
    }

    /// Disconnect the pooled session. The client stays usable.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn search(&self, session: &CliSession, target: &str) -> Result<Option<OnuInfo>> {
        for port in &self.config.ports {
            let timeout = self.config.timeouts.context;
            session.enter_interface(port, timeout).await?;
            let found = self.search_port(session, port, target).await?;
            session.exit_interface(port, timeout).await?;

            if found.is_some() {
                return Ok(found);
            }
        }
        Ok(None)
    }

    /// Scan the units listed on `port`. The session is inside the port's context.
    async fn search_port(
        &self,
        session: &CliSession,
        port: &str,
        target: &str,
    ) -> Result<Option<OnuInfo>> {
        let prompt = &self.dialect.prompts.interface;
        let timeout = self.config.timeouts.command;

        let listing = session
            .send_command(&self.dialect.commands.status_listing, prompt, timeout)
            .await?;
        if let Some(message) = &listing.failure_message {
            warn!("{}: status listing on {} rejected: {}", self.name(), port, message);
            return Ok(None);
        }

        let units = parse_status_table(&listing.result);
        debug!("{}: {} units on {}", self.name(), units.len(), port);

        for unit in units {
            let command = self.dialect.description_command(unit.onu_id.index);
            let response = session.send_command(&command, prompt, timeout).await?;
            let Some(description) = parse_description(&response.result) else {
                continue;
            };

            if ResultCache::normalize_query(&description) == target {
                let (optical, link) = if self.options.fetch_details {
                    self.fetch_details(session, &unit).await?
                } else {
                    (None, None)
                };
                return Ok(Some(OnuInfo {
                    device: self.name().to_string(),
                    description,
                    unit,
                    optical,
                    link,
                }));
            }
        }

        Ok(None)
    }

    async fn fetch_details(
        &self,
        session: &CliSession,
        unit: &OnuStatus,
    ) -> Result<(Option<OpticalDiagnostics>, Option<LinkState>)> {
        let prompt = &self.dialect.prompts.interface;
        let timeout = self.config.timeouts.command;
        let index = unit.onu_id.index;

        let optical = session
            .send_command(&self.dialect.optical_command(index), prompt, timeout)
            .await?;
        let link = session
            .send_command(&self.dialect.link_state_command(index), prompt, timeout)
            .await?;

        Ok((parse_optical(&optical.result), parse_link_state(&link.result)))
    }
}

impl std::fmt::Debug for OltClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OltClient")
            .field("device", &self.config.name)
            .field("dialect", &self.dialect.name)
            .field("pool", &self.pool)
            .finish()
    }
}

/// Builder for [`OltClient`].
pub struct OltClientBuilder {
    config: DeviceConfig,
    dialect: Option<OltDialect>,
    options: ClientOptions,
    cache: Option<ResultCache>,
}

impl OltClientBuilder {
    fn new(config: DeviceConfig) -> Self {
        Self {
            config,
            dialect: None,
            options: ClientOptions::default(),
            cache: None,
        }
    }

    /// Use a dialect other than [`epon::dialect`].
    pub fn dialect(mut self, dialect: OltDialect) -> Self {
        self.dialect = Some(dialect);
        self
    }

    pub fn options(mut self, options: ClientOptions) -> Self {
        self.options = options;
        self
    }

    /// Share a result cache with other clients.
    pub fn cache(mut self, cache: ResultCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn build(self) -> Result<OltClient> {
        self.config.validate()?;

        let dialect = match self.dialect {
            Some(dialect) => dialect,
            None => epon::dialect()?,
        };
        let dialect = Arc::new(dialect);
        let config = Arc::new(self.config);
        let options = self.options;

        let cache = self
            .cache
            .unwrap_or_else(|| ResultCache::new(options.cache_ttl, options.cache_capacity));
        let pool = SessionPool::new(
            config.clone(),
            dialect.clone(),
            PromptSync::new(options.poll_interval),
            options.session_idle_ttl,
        );

        Ok(OltClient {
            config,
            dialect,
            pool,
            cache,
            options,
        })
    }
}
