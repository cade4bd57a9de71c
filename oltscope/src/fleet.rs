//! Searching several OLTs in turn.

use indexmap::IndexMap;
use log::{debug, warn};

use crate::cache::ResultCache;
use crate::error::{ConfigError, Error, Result};
use crate::model::OnuInfo;
use crate::query::{ClientOptions, OltClient};
use crate::transport::DeviceConfig;

/// One client per enabled device, kept in declaration order.
#[derive(Debug)]
pub struct Fleet {
    clients: IndexMap<String, OltClient>,
    cache: ResultCache,
}

impl Fleet {
    /// Build a fleet with default options.
    pub fn new(devices: impl IntoIterator<Item = DeviceConfig>) -> Result<Self> {
        Self::with_options(devices, ClientOptions::default())
    }

    /// Build a fleet; disabled devices are skipped, duplicate names rejected.
    pub fn with_options(
        devices: impl IntoIterator<Item = DeviceConfig>,
        options: ClientOptions,
    ) -> Result<Self> {
        let cache = ResultCache::new(options.cache_ttl, options.cache_capacity);
        let mut clients = IndexMap::new();

        for device in devices {
            if !device.enabled {
                debug!("{}: disabled, skipping", device.name);
                continue;
            }
            if clients.contains_key(&device.name) {
                return Err(ConfigError::InvalidDevice {
                    message: format!("duplicate device name '{}'", device.name),
                }
                .into());
            }

            let name = device.name.clone();
            let client = OltClient::builder(device)
                .options(options.clone())
                .cache(cache.clone())
                .build()?;
            clients.insert(name, client);
        }

        Ok(Self { clients, cache })
    }

    pub fn get(&self, name: &str) -> Option<&OltClient> {
        self.clients.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.clients.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    /// Search every device in order; the first match wins.
    ///
    /// Unreachable devices are skipped. If none of the devices could be
    /// searched, the last error is returned.
    pub async fn get_unit_info(&self, description: &str) -> Result<Option<OnuInfo>> {
        let mut last_error: Option<Error> = None;
        let mut searched = 0usize;

        for (name, client) in &self.clients {
            match client.get_unit_info(description).await {
                Ok(Some(info)) => return Ok(Some(info)),
                Ok(None) => searched += 1,
                Err(e) => {
                    warn!("{}: skipped: {}", name, e);
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) if searched == 0 => Err(e),
            _ => Ok(None),
        }
    }

    /// Close every pooled session.
    pub async fn close(&self) {
        for client in self.clients.values() {
            client.close().await;
        }
    }
}
