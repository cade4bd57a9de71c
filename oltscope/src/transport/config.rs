//! Device connection configuration.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer};

use crate::error::{ConfigError, Result};

/// Default CLI port (telnet).
pub const DEFAULT_PORT: u16 = 23;

/// EPON ports searched when a device does not list its own, in search order.
pub const DEFAULT_PORTS: [&str; 4] = ["0/1", "0/2", "0/3", "0/4"];

/// Per-step timeouts for a device session.
///
/// When deserialized, every field is given in whole seconds.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    /// Establishing the TCP connection.
    #[serde(deserialize_with = "duration_secs")]
    pub connect: Duration,

    /// Each prompt wait of the login / enable sequence.
    #[serde(deserialize_with = "duration_secs")]
    pub login: Duration,

    /// Each regular command (listings, descriptions, diagnostics, pagination).
    #[serde(deserialize_with = "duration_secs")]
    pub command: Duration,

    /// Entering and leaving an interface context.
    #[serde(deserialize_with = "duration_secs")]
    pub context: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(10),
            login: Duration::from_secs(10),
            command: Duration::from_secs(15),
            context: Duration::from_secs(5),
        }
    }
}

/// Connection settings and credentials for one OLT.
///
/// Built once per device, either through [`DeviceConfig::builder`] or by
/// deserializing the external configuration.
#[derive(Debug, Deserialize)]
pub struct DeviceConfig {
    /// Device name, used as the cache and log key.
    pub name: String,

    /// Target host (hostname or IP address).
    pub host: String,

    /// CLI port (default: 23).
    #[serde(default = "default_port")]
    pub port: u16,

    /// Username for the login prompt.
    pub username: String,

    /// Password for the login prompt.
    #[serde(deserialize_with = "secret_string")]
    pub password: SecretString,

    /// Password for privilege escalation (`enable`).
    #[serde(deserialize_with = "secret_string")]
    pub enable_password: SecretString,

    /// Disabled devices are skipped by the fleet.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Per-step timeouts.
    #[serde(default)]
    pub timeouts: Timeouts,

    /// EPON ports searched for a unit, in order.
    #[serde(default = "default_ports")]
    pub ports: Vec<String>,
}

impl DeviceConfig {
    /// Start building a configuration for the given device.
    pub fn builder(name: impl Into<String>, host: impl Into<String>) -> DeviceConfigBuilder {
        DeviceConfigBuilder::new(name, host)
    }

    /// Get the socket address for connection.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Reject configurations that can never log in.
    pub fn validate(&self) -> Result<()> {
        let missing = if self.name.trim().is_empty() {
            Some("name")
        } else if self.host.trim().is_empty() {
            Some("host")
        } else if self.username.is_empty() {
            Some("username")
        } else if self.ports.is_empty() {
            Some("ports")
        } else {
            None
        };

        match missing {
            Some(field) => Err(ConfigError::InvalidDevice {
                message: format!("device '{}': {field} must not be empty", self.name),
            }
            .into()),
            None => Ok(()),
        }
    }
}

/// Builder for [`DeviceConfig`].
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use oltscope::DeviceConfig;
///
/// let config = DeviceConfig::builder("olt-north", "10.20.0.2")
///     .username("admin")
///     .password("secret")
///     .enable_password("secret")
///     .command_timeout(Duration::from_secs(20))
///     .build()
///     .unwrap();
/// assert_eq!(config.socket_addr(), "10.20.0.2:23");
/// ```
pub struct DeviceConfigBuilder {
    name: String,
    host: String,
    port: u16,
    username: Option<String>,
    password: SecretString,
    enable_password: Option<SecretString>,
    enabled: bool,
    timeouts: Timeouts,
    ports: Vec<String>,
}

impl DeviceConfigBuilder {
    fn new(name: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            host: host.into(),
            port: DEFAULT_PORT,
            username: None,
            password: SecretString::from(String::new()),
            enable_password: None,
            enabled: true,
            timeouts: Timeouts::default(),
            ports: default_ports(),
        }
    }

    /// Set the CLI port (default: 23).
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = SecretString::from(password.into());
        self
    }

    /// Set the enable password. Defaults to the login password.
    pub fn enable_password(mut self, password: impl Into<String>) -> Self {
        self.enable_password = Some(SecretString::from(password.into()));
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts.connect = timeout;
        self
    }

    pub fn login_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts.login = timeout;
        self
    }

    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts.command = timeout;
        self
    }

    pub fn context_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts.context = timeout;
        self
    }

    /// Set the EPON ports to search, in order.
    pub fn ports<I, S>(mut self, ports: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ports = ports.into_iter().map(Into::into).collect();
        self
    }

    /// Build and validate the configuration.
    pub fn build(self) -> Result<DeviceConfig> {
        let username = self.username.ok_or_else(|| ConfigError::InvalidDevice {
            message: format!("device '{}': username is required", self.name),
        })?;

        let enable_password = match self.enable_password {
            Some(secret) => secret,
            None => SecretString::from(self.password.expose_secret().to_string()),
        };

        let config = DeviceConfig {
            name: self.name,
            host: self.host,
            port: self.port,
            username,
            password: self.password,
            enable_password,
            enabled: self.enabled,
            timeouts: self.timeouts,
            ports: self.ports,
        };
        config.validate()?;
        Ok(config)
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_enabled() -> bool {
    true
}

fn default_ports() -> Vec<String> {
    DEFAULT_PORTS.iter().map(|p| p.to_string()).collect()
}

fn secret_string<'de, D>(deserializer: D) -> std::result::Result<SecretString, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(SecretString::from)
}

fn duration_secs<'de, D>(deserializer: D) -> std::result::Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    u64::deserialize(deserializer).map(Duration::from_secs)
}
