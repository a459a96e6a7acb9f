use serde::Deserialize;
use std::{fmt, fs, io, net::SocketAddr, time::Duration};

pub const CONFIG_PATH_ENV: &str = "EXPORTER_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "energy-exporter.toml";

pub const ENV_USER: &str = "GEO_USER";
pub const ENV_PASS: &str = "GEO_PASS";
pub const ENV_BASE_URL: &str = "GEO_BASE_URL";
pub const ENV_POLL_INTERVAL: &str = "POLL_INTERVAL";
pub const ENV_METRICS_BIND_ADDR: &str = "METRICS_BIND_ADDR";

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("invalid config file")]
    Parse(#[from] toml::de::Error),
    #[error("missing required setting {0}")]
    Missing(&'static str),
    #[error("invalid poll interval '{0}'")]
    Interval(String),
    #[error("invalid metrics bind address '{0}'")]
    BindAddr(String),
    #[error("metrics path must start with '/': '{0}'")]
    MetricsPath(String),
}

#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct GeoConfig {
    pub username: String,
    pub password: String,
    pub base_url: String,
    pub request_timeout_secs: u64,
}

impl Default for GeoConfig {
    fn default() -> Self {
        Self {
            username: String::new(),
            password: String::new(),
            base_url: geo_client::DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: 30,
        }
    }
}

impl fmt::Debug for GeoConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeoConfig")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl GeoConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PollerConfig {
    /// Should match the scrape interval of the consuming Prometheus.
    #[serde(deserialize_with = "deserialize_interval")]
    pub interval: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub bind_addr: String,
    pub path: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:9090".to_string(),
            path: "/metrics".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub geo: GeoConfig,
    pub poller: PollerConfig,
    pub metrics: MetricsConfig,
}

impl AppConfig {
    /// Load the TOML file named by `EXPORTER_CONFIG` (the default path may be
    /// absent) and overlay environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        use std::env;

        let explicit = env::var(CONFIG_PATH_ENV).ok();
        let path = explicit.clone().unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

        let contents = match fs::read_to_string(&path) {
            Ok(contents) => Some(contents),
            Err(e) if explicit.is_none() && e.kind() == io::ErrorKind::NotFound => None,
            Err(source) => return Err(ConfigError::Read { path, source }),
        };

        Self::from_sources(contents.as_deref(), |key| env::var(key).ok())
    }

    pub fn from_sources<F>(file: Option<&str>, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg: AppConfig = match file {
            Some(contents) => toml::from_str(contents)?,
            None => AppConfig::default(),
        };

        cfg.apply_env(env)?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn apply_env<F>(&mut self, env: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = env(ENV_USER) {
            self.geo.username = v;
        }
        if let Some(v) = env(ENV_PASS) {
            self.geo.password = v;
        }
        if let Some(v) = env(ENV_BASE_URL) {
            self.geo.base_url = v;
        }
        if let Some(v) = env(ENV_POLL_INTERVAL) {
            self.poller.interval = parse_interval(&v)?;
        }
        if let Some(v) = env(ENV_METRICS_BIND_ADDR) {
            self.metrics.bind_addr = v;
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.geo.username.is_empty() {
            return Err(ConfigError::Missing("geo.username (GEO_USER)"));
        }
        if self.geo.password.is_empty() {
            return Err(ConfigError::Missing("geo.password (GEO_PASS)"));
        }
        if self.poller.interval.is_zero() {
            return Err(ConfigError::Interval("0".to_string()));
        }
        if self.metrics.bind_addr.parse::<SocketAddr>().is_err() {
            return Err(ConfigError::BindAddr(self.metrics.bind_addr.clone()));
        }
        if !self.metrics.path.starts_with('/') {
            return Err(ConfigError::MetricsPath(self.metrics.path.clone()));
        }
        Ok(())
    }
}

/// Parse `500ms`, `10s`, `2m`, `1h`, or a bare number of seconds.
pub fn parse_interval(s: &str) -> Result<Duration, ConfigError> {
    let trimmed = s.trim();
    let split = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    let (digits, unit) = trimmed.split_at(split);

    let value: u64 = digits
        .parse()
        .map_err(|_| ConfigError::Interval(s.to_string()))?;

    let secs = match unit {
        "ms" => return Ok(Duration::from_millis(value)),
        "" | "s" => Some(value),
        "m" => value.checked_mul(60),
        "h" => value.checked_mul(3600),
        _ => None,
    };

    secs.map(Duration::from_secs)
        .ok_or_else(|| ConfigError::Interval(s.to_string()))
}

fn deserialize_interval<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Secs(u64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Secs(secs) => Ok(Duration::from_secs(secs)),
        Raw::Text(text) => parse_interval(&text).map_err(serde::de::Error::custom),
    }
}
