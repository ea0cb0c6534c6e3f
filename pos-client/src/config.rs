//! Client configuration

use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the POS sync client
///
/// # Environment variables
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | POS_ENDPOINT_URL | http://localhost:8080/exec | submission endpoint |
/// | POS_DEVICE_TOKEN | (unset) | device token, overrides the stored one |
/// | POS_WORK_DIR | ./work_dir | queue database and logs |
/// | POS_REQUEST_TIMEOUT_SECS | 30 | HTTP timeout |
/// | POS_SYNC_INTERVAL_SECS | 10 | periodic drain timer |
/// | POS_PROBE_INTERVAL_SECS | 5 | reachability probe, 0 disables it |
/// | POS_LOG_LEVEL | info | log filter when RUST_LOG is unset |
/// | POS_LOG_JSON | false | JSON log output |
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend endpoint receiving every action
    pub endpoint_url: String,

    /// Device token
    pub token: Option<String>,

    /// Request timeout in seconds
    pub timeout: u64,

    /// Working directory (queue database, logs)
    pub work_dir: PathBuf,

    /// Interval of the safety-net drain timer
    pub sync_interval: Duration,

    /// Reachability probe interval; `None` treats the backend as always reachable
    pub probe_interval: Option<Duration>,

    /// Log level
    pub log_level: String,

    /// JSON log output
    pub log_json: bool,
}

impl ClientConfig {
    /// Create a configuration for the given endpoint
    pub fn new(endpoint_url: impl Into<String>) -> Self {
        Self {
            endpoint_url: endpoint_url.into(),
            token: None,
            timeout: 30,
            work_dir: PathBuf::from("./work_dir"),
            sync_interval: Duration::from_secs(10),
            probe_interval: Some(Duration::from_secs(5)),
            log_level: "info".to_string(),
            log_json: false,
        }
    }

    /// Load from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            endpoint_url: std::env::var("POS_ENDPOINT_URL").unwrap_or(defaults.endpoint_url),
            token: std::env::var("POS_DEVICE_TOKEN")
                .ok()
                .filter(|t| !t.trim().is_empty()),
            timeout: env_parse("POS_REQUEST_TIMEOUT_SECS").unwrap_or(defaults.timeout),
            work_dir: std::env::var("POS_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.work_dir),
            sync_interval: env_parse("POS_SYNC_INTERVAL_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.sync_interval),
            probe_interval: match env_parse::<u64>("POS_PROBE_INTERVAL_SECS") {
                Some(0) => None,
                Some(secs) => Some(Duration::from_secs(secs)),
                None => defaults.probe_interval,
            },
            log_level: std::env::var("POS_LOG_LEVEL").unwrap_or(defaults.log_level),
            log_json: env_parse("POS_LOG_JSON").unwrap_or(defaults.log_json),
        }
    }

    /// Set the device token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout = seconds;
        self
    }

    /// Set the working directory
    pub fn with_work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = dir.into();
        self
    }

    /// Set the drain timer interval
    pub fn with_sync_interval(mut self, interval: Duration) -> Self {
        self.sync_interval = interval;
        self
    }

    /// Set (or disable) the reachability probe
    pub fn with_probe_interval(mut self, interval: Option<Duration>) -> Self {
        self.probe_interval = interval;
        self
    }

    /// Path of the redb file holding the queue and the device token
    pub fn queue_db_path(&self) -> PathBuf {
        self.work_dir.join("queue.redb")
    }

    pub fn log_dir(&self) -> PathBuf {
        self.work_dir.join("logs")
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new("http://localhost:8080/exec")
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}
