//! Configuration for epiwatch
//!
//! Serializable settings for the replay engine, the query store and the
//! dashboard defaults, loadable from JSON or (with the `toml` feature) TOML.
use serde::de::Error;
use std::path::PathBuf;
use std::time::Duration;

/// Pacing parameters for the windowed replay.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReplayConfig {
    /// Rows per window (must be greater than zero)
    #[serde(default = "ReplayConfig::default_chunk_size")]
    pub chunk_size: usize,

    /// Pause between consecutive windows, in milliseconds
    #[serde(default = "ReplayConfig::default_delay_ms")]
    pub delay_ms: u64,
}

impl ReplayConfig {
    const fn default_chunk_size() -> usize {
        10
    }

    const fn default_delay_ms() -> u64 {
        1_000
    }

    pub fn new(chunk_size: usize, delay: Duration) -> Self {
        Self {
            chunk_size,
            delay_ms: u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.chunk_size == 0 {
            return Err("Chunk size must be greater than zero".to_string());
        }
        Ok(())
    }
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            chunk_size: Self::default_chunk_size(),
            delay_ms: Self::default_delay_ms(),
        }
    }
}

/// Where the query store keeps its database.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// On-disk database file. `None` keeps the store in memory.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Top-level configuration
///
/// # Example
///
/// ```rust
/// use epiwatch::Config;
///
/// let json = r#"{
///     "replay": { "chunk_size": 25, "delay_ms": 250 },
///     "store": { "path": "cases.sqlite" }
/// }"#;
/// let config = Config::from_json(json).unwrap();
/// assert_eq!(config.replay.chunk_size, 25);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub replay: ReplayConfig,

    #[serde(default)]
    pub store: StoreConfig,

    /// Query shown in the SQL panel before the user types anything
    #[serde(default = "Config::default_query")]
    pub default_query: String,
}

impl Config {
    pub const DEFAULT_QUERY: &'static str =
        "SELECT region, SUM(new_cases) AS total_cases FROM data GROUP BY region";

    fn default_query() -> String {
        Self::DEFAULT_QUERY.to_string()
    }

    pub fn with_replay(mut self, replay: ReplayConfig) -> Self {
        self.replay = replay;
        self
    }

    pub fn with_store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.store.path = Some(path.into());
        self
    }

    pub fn with_default_query(mut self, query: impl Into<String>) -> Self {
        self.default_query = query.into();
        self
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        self.replay.validate()?;

        if self.default_query.trim().is_empty() {
            return Err("Default query cannot be empty".to_string());
        }

        Ok(())
    }

    /// Load configuration from JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let config: Config = serde_json::from_str(json)?;
        if let Err(e) = config.validate() {
            return Err(serde_json::Error::custom(e));
        }
        Ok(config)
    }

    /// Save configuration as JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Load configuration from TOML string (requires toml feature)
    #[cfg(feature = "toml")]
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        let config: Config = toml::from_str(toml_str)?;
        if let Err(e) = config.validate() {
            return Err(toml::de::Error::custom(e));
        }
        Ok(config)
    }

    /// Save configuration as TOML string (requires toml feature)
    #[cfg(feature = "toml")]
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            replay: ReplayConfig::default(),
            store: StoreConfig::default(),
            default_query: Self::default_query(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.replay.chunk_size, 10);
        assert_eq!(config.replay.delay(), Duration::from_secs(1));
        assert!(config.store.path.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = Config::from_json(r#"{ "replay": { "chunk_size": 3 } }"#).unwrap();
        assert_eq!(config.replay.chunk_size, 3);
        assert_eq!(config.replay.delay_ms, 1_000);
        assert_eq!(config.default_query, Config::DEFAULT_QUERY);
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        let err = Config::from_json(r#"{ "replay": { "chunk_size": 0 } }"#).unwrap_err();
        assert!(err.to_string().contains("Chunk size"));
    }

    #[test]
    fn test_negative_chunk_size_rejected() {
        assert!(Config::from_json(r#"{ "replay": { "chunk_size": -5 } }"#).is_err());
    }

    #[test]
    fn test_unknown_fields_rejected() {
        assert!(Config::from_json(r#"{ "replay": { "chunks": 3 } }"#).is_err());
    }

    #[test]
    fn test_json_roundtrip() {
        let config = Config::default()
            .with_replay(ReplayConfig::new(7, Duration::from_millis(20)))
            .with_store_path("cases.sqlite");
        let json = config.to_json().unwrap();
        assert_eq!(Config::from_json(&json).unwrap(), config);
    }

    #[cfg(feature = "toml")]
    #[test]
    fn test_toml() {
        let config = Config::from_toml(
            r#"
            default_query = "SELECT COUNT(*) FROM data"

            [replay]
            chunk_size = 4
            delay_ms = 0
            "#,
        )
        .unwrap();
        assert_eq!(config.replay.chunk_size, 4);
        assert_eq!(config.replay.delay(), Duration::ZERO);
        assert_eq!(config.default_query, "SELECT COUNT(*) FROM data");
    }
}
