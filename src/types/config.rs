//! Configuration for recency-cache.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::{CacheError, CacheResult};

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "recency-cache.toml";

/// Main configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Cache settings.
    #[serde(default)]
    pub cache: CacheConfig,
}

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeneralConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log format (text, json).
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

impl GeneralConfig {
    /// Rejects log levels and formats the subscriber cannot honor.
    pub fn validate(&self) -> CacheResult<()> {
        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => return Err(CacheError::config(format!("unknown log level '{other}'"))),
        }
        match self.log_format.as_str() {
            "text" | "json" => Ok(()),
            other => Err(CacheError::config(format!("unknown log format '{other}'"))),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

/// How `put` treats a key that is already cached.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OverwritePolicy {
    /// Conventional LRU: an overwrite moves the key to most-recently-used
    /// and never evicts.
    #[default]
    Refresh,
    /// Capacity check runs before every write, existing keys included, and
    /// an overwrite keeps the key's old recency position.
    Literal,
}

impl std::str::FromStr for OverwritePolicy {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "refresh" => Ok(Self::Refresh),
            "literal" => Ok(Self::Literal),
            other => Err(CacheError::config(format!(
                "unknown overwrite policy '{other}' (expected 'refresh' or 'literal')"
            ))),
        }
    }
}

impl std::fmt::Display for OverwritePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Refresh => write!(f, "refresh"),
            Self::Literal => write!(f, "literal"),
        }
    }
}

/// Cache settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheConfig {
    /// Maximum number of entries. Kept signed because TOML integers are,
    /// so a negative value reaches `validate` instead of failing the parse.
    #[serde(default = "default_cache_capacity")]
    pub capacity: i64,

    /// Overwrite behavior for existing keys.
    #[serde(default)]
    pub policy: OverwritePolicy,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: default_cache_capacity(),
            policy: OverwritePolicy::default(),
        }
    }
}

impl CacheConfig {
    /// Returns the capacity as a `usize`, rejecting negative values.
    pub fn validate(&self) -> CacheResult<usize> {
        usize::try_from(self.capacity).map_err(|_| {
            CacheError::config(format!(
                "cache capacity must be non-negative, got {}",
                self.capacity
            ))
        })
    }
}

fn default_cache_capacity() -> i64 {
    128
}

impl Config {
    /// Loads configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> CacheResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(CacheError::ConfigNotFound(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        tracing::debug!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Saves configuration to a TOML file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> CacheResult<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Creates default configuration.
    pub fn default_config() -> Self {
        Self {
            general: GeneralConfig::default(),
            cache: CacheConfig::default(),
        }
    }

    /// Validates every section.
    pub fn validate(&self) -> CacheResult<()> {
        self.general.validate()?;
        self.cache.validate()?;
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_fill_missing_sections() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default_config());
        assert_eq!(config.cache.capacity, 128);
        assert_eq!(config.cache.policy, OverwritePolicy::Refresh);
    }

    #[test]
    fn test_parse_literal_policy() {
        let config: Config = toml::from_str(
            r#"
            [cache]
            capacity = 2
            policy = "literal"
            "#,
        )
        .unwrap();
        assert_eq!(config.cache.policy, OverwritePolicy::Literal);
        assert_eq!(config.cache.validate().unwrap(), 2);
    }

    #[test]
    fn test_negative_capacity_is_invalid() {
        let config: Config = toml::from_str("[cache]\ncapacity = -3\n").unwrap();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, CacheError::InvalidConfiguration(_)));
        assert!(err.to_string().contains("-3"));
    }

    #[test]
    fn test_zero_capacity_is_valid() {
        let config: Config = toml::from_str("[cache]\ncapacity = 0\n").unwrap();
        assert_eq!(config.cache.validate().unwrap(), 0);
    }

    #[test]
    fn test_unknown_log_format() {
        let mut config = Config::default_config();
        config.general.log_format = "xml".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);

        let mut config = Config::default_config();
        config.cache.capacity = 16;
        config.cache.policy = OverwritePolicy::Literal;
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = Config::load(dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, CacheError::ConfigNotFound(_)));
    }

    #[test]
    fn test_load_malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        std::fs::write(&path, "[cache\ncapacity = ").unwrap();

        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, CacheError::TomlParse(_)));
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!(
            "literal".parse::<OverwritePolicy>().unwrap(),
            OverwritePolicy::Literal
        );
        assert!("lru".parse::<OverwritePolicy>().is_err());
        assert_eq!(OverwritePolicy::Refresh.to_string(), "refresh");
    }
}
