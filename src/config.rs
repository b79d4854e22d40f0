//! Resolver configuration
//!
//! All locations and guard-rail limits are injected through [`ResolverConfig`].
//! The resolver never consults environment state itself; callers compute the
//! defaults once (see [`ResolverConfig::for_home`]) and override what they need.

use crate::error::ResolveError;
use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default export size ceiling (100 MB)
pub const DEFAULT_MAX_EXPORT_BYTES: u64 = 100 * 1024 * 1024;

/// Default export parse budget (10 s)
pub const DEFAULT_PARSE_TIMEOUT_MS: u64 = 10_000;

/// Conventional export document name
pub const EXPORT_FILE_NAME: &str = "export.xml";

/// How often the synthetic seed changes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeedGranularity {
    /// Same synthetic values all day
    #[default]
    Daily,
    /// Values shift every hour
    Hourly,
}

/// Configuration for the source resolver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Directory holding the bulk export
    pub export_dir: PathBuf,
    /// Live-sync snapshot file
    pub live_sync_path: PathBuf,
    /// Exports larger than this are rejected before parsing
    pub max_export_bytes: u64,
    /// Export parse budget in milliseconds
    pub parse_timeout_ms: u64,
    /// Offset used for day boundaries (minutes east of UTC)
    pub utc_offset_minutes: i32,
    pub seed_granularity: SeedGranularity,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            export_dir: PathBuf::from("apple_health_export"),
            live_sync_path: PathBuf::from(".health_sync").join("latest.json"),
            max_export_bytes: DEFAULT_MAX_EXPORT_BYTES,
            parse_timeout_ms: DEFAULT_PARSE_TIMEOUT_MS,
            utc_offset_minutes: 0,
            seed_granularity: SeedGranularity::Daily,
        }
    }
}

impl ResolverConfig {
    /// Default locations under a user's home directory
    pub fn for_home(home: impl AsRef<Path>) -> Self {
        let home = home.as_ref();
        Self {
            export_dir: home.join("Downloads").join("apple_health_export"),
            live_sync_path: home.join(".health_sync").join("latest.json"),
            ..Default::default()
        }
    }

    /// Load configuration from JSON; absent fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self, ResolveError> {
        let config: ResolverConfig =
            serde_json::from_str(json).map_err(|e| ResolveError::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to JSON
    pub fn to_json(&self) -> Result<String, ResolveError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn with_export_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.export_dir = dir.into();
        self
    }

    pub fn with_live_sync_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.live_sync_path = path.into();
        self
    }

    pub fn with_max_export_bytes(mut self, bytes: u64) -> Self {
        self.max_export_bytes = bytes;
        self
    }

    pub fn with_parse_timeout(mut self, timeout: Duration) -> Self {
        self.parse_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn parse_timeout(&self) -> Duration {
        Duration::from_millis(self.parse_timeout_ms)
    }

    /// Offset for day boundaries; out-of-range values fall back to UTC
    pub fn utc_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes.saturating_mul(60))
            .unwrap_or_else(|| Utc.fix())
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<(), ResolveError> {
        if self.max_export_bytes == 0 {
            return Err(ResolveError::ConfigError(
                "max_export_bytes must be greater than zero".to_string(),
            ));
        }
        if self.utc_offset_minutes.abs() >= 24 * 60 {
            return Err(ResolveError::ConfigError(format!(
                "utc_offset_minutes out of range: {}",
                self.utc_offset_minutes
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_home_defaults() {
        let config = ResolverConfig::for_home("/home/ana");

        assert_eq!(
            config.export_dir,
            PathBuf::from("/home/ana/Downloads/apple_health_export")
        );
        assert_eq!(
            config.live_sync_path,
            PathBuf::from("/home/ana/.health_sync/latest.json")
        );
        assert_eq!(config.max_export_bytes, 100 * 1024 * 1024);
        assert_eq!(config.parse_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = ResolverConfig::from_json(
            r#"{"export_dir": "/data/export", "parse_timeout_ms": 2500, "seed_granularity": "hourly"}"#,
        )
        .unwrap();

        assert_eq!(config.export_dir, PathBuf::from("/data/export"));
        assert_eq!(config.parse_timeout(), Duration::from_millis(2500));
        assert_eq!(config.seed_granularity, SeedGranularity::Hourly);
        assert_eq!(config.max_export_bytes, DEFAULT_MAX_EXPORT_BYTES);
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert!(matches!(
            ResolverConfig::from_json(r#"{"max_export_bytes": 0}"#),
            Err(ResolveError::ConfigError(_))
        ));
        assert!(matches!(
            ResolverConfig::from_json(r#"{"utc_offset_minutes": 1440}"#),
            Err(ResolveError::ConfigError(_))
        ));
        assert!(matches!(
            ResolverConfig::from_json("not json"),
            Err(ResolveError::ConfigError(_))
        ));
    }

    #[test]
    fn test_config_roundtrip() {
        let config = ResolverConfig::for_home("/home/ana")
            .with_max_export_bytes(1024)
            .with_parse_timeout(Duration::from_secs(3));
        let json = config.to_json().unwrap();
        assert_eq!(ResolverConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_utc_offset() {
        let config = ResolverConfig {
            utc_offset_minutes: -300,
            ..Default::default()
        };
        assert_eq!(config.utc_offset().local_minus_utc(), -5 * 3600);
    }
}
