//! Configuration management for qrbeam.
//!
//! ## Configuration File Locations
//!
//! | Platform | Path |
//! |----------|------|
//! | Linux | `~/.config/qrbeam/config.toml` |
//! | macOS | `~/Library/Application Support/com.qrbeam.qrbeam/config.toml` |
//! | Windows | `%APPDATA%\qrbeam\qrbeam\config\config.toml` |
//!
//! ## Example
//!
//! ```rust,ignore
//! use qrbeam_core::config::Config;
//!
//! let config = Config::load()?;
//! println!("Frame interval: {:?}", config.transfer.playback_interval);
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Main configuration struct for qrbeam.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Sender settings
    pub transfer: TransferConfig,
    /// Receiver settings
    pub receive: ReceiveConfig,
    /// QR rendering settings
    pub qr: QrSettings,
}

/// Sender configuration options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferConfig {
    /// Fixed unit size in bytes; `None` picks one from the MIME type
    pub chunk_size: Option<usize>,
    /// Time each code stays on screen
    #[serde(with = "duration_serde")]
    pub playback_interval: Duration,
    /// Restart from the first code after the last one
    pub looping: bool,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            chunk_size: None,
            playback_interval: Duration::from_millis(crate::DEFAULT_PLAYBACK_INTERVAL_MS),
            looping: true,
        }
    }
}

/// Receiver configuration options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReceiveConfig {
    /// Window in which a repeated identical scan is dropped
    #[serde(with = "duration_serde")]
    pub debounce_window: Duration,
    /// Default output directory for received files
    pub default_output: Option<PathBuf>,
}

impl Default for ReceiveConfig {
    fn default() -> Self {
        Self {
            debounce_window: Duration::from_millis(crate::DEFAULT_DEBOUNCE_WINDOW_MS),
            default_output: None,
        }
    }
}

/// QR rendering configuration options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QrSettings {
    /// Error correction level
    pub error_correction: ErrorCorrection,
    /// Edge length of exported PNG images in pixels
    pub png_size: u32,
    /// Surround codes with a blank margin
    pub quiet_zone: bool,
}

impl Default for QrSettings {
    fn default() -> Self {
        Self {
            error_correction: ErrorCorrection::M,
            png_size: 512,
            quiet_zone: true,
        }
    }
}

/// QR error correction level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCorrection {
    /// About 7% recovery
    L,
    /// About 15% recovery
    #[default]
    M,
    /// About 25% recovery
    Q,
    /// About 30% recovery
    H,
}

impl std::str::FromStr for ErrorCorrection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "l" | "low" => Ok(Self::L),
            "m" | "medium" => Ok(Self::M),
            "q" | "quartile" => Ok(Self::Q),
            "h" | "high" => Ok(Self::H),
            other => Err(Error::InvalidConfig {
                key: "qr.error_correction".to_string(),
                reason: format!("expected one of l, m, q, h, got '{other}'"),
            }),
        }
    }
}

impl std::fmt::Display for ErrorCorrection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::L => "l",
            Self::M => "m",
            Self::Q => "q",
            Self::H => "h",
        };
        f.write_str(s)
    }
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// If the configuration file doesn't exist, returns the default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be read,
    /// parsed, or fails validation.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from a specific file.
    ///
    /// # Errors
    ///
    /// Same as [`Config::load`].
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::ConfigError(format!("Failed to read config: {e}")))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| Error::ConfigError(format!("Failed to parse config: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to the default location.
    ///
    /// Creates the configuration directory if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be written.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    /// Save configuration to a specific file.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be written.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                Error::ConfigError(format!("Failed to create config directory: {e}"))
            })?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content)
            .map_err(|e| Error::ConfigError(format!("Failed to write config: {e}")))
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] for a zero chunk size, a playback
    /// interval outside 200ms..=3000ms, or a zero PNG size.
    pub fn validate(&self) -> Result<()> {
        if self.transfer.chunk_size == Some(0) {
            return Err(Error::InvalidConfig {
                key: "transfer.chunk_size".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        let interval = self.transfer.playback_interval;
        let min = Duration::from_millis(crate::MIN_PLAYBACK_INTERVAL_MS);
        let max = Duration::from_millis(crate::MAX_PLAYBACK_INTERVAL_MS);
        if interval < min || interval > max {
            return Err(Error::InvalidConfig {
                key: "transfer.playback_interval".to_string(),
                reason: format!(
                    "{} is outside {}..={}",
                    format_duration(interval),
                    format_duration(min),
                    format_duration(max)
                ),
            });
        }

        if self.qr.png_size == 0 {
            return Err(Error::InvalidConfig {
                key: "qr.png_size".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        Ok(())
    }

    /// Get the default configuration directory path.
    #[must_use]
    pub fn config_dir() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "qrbeam", "qrbeam")
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Get the full path to the configuration file.
    #[must_use]
    pub fn config_path() -> PathBuf {
        Self::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("config.toml")
    }
}

/// Parse a duration string like "200ms", "2s" or "1m".
#[must_use]
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();

    if let Some(num) = s.strip_suffix("ms") {
        num.trim().parse().ok().map(Duration::from_millis)
    } else if let Some(num) = s.strip_suffix('s') {
        num.trim().parse().ok().map(Duration::from_secs)
    } else if let Some(num) = s.strip_suffix('m') {
        let mins: u64 = num.trim().parse().ok()?;
        mins.checked_mul(60).map(Duration::from_secs)
    } else {
        None
    }
}

/// Format a duration in the largest unit that represents it exactly.
#[must_use]
pub fn format_duration(duration: Duration) -> String {
    let millis = duration.as_millis();
    if millis % 1000 != 0 || millis == 0 {
        format!("{millis}ms")
    } else if millis % 60_000 == 0 {
        format!("{}m", millis / 60_000)
    } else {
        format!("{}s", millis / 1000)
    }
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::format_duration(*duration))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        super::parse_duration(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid duration format: {s}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_temp_config(dir: &TempDir) -> PathBuf {
        dir.path().join("config").join("config.toml")
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();

        assert_eq!(config.transfer.chunk_size, None);
        assert_eq!(config.transfer.playback_interval, Duration::from_millis(200));
        assert!(config.transfer.looping);
        assert_eq!(config.receive.debounce_window, Duration::from_millis(500));
        assert_eq!(config.qr.error_correction, ErrorCorrection::M);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_roundtrip() {
        let temp_dir = TempDir::new().expect("create temp dir");
        let config_path = setup_temp_config(&temp_dir);

        let mut original = Config::default();
        original.transfer.chunk_size = Some(300);
        original.transfer.playback_interval = Duration::from_millis(750);
        original.transfer.looping = false;
        original.receive.default_output = Some(PathBuf::from("/tmp/inbox"));
        original.qr.error_correction = ErrorCorrection::Q;

        original.save_to(&config_path).expect("save");
        let loaded = Config::load_from(&config_path).expect("load");

        assert_eq!(loaded.transfer.chunk_size, Some(300));
        assert_eq!(loaded.transfer.playback_interval, Duration::from_millis(750));
        assert!(!loaded.transfer.looping);
        assert_eq!(
            loaded.receive.default_output,
            Some(PathBuf::from("/tmp/inbox"))
        );
        assert_eq!(loaded.qr.error_correction, ErrorCorrection::Q);
    }

    #[test]
    fn test_missing_file_loads_defaults() {
        let temp_dir = TempDir::new().expect("create temp dir");
        let config = Config::load_from(&temp_dir.path().join("absent.toml")).expect("load");
        assert!(config.transfer.looping);
    }

    #[test]
    fn test_config_serialization() {
        let toml_str = toml::to_string_pretty(&Config::default()).expect("serialize");

        assert!(toml_str.contains("[transfer]"), "Should have [transfer] section");
        assert!(toml_str.contains("[receive]"), "Should have [receive] section");
        assert!(toml_str.contains("[qr]"), "Should have [qr] section");
        assert!(toml_str.contains("playback_interval = \"200ms\""));
        assert!(toml_str.contains("error_correction = \"m\""));
    }

    #[test]
    fn test_config_deserialization_partial() {
        let partial_toml = r#"
[transfer]
playback_interval = "2s"

[qr]
error_correction = "h"
"#;

        let config: Config = toml::from_str(partial_toml).expect("parse partial config");

        assert_eq!(config.transfer.playback_interval, Duration::from_secs(2));
        assert_eq!(config.qr.error_correction, ErrorCorrection::H);
        assert!(config.transfer.looping);
        assert_eq!(config.receive.debounce_window, Duration::from_millis(500));
    }

    #[test]
    fn test_validate_rejects_zero_chunk_size() {
        let mut config = Config::default();
        config.transfer.chunk_size = Some(0);

        let err = config.validate().unwrap_err();
        assert!(matches!(err, Error::InvalidConfig { ref key, .. } if key == "transfer.chunk_size"));
    }

    #[test]
    fn test_validate_rejects_interval_out_of_range() {
        let mut config = Config::default();

        config.transfer.playback_interval = Duration::from_millis(100);
        assert!(config.validate().is_err());

        config.transfer.playback_interval = Duration::from_secs(4);
        assert!(config.validate().is_err());

        config.transfer.playback_interval = Duration::from_secs(3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let temp_dir = TempDir::new().expect("create temp dir");
        let config_path = setup_temp_config(&temp_dir);
        std::fs::create_dir_all(config_path.parent().expect("parent")).expect("mkdir");
        std::fs::write(&config_path, "[transfer]\nchunk_size = 0\n").expect("write");

        assert!(Config::load_from(&config_path).is_err());
    }

    #[test]
    fn test_config_path() {
        let path = Config::config_path();
        assert!(
            path.ends_with("config.toml"),
            "Config path should end with config.toml"
        );
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("200ms"), Some(Duration::from_millis(200)));
        assert_eq!(parse_duration("2s"), Some(Duration::from_secs(2)));
        assert_eq!(parse_duration("1m"), Some(Duration::from_secs(60)));
        assert_eq!(parse_duration(" 30s "), Some(Duration::from_secs(30)));
        assert_eq!(parse_duration("invalid"), None);
        assert_eq!(parse_duration("200"), None);
        assert_eq!(parse_duration(""), None);
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(200)), "200ms");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1500ms");
        assert_eq!(format_duration(Duration::from_secs(2)), "2s");
        assert_eq!(format_duration(Duration::from_secs(120)), "2m");
        assert_eq!(format_duration(Duration::ZERO), "0ms");
    }

    #[test]
    fn test_error_correction_from_str() {
        assert_eq!("L".parse::<ErrorCorrection>().unwrap(), ErrorCorrection::L);
        assert_eq!("high".parse::<ErrorCorrection>().unwrap(), ErrorCorrection::H);
        assert!("x".parse::<ErrorCorrection>().is_err());
    }
}
