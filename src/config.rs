//! Configuration management for `aqiwatch`
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::AqiwatchError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AqiwatchConfig {
    /// Telemetry endpoint settings
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    /// Map view settings
    #[serde(default)]
    pub map: MapConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Demo server settings
    #[serde(default)]
    pub server: ServerConfig,
}

/// Telemetry endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// URL returning the JSON station array
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Overall deadline for one load, in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u32,
    /// Retries for transient transport failures
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

/// Map view configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapConfig {
    #[serde(default = "default_center_latitude")]
    pub center_latitude: f64,
    #[serde(default = "default_center_longitude")]
    pub center_longitude: f64,
    #[serde(default = "default_zoom")]
    pub zoom: u8,
    /// Tile URL template with `{s}`, `{z}`, `{x}`, `{y}` placeholders
    #[serde(default = "default_tile_url")]
    pub tile_url: String,
    #[serde(default = "default_attribution")]
    pub attribution: String,
    /// Marker radius in pixels
    #[serde(default = "default_marker_radius")]
    pub marker_radius: u32,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
}

// Default value functions
fn default_endpoint() -> String {
    "http://localhost:8080/api/air-quality-data".to_string()
}

fn default_timeout() -> u32 {
    10
}

fn default_max_retries() -> u32 {
    2
}

fn default_center_latitude() -> f64 {
    -5.0
}

fn default_center_longitude() -> f64 {
    -60.0
}

fn default_zoom() -> u8 {
    4
}

fn default_tile_url() -> String {
    "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png".to_string()
}

fn default_attribution() -> String {
    "&copy; OpenStreetMap contributors".to_string()
}

fn default_marker_radius() -> u32 {
    8
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            timeout_seconds: default_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            center_latitude: default_center_latitude(),
            center_longitude: default_center_longitude(),
            zoom: default_zoom(),
            tile_url: default_tile_url(),
            attribution: default_attribution(),
            marker_radius: default_marker_radius(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

impl Default for AqiwatchConfig {
    fn default() -> Self {
        Self {
            telemetry: TelemetryConfig::default(),
            map: MapConfig::default(),
            logging: LoggingConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl TelemetryConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.into())
    }
}

impl AqiwatchConfig {
    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let explicit = config_path.is_some();
        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if explicit && !config_file.exists() {
            return Err(AqiwatchError::config(format!(
                "Config file not found: {}",
                config_file.display()
            ))
            .into());
        }

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // Environment overrides, e.g. AQIWATCH_TELEMETRY__ENDPOINT
        builder = builder.add_source(
            Environment::with_prefix("AQIWATCH")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: AqiwatchConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("aqiwatch").join("config.toml"))
    }

    /// Apply default values to missing configuration fields
    pub fn apply_defaults(&mut self) {
        if self.telemetry.endpoint.is_empty() {
            self.telemetry.endpoint = default_endpoint();
        }
        if self.telemetry.timeout_seconds == 0 {
            self.telemetry.timeout_seconds = default_timeout();
        }
        if self.map.tile_url.is_empty() {
            self.map.tile_url = default_tile_url();
        }
        if self.map.marker_radius == 0 {
            self.map.marker_radius = default_marker_radius();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.telemetry.timeout_seconds > 300 {
            return Err(
                AqiwatchError::config("Telemetry timeout cannot exceed 300 seconds").into(),
            );
        }

        if self.telemetry.max_retries > 10 {
            return Err(AqiwatchError::config("Telemetry max retries cannot exceed 10").into());
        }

        if self.map.zoom > 19 {
            return Err(AqiwatchError::config("Map zoom cannot exceed 19").into());
        }

        if !(-90.0..=90.0).contains(&self.map.center_latitude)
            || !(-180.0..=180.0).contains(&self.map.center_longitude)
        {
            return Err(AqiwatchError::config(format!(
                "Map center ({}, {}) is outside valid coordinates",
                self.map.center_latitude, self.map.center_longitude
            ))
            .into());
        }

        Ok(())
    }

    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(AqiwatchError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(AqiwatchError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        if !self.telemetry.endpoint.starts_with("http://")
            && !self.telemetry.endpoint.starts_with("https://")
        {
            return Err(AqiwatchError::config(
                "Telemetry endpoint must be a valid HTTP or HTTPS URL",
            )
            .into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AqiwatchConfig::default();
        assert_eq!(
            config.telemetry.endpoint,
            "http://localhost:8080/api/air-quality-data"
        );
        assert_eq!(config.telemetry.timeout(), Duration::from_secs(10));
        assert_eq!(config.map.zoom, 4);
        assert_eq!(config.map.center_latitude, -5.0);
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_invalid_log_level() {
        let mut config = AqiwatchConfig::default();
        config.logging.level = "invalid".to_string();
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid log level"));
    }

    #[test]
    fn test_config_validation_numeric_ranges() {
        let mut config = AqiwatchConfig::default();
        config.telemetry.timeout_seconds = 500;
        let result = config.validate();
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("timeout cannot exceed")
        );
    }

    #[test]
    fn test_config_validation_rejects_non_http_endpoint() {
        let mut config = AqiwatchConfig::default();
        config.telemetry.endpoint = "ftp://example.org/data".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_apply_defaults_fills_empty_values() {
        let mut config = AqiwatchConfig::default();
        config.telemetry.endpoint.clear();
        config.telemetry.timeout_seconds = 0;
        config.logging.format.clear();
        config.apply_defaults();
        assert_eq!(config.telemetry.endpoint, default_endpoint());
        assert_eq!(config.telemetry.timeout_seconds, 10);
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[telemetry]\nendpoint = \"https://air.example.org/api/air-quality-data\"\ntimeout_seconds = 5\n\n[map]\nzoom = 7"
        )
        .unwrap();

        let config = AqiwatchConfig::load_from_path(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(
            config.telemetry.endpoint,
            "https://air.example.org/api/air-quality-data"
        );
        assert_eq!(config.telemetry.timeout_seconds, 5);
        assert_eq!(config.map.zoom, 7);
        assert_eq!(config.map.marker_radius, 8);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let result = AqiwatchConfig::load_from_path(Some(PathBuf::from("/nonexistent/aqiwatch.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn test_config_path_generation() {
        if let Some(path) = AqiwatchConfig::get_config_path() {
            assert!(path.to_string_lossy().contains("aqiwatch"));
            assert!(path.to_string_lossy().contains("config.toml"));
        }
    }
}
