//! Application configuration and environment variable handling.

use serde::Deserialize;
use std::env;

/// Divisor turning raw slider units into the fractional distance tolerance
/// the classifier compares against.
pub const DEFAULT_TOLERANCE_SCALE: f64 = 100_000.0;

/// Default tolerance in raw slider units.
pub const DEFAULT_TOLERANCE_RAW: f64 = 5.0;

/// Application configuration loaded from an optional TOML file plus
/// environment variables. Environment variables win over file values.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Server bind host
    pub host: String,
    /// Server bind port
    pub port: u16,
    /// Divisor from raw tolerance units to the classifier fraction
    pub tolerance_scale: f64,
    /// Initial tolerance in raw units
    pub default_tolerance_raw: f64,
}

/// Optional TOML file shape; every field may be omitted.
#[derive(Debug, Clone, Default, Deserialize)]
struct FileConfig {
    host: Option<String>,
    port: Option<u16>,
    tolerance_scale: Option<f64>,
    default_tolerance_raw: Option<f64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            tolerance_scale: DEFAULT_TOLERANCE_SCALE,
            default_tolerance_raw: DEFAULT_TOLERANCE_RAW,
        }
    }
}

impl AppConfig {
    /// Load configuration.
    ///
    /// # Environment Variables
    /// - `SWAPLENS_CONFIG` (optional): path to a TOML file providing base values
    /// - `HOST` (optional, default: 0.0.0.0): server bind host
    /// - `PORT` (optional, default: 8080): server bind port
    /// - `SWAPLENS_TOLERANCE_SCALE` (optional, default: 100000): raw-units divisor
    /// - `SWAPLENS_DEFAULT_TOLERANCE_RAW` (optional, default: 5): initial tolerance
    ///
    /// # Errors
    /// Returns an error if the TOML file is unreadable or a variable fails
    /// to parse.
    pub fn from_env() -> Result<Self, String> {
        let file = match env::var("SWAPLENS_CONFIG") {
            Ok(path) => {
                let content = std::fs::read_to_string(&path)
                    .map_err(|e| format!("Failed to read config file '{}': {}", path, e))?;
                toml::from_str::<FileConfig>(&content)
                    .map_err(|e| format!("Invalid config file '{}': {}", path, e))?
            }
            Err(_) => FileConfig::default(),
        };

        let defaults = AppConfig::default();

        let host = env::var("HOST")
            .ok()
            .or(file.host)
            .unwrap_or(defaults.host);
        let port = match env::var("PORT") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| "PORT must be a valid port number".to_string())?,
            Err(_) => file.port.unwrap_or(defaults.port),
        };
        let tolerance_scale = match env::var("SWAPLENS_TOLERANCE_SCALE") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| "SWAPLENS_TOLERANCE_SCALE must be numeric".to_string())?,
            Err(_) => file.tolerance_scale.unwrap_or(defaults.tolerance_scale),
        };
        let default_tolerance_raw = match env::var("SWAPLENS_DEFAULT_TOLERANCE_RAW") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| "SWAPLENS_DEFAULT_TOLERANCE_RAW must be numeric".to_string())?,
            Err(_) => file
                .default_tolerance_raw
                .unwrap_or(defaults.default_tolerance_raw),
        };

        if tolerance_scale <= 0.0 {
            return Err("SWAPLENS_TOLERANCE_SCALE must be positive".to_string());
        }

        Ok(Self {
            host,
            port,
            tolerance_scale,
            default_tolerance_raw,
        })
    }

    /// Turn raw slider units into the fraction the classifier compares.
    pub fn scale_tolerance(&self, raw_units: f64) -> f64 {
        raw_units / self.tolerance_scale
    }

    /// Initial classifier tolerance as a fraction.
    pub fn default_tolerance(&self) -> f64 {
        self.scale_tolerance(self.default_tolerance_raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.tolerance_scale, DEFAULT_TOLERANCE_SCALE);
    }

    #[test]
    fn test_scale_tolerance() {
        let config = AppConfig::default();
        assert!((config.scale_tolerance(5.0) - 0.00005).abs() < 1e-12);
        assert!((config.default_tolerance() - 0.00005).abs() < 1e-12);
    }

    #[test]
    fn test_file_config_partial() {
        let file: FileConfig = toml::from_str("port = 9090").unwrap();
        assert_eq!(file.port, Some(9090));
        assert!(file.host.is_none());
    }

    #[test]
    fn test_file_config_read_from_disk() {
        use std::io::Write;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "host = \"127.0.0.1\"\nport = 9191").unwrap();

        let content = std::fs::read_to_string(file.path()).unwrap();
        let parsed: FileConfig = toml::from_str(&content).unwrap();
        assert_eq!(parsed.host.as_deref(), Some("127.0.0.1"));
        assert_eq!(parsed.port, Some(9191));
    }
}
