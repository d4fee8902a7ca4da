use serde::Deserialize;
use std::fs::read_to_string;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::chart::ChartSize;

pub const MIN_TIMEOUT_SECS: u64 = 1;
pub const MAX_TIMEOUT_SECS: u64 = 300;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read from '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse toml from '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Upstream timeout must be between 1 and 300 seconds, got {0}")]
    InvalidTimeout(u64),
}

/// Settings of a running dashboard. Built once at startup and shared
/// read-only with every request.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct DashboardConfig {
    pub upstream_url: String,
    pub listen_address: SocketAddr,
    pub timeout_secs: u64,
    pub assets_path: String,
    pub chart_width: u32,
    pub chart_height: u32,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        DashboardConfig {
            upstream_url: "http://localhost:8080".to_string(),
            listen_address: SocketAddr::from(([0, 0, 0, 0], 3000)),
            timeout_secs: 5,
            assets_path: "assets".to_string(),
            chart_width: 1000,
            chart_height: 500,
        }
    }
}

/// Values given on the command line or in the environment. They win over
/// the config file.
#[derive(Debug, Default)]
pub struct ConfigOverrides {
    pub upstream_url: Option<String>,
    pub listen_address: Option<SocketAddr>,
    pub timeout_secs: Option<u64>,
}

impl DashboardConfig {
    pub fn from_toml_file(path: &Path) -> Result<DashboardConfig, ConfigError> {
        let contents = read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(
        path: Option<&Path>,
        overrides: ConfigOverrides,
    ) -> Result<DashboardConfig, ConfigError> {
        let mut config = match path {
            Some(path) => {
                log::info!("Reading configuration from {}", path.display());
                DashboardConfig::from_toml_file(path)?
            }
            None => DashboardConfig::default(),
        };
        if let Some(upstream_url) = overrides.upstream_url {
            config.upstream_url = upstream_url;
        }
        if let Some(listen_address) = overrides.listen_address {
            config.listen_address = listen_address;
        }
        if let Some(timeout_secs) = overrides.timeout_secs {
            config.timeout_secs = timeout_secs;
        }
        if !(MIN_TIMEOUT_SECS..=MAX_TIMEOUT_SECS).contains(&config.timeout_secs) {
            return Err(ConfigError::InvalidTimeout(config.timeout_secs));
        }
        Ok(config)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn chart_size(&self) -> ChartSize {
        ChartSize {
            width: self.chart_width,
            height: self.chart_height,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::fs;

    fn write_config(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "thermo-dashboard-{}-{}.toml",
            name,
            std::process::id()
        ));
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_defaults() {
        let config = DashboardConfig::load(None, ConfigOverrides::default()).unwrap();
        assert_eq!(config, DashboardConfig::default());
        assert_eq!(config.upstream_url, "http://localhost:8080");
        assert_eq!(config.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_file_values_and_overrides() {
        let path = write_config(
            "overrides",
            r#"
                upstream_url = "http://thermometer.local:8080"
                listen_address = "127.0.0.1:4000"
                timeout_secs = 10
                chart_width = 640
            "#,
        );

        let config = DashboardConfig::load(
            Some(&path),
            ConfigOverrides {
                upstream_url: None,
                listen_address: Some("127.0.0.1:5000".parse().unwrap()),
                timeout_secs: Some(2),
            },
        )
        .unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(config.upstream_url, "http://thermometer.local:8080");
        assert_eq!(
            config.listen_address,
            "127.0.0.1:5000".parse::<SocketAddr>().unwrap()
        );
        assert_eq!(config.timeout_secs, 2);
        assert_eq!(
            config.chart_size(),
            ChartSize {
                width: 640,
                height: 500
            }
        );
    }

    #[test]
    fn test_timeout_must_be_bounded() {
        for timeout_secs in [0, MAX_TIMEOUT_SECS + 1] {
            let result = DashboardConfig::load(
                None,
                ConfigOverrides {
                    timeout_secs: Some(timeout_secs),
                    ..Default::default()
                },
            );
            assert!(matches!(result, Err(ConfigError::InvalidTimeout(t)) if t == timeout_secs));
        }
    }

    #[test]
    fn test_missing_file() {
        let result = DashboardConfig::load(
            Some(Path::new("/nonexistent/dashboard.toml")),
            ConfigOverrides::default(),
        );
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn test_invalid_file() {
        let path = write_config("invalid", "timeout_secs = \"soon\"");
        let result = DashboardConfig::load(Some(&path), ConfigOverrides::default());
        fs::remove_file(&path).unwrap();
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }
}
