use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use crate::lending::LendingConfig;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub lending: LendingSettings,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            lending: LendingSettings::from_env()?,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Where the book is loaded from and the house defaults for top-ups.
#[derive(Debug, Clone, PartialEq)]
pub struct LendingSettings {
    /// JSON dataset to start from; the built-in demo book when unset.
    pub seed_path: Option<PathBuf>,
    pub workflow: LendingConfig,
}

impl LendingSettings {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = LendingConfig::default();
        let seed_path = env::var("LENDING_SEED_PATH")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .map(PathBuf::from);

        let top_up_tenure_months = match env::var("LENDING_TOPUP_TENURE_MONTHS") {
            Ok(value) => value
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|months| *months > 0)
                .ok_or(ConfigError::InvalidTopUpTenure)?,
            Err(_) => defaults.top_up_tenure_months,
        };
        let top_up_interest_rate = match env::var("LENDING_TOPUP_RATE") {
            Ok(value) => value
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|rate| rate.is_finite() && *rate >= 0.0)
                .ok_or(ConfigError::InvalidTopUpRate)?,
            Err(_) => defaults.top_up_interest_rate,
        };

        Ok(Self {
            seed_path,
            workflow: LendingConfig {
                top_up_tenure_months,
                top_up_interest_rate,
            },
        })
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidTopUpTenure,
    InvalidTopUpRate,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidTopUpTenure => {
                write!(f, "LENDING_TOPUP_TENURE_MONTHS must be a positive whole number")
            }
            ConfigError::InvalidTopUpRate => {
                write!(f, "LENDING_TOPUP_RATE must be a non-negative percentage")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidTopUpTenure
            | ConfigError::InvalidTopUpRate => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        env::remove_var("APP_ENV");
        env::remove_var("APP_HOST");
        env::remove_var("APP_PORT");
        env::remove_var("APP_LOG_LEVEL");
        env::remove_var("LENDING_SEED_PATH");
        env::remove_var("LENDING_TOPUP_TENURE_MONTHS");
        env::remove_var("LENDING_TOPUP_RATE");
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.lending.seed_path, None);
        assert_eq!(config.lending.workflow, LendingConfig::default());
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
    }

    #[test]
    fn reads_lending_overrides() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("LENDING_SEED_PATH", "/srv/loan-desk/book.json");
        env::set_var("LENDING_TOPUP_TENURE_MONTHS", "12");
        env::set_var("LENDING_TOPUP_RATE", "13.25");
        let config = AppConfig::load().expect("config loads");
        reset_env();

        assert_eq!(
            config.lending.seed_path,
            Some(PathBuf::from("/srv/loan-desk/book.json"))
        );
        assert_eq!(config.lending.workflow.top_up_tenure_months, 12);
        assert_eq!(config.lending.workflow.top_up_interest_rate, 13.25);
    }

    #[test]
    fn rejects_zero_top_up_tenure() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("LENDING_TOPUP_TENURE_MONTHS", "0");
        let result = AppConfig::load();
        reset_env();
        assert!(matches!(result, Err(ConfigError::InvalidTopUpTenure)));
    }
}
