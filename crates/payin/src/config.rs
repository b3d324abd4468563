use std::path::PathBuf;

use masking::Secret;
use serde::Deserialize;

use crate::consts;

/// Service configuration, layered from an optional TOML file and
/// `PAYIN__`-prefixed environment variables (double underscore separates
/// nesting, e.g. `PAYIN__GATEWAY__COMMANDO_MODE=true`).
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub log: Log,
    pub database: Database,
    pub gateway: Gateway,
    pub payments: Payments,
    pub sweeper: Sweeper,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Log {
    pub level: String,
    pub json: bool,
}

impl Default for Log {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Database {
    pub username: String,
    pub password: Secret<String>,
    pub host: String,
    pub port: u16,
    pub dbname: String,
    pub pool_size: u32,
}

impl Default for Database {
    fn default() -> Self {
        Self {
            username: "payin_user".to_string(),
            password: Secret::new(String::new()),
            host: "localhost".to_string(),
            port: 5432,
            dbname: "payin".to_string(),
            pool_size: 5,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Gateway {
    pub base_url: String,
    pub secret_key: Secret<String>,
    pub request_timeout_seconds: u64,
    /// Degraded mode: outbound provider calls for new payments are skipped
    /// and submissions are recorded as provisionally accepted.
    pub commando_mode: bool,
}

impl Default for Gateway {
    fn default() -> Self {
        Self {
            base_url: "https://api.stripe.com".to_string(),
            secret_key: Secret::new(String::new()),
            request_timeout_seconds: consts::DEFAULT_GATEWAY_TIMEOUT_SECONDS,
            commando_mode: false,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Payments {
    /// Capture behavior when the client does not specify one.
    pub delay_capture_default: bool,
    /// Window between authorization and the earliest deferred capture.
    pub default_capture_after_seconds: u64,
    /// Authorized intents older than this are never captured.
    pub capture_sweep_cutoff_seconds: u64,
    pub description_max_length: usize,
}

impl Default for Payments {
    fn default() -> Self {
        Self {
            delay_capture_default: false,
            default_capture_after_seconds: consts::DEFAULT_CAPTURE_AFTER_SECONDS,
            capture_sweep_cutoff_seconds: consts::DEFAULT_CAPTURE_SWEEP_CUTOFF_SECONDS,
            description_max_length: consts::LEGACY_DESCRIPTION_MAX_LENGTH,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Sweeper {
    pub interval_seconds: u64,
    pub batch_size: i64,
}

impl Default for Sweeper {
    fn default() -> Self {
        Self {
            interval_seconds: consts::DEFAULT_SWEEP_INTERVAL_SECONDS,
            batch_size: consts::DEFAULT_SWEEP_BATCH_SIZE,
        }
    }
}

impl Settings {
    /// Load settings from `config/development.toml` (or the file named by
    /// `PAYIN_CONFIG_PATH`) overlaid with environment variables.
    pub fn new() -> Result<Self, config::ConfigError> {
        let file = std::env::var("PAYIN_CONFIG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config/development.toml"));

        config::Config::builder()
            .add_source(config::File::from(file).required(false))
            .add_source(
                config::Environment::with_prefix("PAYIN")
                    .try_parsing(true)
                    .separator("__"),
            )
            .build()?
            .try_deserialize()
    }
}

impl Database {
    pub fn connection_url(&self) -> String {
        use masking::PeekInterface;

        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username,
            self.password.peek(),
            self.host,
            self.port,
            self.dbname,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_knobs() {
        let settings = Settings::default();
        assert!(!settings.payments.delay_capture_default);
        assert_eq!(settings.payments.description_max_length, 1000);
        assert_eq!(
            settings.payments.capture_sweep_cutoff_seconds,
            7 * 24 * 60 * 60
        );
        assert!(!settings.gateway.commando_mode);
    }

    #[test]
    fn database_url_is_assembled() {
        let database = Database {
            username: "svc".to_string(),
            password: Secret::new("hunter2".to_string()),
            host: "db".to_string(),
            port: 5432,
            dbname: "payments".to_string(),
            pool_size: 5,
        };
        assert_eq!(
            database.connection_url(),
            "postgres://svc:hunter2@db:5432/payments"
        );
    }
}
