//! Configuration data model and validation

use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Time-series store host name or IP address
    #[serde(default = "default_influx_address")]
    pub influx_address: String,

    /// Time-series store port
    #[serde(default = "default_influx_port")]
    pub influx_port: u16,

    /// Database the results are written into
    #[serde(default = "default_influx_database")]
    pub influx_database: String,

    /// Store user name, if authentication is enabled
    #[serde(default)]
    pub influx_user: Option<String>,

    /// Store password, if authentication is enabled
    #[serde(default)]
    pub influx_password: Option<String>,

    /// Connect to the store over HTTPS
    #[serde(default)]
    pub influx_ssl: bool,

    /// Verify the store's TLS certificate
    #[serde(default = "default_verify_ssl")]
    pub influx_verify_ssl: bool,

    /// Webhook key; publishing to the webhook is disabled when unset
    #[serde(default)]
    pub webhook_key: Option<String>,

    /// Webhook host base URL
    #[serde(default = "default_webhook_host")]
    pub webhook_host: String,

    /// Server IDs to test against; empty means auto-select the nearest server
    #[serde(default)]
    pub servers: Vec<String>,

    /// Delay in seconds between full test cycles
    #[serde(default = "default_delay_seconds")]
    pub delay_seconds: u64,

    /// Enable colored terminal output
    #[serde(default = "default_enable_color")]
    pub enable_color: bool,

    /// Enable verbose output
    #[serde(default)]
    pub verbose: bool,

    /// Enable debug output
    #[serde(default)]
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            influx_address: default_influx_address(),
            influx_port: default_influx_port(),
            influx_database: default_influx_database(),
            influx_user: None,
            influx_password: None,
            influx_ssl: false,
            influx_verify_ssl: default_verify_ssl(),
            webhook_key: None,
            webhook_host: default_webhook_host(),
            servers: Vec::new(),
            delay_seconds: default_delay_seconds(),
            enable_color: default_enable_color(),
            verbose: false,
            debug: false,
        }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the inter-cycle delay as Duration
    pub fn delay(&self) -> Duration {
        Duration::from_secs(self.delay_seconds)
    }

    /// Base URL of the time-series store
    pub fn store_url(&self) -> String {
        let scheme = if self.influx_ssl { "https" } else { "http" };
        format!("{}://{}:{}", scheme, self.influx_address, self.influx_port)
    }

    /// Whether webhook publishing is enabled
    pub fn webhook_enabled(&self) -> bool {
        self.webhook_key.as_deref().is_some_and(|k| !k.is_empty())
    }

    /// Validate the configuration and return any errors
    pub fn validate(&self) -> Result<()> {
        if self.influx_address.is_empty() {
            return Err(AppError::config("Store address cannot be empty"));
        }

        // The address is a bare host; composing the store URL must yield a
        // parseable endpoint.
        if let Err(e) = url::Url::parse(&self.store_url()) {
            return Err(AppError::config(format!(
                "Invalid store address '{}': {}",
                self.influx_address, e
            )));
        }

        if self.influx_database.is_empty() {
            return Err(AppError::config("Store database name cannot be empty"));
        }

        match url::Url::parse(&self.webhook_host) {
            Ok(parsed) => {
                if parsed.scheme() != "http" && parsed.scheme() != "https" {
                    return Err(AppError::config(format!(
                        "Webhook host must be an HTTP(S) URL: {}",
                        self.webhook_host
                    )));
                }
            }
            Err(e) => {
                return Err(AppError::config(format!(
                    "Invalid webhook host '{}': {}",
                    self.webhook_host, e
                )));
            }
        }

        if self.delay_seconds == 0 {
            return Err(AppError::config("Delay must be greater than 0 seconds"));
        }

        Ok(())
    }

    /// Merge environment variables into this configuration
    pub fn merge_from_env(&mut self) -> Result<()> {
        if let Ok(address) = std::env::var("INFLUX_ADDRESS") {
            self.influx_address = address;
        }

        if let Ok(port) = std::env::var("INFLUX_PORT") {
            self.influx_port = port
                .parse()
                .map_err(|e| AppError::config(format!("Invalid INFLUX_PORT value '{}': {}", port, e)))?;
        }

        if let Ok(database) = std::env::var("INFLUX_DATABASE") {
            self.influx_database = database;
        }

        if let Ok(user) = std::env::var("INFLUX_USER") {
            if !user.is_empty() {
                self.influx_user = Some(user);
            }
        }

        if let Ok(password) = std::env::var("INFLUX_PASSWORD") {
            if !password.is_empty() {
                self.influx_password = Some(password);
            }
        }

        if let Ok(ssl) = std::env::var("INFLUX_SSL") {
            self.influx_ssl = ssl
                .parse()
                .map_err(|e| AppError::config(format!("Invalid INFLUX_SSL value '{}': {}", ssl, e)))?;
        }

        if let Ok(verify) = std::env::var("INFLUX_VERIFY_SSL") {
            self.influx_verify_ssl = verify.parse().map_err(|e| {
                AppError::config(format!("Invalid INFLUX_VERIFY_SSL value '{}': {}", verify, e))
            })?;
        }

        if let Ok(key) = std::env::var("WEBHOOK_KEY") {
            if !key.is_empty() {
                self.webhook_key = Some(key);
            }
        }

        if let Ok(host) = std::env::var("WEBHOOK_HOST") {
            self.webhook_host = host;
        }

        if let Ok(servers) = std::env::var("TEST_SERVERS") {
            self.servers = servers
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        if let Ok(delay) = std::env::var("DELAY_SECONDS") {
            self.delay_seconds = delay.parse().map_err(|e| {
                AppError::config(format!("Invalid DELAY_SECONDS value '{}': {}", delay, e))
            })?;
        }

        if let Ok(enable_color) = std::env::var("ENABLE_COLOR") {
            self.enable_color = enable_color.parse().map_err(|e| {
                AppError::config(format!("Invalid ENABLE_COLOR value '{}': {}", enable_color, e))
            })?;
        }

        Ok(())
    }
}

// Default value functions for serde
fn default_influx_address() -> String {
    crate::defaults::DEFAULT_INFLUX_ADDRESS.to_string()
}

fn default_influx_port() -> u16 {
    crate::defaults::DEFAULT_INFLUX_PORT
}

fn default_influx_database() -> String {
    crate::defaults::DEFAULT_INFLUX_DATABASE.to_string()
}

fn default_verify_ssl() -> bool {
    true
}

fn default_webhook_host() -> String {
    crate::defaults::DEFAULT_WEBHOOK_HOST.to_string()
}

fn default_delay_seconds() -> u64 {
    crate::defaults::DEFAULT_DELAY.as_secs()
}

fn default_enable_color() -> bool {
    crate::defaults::DEFAULT_ENABLE_COLOR
}
