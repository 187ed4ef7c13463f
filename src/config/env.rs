//! Environment variable handling and .env file management

use crate::error::{AppError, Result};
use std::path::Path;

/// Environment variable configuration manager
pub struct EnvManager;

impl EnvManager {
    /// Load .env file if it exists
    pub fn load_env_file(debug: bool) -> Result<()> {
        if Path::new(".env").exists() {
            dotenv::from_filename(".env")
                .map_err(|e| AppError::config(format!("Failed to load .env file: {}", e)))?;

            if debug {
                println!("Loaded configuration from .env file");
            }
        } else if debug {
            println!("No .env file found, using defaults and CLI arguments");
        }

        Ok(())
    }

    /// Create example .env file content
    pub fn create_example_env_content() -> String {
        r#"# Speed Test Monitor Configuration
#
# This file contains environment variables that can be used to configure
# the speed test monitor. Values specified here will be used as defaults,
# but can be overridden by command-line arguments.

# Time-series store connection
# INFLUX_ADDRESS=localhost
# INFLUX_PORT=8086
# INFLUX_DATABASE=speedtests
# INFLUX_USER=
# INFLUX_PASSWORD=
# INFLUX_SSL=false
# INFLUX_VERIFY_SSL=true

# Webhook key; leave unset to disable webhook notifications
# WEBHOOK_KEY=

# Webhook host base URL
# WEBHOOK_HOST=https://maker.ifttt.com

# Server IDs to test against (comma-separated); empty means auto-select
# the nearest server
# TEST_SERVERS=1234,5678

# Delay in seconds between full test cycles
# DELAY_SECONDS=300

# Enable colored output (true/false)
# ENABLE_COLOR=true
"#
        .to_string()
    }

    /// Save example .env file to disk
    pub fn save_example_env_file(path: &Path) -> Result<()> {
        use std::fs;

        let content = Self::create_example_env_content();
        fs::write(path, content)
            .map_err(|e| AppError::config(format!("Failed to write example .env file: {}", e)))?;

        Ok(())
    }

    /// Validate environment variable format before parsing
    pub fn validate_env_var(key: &str, value: &str) -> Result<()> {
        match key {
            "INFLUX_ADDRESS" => {
                if value.is_empty() {
                    return Err(AppError::config("INFLUX_ADDRESS cannot be empty"));
                }
            }
            "INFLUX_PORT" => {
                value.parse::<u16>().map_err(|e| {
                    AppError::config(format!("Invalid INFLUX_PORT value '{}': {}", value, e))
                })?;
            }
            "INFLUX_SSL" | "INFLUX_VERIFY_SSL" | "ENABLE_COLOR" => {
                value.parse::<bool>().map_err(|e| {
                    AppError::config(format!("Invalid {} value '{}': {}", key, value, e))
                })?;
            }
            "WEBHOOK_HOST" => {
                let parsed = url::Url::parse(value).map_err(|e| {
                    AppError::config(format!("Invalid WEBHOOK_HOST value '{}': {}", value, e))
                })?;
                if parsed.scheme() != "http" && parsed.scheme() != "https" {
                    return Err(AppError::config(format!(
                        "WEBHOOK_HOST must be an HTTP(S) URL: {}",
                        value
                    )));
                }
            }
            "DELAY_SECONDS" => {
                let delay: u64 = value.parse().map_err(|e| {
                    AppError::config(format!("Invalid DELAY_SECONDS value '{}': {}", value, e))
                })?;
                if delay == 0 {
                    return Err(AppError::config("DELAY_SECONDS must be greater than 0"));
                }
            }
            _ => {
                // Unknown environment variable, ignore. TEST_SERVERS tokens
                // are validated per-token at selection time so one bad ID
                // cannot reject the whole configuration.
            }
        }

        Ok(())
    }

    /// Get list of all supported environment variables with descriptions
    pub fn get_supported_env_vars() -> Vec<(&'static str, &'static str, &'static str)> {
        vec![
            ("INFLUX_ADDRESS", "Time-series store host", "localhost"),
            ("INFLUX_PORT", "Time-series store port", "8086"),
            ("INFLUX_DATABASE", "Database to write results into", "speedtests"),
            ("INFLUX_USER", "Store user name", "monitor"),
            ("INFLUX_PASSWORD", "Store password", "secret"),
            ("INFLUX_SSL", "Connect to the store over HTTPS", "false"),
            ("INFLUX_VERIFY_SSL", "Verify the store TLS certificate", "true"),
            ("WEBHOOK_KEY", "Webhook key (unset disables notifications)", "abc123"),
            ("WEBHOOK_HOST", "Webhook host base URL", "https://maker.ifttt.com"),
            ("TEST_SERVERS", "Comma-separated server IDs", "1234,5678"),
            ("DELAY_SECONDS", "Seconds between test cycles", "300"),
            ("ENABLE_COLOR", "Enable colored output", "true"),
        ]
    }

    /// Validate all currently set environment variables
    pub fn validate_current_env() -> Result<Vec<String>> {
        let mut warnings = Vec::new();

        for (var_name, _, _) in Self::get_supported_env_vars() {
            if let Ok(value) = std::env::var(var_name) {
                if let Err(e) = Self::validate_env_var(var_name, &value) {
                    warnings.push(format!("Warning: {}", e));
                }
            }
        }

        Ok(warnings)
    }
}
