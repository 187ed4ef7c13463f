//! Configuration parsing from CLI arguments and environment variables

use crate::{
    cli::Cli,
    config::env::EnvManager,
    error::Result,
    models::Config,
};

/// Configuration parser that combines CLI arguments with environment variables
pub struct ConfigParser {
    cli: Cli,
}

impl ConfigParser {
    /// Create a new configuration parser with CLI arguments
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Parse and build the complete configuration
    pub fn parse(&self) -> Result<Config> {
        // Start with default configuration
        let mut config = Config::default();

        // Load from environment file if it exists
        EnvManager::load_env_file(self.cli.debug)?;

        // Merge environment variables into config
        config.merge_from_env()?;

        // Override with CLI arguments
        self.apply_cli_overrides(&mut config);

        // Validate the final configuration
        config.validate()?;

        Ok(config)
    }

    /// Apply CLI argument overrides to configuration
    fn apply_cli_overrides(&self, config: &mut Config) {
        if let Some(ref address) = self.cli.influx_address {
            config.influx_address = address.clone();
        }

        if let Some(port) = self.cli.influx_port {
            config.influx_port = port;
        }

        if let Some(ref database) = self.cli.influx_database {
            config.influx_database = database.clone();
        }

        if let Some(ref user) = self.cli.influx_user {
            config.influx_user = Some(user.clone());
        }

        if let Some(ref password) = self.cli.influx_password {
            config.influx_password = Some(password.clone());
        }

        if self.cli.ssl {
            config.influx_ssl = true;
        }

        if self.cli.no_verify_ssl {
            config.influx_verify_ssl = false;
        }

        if let Some(ref key) = self.cli.webhook_key {
            config.webhook_key = Some(key.clone());
        }

        if let Some(ref host) = self.cli.webhook_host {
            config.webhook_host = host.clone();
        }

        if !self.cli.servers.is_empty() {
            config.servers = self.cli.servers.clone();
        }

        if let Some(delay) = self.cli.delay {
            config.delay_seconds = delay;
        }

        config.enable_color = self.cli.use_colors();
        config.verbose = self.cli.verbose;
        config.debug = self.cli.debug;

        if config.debug {
            println!("Applied CLI overrides to configuration");
        }
    }
}

/// Convenience function to load complete configuration from CLI arguments
pub fn load_config(cli: Cli) -> Result<Config> {
    let parser = ConfigParser::new(cli);
    parser.parse()
}

/// Display configuration summary for debug purposes
pub fn display_config_summary(config: &Config) -> String {
    let mut summary = Vec::new();

    summary.push(format!("Store: {}", config.store_url()));
    summary.push(format!("Database: {}", config.influx_database));
    summary.push(format!(
        "Credentials: {}",
        if config.influx_user.is_some() { "configured" } else { "none" }
    ));
    summary.push(format!("Webhook: {}", if config.webhook_enabled() { "enabled" } else { "disabled" }));
    summary.push(format!(
        "Servers: {}",
        if config.servers.is_empty() {
            "auto-select nearest".to_string()
        } else {
            config.servers.join(", ")
        }
    ));
    summary.push(format!("Delay: {}s", config.delay_seconds));
    summary.push(format!("Color Output: {}", config.enable_color));
    summary.push(format!("Verbose: {}", config.verbose));
    summary.push(format!("Debug: {}", config.debug));

    summary.join("\n")
}
