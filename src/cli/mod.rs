//! Command-line interface module

use clap::{ArgAction, Parser};

/// Speed Test Monitor - periodically measures network throughput and latency
/// and publishes the results to InfluxDB and a notification webhook
#[derive(Parser, Debug, Clone)]
#[command(name = "speedtest-monitor")]
#[command(version, long_about = None)]
pub struct Cli {
    /// Time-series store host name or IP address
    #[arg(long, value_name = "HOST")]
    pub influx_address: Option<String>,

    /// Time-series store port
    #[arg(long, value_name = "PORT")]
    pub influx_port: Option<u16>,

    /// Database to write results into
    #[arg(long, value_name = "NAME")]
    pub influx_database: Option<String>,

    /// Store user name
    #[arg(long, value_name = "USER")]
    pub influx_user: Option<String>,

    /// Store password
    #[arg(long, value_name = "PASSWORD")]
    pub influx_password: Option<String>,

    /// Connect to the store over HTTPS
    #[arg(long)]
    pub ssl: bool,

    /// Skip TLS certificate verification for the store connection
    #[arg(long)]
    pub no_verify_ssl: bool,

    /// Webhook key; omitting it disables webhook notifications
    #[arg(long, value_name = "KEY")]
    pub webhook_key: Option<String>,

    /// Webhook host base URL
    #[arg(long, value_name = "URL")]
    pub webhook_host: Option<String>,

    /// Server ID to test against (can be used multiple times)
    #[arg(long = "server", action = ArgAction::Append, value_name = "ID")]
    pub servers: Vec<String>,

    /// Delay in seconds between test cycles
    #[arg(short, long, value_parser = parse_delay, value_name = "SECONDS")]
    pub delay: Option<u64>,

    /// Force colored output
    #[arg(long)]
    pub color: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub log_json: bool,

    /// Enable verbose output
    #[arg(long)]
    pub verbose: bool,

    /// Enable debug output
    #[arg(long)]
    pub debug: bool,
}

impl Cli {
    /// Validate CLI arguments for conflicts
    pub fn validate(&self) -> Result<(), String> {
        if self.color && self.no_color {
            return Err("Cannot specify both --color and --no-color".to_string());
        }

        if let Some(ref host) = self.webhook_host {
            if url::Url::parse(host).is_err() {
                return Err(format!("Invalid webhook host URL: {}", host));
            }
        }

        Ok(())
    }

    /// Check if colors should be enabled
    pub fn use_colors(&self) -> bool {
        if self.color {
            true
        } else if self.no_color {
            false
        } else {
            supports_color()
        }
    }
}

/// Parse the inter-cycle delay from a seconds string
fn parse_delay(s: &str) -> Result<u64, String> {
    if s.starts_with('+') || s.starts_with("0x") || s.starts_with("0X") {
        return Err(format!("Invalid delay: {}", s));
    }

    s.parse::<u64>()
        .map_err(|_| format!("Invalid delay: {}", s))
        .and_then(|secs| {
            if secs == 0 {
                Err("Delay must be greater than 0".to_string())
            } else {
                Ok(secs)
            }
        })
}

/// Check if the terminal supports color output
fn supports_color() -> bool {
    if let Ok(term) = std::env::var("TERM") {
        if term == "dumb" {
            return false;
        }
    }

    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    true
}
