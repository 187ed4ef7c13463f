//! Speed Test Monitor
//!
//! A periodic network speed test monitor that measures throughput and
//! latency against one or more remote test servers and publishes each result
//! to an InfluxDB-compatible time-series store and a notification webhook.

pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod probe;
pub mod publish;

// Re-export commonly used types
pub use error::{AppError, Result};
pub use logging::{LogFormat, LogLevel, Logger};
pub use models::{Config, SpeedTestResult, TestServer};

/// Application version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
pub const PKG_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Default configuration values
pub mod defaults {
    use std::time::Duration;

    pub const DEFAULT_INFLUX_ADDRESS: &str = "localhost";
    pub const DEFAULT_INFLUX_PORT: u16 = 8086;
    pub const DEFAULT_INFLUX_DATABASE: &str = "speedtests";
    pub const DEFAULT_WEBHOOK_HOST: &str = "https://maker.ifttt.com";
    pub const DEFAULT_DELAY: Duration = Duration::from_secs(300);
    pub const DEFAULT_ENABLE_COLOR: bool = true;

    pub const DEFAULT_PROVIDER_CONFIG_URL: &str =
        "https://www.speedtest.net/speedtest-config.php";
    pub const DEFAULT_PROVIDER_SERVERS_URL: &str =
        "https://www.speedtest.net/speedtest-servers-static.php";
}
