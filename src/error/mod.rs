//! Error handling for the speed test monitor

use thiserror::Error;

/// Custom error types for the speed test monitor
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Time-series store is unreachable (connect failure or timeout)
    #[error("Unable to connect to the time-series store at the provided address ({0})")]
    StoreUnreachable(String),

    /// Time-series store rejected the provided credentials
    #[error("Unable to connect to the time-series store with the provided credentials: {0}")]
    StoreAuthRejected(String),

    /// Time-series store connect check failed for a reason other than
    /// reachability or credentials
    #[error("Failed to connect to the time-series store: {0}")]
    StoreConnect(String),

    /// Time-series store write failures
    #[error("Store write error: {0}")]
    StoreWrite(String),

    /// Speed test provider configuration could not be retrieved
    #[error("Failed to retrieve the speed test provider configuration: {0}")]
    ProviderConfig(String),

    /// Speed test server list could not be retrieved
    #[error("Cannot retrieve the speed test server list: {0}")]
    ServersUnavailable(String),

    /// None of the configured server IDs matched the provider list
    #[error("No matched servers: {0}")]
    NoMatchedServers(String),

    /// A configured server ID is not a valid positive integer
    #[error("{0} is an invalid server ID, must be a positive integer")]
    InvalidServerId(String),

    /// Download/upload/latency measurement failures
    #[error("Measurement error: {0}")]
    Measurement(String),

    /// Webhook notification failures
    #[error("Notification error: {0}")]
    Notify(String),

    /// Timeout errors
    #[error("Timeout error: {0}")]
    Timeout(String),

    /// Parsing errors (URLs, JSON, XML attributes, etc.)
    #[error("Parsing error: {0}")]
    Parse(String),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    /// Create a new store-unreachable error
    pub fn store_unreachable<S: Into<String>>(address: S) -> Self {
        Self::StoreUnreachable(address.into())
    }

    /// Create a new store-credentials error
    pub fn store_auth_rejected<S: Into<String>>(message: S) -> Self {
        Self::StoreAuthRejected(message.into())
    }

    /// Create a new store-connect error
    pub fn store_connect<S: Into<String>>(message: S) -> Self {
        Self::StoreConnect(message.into())
    }

    /// Create a new store write error
    pub fn store_write<S: Into<String>>(message: S) -> Self {
        Self::StoreWrite(message.into())
    }

    /// Create a new provider configuration error
    pub fn provider_config<S: Into<String>>(message: S) -> Self {
        Self::ProviderConfig(message.into())
    }

    /// Create a new server-list retrieval error
    pub fn servers_unavailable<S: Into<String>>(message: S) -> Self {
        Self::ServersUnavailable(message.into())
    }

    /// Create a new no-matched-servers error
    pub fn no_matched_servers<S: Into<String>>(message: S) -> Self {
        Self::NoMatchedServers(message.into())
    }

    /// Create a new invalid server ID error
    pub fn invalid_server_id<S: Into<String>>(token: S) -> Self {
        Self::InvalidServerId(token.into())
    }

    /// Create a new measurement error
    pub fn measurement<S: Into<String>>(message: S) -> Self {
        Self::Measurement(message.into())
    }

    /// Create a new notification error
    pub fn notify<S: Into<String>>(message: S) -> Self {
        Self::Notify(message.into())
    }

    /// Create a new timeout error
    pub fn timeout<S: Into<String>>(message: S) -> Self {
        Self::Timeout(message.into())
    }

    /// Create a new parsing error
    pub fn parse<S: Into<String>>(message: S) -> Self {
        Self::Parse(message.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal(message.into())
    }

    /// Get error category for logging and reporting
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG",
            Self::StoreUnreachable(_) | Self::StoreConnect(_) | Self::StoreWrite(_) => "STORE",
            Self::StoreAuthRejected(_) => "AUTH",
            Self::ProviderConfig(_) | Self::ServersUnavailable(_) => "PROVIDER",
            Self::NoMatchedServers(_) | Self::InvalidServerId(_) => "SELECTION",
            Self::Measurement(_) => "MEASURE",
            Self::Notify(_) => "NOTIFY",
            Self::Timeout(_) => "TIMEOUT",
            Self::Parse(_) => "PARSE",
            Self::Internal(_) => "INTERNAL",
        }
    }

    /// Check whether this error must terminate the process.
    ///
    /// Fatal errors would recur identically on every future cycle, so looping
    /// on them is pointless. Components propagate them up to the top-level
    /// runner, which performs the actual exit.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Config(_)
                | Self::StoreUnreachable(_)
                | Self::StoreAuthRejected(_)
                | Self::StoreConnect(_)
                | Self::ProviderConfig(_)
        )
    }

    /// Check if error is recoverable within the orchestration loop
    pub fn is_cycle_local(&self) -> bool {
        !self.is_fatal()
    }

    /// Get exit code for this error type
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Parse(_) => 1, // Invalid configuration/usage
            Self::StoreUnreachable(_) | Self::StoreConnect(_) | Self::ProviderConfig(_) => 2, // Network issues
            Self::Timeout(_) => 3,
            Self::StoreAuthRejected(_) => 4, // Authentication issues
            Self::StoreWrite(_)
            | Self::ServersUnavailable(_)
            | Self::NoMatchedServers(_)
            | Self::InvalidServerId(_)
            | Self::Measurement(_)
            | Self::Notify(_) => 6, // Cycle-local failures that leaked to top level
            Self::Internal(_) => 99, // Internal/unexpected errors
        }
    }

    /// Format error for console display with color coding
    pub fn format_for_console(&self, use_color: bool) -> String {
        let category = self.category();
        let message = self.to_string();

        if use_color {
            use colored::Colorize;
            if self.is_fatal() {
                format!("[{}] {}", category.red().bold(), message.red())
            } else {
                format!("[{}] {}", category.yellow().bold(), message.yellow())
            }
        } else {
            format!("[{}] {}", category, message)
        }
    }
}

// Standard library error conversions
impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::internal(error.to_string())
    }
}

impl From<url::ParseError> for AppError {
    fn from(error: url::ParseError) -> Self {
        Self::parse(format!("URL parse error: {}", error))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        Self::parse(format!("JSON parse error: {}", error))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::timeout(error.to_string())
        } else {
            Self::internal(error.to_string())
        }
    }
}

impl From<dotenv::Error> for AppError {
    fn from(error: dotenv::Error) -> Self {
        Self::config(format!("Environment file error: {}", error))
    }
}

impl From<std::num::ParseIntError> for AppError {
    fn from(error: std::num::ParseIntError) -> Self {
        Self::parse(format!("Integer parse error: {}", error))
    }
}

impl From<std::num::ParseFloatError> for AppError {
    fn from(error: std::num::ParseFloatError) -> Self {
        Self::parse(format!("Float parse error: {}", error))
    }
}

impl From<std::str::ParseBoolError> for AppError {
    fn from(error: std::str::ParseBoolError) -> Self {
        Self::parse(format!("Boolean parse error: {}", error))
    }
}

// Anyhow integration
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::internal(error.to_string())
    }
}

/// Custom Result type for the application
pub type Result<T> = std::result::Result<T, AppError>;

/// Error context trait for adding context to errors
pub trait ErrorContext<T> {
    /// Add context to an error
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;

    /// Add static context to an error
    fn context(self, message: &'static str) -> Result<T>;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: Into<AppError>,
{
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let original_error = e.into();
            let context = f();
            AppError::internal(format!("{}: {}", context, original_error))
        })
    }

    fn context(self, message: &'static str) -> Result<T> {
        self.with_context(|| message.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let config_error = AppError::config("Invalid configuration");
        assert_eq!(config_error.category(), "CONFIG");
        assert!(config_error.is_fatal());
        assert_eq!(config_error.exit_code(), 1);

        let write_error = AppError::store_write("Connection reset");
        assert_eq!(write_error.category(), "STORE");
        assert!(write_error.is_cycle_local());
        assert_eq!(write_error.exit_code(), 6);
    }

    #[test]
    fn test_fatal_taxonomy() {
        assert!(AppError::store_unreachable("localhost").is_fatal());
        assert!(AppError::store_auth_rejected("401").is_fatal());
        assert!(AppError::store_connect("HTTP 500").is_fatal());
        assert!(AppError::provider_config("fetch failed").is_fatal());
        assert!(AppError::config("bad delay").is_fatal());

        assert!(!AppError::store_write("500").is_fatal());
        assert!(!AppError::servers_unavailable("timeout").is_fatal());
        assert!(!AppError::no_matched_servers("1234").is_fatal());
        assert!(!AppError::invalid_server_id("abc").is_fatal());
        assert!(!AppError::measurement("download failed").is_fatal());
        assert!(!AppError::notify("webhook down").is_fatal());
    }

    #[test]
    fn test_error_display() {
        let error = AppError::store_unreachable("influx.local");
        let display = error.to_string();
        assert!(display.contains("Unable to connect"));
        assert!(display.contains("influx.local"));

        let error = AppError::invalid_server_id("twelve");
        assert!(error.to_string().contains("twelve"));
        assert!(error.to_string().contains("positive integer"));
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(AppError::config("test").exit_code(), 1);
        assert_eq!(AppError::store_unreachable("test").exit_code(), 2);
        assert_eq!(AppError::provider_config("test").exit_code(), 2);
        assert_eq!(AppError::timeout("test").exit_code(), 3);
        assert_eq!(AppError::store_auth_rejected("test").exit_code(), 4);
        assert_eq!(AppError::internal("test").exit_code(), 99);
    }

    #[test]
    fn test_error_conversions() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let app_error: AppError = io_error.into();
        assert_eq!(app_error.category(), "INTERNAL");

        let parse_error = "not_a_number".parse::<i32>().unwrap_err();
        let app_error: AppError = parse_error.into();
        assert_eq!(app_error.category(), "PARSE");

        let url_error = url::Url::parse("not-a-valid-url").unwrap_err();
        let app_error: AppError = url_error.into();
        assert_eq!(app_error.category(), "PARSE");

        let json_error: serde_json::Error =
            serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let app_error: AppError = json_error.into();
        assert_eq!(app_error.category(), "PARSE");
    }

    #[test]
    fn test_anyhow_integration() {
        let anyhow_error = anyhow::anyhow!("Test anyhow error");
        let app_error: AppError = anyhow_error.into();
        assert_eq!(app_error.category(), "INTERNAL");
    }

    #[test]
    fn test_error_context() {
        let result: Result<i32> = Err(AppError::store_write("Connection failed"));
        let with_context = result.context("While publishing results");

        assert!(with_context.is_err());
        let error = with_context.unwrap_err();
        assert_eq!(error.category(), "INTERNAL");
        assert!(error.to_string().contains("While publishing results"));
    }

    #[test]
    fn test_console_formatting() {
        let error = AppError::store_unreachable("influx.local");
        let formatted_no_color = error.format_for_console(false);
        let formatted_color = error.format_for_console(true);

        assert!(formatted_no_color.contains("[STORE]"));
        assert!(formatted_color.contains("influx.local"));
    }
}
